//! Transit network reconstruction and journey planning.
//!
//! Raw line geometries are turned into a weighted graph of stops, transfers
//! and repair connectors, which can then be queried for time, distance or
//! transfer optimal routes between arbitrary coordinates.

pub mod error;
pub mod geometry;
pub mod loading;
pub mod model;
pub mod prelude;
pub mod routing;

pub use error::Error;
pub use loading::{
    BuildOptions, BuildPhase, CancellationToken, EngineConfig, NetworkConfig, RoutingConfig,
    SpeedProfile, build_network, build_network_with,
};
pub use model::{
    Edge, EdgeKind, KnownStation, LineInfo, NetworkGraph, Node, NodeKind, QueryOverlay,
    RoutingGraph, SpeedClass, TransitLine,
};
pub use routing::{
    OptimizeFor, QueryError, RawRouteQuery, RouteQuery, RouteResult, ValidationError, plan_route,
};

/// Index of a node inside a graph (permanent or query-local)
pub type NodeId = usize;
/// Index of a directed edge inside a graph (permanent or query-local)
pub type EdgeId = usize;
/// Index of a line inside the network line registry
pub type LineId = usize;

/// Distances are expressed in miles, durations in minutes.
pub type Miles = f64;
pub type Minutes = f64;

/// Maximum number of access candidates tried per query side
pub const MAX_CANDIDATE_STOPS: usize = 5;
