pub use crate::MAX_CANDIDATE_STOPS;

// Re-export key components
pub use crate::loading::{
    BuildOptions, BuildReport, BuildWarning, EngineConfig, NetworkConfig, RoutingConfig,
    SpeedProfile, build_network, build_network_with, read_lines_geojson, read_stations_csv,
};
pub use crate::model::{
    KnownStation, NetworkGraph, QueryOverlay, RoutingGraph, SpeedClass, TransitLine,
};
pub use crate::routing::{
    OptimizeFor, QueryError, RawRouteQuery, RouteQuery, RouteResult, RouteSegment, plan_route,
};

// Core identifier and unit types
pub use crate::{EdgeId, LineId, NodeId};
pub use crate::{Miles, Minutes};
