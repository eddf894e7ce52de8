//! Application-facing entry point of the tramline journey planner.
//!
//! Wraps the `tramline_core` engine in a [`TransitNetwork`] handle that can be
//! loaded from files and queried concurrently, and a [`RouteController`] that
//! keeps the start/end placement of an interactive search.

pub mod matrix;
pub mod model;
pub mod routing;

pub use matrix::{plan_batch, travel_time_matrix};
pub use model::TransitNetwork;
pub use routing::RouteController;

pub use tramline_core::prelude;
pub use tramline_core::{
    EngineConfig, Error, KnownStation, OptimizeFor, QueryError, RawRouteQuery, RouteQuery,
    RouteResult, SpeedClass, TransitLine, ValidationError,
};
