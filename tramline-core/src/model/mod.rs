//! Data model for transit network routing
//!
//! Contains the input line and station types and the built network graph.

pub mod lines;
pub mod network;

pub use lines::{KnownStation, LineInfo, SpeedClass, TransitLine};
pub use network::{Edge, EdgeKind, NetworkGraph, Node, NodeKind, QueryOverlay, RoutingGraph};
