//! Transit network graph: node and edge arenas, the routing trait and the
//! per-query overlay

pub mod components;
pub mod graph;
pub mod overlay;

pub use components::{Edge, EdgeKind, Node, NodeKind};
pub use graph::{IndexedEdge, IndexedNode, NetworkGraph, RoutingGraph};
pub use overlay::QueryOverlay;
