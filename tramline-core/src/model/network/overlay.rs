//! Copy-on-write view of a network used by a single query.
//!
//! Virtual access nodes and the edges obtained by splitting a travel edge are
//! kept in a small delta. The split edges are hidden rather than removed, so
//! the base [`NetworkGraph`] is never touched and dropping the overlay is the
//! whole rollback.

use std::collections::BTreeSet;

use geo::{LineString, Point};
use hashbrown::{HashMap, HashSet};

use super::components::{Edge, EdgeKind, Node, NodeKind};
use super::graph::{NetworkGraph, RoutingGraph};
use crate::{
    EdgeId, LineId, Miles, NodeId,
    geometry::{PolylineProjection, polyline_length, split_polyline},
    model::LineInfo,
};

#[derive(Debug)]
pub struct QueryOverlay<'a> {
    base: &'a NetworkGraph,
    added_nodes: Vec<Node>,
    added_edges: Vec<Edge>,
    added_adjacency: HashMap<NodeId, Vec<EdgeId>>,
    hidden: HashSet<EdgeId>,
}

impl<'a> QueryOverlay<'a> {
    pub fn new(base: &'a NetworkGraph) -> Self {
        Self {
            base,
            added_nodes: Vec::new(),
            added_edges: Vec::new(),
            added_adjacency: HashMap::new(),
            hidden: HashSet::new(),
        }
    }

    pub fn base(&self) -> &'a NetworkGraph {
        self.base
    }

    pub fn is_permanent(&self, node: NodeId) -> bool {
        node < self.base.nodes.len()
    }

    pub fn virtual_node_count(&self) -> usize {
        self.added_nodes.len()
    }

    pub fn is_hidden(&self, edge: EdgeId) -> bool {
        self.hidden.contains(&edge)
    }

    /// Live travel edges near `point`, one per physical link
    pub(crate) fn travel_edges_near(
        &self,
        point: Point<f64>,
        radius: Miles,
    ) -> Vec<&Edge> {
        let mut edges: Vec<&Edge> = self
            .base
            .travel_edges_near(point, radius)
            .filter(|edge| !self.hidden.contains(&edge.id))
            .collect();
        edges.extend(self.added_edges.iter().filter(|edge| {
            matches!(edge.kind, EdgeKind::Travel { .. })
                && edge.id < edge.reverse
                && !self.hidden.contains(&edge.id)
        }));
        edges
    }

    /// Split the physical link `edge_id` at `at` and return the node standing
    /// at the split point.
    ///
    /// Distance and both time components are shared between the two halves in
    /// proportion to their lengths. A projection landing on one of the edge's
    /// ends returns that end node and adds nothing.
    pub fn split_edge(&mut self, edge_id: EdgeId, at: &PolylineProjection) -> Option<NodeId> {
        let edge = self.edge(edge_id)?.clone();
        if self.hidden.contains(&edge_id) {
            return None;
        }

        let (head, tail) = split_polyline(&edge.geometry.0, at);
        let head_len = polyline_length(&head.0);
        let total_len = head_len + polyline_length(&tail.0);
        let fraction = if total_len > 0.0 {
            head_len / total_len
        } else {
            0.0
        };
        if fraction <= 0.0 {
            return Some(edge.from);
        }
        if fraction >= 1.0 {
            return Some(edge.to);
        }

        let lines: BTreeSet<LineId> = edge.line().into_iter().collect();
        let node_id = self.base.nodes.len() + self.added_nodes.len();
        self.added_nodes.push(Node {
            id: node_id,
            geometry: at.point,
            lines,
            kind: NodeKind::Virtual,
            name: None,
        });

        self.add_link(&edge, edge.from, node_id, head, fraction);
        self.add_link(&edge, node_id, edge.to, tail, 1.0 - fraction);

        self.hidden.insert(edge.id);
        self.hidden.insert(edge.reverse);

        Some(node_id)
    }

    /// Add a forward/backward pair carrying `share` of `parent`
    fn add_link(
        &mut self,
        parent: &Edge,
        from: NodeId,
        to: NodeId,
        geometry: LineString<f64>,
        share: f64,
    ) {
        let forward_id = self.base.edges.len() + self.added_edges.len();
        let backward_id = forward_id + 1;
        let forward = Edge {
            id: forward_id,
            from,
            to,
            reverse: backward_id,
            kind: parent.kind,
            distance_miles: parent.distance_miles * share,
            travel_time_minutes: parent.travel_time_minutes * share,
            penalty_minutes: parent.penalty_minutes * share,
            geometry: geometry.clone(),
        };
        let backward = Edge {
            id: backward_id,
            from: to,
            to: from,
            reverse: forward_id,
            geometry: geometry.0.into_iter().rev().collect(),
            ..forward.clone()
        };

        self.added_adjacency.entry(from).or_default().push(forward_id);
        self.added_adjacency.entry(to).or_default().push(backward_id);
        self.added_edges.push(forward);
        self.added_edges.push(backward);
    }
}

impl RoutingGraph for QueryOverlay<'_> {
    fn node(&self, id: NodeId) -> Option<&Node> {
        let base_count = self.base.nodes.len();
        if id < base_count {
            self.base.nodes.get(id)
        } else {
            self.added_nodes.get(id - base_count)
        }
    }

    fn edge(&self, id: EdgeId) -> Option<&Edge> {
        let base_count = self.base.edges.len();
        if id < base_count {
            self.base.edges.get(id)
        } else {
            self.added_edges.get(id - base_count)
        }
    }

    fn outgoing(&self, node: NodeId) -> impl Iterator<Item = &Edge> {
        let added = self.added_adjacency.get(&node).map_or(&[][..], Vec::as_slice);
        self.base
            .adjacent(node)
            .iter()
            .chain(added)
            .filter(|id| !self.hidden.contains(*id))
            .filter_map(|&id| self.edge(id))
    }

    fn line(&self, id: LineId) -> Option<&LineInfo> {
        self.base.lines.get(id)
    }

    fn node_count(&self) -> usize {
        self.base.nodes.len() + self.added_nodes.len()
    }

    fn max_speed_mph(&self) -> f64 {
        self.base.max_speed_mph
    }

    fn position_slack_miles(&self) -> Miles {
        self.base.position_slack_miles
    }
}

#[cfg(test)]
mod tests {
    use geo::Point;

    use super::*;
    use crate::geometry::project_onto_polyline;
    use crate::{TransitLine, build_network, loading::NetworkConfig};

    fn network() -> NetworkGraph {
        let mut config = NetworkConfig::default();
        config.station_spacing_miles = 10.0;
        config.speeds.dwell_minutes = 0.0;
        let lines = vec![TransitLine::new("Red", vec![(0.0, 0.0), (0.02, 0.0)])];
        build_network(&lines, &[], &config).unwrap()
    }

    #[test]
    fn split_preserves_total_weight_and_leaves_base_untouched() {
        let graph = network();
        assert_eq!(graph.edge_count(), 2);
        let original = graph.edges()[0].clone();

        let mut overlay = QueryOverlay::new(&graph);
        let at = project_onto_polyline(Point::new(0.005, 0.001), &original.geometry.0).unwrap();
        let node = overlay.split_edge(original.id, &at).unwrap();

        assert_eq!(node, graph.nodes().len());
        assert_eq!(overlay.node(node).map(|n| n.kind), Some(NodeKind::Virtual));
        assert!(overlay.is_hidden(original.id));
        assert!(overlay.is_hidden(original.reverse));

        let out: Vec<&Edge> = overlay.outgoing(node).collect();
        assert_eq!(out.len(), 2);
        let total: f64 = out.iter().map(|e| e.time_minutes()).sum();
        assert!((total - original.time_minutes()).abs() < 1e-9);
        let miles: f64 = out.iter().map(|e| e.distance_miles).sum();
        assert!((miles - original.distance_miles).abs() < 1e-9);

        // the original link no longer leaves its endpoints
        assert!(overlay.outgoing(original.from).all(|e| e.id != original.id));
        drop(overlay);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn split_at_an_end_reuses_the_end_node() {
        let graph = network();
        let edge = graph.edges()[0].clone();
        let mut overlay = QueryOverlay::new(&graph);
        let at = project_onto_polyline(Point::new(-0.01, 0.0), &edge.geometry.0).unwrap();
        assert_eq!(overlay.split_edge(edge.id, &at), Some(edge.from));
        assert_eq!(overlay.virtual_node_count(), 0);
    }

    #[test]
    fn split_pieces_can_be_split_again() {
        let graph = network();
        let edge = graph.edges()[0].clone();
        let mut overlay = QueryOverlay::new(&graph);
        let first = project_onto_polyline(Point::new(0.005, 0.0), &edge.geometry.0).unwrap();
        let a = overlay.split_edge(edge.id, &first).unwrap();

        let point = Point::new(0.015, 0.0);
        let pieces = overlay.travel_edges_near(point, 0.5);
        assert_eq!(pieces.len(), 2);
        let (piece_id, at) = pieces
            .iter()
            .filter_map(|e| Some((e.id, project_onto_polyline(point, &e.geometry.0)?)))
            .min_by(|x, y| x.1.distance.total_cmp(&y.1.distance))
            .unwrap();
        let b = overlay.split_edge(piece_id, &at).unwrap();

        assert_ne!(a, b);
        assert_eq!(overlay.virtual_node_count(), 2);
        assert_eq!(overlay.node_count(), graph.nodes().len() + 2);
    }
}
