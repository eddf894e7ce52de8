use std::collections::VecDeque;

use fixedbitset::FixedBitSet;
use geo::{LineString, Point};
use geojson::{Feature, FeatureCollection, Geometry, Value as GeoJsonValue};
use rstar::{
    AABB, RTree,
    primitives::{GeomWithData, Rectangle},
};
use serde_json::{Map, Value as JsonValue, json};

use super::components::{Edge, EdgeKind, Node};
use crate::{
    EdgeId, LineId, Miles, NodeId,
    geometry::{distance, search_envelope},
    loading::{BuildReport, SpeedProfile},
    model::LineInfo,
};

pub type IndexedNode = GeomWithData<[f64; 2], NodeId>;
pub type IndexedEdge = GeomWithData<Rectangle<[f64; 2]>, EdgeId>;

/// Read access to a routable graph.
///
/// Implemented by the immutable [`NetworkGraph`] and by the per-query
/// [`QueryOverlay`](super::QueryOverlay), so the planner never needs to know
/// whether a node is permanent or query-local.
pub trait RoutingGraph {
    fn node(&self, id: NodeId) -> Option<&Node>;
    fn edge(&self, id: EdgeId) -> Option<&Edge>;
    /// Live directed edges leaving `node`
    fn outgoing(&self, node: NodeId) -> impl Iterator<Item = &Edge>;
    fn line(&self, id: LineId) -> Option<&LineInfo>;
    fn node_count(&self) -> usize;
    /// Upper bound of any travel or walking speed in the graph (mph)
    fn max_speed_mph(&self) -> f64;
    /// How much closer two nodes can be than the network distance between
    /// the points their edges are measured from
    fn position_slack_miles(&self) -> Miles {
        0.0
    }
}

/// Built transit network: nodes, directed edges and the line registry.
///
/// Nodes and edges live in arenas addressed by index. Every physical link is
/// stored as two directed edges pointing at each other through
/// [`Edge::reverse`].
#[derive(Debug, Clone)]
pub struct NetworkGraph {
    pub(crate) nodes: Vec<Node>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) adjacency: Vec<Vec<EdgeId>>,
    pub(crate) lines: Vec<LineInfo>,
    pub(crate) node_index: RTree<IndexedNode>,
    pub(crate) edge_index: RTree<IndexedEdge>,
    pub(crate) profile: SpeedProfile,
    pub(crate) max_speed_mph: f64,
    /// Twice the merge radius: a merged node sits within it of each line
    pub(crate) position_slack_miles: Miles,
    pub(crate) report: BuildReport,
}

impl NetworkGraph {
    pub(crate) fn new(
        nodes: Vec<Node>,
        edges: Vec<Edge>,
        lines: Vec<LineInfo>,
        profile: SpeedProfile,
        report: BuildReport,
    ) -> Self {
        let mut adjacency = vec![Vec::new(); nodes.len()];
        for edge in &edges {
            adjacency[edge.from].push(edge.id);
        }

        let node_index = RTree::bulk_load(
            nodes
                .iter()
                .map(|node| GeomWithData::new([node.geometry.x(), node.geometry.y()], node.id))
                .collect(),
        );
        let edge_index = RTree::bulk_load(
            edges
                .iter()
                .filter(|edge| matches!(edge.kind, EdgeKind::Travel { .. }))
                .filter(|edge| edge.id < edge.reverse)
                .filter_map(|edge| Some(GeomWithData::new(edge_bounds(&edge.geometry)?, edge.id)))
                .collect(),
        );

        let max_speed_mph = lines
            .iter()
            .map(|line| line.speed_mph)
            .fold(profile.walking_speed_mph, f64::max);

        Self {
            nodes,
            edges,
            adjacency,
            lines,
            node_index,
            edge_index,
            profile,
            max_speed_mph,
            position_slack_miles: 0.0,
            report,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn lines(&self) -> &[LineInfo] {
        &self.lines
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn profile(&self) -> &SpeedProfile {
        &self.profile
    }

    /// Warnings and repair statistics collected while building
    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    /// Outgoing edge ids of a node
    pub fn adjacent(&self, node: NodeId) -> &[EdgeId] {
        self.adjacency.get(node).map_or(&[], Vec::as_slice)
    }

    /// Nodes within `radius` miles of `point`, closest first
    pub fn nodes_within(&self, point: Point<f64>, radius: Miles) -> Vec<(NodeId, Miles)> {
        let mut found: Vec<(NodeId, Miles)> = self
            .node_index
            .locate_in_envelope(&search_envelope(point, radius))
            .filter_map(|indexed| {
                let d = distance(point, self.nodes[indexed.data].geometry);
                (d <= radius).then_some((indexed.data, d))
            })
            .collect();
        found.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        found
    }

    /// Travel edges (one per physical link) whose bounding box lies within
    /// `radius` miles of `point`
    pub(crate) fn travel_edges_near(
        &self,
        point: Point<f64>,
        radius: Miles,
    ) -> impl Iterator<Item = &Edge> {
        self.edge_index
            .locate_in_envelope_intersecting(&search_envelope(point, radius))
            .map(|indexed| &self.edges[indexed.data])
    }

    /// Connected components, each as a sorted list of node ids
    pub fn connected_components(&self) -> Vec<Vec<NodeId>> {
        let mut visited = FixedBitSet::with_capacity(self.nodes.len());
        let mut components = Vec::new();
        let mut queue = VecDeque::new();

        for start in 0..self.nodes.len() {
            if visited.contains(start) {
                continue;
            }
            visited.insert(start);
            queue.push_back(start);
            let mut component = Vec::new();

            while let Some(node) = queue.pop_front() {
                component.push(node);
                for &edge_id in self.adjacent(node) {
                    let next = self.edges[edge_id].to;
                    if !visited.contains(next) {
                        visited.insert(next);
                        queue.push_back(next);
                    }
                }
            }

            component.sort_unstable();
            components.push(component);
        }

        components
    }

    /// Sum of the weights of every directed edge, in minutes
    pub fn total_edge_weight(&self) -> f64 {
        self.edges.iter().map(Edge::time_minutes).sum()
    }

    pub fn line_names(&self, node: &Node) -> Vec<&str> {
        node.lines
            .iter()
            .filter_map(|&id| self.lines.get(id))
            .map(|line| line.name.as_str())
            .collect()
    }

    /// Network as a `GeoJSON` `FeatureCollection`: nodes as points and each
    /// physical edge once as a line string.
    pub fn to_geojson(&self) -> FeatureCollection {
        let mut features = Vec::with_capacity(self.nodes.len() + self.edges.len() / 2);

        for node in &self.nodes {
            let properties = json!({
                "feature_type": "node",
                "id": node.id,
                "kind": node.kind.as_str(),
                "name": node.name,
                "lines": self.line_names(node),
            });
            features.push(feature(
                GeoJsonValue::from(&node.geometry),
                properties,
            ));
        }

        for edge in self.edges.iter().filter(|edge| edge.id < edge.reverse) {
            let (kind, line) = match edge.kind {
                EdgeKind::Travel { line } => {
                    ("travel", self.lines.get(line).map(|l| l.name.clone()))
                }
                EdgeKind::Transfer => ("transfer", None),
                EdgeKind::Connector => ("connector", None),
            };
            let properties = json!({
                "feature_type": "edge",
                "id": edge.id,
                "kind": kind,
                "line": line,
                "from": edge.from,
                "to": edge.to,
                "distance_miles": edge.distance_miles,
                "time_minutes": edge.time_minutes(),
            });
            features.push(feature(GeoJsonValue::from(&edge.geometry), properties));
        }

        FeatureCollection {
            features,
            bbox: None,
            foreign_members: None,
        }
    }
}

impl RoutingGraph for NetworkGraph {
    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    fn outgoing(&self, node: NodeId) -> impl Iterator<Item = &Edge> {
        self.adjacent(node).iter().map(|&id| &self.edges[id])
    }

    fn line(&self, id: LineId) -> Option<&LineInfo> {
        self.lines.get(id)
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn max_speed_mph(&self) -> f64 {
        self.max_speed_mph
    }

    fn position_slack_miles(&self) -> Miles {
        self.position_slack_miles
    }
}

fn edge_bounds(geometry: &LineString<f64>) -> Option<Rectangle<[f64; 2]>> {
    let first = geometry.0.first()?;
    let (mut min, mut max) = ([first.x, first.y], [first.x, first.y]);
    for coord in &geometry.0 {
        min = [min[0].min(coord.x), min[1].min(coord.y)];
        max = [max[0].max(coord.x), max[1].max(coord.y)];
    }
    Some(Rectangle::from_aabb(AABB::from_corners(min, max)))
}

fn feature(geometry: GeoJsonValue, properties: JsonValue) -> Feature {
    let properties: Option<Map<String, JsonValue>> = match properties {
        JsonValue::Object(map) => Some(map),
        _ => None,
    };
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geometry)),
        id: None,
        properties,
        foreign_members: None,
    }
}
