//! Consolidated itineraries built from planner paths.

mod format;
mod to_geojson;

pub use format::{format_distance, format_duration};

use geo::{LineString, Point};

use super::access::AccessPoint;
use super::planner::PlannedPath;
use super::query::OptimizeFor;
use crate::{
    LineId, Miles, Minutes, NodeId,
    model::{Edge, Node, RoutingGraph},
};

/// Walk between a query coordinate and its network entry point
#[derive(Debug, Clone, PartialEq)]
pub struct WalkLeg {
    pub from: Point<f64>,
    pub to: Point<f64>,
    pub distance_miles: Miles,
    pub time_minutes: Minutes,
}

impl WalkLeg {
    fn access(point: &AccessPoint, node: &Node) -> Self {
        Self {
            from: point.location,
            to: node.geometry,
            distance_miles: point.walk_miles,
            time_minutes: point.walk_minutes,
        }
    }

    fn egress(point: &AccessPoint, node: &Node) -> Self {
        Self {
            from: node.geometry,
            to: point.location,
            distance_miles: point.walk_miles,
            time_minutes: point.walk_minutes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    Ride { line: LineId, line_name: String },
    Walk,
}

/// Run of consecutive edges on the same line, or of consecutive walks
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSegment {
    pub kind: SegmentKind,
    pub from: NodeId,
    pub to: NodeId,
    pub from_name: Option<String>,
    pub to_name: Option<String>,
    pub distance_miles: Miles,
    pub time_minutes: Minutes,
    /// Number of edges merged into the segment
    pub hops: usize,
    pub geometry: LineString<f64>,
}

impl RouteSegment {
    fn start(kind: SegmentKind, edge: &Edge, from: &Node) -> Self {
        Self {
            kind,
            from: edge.from,
            to: edge.from,
            from_name: from.name.clone(),
            to_name: from.name.clone(),
            distance_miles: 0.0,
            time_minutes: 0.0,
            hops: 0,
            geometry: LineString::new(Vec::new()),
        }
    }

    fn push(&mut self, edge: &Edge, to: &Node) {
        self.to = edge.to;
        self.to_name = to.name.clone();
        self.distance_miles += edge.distance_miles;
        self.time_minutes += edge.time_minutes();
        self.hops += 1;

        let mut coords = edge.geometry.0.iter().copied();
        // consecutive edge geometries share their joint vertex
        if self.geometry.0.last() == edge.geometry.0.first() {
            coords.next();
        }
        self.geometry.0.extend(coords);
    }

    pub fn is_walk(&self) -> bool {
        self.kind == SegmentKind::Walk
    }
}

/// Result of a successful route query
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResult {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub segments: Vec<RouteSegment>,
    pub access: WalkLeg,
    pub egress: WalkLeg,
    /// Includes the access and egress walks
    pub total_distance_miles: Miles,
    /// Includes the access and egress walks
    pub total_time_minutes: Minutes,
    /// Walks, plus the transfer penalties of every line change
    pub walking_time_minutes: Minutes,
    pub transit_time_minutes: Minutes,
    /// Line changes along the unconsolidated edge sequence
    pub transfers: usize,
    /// Distinct line names in riding order
    pub lines_used: Vec<String>,
    pub optimize_for: OptimizeFor,
}

impl RouteResult {
    /// Copies the path out of `graph` (virtual nodes included) into an
    /// owned itinerary.
    ///
    /// Returns `None` if the path references ids unknown to `graph`.
    pub(crate) fn assemble<G: RoutingGraph>(
        graph: &G,
        path: &PlannedPath,
        start: &AccessPoint,
        end: &AccessPoint,
        optimize_for: OptimizeFor,
    ) -> Option<Self> {
        let nodes: Vec<Node> = path
            .nodes
            .iter()
            .map(|&id| graph.node(id).cloned())
            .collect::<Option<_>>()?;
        let edges: Vec<Edge> = path
            .edges
            .iter()
            .map(|&id| graph.edge(id).cloned())
            .collect::<Option<_>>()?;

        let first = nodes.first()?;
        let last = nodes.last()?;
        let access = WalkLeg::access(start, first);
        let egress = WalkLeg::egress(end, last);

        let mut segments: Vec<RouteSegment> = Vec::new();
        let mut lines_used: Vec<String> = Vec::new();
        let mut walking_time = access.time_minutes + egress.time_minutes + path.penalty_minutes;
        let mut transit_time = 0.0;

        for (edge, pair) in edges.iter().zip(nodes.windows(2)) {
            let kind = match edge.line() {
                Some(line) => {
                    let line_name = graph
                        .line(line)
                        .map_or_else(|| format!("Line {line}"), |info| info.name.clone());
                    if !lines_used.contains(&line_name) {
                        lines_used.push(line_name.clone());
                    }
                    transit_time += edge.time_minutes();
                    SegmentKind::Ride { line, line_name }
                }
                None => {
                    walking_time += edge.time_minutes();
                    SegmentKind::Walk
                }
            };

            if let Some(current) = segments.last_mut().filter(|s| s.kind == kind) {
                current.push(edge, &pair[1]);
            } else {
                let mut segment = RouteSegment::start(kind, edge, &pair[0]);
                segment.push(edge, &pair[1]);
                segments.push(segment);
            }
        }

        Some(Self {
            total_distance_miles: access.distance_miles
                + path.distance_miles
                + egress.distance_miles,
            total_time_minutes: access.time_minutes + path.time_minutes + egress.time_minutes,
            walking_time_minutes: walking_time,
            transit_time_minutes: transit_time,
            transfers: path.transfers,
            nodes,
            edges,
            segments,
            access,
            egress,
            lines_used,
            optimize_for,
        })
    }

    /// Segments spent on board
    pub fn rides(&self) -> impl Iterator<Item = &RouteSegment> {
        self.segments.iter().filter(|segment| !segment.is_walk())
    }
}
