//! Network components - nodes and edges

use std::collections::BTreeSet;

use geo::{LineString, Point};

use crate::{EdgeId, LineId, Miles, Minutes, NodeId};

/// What a node stands for. Declaration order is merge priority, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    /// Two or more lines cross here
    Intersection,
    /// First or last coordinate of a line
    Endpoint,
    /// Known station supplied with the input
    Station,
    /// Stop placed at a regular spacing along a line
    Interpolated,
    /// Query-local access point, never part of a built network
    Virtual,
}

impl NodeKind {
    /// Kind kept when two candidates are merged into one node
    pub fn merge(self, other: NodeKind) -> NodeKind {
        self.min(other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Intersection => "intersection",
            NodeKind::Endpoint => "endpoint",
            NodeKind::Station => "station",
            NodeKind::Interpolated => "interpolated",
            NodeKind::Virtual => "virtual",
        }
    }
}

/// Network node
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    /// Node coordinates (longitude, latitude)
    pub geometry: Point<f64>,
    /// Lines serving this node
    pub lines: BTreeSet<LineId>,
    pub kind: NodeKind,
    /// Name of a known station merged into this node
    pub name: Option<String>,
}

impl Node {
    pub fn shares_line_with(&self, other: &Node) -> bool {
        !self.lines.is_disjoint(&other.lines)
    }

    pub fn is_virtual(&self) -> bool {
        self.kind == NodeKind::Virtual
    }
}

/// What an edge represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Riding a line between two consecutive stops
    Travel { line: LineId },
    /// Walking between nearby stops of different lines
    Transfer,
    /// Walking link added to join disconnected parts of the network
    Connector,
}

/// Directed network edge
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    /// Opposite direction of the same physical link
    pub reverse: EdgeId,
    pub kind: EdgeKind,
    pub distance_miles: Miles,
    /// Riding time for travel edges, walking time otherwise
    pub travel_time_minutes: Minutes,
    /// Fixed extra cost: stop dwell for travel edges, penalty otherwise
    pub penalty_minutes: Minutes,
    pub geometry: LineString<f64>,
}

impl Edge {
    /// Full weight of the edge in minutes
    pub fn time_minutes(&self) -> Minutes {
        self.travel_time_minutes + self.penalty_minutes
    }

    pub fn line(&self) -> Option<LineId> {
        match self.kind {
            EdgeKind::Travel { line } => Some(line),
            EdgeKind::Transfer | EdgeKind::Connector => None,
        }
    }

    /// Transfer and connector edges are walked
    pub fn is_walk(&self) -> bool {
        self.line().is_none()
    }
}
