use std::cmp::Ordering;

use crate::{EdgeId, LineId, Miles, Minutes, NodeId};

/// A node together with what the traveller brings into it.
///
/// The cost of leaving a node depends on the line last ridden and on whether
/// a walking link was taken since, so the search keeps one label per arrival
/// rather than per node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(super) struct Arrival {
    pub(super) node: NodeId,
    /// Last line ridden; walking edges keep the previous one
    pub(super) last_line: Option<LineId>,
    /// A transfer or connector edge was walked since the last ride
    pub(super) walked: bool,
}

impl Arrival {
    pub(super) fn origin(node: NodeId) -> Self {
        Self {
            node,
            last_line: None,
            walked: false,
        }
    }
}

/// Heap entry of the search frontier
#[derive(Copy, Clone, Debug)]
pub(super) struct State {
    /// Cost so far plus the remaining estimate
    pub(super) priority: f64,
    pub(super) cost: f64,
    pub(super) transfers: usize,
    pub(super) arrival: Arrival,
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

// Implement Ord for State to use in BinaryHeap
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap by priority, then fewer transfers (reversed from standard Rust BinaryHeap)
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.transfers.cmp(&self.transfers))
            .then_with(|| other.arrival.cmp(&self.arrival))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Best known way of reaching an [`Arrival`]
#[derive(Copy, Clone, Debug)]
pub(super) struct Label {
    pub(super) cost: f64,
    pub(super) distance: Miles,
    pub(super) time: Minutes,
    /// Line-change penalties charged where no walking link carried one
    pub(super) penalty: Minutes,
    pub(super) transfers: usize,
    /// Edge taken and the arrival it was taken from
    pub(super) via: Option<(EdgeId, Arrival)>,
}

impl Label {
    pub(super) fn origin() -> Self {
        Self {
            cost: 0.0,
            distance: 0.0,
            time: 0.0,
            penalty: 0.0,
            transfers: 0,
            via: None,
        }
    }

    /// Lower cost wins; costs within `epsilon` go to fewer transfers
    pub(super) fn improves_on(&self, other: &Label, epsilon: f64) -> bool {
        if self.cost < other.cost - epsilon {
            return true;
        }
        (self.cost - other.cost).abs() <= epsilon && self.transfers < other.transfers
    }
}
