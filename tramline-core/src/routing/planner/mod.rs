//! Single-source, single-target search over a [`RoutingGraph`].
//!
//! Dijkstra when no heuristic is requested, A* with a straight-line estimate
//! otherwise. The cost of an edge depends on the objective and on the last
//! line ridden, so labels are kept per node and line of arrival.

mod state;

use std::collections::BinaryHeap;
use std::time::Instant;

use hashbrown::{HashMap, HashSet};
use log::{debug, warn};

use self::state::{Arrival, Label, State};
use super::query::OptimizeFor;
use crate::{
    EdgeId, Miles, Minutes, NodeId,
    geometry::distance,
    model::{Edge, RoutingGraph},
};

/// Heap pops between two deadline checks
const DEADLINE_CHECK_INTERVAL: usize = 64;

#[derive(Debug, Clone, Copy)]
pub struct PlannerOptions {
    pub mode: OptimizeFor,
    /// Charged on a line change not preceded by a walking link
    pub transfer_penalty_minutes: Minutes,
    /// Cost of one line change in `transfers` mode
    pub transfer_weight: f64,
    pub tie_epsilon: f64,
    pub use_heuristic: bool,
    pub deadline: Option<Instant>,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            mode: OptimizeFor::Time,
            transfer_penalty_minutes: 5.0,
            transfer_weight: 1000.0,
            tie_epsilon: 1e-6,
            use_heuristic: true,
            deadline: None,
        }
    }
}

/// Path found by [`find_path`]
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPath {
    pub nodes: Vec<NodeId>,
    pub edges: Vec<EdgeId>,
    /// Objective value of the path
    pub cost: f64,
    pub distance_miles: Miles,
    /// Edge weights plus [`Self::penalty_minutes`]
    pub time_minutes: Minutes,
    /// Transfer penalties of line changes made without a walking link
    pub penalty_minutes: Minutes,
    pub transfers: usize,
}

/// Lowest-cost path from `source` to `target` under `options.mode`.
///
/// Returns `None` when the target is unreachable or the deadline passes
/// before it is settled.
pub fn find_path<G: RoutingGraph>(
    graph: &G,
    source: NodeId,
    target: NodeId,
    options: &PlannerOptions,
) -> Option<PlannedPath> {
    let target_point = graph.node(target)?.geometry;
    graph.node(source)?;

    let max_speed = graph.max_speed_mph();
    let slack = graph.position_slack_miles();
    let estimate = |node: NodeId| -> f64 {
        if !options.use_heuristic {
            return 0.0;
        }
        let Some(node) = graph.node(node) else {
            return 0.0;
        };
        // nodes may sit off the line their edges are measured along
        let miles = (distance(node.geometry, target_point) - slack).max(0.0);
        match options.mode {
            OptimizeFor::Distance => miles,
            OptimizeFor::Time | OptimizeFor::Transfers => miles / max_speed * 60.0,
        }
    };

    let mut labels: HashMap<Arrival, Label> = HashMap::new();
    let mut settled: HashSet<Arrival> = HashSet::new();
    let mut heap = BinaryHeap::new();

    let origin = Arrival::origin(source);
    labels.insert(origin, Label::origin());
    heap.push(State {
        priority: estimate(source),
        cost: 0.0,
        transfers: 0,
        arrival: origin,
    });

    let mut pops = 0usize;
    while let Some(State { cost, arrival, .. }) = heap.pop() {
        pops += 1;
        if pops % DEADLINE_CHECK_INTERVAL == 0
            && options.deadline.is_some_and(|deadline| Instant::now() >= deadline)
        {
            warn!("Route search from {source} to {target} timed out after {pops} steps");
            return None;
        }

        if settled.contains(&arrival) {
            continue;
        }
        let Some(label) = labels.get(&arrival).copied() else {
            continue;
        };
        if cost > label.cost + options.tie_epsilon {
            continue;
        }
        settled.insert(arrival);

        // Check if we've reached the target
        if arrival.node == target {
            debug!("Settled target {target} after {pops} steps");
            return Some(reconstruct(&labels, arrival));
        }

        for edge in graph.outgoing(arrival.node) {
            let (next_arrival, next) = extend(arrival, &label, edge, options);

            let improved = labels
                .get(&next_arrival)
                .is_none_or(|current| next.improves_on(current, options.tie_epsilon));
            if improved {
                // the estimate is admissible but not consistent, so a settled
                // arrival can still improve and is searched again
                settled.remove(&next_arrival);
                labels.insert(next_arrival, next);
                heap.push(State {
                    priority: next.cost + estimate(edge.to),
                    cost: next.cost,
                    transfers: next.transfers,
                    arrival: next_arrival,
                });
            }
        }
    }

    None
}

/// Arrival and label reached by traversing `edge` from `from`.
///
/// Walking edges carry no line and pass the previous one through, so only a
/// ride on a different line than the last one ridden is a transfer. Transfer
/// and connector edges already carry a penalty in their weight; a change
/// made right at a shared node is charged the transfer penalty instead.
fn extend(from: Arrival, label: &Label, edge: &Edge, options: &PlannerOptions) -> (Arrival, Label) {
    let line = edge.line();
    let changed = matches!((from.last_line, line), (Some(previous), Some(next)) if previous != next);
    let penalty = if changed && !from.walked {
        options.transfer_penalty_minutes
    } else {
        0.0
    };
    let minutes = edge.time_minutes() + penalty;

    let step = match options.mode {
        OptimizeFor::Time => minutes,
        OptimizeFor::Distance => edge.distance_miles,
        OptimizeFor::Transfers => minutes + if changed { options.transfer_weight } else { 0.0 },
    };

    let arrival = Arrival {
        node: edge.to,
        last_line: line.or(from.last_line),
        walked: line.is_none(),
    };
    let label = Label {
        cost: label.cost + step,
        distance: label.distance + edge.distance_miles,
        time: label.time + minutes,
        penalty: label.penalty + penalty,
        transfers: label.transfers + usize::from(changed),
        via: Some((edge.id, from)),
    };
    (arrival, label)
}

fn reconstruct(labels: &HashMap<Arrival, Label>, reached: Arrival) -> PlannedPath {
    let mut edges = Vec::new();
    let mut nodes = vec![reached.node];
    let mut current = reached;

    while let Some((edge, previous)) = labels.get(&current).and_then(|label| label.via) {
        if edges.len() > labels.len() {
            break;
        }
        edges.push(edge);
        nodes.push(previous.node);
        current = previous;
    }
    edges.reverse();
    nodes.reverse();

    let label = labels.get(&reached).copied().unwrap_or_else(Label::origin);
    PlannedPath {
        nodes,
        edges,
        cost: label.cost,
        distance_miles: label.distance,
        time_minutes: label.time,
        penalty_minutes: label.penalty,
        transfers: label.transfers,
    }
}
