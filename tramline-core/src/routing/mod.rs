//! Route queries: access resolution, path search and itinerary assembly.

pub mod access;
pub mod itinerary;
pub mod planner;
pub mod query;

use std::time::{Duration, Instant};

use log::{debug, info, warn};

pub use access::{AccessPoint, resolve_access};
pub use itinerary::{
    RouteResult, RouteSegment, SegmentKind, WalkLeg, format_distance, format_duration,
};
pub use planner::{PlannedPath, PlannerOptions, find_path};
pub use query::{
    DEFAULT_MAX_WALKING_MILES, OptimizeFor, QueryEndpoint, QueryError, RawRouteQuery, RouteQuery,
    ValidationError,
};

use crate::{
    loading::RoutingConfig,
    model::{NetworkGraph, QueryOverlay},
};

/// Plans a route between two coordinates.
///
/// Every start candidate is tried against every end candidate and the
/// combination with the lowest objective, walks included, is kept. Costs
/// within `tie_epsilon` go to fewer transfers, then to the shorter time.
///
/// Returns `Ok(None)` when no candidate pair is connected or the query runs
/// past `config.timeout_ms`.
///
/// # Errors
///
/// Returns [`QueryError::Invalid`] for a malformed query and
/// [`QueryError::NoAccessibleStation`] when one side is out of walking range
/// of the network
pub fn plan_route(
    graph: &NetworkGraph,
    query: &RouteQuery,
    config: &RoutingConfig,
) -> Result<Option<RouteResult>, QueryError> {
    query.validate(config)?;

    let deadline = Instant::now() + Duration::from_millis(config.timeout_ms);
    let walk_limit = query.max_walking_distance_miles;

    let mut overlay = QueryOverlay::new(graph);
    let starts = resolve_access(&mut overlay, query.start, walk_limit, config.max_candidates);
    if starts.is_empty() {
        return Err(QueryError::NoAccessibleStation(QueryEndpoint::Start));
    }
    let ends = resolve_access(&mut overlay, query.end, walk_limit, config.max_candidates);
    if ends.is_empty() {
        return Err(QueryError::NoAccessibleStation(QueryEndpoint::End));
    }
    debug!(
        "Query {} candidate pair(s), {} virtual node(s)",
        starts.len() * ends.len(),
        overlay.virtual_node_count()
    );

    let options = PlannerOptions {
        mode: query.optimize_for,
        transfer_penalty_minutes: graph.profile().transfer_penalty_minutes,
        transfer_weight: config.transfer_weight,
        tie_epsilon: config.tie_epsilon,
        use_heuristic: config.use_heuristic,
        deadline: Some(deadline),
    };

    let walk_cost = |point: &AccessPoint| match query.optimize_for {
        OptimizeFor::Distance => point.walk_miles,
        OptimizeFor::Time | OptimizeFor::Transfers => point.walk_minutes,
    };

    let mut best: Option<(f64, PlannedPath, &AccessPoint, &AccessPoint)> = None;
    for start in &starts {
        for end in &ends {
            if Instant::now() >= deadline {
                warn!("Route query timed out after {} ms", config.timeout_ms);
                return Ok(None);
            }
            let Some(path) = find_path(&overlay, start.node, end.node, &options) else {
                continue;
            };
            let score = path.cost + walk_cost(start) + walk_cost(end);
            let better = best.as_ref().is_none_or(|(best_score, best_path, s, e)| {
                is_better(
                    (score, &path, start, end),
                    (*best_score, best_path, *s, *e),
                    config.tie_epsilon,
                )
            });
            if better {
                best = Some((score, path, start, end));
            }
        }
    }

    if Instant::now() >= deadline {
        warn!("Route query timed out after {} ms", config.timeout_ms);
        return Ok(None);
    }

    let Some((score, path, start, end)) = best else {
        info!("No route between {:?} and {:?}", query.start, query.end);
        return Ok(None);
    };
    debug!(
        "Best route scores {score:.3} over {} edge(s) with {} transfer(s)",
        path.edges.len(),
        path.transfers
    );
    Ok(RouteResult::assemble(
        &overlay,
        &path,
        start,
        end,
        query.optimize_for,
    ))
}

type Scored<'a> = (f64, &'a PlannedPath, &'a AccessPoint, &'a AccessPoint);

fn is_better(candidate: Scored<'_>, current: Scored<'_>, epsilon: f64) -> bool {
    let (score, path, start, end) = candidate;
    let (best_score, best_path, best_start, best_end) = current;
    if score < best_score - epsilon {
        return true;
    }
    if score > best_score + epsilon {
        return false;
    }
    let time = start.walk_minutes + path.time_minutes + end.walk_minutes;
    let best_time = best_start.walk_minutes + best_path.time_minutes + best_end.walk_minutes;
    path.transfers
        .cmp(&best_path.transfers)
        .then(time.total_cmp(&best_time))
        .is_lt()
}
