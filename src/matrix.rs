use geo::Point;
use log::warn;
use rayon::prelude::*;
use tramline_core::prelude::*;

use crate::model::TransitNetwork;

/// Plan independent queries in parallel, one result per query in order
pub fn plan_batch(
    network: &TransitNetwork,
    queries: &[RouteQuery],
) -> Vec<Result<Option<RouteResult>, QueryError>> {
    queries.par_iter().map(|query| network.plan(query)).collect()
}

/// Total travel time in minutes between every pair of points.
///
/// The diagonal is zero. Pairs without a route, or with an endpoint out of
/// walking range, are `None`.
pub fn travel_time_matrix(
    network: &TransitNetwork,
    points: &[Point<f64>],
    optimize_for: OptimizeFor,
    max_walking_distance: Miles,
) -> Vec<Vec<Option<Minutes>>> {
    points
        .par_iter()
        .enumerate()
        .map(|(i, &start)| {
            points
                .iter()
                .enumerate()
                .map(|(j, &end)| {
                    if i == j {
                        return Some(0.0);
                    }
                    let query = RouteQuery::new(start, end)
                        .optimize_for(optimize_for)
                        .max_walking_distance(max_walking_distance);
                    match network.plan(&query) {
                        Ok(route) => route.map(|route| route.total_time_minutes),
                        Err(e) => {
                            warn!("Routing failed for points {i} -> {j}, error: {e}");
                            None
                        }
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>()
}
