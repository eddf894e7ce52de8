//! Mapping of query coordinates onto network entry points

use geo::Point;
use log::trace;

use crate::{
    EdgeId, Miles, Minutes, NodeId,
    geometry::{PolylineProjection, project_onto_polyline},
    model::QueryOverlay,
};

/// Network entry point for one side of a query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccessPoint {
    pub node: NodeId,
    /// Query coordinate the walk starts or ends at
    pub location: Point<f64>,
    pub walk_miles: Miles,
    pub walk_minutes: Minutes,
    /// The node was synthesised on a split edge for this query
    pub is_virtual: bool,
}

/// Entry points for `point`, closest first, at most `limit` of them.
///
/// Existing nodes within `max_walk` are used as they are. Only when there is
/// none, the closest travel edges within reach are split at the projection
/// of `point` and a virtual node is placed there. An empty result means the
/// point is out of walking range of the whole network.
pub fn resolve_access(
    overlay: &mut QueryOverlay<'_>,
    point: Point<f64>,
    max_walk: Miles,
    limit: usize,
) -> Vec<AccessPoint> {
    let profile = overlay.base().profile();
    let walking = |miles: Miles| profile.walking_minutes(miles);

    let nearby: Vec<AccessPoint> = overlay
        .base()
        .nodes_within(point, max_walk)
        .into_iter()
        .take(limit)
        .map(|(node, walk_miles)| AccessPoint {
            node,
            location: point,
            walk_miles,
            walk_minutes: walking(walk_miles),
            is_virtual: false,
        })
        .collect();
    if !nearby.is_empty() {
        trace!("{} existing node(s) within {max_walk} mi of {point:?}", nearby.len());
        return nearby;
    }

    let mut projections: Vec<(EdgeId, PolylineProjection)> = overlay
        .travel_edges_near(point, max_walk)
        .into_iter()
        .filter_map(|edge| Some((edge.id, project_onto_polyline(point, &edge.geometry.0)?)))
        .filter(|(_, projection)| projection.distance <= max_walk)
        .collect();
    projections.sort_by(|a, b| a.1.distance.total_cmp(&b.1.distance).then(a.0.cmp(&b.0)));
    projections.truncate(limit);

    let mut access: Vec<AccessPoint> = Vec::with_capacity(projections.len());
    for (edge, projection) in projections {
        let Some(node) = overlay.split_edge(edge, &projection) else {
            continue;
        };
        if access.iter().any(|a| a.node == node) {
            continue;
        }
        trace!(
            "Virtual access node {node} on edge {edge}, {:.3} mi from {point:?}",
            projection.distance
        );
        access.push(AccessPoint {
            node,
            location: point,
            walk_miles: projection.distance,
            walk_minutes: walking(projection.distance),
            is_virtual: !overlay.is_permanent(node),
        });
    }
    access
}
