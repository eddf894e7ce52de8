//! Geometry kernel: great-circle distances, projections onto segments and
//! polylines, and segment/polyline intersection.
//!
//! Coordinates are `(longitude, latitude)` in degrees. Projections and
//! intersections are planar in a local equirectangular frame, which is
//! accurate enough at city scale; reported distances are always haversine.

mod distance;
mod intersection;
mod projection;

pub use distance::{
    METERS_PER_MILE, cumulative_lengths, degrees_for_miles, distance, is_valid_coord,
    points_along, polyline_length, search_envelope,
};
pub use intersection::{polyline_intersections, segment_intersection};
pub use projection::{
    PolylineProjection, SegmentProjection, project_onto_polyline, project_onto_segment,
    slice_polyline, split_polyline,
};
