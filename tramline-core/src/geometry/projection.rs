use geo::{Coord, LineString, Point};

use super::distance::distance;
use crate::Miles;

/// Closest point of a segment to a query point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentProjection {
    pub point: Point<f64>,
    /// Distance in miles from the query point to `point`
    pub distance: Miles,
    /// Position of `point` along the segment, in `[0, 1]`
    pub t: f64,
}

/// Closest point of a polyline to a query point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolylineProjection {
    pub point: Point<f64>,
    pub distance: Miles,
    /// Index of the segment `(coords[i], coords[i + 1])` holding `point`
    pub segment_index: usize,
    pub t: f64,
}

impl PolylineProjection {
    /// Arc length from the polyline start to the projected point, given the
    /// output of [`cumulative_lengths`](super::cumulative_lengths)
    pub fn arc_position(&self, cumulative: &[Miles]) -> Miles {
        let start = cumulative.get(self.segment_index).copied().unwrap_or(0.0);
        let end = cumulative.get(self.segment_index + 1).copied().unwrap_or(start);
        start + (end - start) * self.t
    }

    fn order_key(&self) -> (usize, f64) {
        (self.segment_index, self.t)
    }
}

/// Project `p` onto the segment `s -> e`, clamping to the endpoints
pub fn project_onto_segment(p: Point<f64>, s: Point<f64>, e: Point<f64>) -> SegmentProjection {
    // local equirectangular frame: shrink longitude by cos(latitude)
    let kx = p.y().to_radians().cos();
    let dx = (e.x() - s.x()) * kx;
    let dy = e.y() - s.y();
    let px = (p.x() - s.x()) * kx;
    let py = p.y() - s.y();

    let len2 = dx * dx + dy * dy;
    let t = if len2 > 0.0 {
        ((px * dx + py * dy) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let point = Point::new(s.x() + (e.x() - s.x()) * t, s.y() + (e.y() - s.y()) * t);
    SegmentProjection {
        point,
        distance: distance(p, point),
        t,
    }
}

/// Project `p` onto the closest segment of `coords`.
///
/// Ties are broken in favour of the first segment. Returns `None` for an
/// empty coordinate list.
pub fn project_onto_polyline(p: Point<f64>, coords: &[Coord<f64>]) -> Option<PolylineProjection> {
    match coords {
        [] => None,
        [only] => Some(PolylineProjection {
            point: (*only).into(),
            distance: distance(p, (*only).into()),
            segment_index: 0,
            t: 0.0,
        }),
        _ => {
            let mut best: Option<PolylineProjection> = None;
            for (segment_index, pair) in coords.windows(2).enumerate() {
                let projection = project_onto_segment(p, pair[0].into(), pair[1].into());
                if best.is_none_or(|b| projection.distance < b.distance) {
                    best = Some(PolylineProjection {
                        point: projection.point,
                        distance: projection.distance,
                        segment_index,
                        t: projection.t,
                    });
                }
            }
            best
        }
    }
}

/// The part of `coords` between two projections.
///
/// The projections are reordered if `to` lies before `from`, so the slice
/// always runs in the polyline's own direction.
pub fn slice_polyline(
    coords: &[Coord<f64>],
    from: &PolylineProjection,
    to: &PolylineProjection,
) -> LineString<f64> {
    let (from, to) = if to.order_key() < from.order_key() {
        (to, from)
    } else {
        (from, to)
    };

    let mut sliced = vec![from.point.into()];
    if to.segment_index > from.segment_index {
        let first = (from.segment_index + 1).min(coords.len());
        let last = (to.segment_index + 1).min(coords.len());
        sliced.extend_from_slice(&coords[first..last]);
    }
    sliced.push(to.point.into());

    finish_line(sliced)
}

/// Split `coords` at a projected point into the part before and after it
pub fn split_polyline(
    coords: &[Coord<f64>],
    at: &PolylineProjection,
) -> (LineString<f64>, LineString<f64>) {
    let pivot = (at.segment_index + 1).min(coords.len());

    let mut head = coords[..pivot].to_vec();
    head.push(at.point.into());

    let mut tail = vec![at.point.into()];
    tail.extend_from_slice(&coords[pivot..]);

    (finish_line(head), finish_line(tail))
}

fn finish_line(mut coords: Vec<Coord<f64>>) -> LineString<f64> {
    coords.dedup();
    if coords.len() == 1 {
        coords.push(coords[0]);
    }
    LineString::new(coords)
}
