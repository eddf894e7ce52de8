use geo::{Coord, Point};

use super::distance::{degrees_for_miles, distance};
use crate::Miles;

/// Below this value of `sin(angle)` two segments are treated as parallel
const PARALLEL_EPSILON: f64 = 1e-9;

/// Intersection point of segments `a1 -> a2` and `b1 -> b2`.
///
/// Returns `None` for near-parallel or degenerate segments, and when the
/// intersection falls outside either segment. `tolerance` (miles) widens each
/// segment at both ends, so a line stopping just short of another one still
/// meets it; the returned point is clamped onto segment `a`.
pub fn segment_intersection(
    a1: Coord<f64>,
    a2: Coord<f64>,
    b1: Coord<f64>,
    b2: Coord<f64>,
    tolerance: Miles,
) -> Option<Point<f64>> {
    let kx = a1.y.to_radians().cos();
    let r = ((a2.x - a1.x) * kx, a2.y - a1.y);
    let s = ((b2.x - b1.x) * kx, b2.y - b1.y);
    let qp = ((b1.x - a1.x) * kx, b1.y - a1.y);

    let r_len = r.0.hypot(r.1);
    let s_len = s.0.hypot(s.1);
    if r_len == 0.0 || s_len == 0.0 {
        return None;
    }

    let denom = cross(r, s);
    if denom.abs() <= PARALLEL_EPSILON * r_len * s_len {
        return None;
    }

    let t = cross(qp, s) / denom;
    let u = cross(qp, r) / denom;

    let slack_a = tolerance.max(0.0) / distance(a1.into(), a2.into());
    let slack_b = tolerance.max(0.0) / distance(b1.into(), b2.into());
    if !(-slack_a..=1.0 + slack_a).contains(&t) || !(-slack_b..=1.0 + slack_b).contains(&u) {
        return None;
    }

    let t = t.clamp(0.0, 1.0);
    Some(Point::new(
        a1.x + (a2.x - a1.x) * t,
        a1.y + (a2.y - a1.y) * t,
    ))
}

/// Every pairwise segment intersection between two polylines.
///
/// Points at shared vertices can be reported more than once.
pub fn polyline_intersections(
    a: &[Coord<f64>],
    b: &[Coord<f64>],
    tolerance: Miles,
) -> Vec<Point<f64>> {
    let mut points = Vec::new();
    if a.len() < 2 || b.len() < 2 {
        return points;
    }

    let pad = degrees_for_miles(tolerance.max(0.0), a[0].y);
    let b_bounds: Vec<Bounds> = b.windows(2).map(|w| Bounds::of(w[0], w[1], pad)).collect();

    for seg_a in a.windows(2) {
        let a_bounds = Bounds::of(seg_a[0], seg_a[1], pad);
        for (seg_b, bounds) in b.windows(2).zip(&b_bounds) {
            if !a_bounds.overlaps(bounds) {
                continue;
            }
            if let Some(point) = segment_intersection(seg_a[0], seg_a[1], seg_b[0], seg_b[1], tolerance) {
                points.push(point);
            }
        }
    }

    points
}

fn cross(a: (f64, f64), b: (f64, f64)) -> f64 {
    a.0 * b.1 - a.1 * b.0
}

#[derive(Debug, Clone, Copy)]
struct Bounds {
    min: Coord<f64>,
    max: Coord<f64>,
}

impl Bounds {
    fn of(a: Coord<f64>, b: Coord<f64>, pad: f64) -> Self {
        Self {
            min: Coord {
                x: a.x.min(b.x) - pad,
                y: a.y.min(b.y) - pad,
            },
            max: Coord {
                x: a.x.max(b.x) + pad,
                y: a.y.max(b.y) + pad,
            },
        }
    }

    fn overlaps(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;

    const TEN_METERS: Miles = 0.0062;

    #[test]
    fn crossing_segments_meet_in_the_middle() {
        let point = segment_intersection(
            coord! { x: -0.01, y: 0.0 },
            coord! { x: 0.01, y: 0.0 },
            coord! { x: 0.0, y: -0.01 },
            coord! { x: 0.0, y: 0.01 },
            0.0,
        )
        .unwrap();
        assert!(point.x().abs() < 1e-12);
        assert!(point.y().abs() < 1e-12);
    }

    #[test]
    fn parallel_segments_never_intersect() {
        let point = segment_intersection(
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 0.01, y: 0.0 },
            coord! { x: 0.0, y: 0.001 },
            coord! { x: 0.01, y: 0.001 },
            TEN_METERS,
        );
        assert!(point.is_none());
    }

    #[test]
    fn disjoint_segments_do_not_intersect() {
        let point = segment_intersection(
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 0.01, y: 0.0 },
            coord! { x: 0.02, y: -0.01 },
            coord! { x: 0.02, y: 0.01 },
            TEN_METERS,
        );
        assert!(point.is_none());
    }

    #[test]
    fn near_miss_within_tolerance_snaps_to_segment_end() {
        // b stops ~5 m short of a's end
        let point = segment_intersection(
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 0.01, y: 0.0 },
            coord! { x: 0.01005, y: -0.01 },
            coord! { x: 0.01005, y: 0.01 },
            TEN_METERS,
        )
        .unwrap();
        assert!((point.x() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn tolerance_extends_ends_but_not_parallel_runs() {
        // ~5.5 m apart, closer than the tolerance, yet never crossing
        let side_by_side = segment_intersection(
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 0.01, y: 0.0 },
            coord! { x: 0.0, y: 0.00005 },
            coord! { x: 0.01, y: 0.00005 },
            TEN_METERS,
        );
        assert!(side_by_side.is_none());

        // b stops ~33 m short of a, beyond the tolerance
        let short = segment_intersection(
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 0.01, y: 0.0 },
            coord! { x: 0.005, y: 0.0003 },
            coord! { x: 0.005, y: 0.01 },
            TEN_METERS,
        );
        assert!(short.is_none());
    }

    #[test]
    fn zig_zag_crosses_a_straight_line_twice() {
        let straight = vec![coord! { x: 0.0, y: 0.0 }, coord! { x: 0.03, y: 0.0 }];
        let zig_zag = vec![
            coord! { x: 0.0, y: 0.01 },
            coord! { x: 0.01, y: -0.01 },
            coord! { x: 0.02, y: 0.01 },
        ];
        let points = polyline_intersections(&straight, &zig_zag, 0.0);
        assert_eq!(points.len(), 2);
        assert!((points[0].x() - 0.005).abs() < 1e-9);
        assert!((points[1].x() - 0.015).abs() < 1e-9);
    }
}
