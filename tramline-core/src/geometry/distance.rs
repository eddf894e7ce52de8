use geo::{Coord, Distance, Haversine, Point};
use rstar::AABB;

use crate::Miles;

pub const METERS_PER_MILE: f64 = 1609.344;

/// Miles per degree of latitude (and of longitude at the equator)
const MILES_PER_DEGREE: f64 = 69.093;

/// Great-circle distance between two points in miles
///
/// Symmetric, and zero only for identical points.
pub fn distance(a: Point<f64>, b: Point<f64>) -> Miles {
    Haversine.distance(a, b) / METERS_PER_MILE
}

/// Total haversine length of a polyline
pub fn polyline_length(coords: &[Coord<f64>]) -> Miles {
    coords
        .windows(2)
        .map(|pair| distance(pair[0].into(), pair[1].into()))
        .sum()
}

/// Running arc length at every vertex, starting at zero
pub fn cumulative_lengths(coords: &[Coord<f64>]) -> Vec<Miles> {
    let mut lengths = Vec::with_capacity(coords.len());
    let mut total = 0.0;
    lengths.push(total);
    for pair in coords.windows(2) {
        total += distance(pair[0].into(), pair[1].into());
        lengths.push(total);
    }
    lengths
}

/// Points placed every `spacing` miles of arc length along the polyline.
///
/// The start and the end of the polyline are never emitted.
pub fn points_along(coords: &[Coord<f64>], spacing: Miles) -> Vec<Point<f64>> {
    let mut points = Vec::new();
    if coords.len() < 2 || !(spacing > 0.0) {
        return points;
    }

    let total = polyline_length(coords);
    let mut next_mark = spacing;
    let mut travelled = 0.0;

    for pair in coords.windows(2) {
        let segment = distance(pair[0].into(), pair[1].into());
        if segment <= 0.0 {
            continue;
        }
        while next_mark < total && next_mark <= travelled + segment {
            let fraction = (next_mark - travelled) / segment;
            points.push(Point::new(
                pair[0].x + (pair[1].x - pair[0].x) * fraction,
                pair[0].y + (pair[1].y - pair[0].y) * fraction,
            ));
            next_mark += spacing;
        }
        travelled += segment;
    }

    points
}

/// Conservative size in degrees of `miles` around latitude `lat`
pub fn degrees_for_miles(miles: Miles, lat: f64) -> f64 {
    let cos_lat = lat.to_radians().cos().abs().max(0.01);
    miles / (MILES_PER_DEGREE * cos_lat) * 1.05
}

/// Bounding box that contains every point within `radius` miles of `point`
pub fn search_envelope(point: Point<f64>, radius: Miles) -> AABB<[f64; 2]> {
    let dy = radius / MILES_PER_DEGREE * 1.05;
    let dx = degrees_for_miles(radius, point.y());
    AABB::from_corners(
        [point.x() - dx, point.y() - dy],
        [point.x() + dx, point.y() + dy],
    )
}

/// Finite longitude/latitude inside the valid geographic range
pub fn is_valid_coord(coord: Coord<f64>) -> bool {
    coord.x.is_finite()
        && coord.y.is_finite()
        && (-180.0..=180.0).contains(&coord.x)
        && (-90.0..=90.0).contains(&coord.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;
    use proptest::prelude::*;

    #[test]
    fn one_degree_of_latitude_is_about_69_miles() {
        let d = distance(Point::new(0.0, 0.0), Point::new(0.0, 1.0));
        assert!((d - 69.09).abs() < 0.1, "got {d}");
    }

    #[test]
    fn identical_points_have_zero_distance() {
        let p = Point::new(-73.98, 40.75);
        assert_eq!(distance(p, p), 0.0);
    }

    #[test]
    fn cumulative_lengths_end_at_total_length() {
        let coords = vec![
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 0.01, y: 0.0 },
            coord! { x: 0.01, y: 0.01 },
        ];
        let lengths = cumulative_lengths(&coords);
        assert_eq!(lengths.len(), 3);
        assert_eq!(lengths[0], 0.0);
        assert!((lengths[2] - polyline_length(&coords)).abs() < 1e-12);
    }

    #[test]
    fn points_along_skips_the_endpoints() {
        // ~2.07 miles along the equator
        let coords = vec![coord! { x: 0.0, y: 0.0 }, coord! { x: 0.03, y: 0.0 }];
        let points = points_along(&coords, 0.5);
        assert_eq!(points.len(), 4);
        let first = distance(Point::new(0.0, 0.0), points[0]);
        assert!((first - 0.5).abs() < 1e-3);
    }

    #[test]
    fn envelope_contains_the_radius() {
        let center = Point::new(-87.63, 41.88);
        let envelope = search_envelope(center, 1.0);
        let east = Point::new(center.x() + degrees_for_miles(1.0, center.y()) / 1.05, center.y());
        assert!((distance(center, east) - 1.0).abs() < 0.02);
        let west = Point::new(2.0 * center.x() - east.x(), center.y());
        assert!(envelope.lower()[0] <= west.x());
        assert!(envelope.upper()[0] >= east.x());
        assert!(envelope.upper()[1] - center.y() >= 1.0 / MILES_PER_DEGREE);
    }

    #[test]
    fn rejects_non_finite_and_out_of_range_coordinates() {
        assert!(is_valid_coord(coord! { x: 10.0, y: 45.0 }));
        assert!(!is_valid_coord(coord! { x: f64::NAN, y: 45.0 }));
        assert!(!is_valid_coord(coord! { x: 200.0, y: 45.0 }));
        assert!(!is_valid_coord(coord! { x: 10.0, y: -91.0 }));
    }

    proptest! {
        #[test]
        fn distance_is_symmetric(
            ax in -179.0f64..179.0, ay in -80.0f64..80.0,
            bx in -179.0f64..179.0, by in -80.0f64..80.0,
        ) {
            let a = Point::new(ax, ay);
            let b = Point::new(bx, by);
            prop_assert!((distance(a, b) - distance(b, a)).abs() < 1e-9);
            prop_assert!(distance(a, b) >= 0.0);
        }
    }
}
