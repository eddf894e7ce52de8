//! Shared fixtures for the integration tests.
//!
//! Networks are laid out near the equator in miles, so one degree of either
//! axis is the same distance.
#![allow(dead_code)]

use geo::{LineString, Point};
use tramline_core::{NetworkConfig, NetworkGraph, TransitLine, build_network};

pub const MILES_PER_DEGREE: f64 = 69.093;

pub fn deg(miles: f64) -> f64 {
    miles / MILES_PER_DEGREE
}

/// Point `x` miles east and `y` miles north of the origin
pub fn at(x: f64, y: f64) -> Point<f64> {
    Point::new(deg(x), deg(y))
}

/// Line through the given mile offsets
pub fn line(name: &str, miles: &[(f64, f64)]) -> TransitLine {
    let coords: Vec<(f64, f64)> = miles.iter().map(|&(x, y)| (deg(x), deg(y))).collect();
    TransitLine::new(name, LineString::from(coords))
}

/// Default network settings without stop dwell
pub fn no_dwell() -> NetworkConfig {
    let mut config = NetworkConfig::default();
    config.speeds.dwell_minutes = 0.0;
    config
}

/// Two 5 mile local lines; B starts 0.2 mi north of where A ends
pub fn parallel_lines() -> Vec<TransitLine> {
    vec![
        line("A", &[(0.0, 0.0), (5.0, 0.0)]),
        line("B", &[(5.0, 0.2), (10.0, 0.2)]),
    ]
}

pub fn parallel_network() -> NetworkGraph {
    build_network(&parallel_lines(), &[], &no_dwell()).unwrap()
}

/// A small street-grid-like network of crossing lines
pub fn grid_lines(size: usize) -> Vec<TransitLine> {
    let span = size as f64;
    let mut lines = Vec::with_capacity(size * 2);
    for i in 0..size {
        let offset = i as f64 + 0.5;
        lines.push(line(&format!("Row {i}"), &[(0.0, offset), (span, offset)]));
        lines.push(line(&format!("Column {i}"), &[(offset, 0.0), (offset, span)]));
    }
    lines
}
