use std::collections::BTreeSet;

use geo::Point;
use hashbrown::HashMap;
use itertools::Itertools;
use log::debug;
use rayon::prelude::*;

use super::cancel::BuildOptions;
use super::config::NetworkConfig;
use super::report::{BuildReport, BuildWarning};
use crate::{
    Error, LineId,
    geometry::{is_valid_coord, points_along, polyline_intersections, project_onto_polyline},
    model::{KnownStation, LineInfo, NodeKind},
};

const ENDPOINT_CONFIDENCE: f64 = 1.0;
const INTERSECTION_CONFIDENCE: f64 = 1.0;
const STATION_CONFIDENCE: f64 = 0.9;
const INTERPOLATED_CONFIDENCE: f64 = 0.7;

/// A potential node before merging
#[derive(Debug, Clone)]
pub(super) struct Candidate {
    pub point: Point<f64>,
    pub lines: BTreeSet<LineId>,
    pub kind: NodeKind,
    pub confidence: f64,
    pub name: Option<String>,
}

impl Candidate {
    fn on_line(point: Point<f64>, line: LineId, kind: NodeKind, confidence: f64) -> Self {
        Self {
            point,
            lines: BTreeSet::from([line]),
            kind,
            confidence,
            name: None,
        }
    }
}

/// Endpoints, known stations, interpolated stations and pairwise line
/// intersections, in that order
pub(super) fn collect_candidates(
    lines: &[LineInfo],
    stations: &[KnownStation],
    config: &NetworkConfig,
    options: &BuildOptions,
    report: &mut BuildReport,
) -> Result<Vec<Candidate>, Error> {
    let mut candidates = Vec::new();

    for line in lines {
        let coords = &line.geometry.0;
        if let (Some(first), Some(last)) = (coords.first(), coords.last()) {
            candidates.push(Candidate::on_line(
                (*first).into(),
                line.id,
                NodeKind::Endpoint,
                ENDPOINT_CONFIDENCE,
            ));
            candidates.push(Candidate::on_line(
                (*last).into(),
                line.id,
                NodeKind::Endpoint,
                ENDPOINT_CONFIDENCE,
            ));
        }
    }

    candidates.extend(station_candidates(lines, stations, report));

    for line in lines {
        candidates.extend(
            points_along(&line.geometry.0, config.station_spacing_miles)
                .into_iter()
                .map(|point| {
                    Candidate::on_line(
                        point,
                        line.id,
                        NodeKind::Interpolated,
                        INTERPOLATED_CONFIDENCE,
                    )
                }),
        );
    }
    options.check()?;

    let intersections = intersection_candidates(lines, config, options);
    options.check()?;
    debug!(
        "Collected {} candidates ({} intersections)",
        candidates.len() + intersections.len(),
        intersections.len()
    );
    candidates.extend(intersections);

    Ok(candidates)
}

fn station_candidates(
    lines: &[LineInfo],
    stations: &[KnownStation],
    report: &mut BuildReport,
) -> Vec<Candidate> {
    // first line wins when names repeat
    let mut by_name: HashMap<&str, &LineInfo> = HashMap::with_capacity(lines.len());
    for line in lines {
        by_name.entry(line.name.as_str()).or_insert(line);
    }

    let mut candidates = Vec::with_capacity(stations.len());
    for station in stations {
        if !is_valid_coord(station.geometry.0) {
            report.warn(BuildWarning::InvalidStationCoordinate {
                station: station.name.clone(),
            });
            continue;
        }
        let Some(&line) = by_name.get(station.line.as_str()) else {
            report.warn(BuildWarning::UnknownStationLine {
                station: station.name.clone(),
                line: station.line.clone(),
            });
            continue;
        };
        // stations sit on their line, where its edges are measured
        let point = project_onto_polyline(station.geometry, &line.geometry.0)
            .map_or(station.geometry, |projection| projection.point);
        let mut candidate =
            Candidate::on_line(point, line.id, NodeKind::Station, STATION_CONFIDENCE);
        candidate.name = Some(station.name.clone());
        candidates.push(candidate);
    }
    candidates
}

/// Crossings of every unordered pair of lines, computed in parallel
fn intersection_candidates(
    lines: &[LineInfo],
    config: &NetworkConfig,
    options: &BuildOptions,
) -> Vec<Candidate> {
    let pairs: Vec<(&LineInfo, &LineInfo)> = lines.iter().tuple_combinations().collect();
    let tolerance = config.intersection_tolerance_miles;

    let found: Vec<Vec<Candidate>> = pairs
        .par_iter()
        .map(|(a, b)| {
            if options.cancel.is_cancelled() {
                return Vec::new();
            }
            polyline_intersections(&a.geometry.0, &b.geometry.0, tolerance)
                .into_iter()
                .map(|point| Candidate {
                    point,
                    lines: BTreeSet::from([a.id, b.id]),
                    kind: NodeKind::Intersection,
                    confidence: INTERSECTION_CONFIDENCE,
                    name: None,
                })
                .collect()
        })
        .collect();

    found.into_iter().flatten().collect()
}
