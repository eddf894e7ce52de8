use geo::{Coord, LineString};
use log::info;

use super::candidates::collect_candidates;
use super::cancel::{BuildOptions, BuildPhase};
use super::config::NetworkConfig;
use super::connectivity::{drop_isolated_nodes, repair_connectivity};
use super::edges::{EdgeDraft, create_travel_edges};
use super::merge::merge_candidates;
use super::report::{BuildReport, BuildWarning};
use super::transfers::calculate_transfers;
use crate::{
    Error,
    geometry::{is_valid_coord, polyline_length},
    model::{KnownStation, LineInfo, NetworkGraph, TransitLine},
};

/// Builds a network from line geometries and optional known stations
///
/// # Errors
///
/// Returns an error if the configuration is invalid or no line yields a
/// usable edge
pub fn build_network(
    lines: &[TransitLine],
    stations: &[KnownStation],
    config: &NetworkConfig,
) -> Result<NetworkGraph, Error> {
    build_network_with(lines, stations, config, &BuildOptions::default())
}

/// Builds a network, reporting progress and honouring cancellation
///
/// # Errors
///
/// Same as [`build_network`], plus [`Error::Cancelled`] when the token in
/// `options` is cancelled before the build completes
pub fn build_network_with(
    lines: &[TransitLine],
    stations: &[KnownStation],
    config: &NetworkConfig,
    options: &BuildOptions,
) -> Result<NetworkGraph, Error> {
    config.validate()?;
    if lines.is_empty() {
        return Err(Error::EmptyNetwork);
    }

    info!(
        "Building network from {} lines and {} known stations",
        lines.len(),
        stations.len()
    );
    let mut report = BuildReport::default();

    let line_infos = prepare_lines(lines, config, &mut report);
    if line_infos.is_empty() {
        return Err(Error::EmptyNetwork);
    }

    options.enter(BuildPhase::CollectCandidates);
    let candidates = collect_candidates(&line_infos, stations, config, options, &mut report)?;

    options.enter(BuildPhase::MergeCandidates);
    let nodes = merge_candidates(candidates, config.merge_radius_miles);
    options.check()?;

    options.enter(BuildPhase::CreateEdges);
    let mut drafts = create_travel_edges(&nodes, &line_infos, &config.speeds, &mut report);
    if drafts.is_empty() {
        return Err(Error::EmptyNetwork);
    }
    options.check()?;

    options.enter(BuildPhase::CreateTransfers);
    drafts.extend(calculate_transfers(&nodes, config, options)?);

    options.enter(BuildPhase::RepairConnectivity);
    let nodes = drop_isolated_nodes(nodes, &mut drafts, &mut report);
    let connectors = repair_connectivity(&nodes, &drafts, config, options, &mut report)?;
    drafts.extend(connectors);

    let edges = drafts
        .into_iter()
        .enumerate()
        .flat_map(|(index, draft): (usize, EdgeDraft)| draft.into_edges(index * 2))
        .collect();

    let mut graph = NetworkGraph::new(nodes, edges, line_infos, config.speeds.clone(), report);
    graph.position_slack_miles = 2.0 * config.merge_radius_miles;
    graph.report.components = graph.connected_components().len();

    info!(
        "Network built: {} nodes, {} edges, {} lines, {} connectors, {} component(s), {} warning(s)",
        graph.nodes.len(),
        graph.edges.len(),
        graph.lines.len(),
        graph.report.connectors_added,
        graph.report.components,
        graph.report.warnings.len()
    );
    Ok(graph)
}

/// Clean input lines into the line registry, skipping degenerate ones
fn prepare_lines(
    lines: &[TransitLine],
    config: &NetworkConfig,
    report: &mut BuildReport,
) -> Vec<LineInfo> {
    let mut infos = Vec::with_capacity(lines.len());

    for line in lines {
        if !line.geometry.0.iter().all(|&coord| is_valid_coord(coord)) {
            report.warn(BuildWarning::NonFiniteCoordinate {
                line: line.name.clone(),
            });
            continue;
        }

        let mut coords: Vec<Coord<f64>> = line.geometry.0.clone();
        coords.dedup();
        if coords.len() < 2 {
            report.warn(BuildWarning::TooFewCoordinates {
                line: line.name.clone(),
                count: coords.len(),
            });
            continue;
        }

        let speed_mph = config
            .speeds
            .speed_for_line(&line.name, line.speed_mph, line.speed_class);
        if !(speed_mph.is_finite() && speed_mph > 0.0) {
            report.warn(BuildWarning::InvalidSpeed {
                line: line.name.clone(),
                speed_mph,
            });
            continue;
        }

        infos.push(LineInfo {
            id: infos.len(),
            name: line.name.clone(),
            speed_mph,
            length_miles: polyline_length(&coords),
            geometry: LineString::new(coords),
        });
    }

    infos
}
