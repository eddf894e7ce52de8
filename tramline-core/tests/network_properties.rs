//! Invariants every built network has to satisfy.

mod common;

use std::sync::{Arc, Mutex};

use common::{grid_lines, line, no_dwell};
use itertools::Itertools;
use tramline_core::{
    BuildOptions, BuildPhase, EdgeKind, Error, NetworkConfig, RouteQuery, build_network,
    build_network_with, geometry::distance, loading::BuildWarning, plan_route,
};

#[test]
fn edge_weights_are_never_negative() {
    let graph = build_network(&grid_lines(4), &[], &NetworkConfig::default()).unwrap();

    assert!(!graph.edges().is_empty());
    for edge in graph.edges() {
        assert!(edge.distance_miles >= 0.0, "edge {}", edge.id);
        assert!(edge.travel_time_minutes >= 0.0, "edge {}", edge.id);
        assert!(edge.penalty_minutes >= 0.0, "edge {}", edge.id);
    }
}

#[test]
fn nodes_respect_the_merge_radius() {
    let config = NetworkConfig::default();
    let graph = build_network(&grid_lines(4), &[], &config).unwrap();

    for (a, b) in graph.nodes().iter().tuple_combinations() {
        let d = distance(a.geometry, b.geometry);
        assert!(
            d >= config.merge_radius_miles,
            "nodes {} and {} are {d} mi apart",
            a.id,
            b.id
        );
    }
}

#[test]
fn travel_time_follows_line_speed() {
    let config = no_dwell();
    let graph = build_network(&grid_lines(3), &[], &config).unwrap();

    for edge in graph.edges() {
        if let EdgeKind::Travel { line } = edge.kind {
            let speed = graph.lines()[line].speed_mph;
            let expected = edge.distance_miles / speed * 60.0;
            assert!((edge.travel_time_minutes - expected).abs() < 1e-9);
            assert_eq!(edge.penalty_minutes, 0.0);
        }
    }
}

#[test]
fn every_edge_has_an_equal_twin() {
    let graph = build_network(&grid_lines(3), &[], &NetworkConfig::default()).unwrap();

    for edge in graph.edges() {
        let twin = &graph.edges()[edge.reverse];
        assert_eq!(twin.reverse, edge.id);
        assert_eq!((twin.from, twin.to), (edge.to, edge.from));
        assert_eq!(twin.kind, edge.kind);
        assert!((twin.time_minutes() - edge.time_minutes()).abs() < 1e-12);
    }
}

#[test]
fn building_twice_gives_the_same_network() {
    let lines = grid_lines(4);
    let config = NetworkConfig::default();
    let first = build_network(&lines, &[], &config).unwrap();
    let second = build_network(&lines, &[], &config).unwrap();

    assert_eq!(first.nodes().len(), second.nodes().len());
    assert_eq!(first.edges().len(), second.edges().len());
    assert!((first.total_edge_weight() - second.total_edge_weight()).abs() < 1e-9);
}

#[test]
fn gap_within_cutoff_gets_one_connector() {
    let lines = vec![
        line("West", &[(0.0, 0.0), (2.0, 0.0)]),
        line("East", &[(2.6, 0.0), (4.6, 0.0)]),
    ];
    let graph = build_network(&lines, &[], &NetworkConfig::default()).unwrap();

    let connectors: Vec<_> = graph
        .edges()
        .iter()
        .filter(|e| e.kind == EdgeKind::Connector)
        .collect();
    // one physical link, stored in both directions
    assert_eq!(connectors.len(), 2);
    assert!((connectors[0].distance_miles - 0.6).abs() < 0.01);
    assert_eq!(graph.report().connectors_added, 1);
    assert_eq!(graph.connected_components().len(), 1);
    assert!(graph.report().is_connected());
}

#[test]
fn gap_beyond_cutoff_stays_open_and_fails_routing() {
    let lines = vec![
        line("West", &[(0.0, 0.0), (2.0, 0.0)]),
        line("East", &[(3.5, 0.0), (5.5, 0.0)]),
    ];
    let graph = build_network(&lines, &[], &NetworkConfig::default()).unwrap();

    assert_eq!(graph.connected_components().len(), 2);
    assert_eq!(graph.report().components, 2);
    assert!(
        graph
            .report()
            .warnings
            .iter()
            .any(|w| matches!(w, BuildWarning::UnbridgedComponent { .. }))
    );

    let query = RouteQuery::new(common::at(0.0, 0.0), common::at(5.5, 0.0));
    let result = plan_route(&graph, &query, &Default::default()).unwrap();
    assert!(result.is_none());
}

#[test]
fn progress_is_reported_in_phase_order() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let options = BuildOptions::new().with_progress(move |phase| {
        sink.lock().unwrap().push(phase);
    });
    build_network_with(&grid_lines(2), &[], &NetworkConfig::default(), &options).unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            BuildPhase::CollectCandidates,
            BuildPhase::MergeCandidates,
            BuildPhase::CreateEdges,
            BuildPhase::CreateTransfers,
            BuildPhase::RepairConnectivity,
        ]
    );
}

#[test]
fn cancelling_mid_build_returns_no_graph() {
    let options = BuildOptions::new();
    let token = options.cancel.clone();
    let options = options.with_progress(move |phase| {
        if phase == BuildPhase::CreateEdges {
            token.cancel();
        }
    });

    let result = build_network_with(&grid_lines(3), &[], &NetworkConfig::default(), &options);
    assert!(matches!(result, Err(Error::Cancelled)));
}
