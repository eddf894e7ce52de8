use geo::LineString;
use log::debug;

use super::config::SpeedProfile;
use super::report::{BuildReport, BuildWarning};
use crate::{
    EdgeId, Miles, Minutes, NodeId,
    geometry::{
        PolylineProjection, cumulative_lengths, polyline_length, project_onto_polyline,
        slice_polyline,
    },
    model::{Edge, EdgeKind, LineInfo, Node, NodeKind},
};

/// One physical link before ids are assigned
#[derive(Debug, Clone)]
pub(super) struct EdgeDraft {
    pub from: NodeId,
    pub to: NodeId,
    pub kind: EdgeKind,
    pub distance_miles: Miles,
    pub travel_time_minutes: Minutes,
    pub penalty_minutes: Minutes,
    pub geometry: LineString<f64>,
}

impl EdgeDraft {
    /// Walking link (transfer or connector) along a straight line
    pub fn walk(
        from: &Node,
        to: &Node,
        kind: EdgeKind,
        distance_miles: Miles,
        profile: &SpeedProfile,
    ) -> Self {
        let penalty_minutes = match kind {
            EdgeKind::Connector => profile.connector_penalty_minutes,
            _ => profile.transfer_penalty_minutes,
        };
        Self {
            from: from.id,
            to: to.id,
            kind,
            distance_miles,
            travel_time_minutes: profile.walking_minutes(distance_miles),
            penalty_minutes,
            geometry: LineString::from(vec![from.geometry, to.geometry]),
        }
    }

    /// Forward and backward directed edges with ids `first` and `first + 1`
    pub fn into_edges(self, first: EdgeId) -> [Edge; 2] {
        let backward_geometry: LineString<f64> = self.geometry.0.iter().rev().copied().collect();
        let forward = Edge {
            id: first,
            from: self.from,
            to: self.to,
            reverse: first + 1,
            kind: self.kind,
            distance_miles: self.distance_miles,
            travel_time_minutes: self.travel_time_minutes,
            penalty_minutes: self.penalty_minutes,
            geometry: self.geometry,
        };
        let backward = Edge {
            id: first + 1,
            from: self.to,
            to: self.from,
            reverse: first,
            geometry: backward_geometry,
            ..forward.clone()
        };
        [forward, backward]
    }
}

/// Travel edges between consecutive nodes of every line.
///
/// Nodes are ordered by the arc position of their projection onto the line.
/// An interpolated station puts half a dwell on each edge touching it, so a
/// ride through it pays one full dwell in either direction.
#[allow(clippy::cast_precision_loss)]
pub(super) fn create_travel_edges(
    nodes: &[Node],
    lines: &[LineInfo],
    profile: &SpeedProfile,
    report: &mut BuildReport,
) -> Vec<EdgeDraft> {
    let mut members: Vec<Vec<NodeId>> = vec![Vec::new(); lines.len()];
    for node in nodes {
        for &line in &node.lines {
            if let Some(list) = members.get_mut(line) {
                list.push(node.id);
            }
        }
    }

    let mut drafts = Vec::new();
    for line in lines {
        let coords = &line.geometry.0;
        let cumulative = cumulative_lengths(coords);

        let mut ordered: Vec<(Miles, NodeId, PolylineProjection)> = members[line.id]
            .iter()
            .filter_map(|&id| {
                let projection = project_onto_polyline(nodes[id].geometry, coords)?;
                Some((projection.arc_position(&cumulative), id, projection))
            })
            .collect();
        ordered.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        if ordered.len() < 2 {
            report.warn(BuildWarning::CollapsedLine {
                line: line.name.clone(),
            });
            continue;
        }

        for pair in ordered.windows(2) {
            let (_, from, from_projection) = &pair[0];
            let (_, to, to_projection) = &pair[1];
            let geometry = slice_polyline(coords, from_projection, to_projection);
            let distance_miles = polyline_length(&geometry.0);
            let dwell_stops = [*from, *to]
                .iter()
                .filter(|&&id| nodes[id].kind == NodeKind::Interpolated)
                .count();

            drafts.push(EdgeDraft {
                from: *from,
                to: *to,
                kind: EdgeKind::Travel { line: line.id },
                distance_miles,
                travel_time_minutes: distance_miles / line.speed_mph * 60.0,
                penalty_minutes: profile.dwell_minutes * dwell_stops as f64 / 2.0,
                geometry,
            });
        }
    }

    debug!("Created {} travel links", drafts.len());
    drafts
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use geo::Point;

    use super::*;

    fn node(id: NodeId, x: f64, kind: NodeKind) -> Node {
        Node {
            id,
            geometry: Point::new(x, 0.0),
            lines: BTreeSet::from([0]),
            kind,
            name: None,
        }
    }

    fn red_line() -> LineInfo {
        let geometry = LineString::from(vec![(0.0, 0.0), (0.01, 0.0), (0.02, 0.0)]);
        LineInfo {
            id: 0,
            name: "Red".to_string(),
            speed_mph: 20.0,
            length_miles: polyline_length(&geometry.0),
            geometry,
        }
    }

    #[test]
    fn links_consecutive_nodes_in_arc_order() {
        // ids deliberately out of line order
        let nodes = vec![
            node(0, 0.02, NodeKind::Endpoint),
            node(1, 0.0, NodeKind::Endpoint),
            node(2, 0.012, NodeKind::Interpolated),
        ];
        let mut report = BuildReport::default();
        let drafts =
            create_travel_edges(&nodes, &[red_line()], &SpeedProfile::default(), &mut report);

        assert_eq!(drafts.len(), 2);
        assert_eq!((drafts[0].from, drafts[0].to), (1, 2));
        assert_eq!((drafts[1].from, drafts[1].to), (2, 0));
        // the first slice keeps the interior vertex
        assert_eq!(drafts[0].geometry.0.len(), 3);
        for draft in &drafts {
            let expected = draft.distance_miles / 20.0 * 60.0;
            assert!((draft.travel_time_minutes - expected).abs() < 1e-12);
            assert!((draft.penalty_minutes - 0.25).abs() < 1e-12);
        }
    }

    #[test]
    fn single_node_line_is_reported() {
        let nodes = vec![node(0, 0.0, NodeKind::Endpoint)];
        let mut report = BuildReport::default();
        let drafts =
            create_travel_edges(&nodes, &[red_line()], &SpeedProfile::default(), &mut report);
        assert!(drafts.is_empty());
        assert!(matches!(report.warnings[0], BuildWarning::CollapsedLine { .. }));
    }

    #[test]
    fn drafts_expand_into_twin_edges() {
        let nodes = vec![
            node(0, 0.0, NodeKind::Endpoint),
            node(1, 0.01, NodeKind::Endpoint),
        ];
        let profile = SpeedProfile::default();
        let draft = EdgeDraft::walk(&nodes[0], &nodes[1], EdgeKind::Transfer, 0.69, &profile);
        let [forward, backward] = draft.into_edges(4);
        assert_eq!((forward.id, forward.reverse), (4, 5));
        assert_eq!((backward.from, backward.to), (1, 0));
        assert_eq!(backward.time_minutes(), forward.time_minutes());
        assert_eq!(backward.geometry.0.first(), forward.geometry.0.last());
        assert!((forward.penalty_minutes - 5.0).abs() < 1e-12);
    }
}
