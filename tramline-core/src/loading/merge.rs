use log::debug;
use rstar::{RTree, primitives::GeomWithData};

use super::candidates::Candidate;
use crate::{
    Miles, NodeId,
    geometry::{distance, search_envelope},
    model::Node,
};

/// Greedy clustering of candidates into nodes.
///
/// Candidates are visited by descending confidence (stable, so ties keep
/// collection order). Each one joins the closest existing node within
/// `radius`, or starts a new node anchored at its own position. Resulting
/// nodes are therefore always more than `radius` apart.
pub(super) fn merge_candidates(mut candidates: Vec<Candidate>, radius: Miles) -> Vec<Node> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut nodes: Vec<Node> = Vec::new();
    let mut tree: RTree<GeomWithData<[f64; 2], NodeId>> = RTree::new();
    let mut merged = 0usize;

    for candidate in candidates {
        let closest = tree
            .locate_in_envelope(&search_envelope(candidate.point, radius))
            .map(|indexed| (indexed.data, distance(candidate.point, nodes[indexed.data].geometry)))
            .filter(|&(_, d)| d <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

        match closest {
            Some((id, _)) => {
                let node = &mut nodes[id];
                node.lines.extend(candidate.lines);
                node.kind = node.kind.merge(candidate.kind);
                if node.name.is_none() {
                    node.name = candidate.name;
                }
                merged += 1;
            }
            None => {
                let id = nodes.len();
                tree.insert(GeomWithData::new(
                    [candidate.point.x(), candidate.point.y()],
                    id,
                ));
                nodes.push(Node {
                    id,
                    geometry: candidate.point,
                    lines: candidate.lines,
                    kind: candidate.kind,
                    name: candidate.name,
                });
            }
        }
    }

    debug!("Merged candidates into {} nodes ({merged} absorbed)", nodes.len());
    nodes
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use geo::Point;

    use super::*;
    use crate::model::NodeKind;

    fn candidate(x: f64, line: usize, kind: NodeKind, confidence: f64) -> Candidate {
        Candidate {
            point: Point::new(x, 0.0),
            lines: BTreeSet::from([line]),
            kind,
            confidence,
            name: None,
        }
    }

    #[test]
    fn higher_confidence_anchors_the_cluster() {
        // ~11 m apart, within the 20 m radius
        let candidates = vec![
            candidate(0.0001, 1, NodeKind::Interpolated, 0.7),
            candidate(0.0, 0, NodeKind::Endpoint, 1.0),
        ];
        let nodes = merge_candidates(candidates, 0.0125);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].geometry, Point::new(0.0, 0.0));
        assert_eq!(nodes[0].kind, NodeKind::Endpoint);
        assert_eq!(nodes[0].lines, BTreeSet::from([0, 1]));
    }

    #[test]
    fn intersection_kind_wins_the_merge() {
        let mut station = candidate(0.0, 0, NodeKind::Station, 0.9);
        station.name = Some("Union".to_string());
        let candidates = vec![station, candidate(0.00005, 1, NodeKind::Intersection, 1.0)];
        let nodes = merge_candidates(candidates, 0.0125);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].kind, NodeKind::Intersection);
        assert_eq!(nodes[0].name.as_deref(), Some("Union"));
    }

    #[test]
    fn distant_candidates_stay_apart() {
        let candidates = vec![
            candidate(0.0, 0, NodeKind::Endpoint, 1.0),
            candidate(0.001, 0, NodeKind::Endpoint, 1.0),
        ];
        let nodes = merge_candidates(candidates, 0.0125);
        assert_eq!(nodes.len(), 2);
        assert!(distance(nodes[0].geometry, nodes[1].geometry) > 0.0125);
    }
}
