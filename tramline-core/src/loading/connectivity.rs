//! Validation and repair of the assembled network: isolated nodes are
//! dropped and disconnected components are joined by connector links.

use hashbrown::HashMap;
use log::{debug, info};
use petgraph::unionfind::UnionFind;
use rayon::prelude::*;

use super::cancel::BuildOptions;
use super::config::NetworkConfig;
use super::edges::EdgeDraft;
use super::report::{BuildReport, BuildWarning};
use super::transfers::index_nodes;
use crate::{
    Error, Miles, NodeId,
    geometry::{distance, search_envelope},
    model::{EdgeKind, Node},
};

/// Upper bound of neighbours visited when measuring the gap of an
/// unbridged component
const GAP_SEARCH_LIMIT: usize = 256;

/// Remove nodes no link touches and renumber the rest
pub(super) fn drop_isolated_nodes(
    nodes: Vec<Node>,
    drafts: &mut [EdgeDraft],
    report: &mut BuildReport,
) -> Vec<Node> {
    let mut degree = vec![0usize; nodes.len()];
    for draft in drafts.iter() {
        degree[draft.from] += 1;
        degree[draft.to] += 1;
    }

    let mut remap: Vec<Option<NodeId>> = vec![None; nodes.len()];
    let mut kept = Vec::with_capacity(nodes.len());
    for mut node in nodes {
        if degree[node.id] == 0 {
            continue;
        }
        let id = kept.len();
        remap[node.id] = Some(id);
        node.id = id;
        kept.push(node);
    }

    report.dropped_nodes = remap.len() - kept.len();
    if report.dropped_nodes > 0 {
        debug!("Dropped {} isolated nodes", report.dropped_nodes);
    }

    // every draft endpoint has degree > 0, so it was kept
    for draft in drafts.iter_mut() {
        draft.from = remap[draft.from].unwrap_or(draft.from);
        draft.to = remap[draft.to].unwrap_or(draft.to);
    }

    kept
}

/// Closest node pair between two components
#[derive(Debug, Clone, Copy)]
struct Bridge {
    distance: Miles,
    from: NodeId,
    to: NodeId,
}

/// Join disconnected components with connector links, closest first.
///
/// Only gaps up to `bridge_cutoff_miles` are bridged. Components that stay
/// apart are recorded in the report so cross-component queries fail honestly.
pub(super) fn repair_connectivity(
    nodes: &[Node],
    drafts: &[EdgeDraft],
    config: &NetworkConfig,
    options: &BuildOptions,
    report: &mut BuildReport,
) -> Result<Vec<EdgeDraft>, Error> {
    let component = component_labels(nodes.len(), drafts);
    let component_count = component.iter().copied().max().map_or(0, |max| max + 1);
    if component_count <= 1 {
        return Ok(Vec::new());
    }
    info!(
        "Network has {component_count} components, bridging gaps up to {} mi",
        config.bridge_cutoff_miles
    );

    let tree = index_nodes(nodes);
    let cutoff = config.bridge_cutoff_miles;

    let found: Vec<Vec<(usize, usize, Bridge)>> = nodes
        .par_iter()
        .map(|source| {
            if options.cancel.is_cancelled() {
                return Vec::new();
            }
            let own = component[source.id];
            let mut best: HashMap<usize, Bridge> = HashMap::new();
            for indexed in tree.locate_in_envelope(&search_envelope(source.geometry, cutoff)) {
                let target = indexed.data;
                let other = component[target];
                if other <= own {
                    continue;
                }
                let d = distance(source.geometry, nodes[target].geometry);
                if d > cutoff {
                    continue;
                }
                let candidate = Bridge {
                    distance: d,
                    from: source.id,
                    to: target,
                };
                best.entry(other)
                    .and_modify(|bridge| {
                        if is_better(&candidate, bridge) {
                            *bridge = candidate;
                        }
                    })
                    .or_insert(candidate);
            }
            best.into_iter()
                .map(|(other, bridge)| (own, other, bridge))
                .collect()
        })
        .collect();
    options.check()?;

    // closest pair per component pair
    let mut per_pair: HashMap<(usize, usize), Bridge> = HashMap::new();
    for (a, b, bridge) in found.into_iter().flatten() {
        per_pair
            .entry((a, b))
            .and_modify(|best| {
                if is_better(&bridge, best) {
                    *best = bridge;
                }
            })
            .or_insert(bridge);
    }

    let mut bridges: Vec<((usize, usize), Bridge)> = per_pair.into_iter().collect();
    bridges.sort_by(|a, b| {
        a.1.distance
            .total_cmp(&b.1.distance)
            .then(a.0.cmp(&b.0))
            .then((a.1.from, a.1.to).cmp(&(b.1.from, b.1.to)))
    });

    let mut joined = UnionFind::<usize>::new(component_count);
    let mut connectors = Vec::new();
    for ((a, b), bridge) in bridges {
        if joined.union(a, b) {
            debug!(
                "Bridging components {a} and {b} over {:.3} mi",
                bridge.distance
            );
            connectors.push(EdgeDraft::walk(
                &nodes[bridge.from],
                &nodes[bridge.to],
                EdgeKind::Connector,
                bridge.distance,
                &config.speeds,
            ));
        }
    }
    report.connectors_added = connectors.len();

    report_unbridged(nodes, &component, &mut joined, &tree, report);
    Ok(connectors)
}

fn is_better(candidate: &Bridge, current: &Bridge) -> bool {
    candidate
        .distance
        .total_cmp(&current.distance)
        .then((candidate.from, candidate.to).cmp(&(current.from, current.to)))
        .is_lt()
}

/// Component index of every node, numbered by lowest node id
pub(super) fn component_labels(node_count: usize, drafts: &[EdgeDraft]) -> Vec<usize> {
    let mut sets = UnionFind::<usize>::new(node_count);
    for draft in drafts {
        sets.union(draft.from, draft.to);
    }

    let mut labels = HashMap::new();
    (0..node_count)
        .map(|node| {
            let root = sets.find_mut(node);
            let next = labels.len();
            *labels.entry(root).or_insert(next)
        })
        .collect()
}

/// Warn about every component left apart from the largest one
fn report_unbridged(
    nodes: &[Node],
    component: &[usize],
    joined: &mut UnionFind<usize>,
    tree: &rstar::RTree<rstar::primitives::GeomWithData<[f64; 2], NodeId>>,
    report: &mut BuildReport,
) {
    let mut groups: HashMap<usize, Vec<NodeId>> = HashMap::new();
    for node in nodes {
        groups
            .entry(joined.find_mut(component[node.id]))
            .or_default()
            .push(node.id);
    }
    if groups.len() <= 1 {
        return;
    }

    let mut groups: Vec<(usize, Vec<NodeId>)> = groups.into_iter().collect();
    groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then(a.0.cmp(&b.0)));

    for (root, members) in groups.iter().skip(1) {
        let nearest_miles = members
            .iter()
            .filter_map(|&id| {
                let point = nodes[id].geometry;
                tree.nearest_neighbor_iter(&[point.x(), point.y()])
                    .take(GAP_SEARCH_LIMIT)
                    .find(|indexed| joined.find(component[indexed.data]) != *root)
                    .map(|indexed| distance(point, nodes[indexed.data].geometry))
            })
            .min_by(f64::total_cmp);
        report.warn(BuildWarning::UnbridgedComponent {
            size: members.len(),
            nearest_miles,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use geo::Point;

    use super::*;
    use crate::{loading::config::SpeedProfile, model::NodeKind};

    fn node(id: NodeId, x: f64) -> Node {
        Node {
            id,
            geometry: Point::new(x, 0.0),
            lines: BTreeSet::from([id / 2]),
            kind: NodeKind::Endpoint,
            name: None,
        }
    }

    fn link(nodes: &[Node], from: NodeId, to: NodeId) -> EdgeDraft {
        let d = distance(nodes[from].geometry, nodes[to].geometry);
        let mut draft = EdgeDraft::walk(
            &nodes[from],
            &nodes[to],
            EdgeKind::Transfer,
            d,
            &SpeedProfile::default(),
        );
        draft.kind = EdgeKind::Travel { line: from / 2 };
        draft
    }

    #[test]
    fn isolated_nodes_are_dropped_and_ids_remapped() {
        let nodes = vec![node(0, 0.0), node(1, 0.01), node(2, 0.02)];
        let mut drafts = vec![link(&nodes, 0, 2)];
        let mut report = BuildReport::default();
        let kept = drop_isolated_nodes(nodes, &mut drafts, &mut report);

        assert_eq!(kept.len(), 2);
        assert_eq!(report.dropped_nodes, 1);
        assert_eq!(kept[1].geometry, Point::new(0.02, 0.0));
        assert_eq!((drafts[0].from, drafts[0].to), (0, 1));
    }

    #[test]
    fn labels_follow_links() {
        let nodes: Vec<Node> = (0..4).map(|i| node(i, i as f64 * 0.01)).collect();
        let drafts = vec![link(&nodes, 0, 1), link(&nodes, 2, 3)];
        assert_eq!(component_labels(4, &drafts), vec![0, 0, 1, 1]);
    }

    #[test]
    fn bridges_closest_pair_within_cutoff() {
        // two segments with a ~0.6 mi gap between nodes 1 and 2
        let nodes = vec![node(0, 0.0), node(1, 0.01), node(2, 0.0187), node(3, 0.03)];
        let drafts = vec![link(&nodes, 0, 1), link(&nodes, 2, 3)];
        let mut report = BuildReport::default();
        let connectors = repair_connectivity(
            &nodes,
            &drafts,
            &NetworkConfig::default(),
            &BuildOptions::default(),
            &mut report,
        )
        .unwrap();

        assert_eq!(connectors.len(), 1);
        assert_eq!((connectors[0].from, connectors[0].to), (1, 2));
        assert_eq!(connectors[0].kind, EdgeKind::Connector);
        assert_eq!(report.connectors_added, 1);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn gaps_beyond_cutoff_stay_open() {
        let nodes = vec![node(0, 0.0), node(1, 0.01), node(2, 0.05), node(3, 0.06)];
        let drafts = vec![link(&nodes, 0, 1), link(&nodes, 2, 3)];
        let mut report = BuildReport::default();
        let connectors = repair_connectivity(
            &nodes,
            &drafts,
            &NetworkConfig::default(),
            &BuildOptions::default(),
            &mut report,
        )
        .unwrap();

        assert!(connectors.is_empty());
        match &report.warnings[..] {
            [BuildWarning::UnbridgedComponent { size, nearest_miles }] => {
                assert_eq!(*size, 2);
                let gap = nearest_miles.unwrap();
                assert!((gap - 0.04 * 69.09).abs() < 0.05, "gap {gap}");
            }
            other => panic!("unexpected warnings {other:?}"),
        }
    }
}
