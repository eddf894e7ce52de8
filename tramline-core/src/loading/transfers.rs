use log::info;
use rayon::prelude::*;
use rstar::{RTree, primitives::GeomWithData};

use super::cancel::BuildOptions;
use super::config::NetworkConfig;
use super::edges::EdgeDraft;
use crate::{
    Error, NodeId,
    geometry::{distance, search_envelope},
    model::{EdgeKind, Node},
};

/// Spatial index over node positions
pub(super) fn index_nodes(nodes: &[Node]) -> RTree<GeomWithData<[f64; 2], NodeId>> {
    RTree::bulk_load(
        nodes
            .iter()
            .map(|node| GeomWithData::new([node.geometry.x(), node.geometry.y()], node.id))
            .collect(),
    )
}

/// Transfer links between every pair of nearby nodes that share no line
pub(super) fn calculate_transfers(
    nodes: &[Node],
    config: &NetworkConfig,
    options: &BuildOptions,
) -> Result<Vec<EdgeDraft>, Error> {
    let radius = config.transfer_radius_miles;
    info!("Calculating transfers between {} nodes", nodes.len());

    let tree = index_nodes(nodes);
    let per_node: Vec<Vec<EdgeDraft>> = nodes
        .par_iter()
        .map(|source| {
            if options.cancel.is_cancelled() {
                return Vec::new();
            }
            find_transfers_from_node(nodes, &tree, source, config)
        })
        .collect();
    options.check()?;

    let transfers: Vec<EdgeDraft> = per_node.into_iter().flatten().collect();
    info!("Calculated {} transfers within {radius} mi", transfers.len());
    Ok(transfers)
}

/// Transfers from `source` to nodes with a higher id, so each pair is seen once
fn find_transfers_from_node(
    nodes: &[Node],
    tree: &RTree<GeomWithData<[f64; 2], NodeId>>,
    source: &Node,
    config: &NetworkConfig,
) -> Vec<EdgeDraft> {
    let radius = config.transfer_radius_miles;
    let mut targets: Vec<(NodeId, f64)> = tree
        .locate_in_envelope(&search_envelope(source.geometry, radius))
        .map(|indexed| indexed.data)
        .filter(|&id| id > source.id)
        .filter(|&id| !source.shares_line_with(&nodes[id]))
        .map(|id| (id, distance(source.geometry, nodes[id].geometry)))
        .filter(|&(_, d)| d <= radius)
        .collect();
    targets.sort_by_key(|&(id, _)| id);

    targets
        .into_iter()
        .map(|(id, d)| EdgeDraft::walk(source, &nodes[id], EdgeKind::Transfer, d, &config.speeds))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use geo::Point;

    use super::*;
    use crate::model::NodeKind;

    fn node(id: NodeId, x: f64, y: f64, line: usize) -> Node {
        Node {
            id,
            geometry: Point::new(x, y),
            lines: BTreeSet::from([line]),
            kind: NodeKind::Endpoint,
            name: None,
        }
    }

    #[test]
    fn links_close_nodes_of_different_lines_once() {
        let nodes = vec![
            node(0, 0.0, 0.0, 0),
            // ~0.2 mi north, other line
            node(1, 0.0, 0.2 / 69.09, 1),
            // same line as 0, close but not a transfer
            node(2, 0.001, 0.0, 0),
            // other line, too far
            node(3, 0.1, 0.0, 1),
        ];
        let transfers =
            calculate_transfers(&nodes, &NetworkConfig::default(), &BuildOptions::default())
                .unwrap();

        let pairs: Vec<(NodeId, NodeId)> = transfers.iter().map(|t| (t.from, t.to)).collect();
        assert_eq!(pairs, vec![(0, 1), (1, 2)]);
        let first = &transfers[0];
        assert!((first.distance_miles - 0.2).abs() < 1e-3);
        assert!((first.travel_time_minutes - 4.0).abs() < 0.1);
        assert_eq!(first.penalty_minutes, 5.0);
    }

    #[test]
    fn cancelled_scan_is_an_error() {
        let nodes = vec![node(0, 0.0, 0.0, 0), node(1, 0.0, 0.001, 1)];
        let options = BuildOptions::default();
        options.cancel.cancel();
        let result = calculate_transfers(&nodes, &NetworkConfig::default(), &options);
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
