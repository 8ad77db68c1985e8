use super::union_find::UnionFind;
use crate::algorithm::stats;
use crate::model::graph::{AttrValue, NodeData, NodeId, StreetGraph};
use crate::model::NetworkError;
use crate::spatial::NodeIndex;
use itertools::Itertools;
use kdam::tqdm;
use std::collections::HashMap;

/// merges junctions whose tolerance buffers overlap into single
/// representative nodes and returns the rebuilt graph.
///
/// two nodes merge when they sit within `2 * tolerance_m` of one another
/// (their buffers overlap); clusters are the connected components of that
/// proximity relation. the representative is the member with the
/// lexicographically smallest id string, placed at the cluster's coordinate
/// mean, with the membership recorded in `merged_nodes`. every source edge
/// is relabeled onto the representatives, keeping its attributes; edges
/// interior to a cluster become self-loops. nodes without finite
/// coordinates pass through as singleton clusters.
pub fn consolidate_intersections(
    graph: &StreetGraph,
    tolerance_m: f64,
) -> Result<StreetGraph, NetworkError> {
    if !tolerance_m.is_finite() || tolerance_m <= 0.0 {
        return Err(NetworkError::InvalidInput(format!(
            "consolidation tolerance must be a positive number of meters, got {tolerance_m}"
        )));
    }
    log::info!(
        "consolidating {} nodes with tolerance {} m",
        graph.n_nodes(),
        tolerance_m
    );

    let clusters = proximity_clusters(graph, tolerance_m)?;
    let n_merged: usize = clusters.iter().filter(|c| c.len() > 1).count();
    log::info!(
        "found {} clusters ({} with more than one member)",
        clusters.len(),
        n_merged
    );

    // assign each source node its representative
    let mut representative_of: HashMap<NodeId, NodeId> = HashMap::new();
    let mut representatives: Vec<NodeData> = vec![];
    for cluster in clusters.iter() {
        let rep_id = *cluster
            .iter()
            .min_by_key(|id| id.encoded())
            .ok_or_else(|| {
                NetworkError::ConsolidationError(String::from("proximity cluster is empty"))
            })?;
        for member in cluster.iter() {
            representative_of.insert(*member, rep_id);
        }
        representatives.push(representative_node(graph, rep_id, cluster)?);
    }

    // rebuild on a fresh graph: representatives first, then every source
    // edge relabeled onto them
    let mut out = graph.like();
    for node in representatives.into_iter().sorted_by_key(|n| n.osmid) {
        out.add_node(node)?;
    }
    for (src, dst, edge) in graph.edges_iter() {
        let new_src = representative_of.get(&src).copied().ok_or_else(|| {
            NetworkError::ConsolidationError(format!("node {src} missing from clusters"))
        })?;
        let new_dst = representative_of.get(&dst).copied().ok_or_else(|| {
            NetworkError::ConsolidationError(format!("node {dst} missing from clusters"))
        })?;
        out.add_edge(new_src, new_dst, edge.clone())?;
    }

    let street_counts = stats::count_streets_per_node(&out);
    for (node_id, count) in street_counts.into_iter() {
        out.node_mut(&node_id)?.street_count = Some(count);
    }

    log::info!(
        "consolidated graph has {} nodes and {} edges",
        out.n_nodes(),
        out.n_edges()
    );
    Ok(out)
}

/// connected components of the threshold proximity graph, grown with
/// union-find over the candidate pairs the spatial index surfaces.
fn proximity_clusters(
    graph: &StreetGraph,
    tolerance_m: f64,
) -> Result<Vec<Vec<NodeId>>, NetworkError> {
    let node_ids = graph.node_ids();
    let index_of: HashMap<NodeId, usize> = node_ids
        .iter()
        .enumerate()
        .map(|(index, id)| (*id, index))
        .collect();
    let mut dsu = UnionFind::new(node_ids.len());

    let located = node_ids
        .iter()
        .filter(|id| {
            graph
                .node(id)
                .map(|n| n.has_finite_coords())
                .unwrap_or(false)
        })
        .copied()
        .collect_vec();
    if !located.is_empty() {
        let spatial = NodeIndex::new(graph)?;
        let iter = tqdm!(
            located.iter(),
            total = located.len(),
            desc = "proximity clustering"
        );
        for node_id in iter {
            let point = graph.node(node_id)?.point();
            for (other_id, _) in spatial.nodes_within(point, 2.0 * tolerance_m) {
                if other_id != *node_id {
                    dsu.union(index_of[node_id], index_of[&other_id]);
                }
            }
        }
    }

    let mut clusters: HashMap<usize, Vec<NodeId>> = HashMap::new();
    for node_id in node_ids.iter() {
        let root = dsu.find(index_of[node_id]);
        clusters.entry(root).or_default().push(*node_id);
    }
    // sorted members, clusters ordered by smallest member
    Ok(clusters
        .into_values()
        .map(|mut members| {
            members.sort();
            members
        })
        .sorted_by_key(|members| members[0])
        .collect_vec())
}

/// synthesizes the representative node for one cluster: mean coordinates,
/// merged tag values, full membership recorded when more than one node
/// merged.
fn representative_node(
    graph: &StreetGraph,
    rep_id: NodeId,
    cluster: &[NodeId],
) -> Result<NodeData, NetworkError> {
    let mut node = graph.node(&rep_id)?.clone();
    if cluster.len() == 1 {
        return Ok(node);
    }

    let members = cluster
        .iter()
        .map(|id| graph.node(id))
        .collect::<Result<Vec<_>, _>>()?;
    let located = members
        .iter()
        .filter(|n| n.has_finite_coords())
        .collect_vec();
    if !located.is_empty() {
        node.x = located.iter().map(|n| n.x).sum::<f64>() / located.len() as f64;
        node.y = located.iter().map(|n| n.y).sum::<f64>() / located.len() as f64;
    }

    let tag_keys = members
        .iter()
        .flat_map(|n| n.tags.keys().cloned())
        .unique()
        .collect_vec();
    for key in tag_keys.into_iter() {
        let values = members
            .iter()
            .filter_map(|n| n.tags.get(&key).cloned())
            .collect_vec();
        if let Some(value) = AttrValue::merged(values) {
            node.tags.insert(key, value);
        }
    }

    node.merged_nodes = cluster.to_vec();
    Ok(node)
}
