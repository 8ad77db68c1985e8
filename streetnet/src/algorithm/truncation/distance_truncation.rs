use crate::algorithm::routing::single_source_distances;
use crate::model::graph::{NodeId, StreetGraph};
use crate::model::NetworkError;
use itertools::Itertools;

/// drops every node farther than `max_dist` from the source under the given
/// edge weight attribute, along with everything unreachable.
pub fn truncate_graph_dist(
    graph: &mut StreetGraph,
    source: NodeId,
    max_dist: f64,
    weight: &str,
) -> Result<(), NetworkError> {
    if !max_dist.is_finite() || max_dist < 0.0 {
        return Err(NetworkError::InvalidInput(format!(
            "truncation distance must be a non-negative number, got {max_dist}"
        )));
    }
    let distances = single_source_distances(graph, source, weight, Some(max_dist))?;
    let to_remove = graph
        .node_ids()
        .into_iter()
        .filter(|node_id| {
            distances
                .get(node_id)
                .map(|d| *d > max_dist)
                .unwrap_or(true)
        })
        .collect_vec();
    let n_removed = to_remove.len();
    for node_id in to_remove.into_iter() {
        graph.remove_node(&node_id)?;
    }
    log::info!(
        "removed {n_removed} nodes beyond {weight} {max_dist} of node {source}; {} remain",
        graph.n_nodes()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::truncate_graph_dist;
    use crate::model::graph::{Crs, EdgeData, NodeData, NodeId, StreetGraph, WayId};

    fn chain_graph() -> StreetGraph {
        let mut graph = StreetGraph::new(Crs::default_geographic(), "test");
        for id in 1..=4 {
            graph
                .add_node(NodeData::new(NodeId(id), id as f64, 0.0))
                .unwrap();
        }
        for (u, v) in [(1, 2), (2, 3), (3, 4)] {
            graph
                .add_edge(
                    NodeId(u),
                    NodeId(v),
                    EdgeData::new(WayId(1), 100.0, true, false),
                )
                .unwrap();
        }
        // an unreachable island
        graph.add_node(NodeData::new(NodeId(9), 9.0, 0.0)).unwrap();
        graph
    }

    #[test]
    fn test_distance_truncation() {
        let mut graph = chain_graph();
        truncate_graph_dist(&mut graph, NodeId(1), 200.0, "length").unwrap();
        assert!(graph.has_node(&NodeId(1)));
        assert!(graph.has_node(&NodeId(2)));
        assert!(graph.has_node(&NodeId(3)));
        assert!(!graph.has_node(&NodeId(4)));
        assert!(!graph.has_node(&NodeId(9)));
    }

    #[test]
    fn test_zero_distance_keeps_only_source() {
        let mut graph = chain_graph();
        truncate_graph_dist(&mut graph, NodeId(1), 0.0, "length").unwrap();
        assert_eq!(graph.n_nodes(), 1);
        assert!(graph.has_node(&NodeId(1)));
    }

    #[test]
    fn test_missing_source_is_an_error() {
        let mut graph = chain_graph();
        assert!(truncate_graph_dist(&mut graph, NodeId(77), 100.0, "length").is_err());
    }
}
