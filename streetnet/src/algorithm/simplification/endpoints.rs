use crate::model::graph::{NodeId, StreetGraph};
use itertools::Itertools;
use std::collections::HashSet;

/// decides whether a node must survive simplification.
///
/// endpoints are nodes that cannot sit in the middle of a collapsed chain:
/// self-looped nodes, sources and sinks, and anything whose degree profile
/// differs from a pure chain. a node is interstitial exactly when it has two
/// distinct neighbors and a parallel-counting total degree of 2 (a oneway
/// chain) or 4 (two reciprocal pairs on a bidirectional chain).
pub fn is_endpoint(graph: &StreetGraph, node_id: &NodeId) -> bool {
    if graph.has_self_loop(node_id) {
        return true;
    }
    let in_degree = graph.in_degree(node_id);
    let out_degree = graph.out_degree(node_id);
    if in_degree == 0 || out_degree == 0 {
        return true;
    }
    let unique_neighbors = graph
        .neighbor_set(node_id)
        .into_iter()
        .filter(|n| n != node_id)
        .count();
    let total_degree = in_degree + out_degree;
    !(unique_neighbors == 2 && (total_degree == 2 || total_degree == 4))
}

/// the full endpoint set, sorted iteration order.
pub fn find_endpoints(graph: &StreetGraph) -> HashSet<NodeId> {
    graph
        .node_ids()
        .into_iter()
        .filter(|n| is_endpoint(graph, n))
        .collect_vec()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::is_endpoint;
    use crate::model::graph::{Crs, EdgeData, NodeData, NodeId, StreetGraph, WayId};

    fn graph_with_edges(n: i64, edges: &[(i64, i64)]) -> StreetGraph {
        let mut graph = StreetGraph::new(Crs::default_geographic(), "test");
        for id in 1..=n {
            graph
                .add_node(NodeData::new(NodeId(id), id as f64, 0.0))
                .unwrap();
        }
        for (u, v) in edges {
            graph
                .add_edge(
                    NodeId(*u),
                    NodeId(*v),
                    EdgeData::new(WayId(1), 1.0, true, false),
                )
                .unwrap();
        }
        graph
    }

    #[test]
    fn test_oneway_chain_interior_is_interstitial() {
        let graph = graph_with_edges(3, &[(1, 2), (2, 3)]);
        assert!(is_endpoint(&graph, &NodeId(1)));
        assert!(!is_endpoint(&graph, &NodeId(2)));
        assert!(is_endpoint(&graph, &NodeId(3)));
    }

    #[test]
    fn test_bidirectional_chain_interior_is_interstitial() {
        let graph = graph_with_edges(3, &[(1, 2), (2, 1), (2, 3), (3, 2)]);
        assert!(!is_endpoint(&graph, &NodeId(2)));
    }

    #[test]
    fn test_t_junction_is_endpoint() {
        let graph = graph_with_edges(4, &[(1, 2), (2, 3), (2, 4)]);
        assert!(is_endpoint(&graph, &NodeId(2)));
    }

    #[test]
    fn test_self_loop_is_endpoint() {
        let graph = graph_with_edges(3, &[(1, 2), (2, 3), (2, 2)]);
        assert!(is_endpoint(&graph, &NodeId(2)));
    }

    #[test]
    fn test_asymmetric_degree_is_endpoint() {
        // node 2 has two inbound, one outbound: degree 3 breaks the chain shape
        let graph = graph_with_edges(4, &[(1, 2), (3, 2), (2, 4), (4, 3)]);
        assert!(is_endpoint(&graph, &NodeId(2)));
    }
}
