use crate::model::graph::{NodeId, StreetGraph};
use itertools::Itertools;
use std::collections::{HashSet, VecDeque};

/// breadth-first search over the symmetric closure of the graph's edges.
///
/// # Arguments
///
/// * `src` - origin of the tree
/// * `graph` - graph to search
/// * `valid_set` - set of nodes the search may visit, or None for all
///
/// # Returns
///
/// The set of nodes reachable from `src` ignoring edge direction.
pub fn bfs_undirected(
    src: NodeId,
    graph: &StreetGraph,
    valid_set: Option<&HashSet<NodeId>>,
) -> HashSet<NodeId> {
    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut frontier: VecDeque<NodeId> = VecDeque::new();
    visited.insert(src);
    frontier.push_back(src);

    while let Some(next_id) = frontier.pop_front() {
        // neighbors are sorted for deterministic frontier insertion order
        let neighbors = graph
            .neighbor_set(&next_id)
            .into_iter()
            .filter(|n| match valid_set {
                Some(valid) => valid.contains(n),
                None => true,
            })
            .sorted();
        for neighbor in neighbors {
            if visited.insert(neighbor) {
                frontier.push_back(neighbor);
            }
        }
    }
    visited
}

#[cfg(test)]
mod tests {
    use super::bfs_undirected;
    use crate::model::graph::{Crs, EdgeData, NodeData, NodeId, StreetGraph, WayId};
    use std::collections::HashSet;

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
    fn test_bfs_crosses_edge_direction() {
        // 1 -> 2 <- 3: all mutually reachable ignoring direction
        let graph = graph_with_edges(3, &[(1, 2), (3, 2)]);
        let visited = bfs_undirected(NodeId(1), &graph, None);
        assert_eq!(visited.len(), 3);
    }

    #[test]
    fn test_bfs_respects_valid_set() {
        let graph = graph_with_edges(3, &[(1, 2), (2, 3)]);
        let valid: HashSet<_> = [NodeId(1), NodeId(2)].into_iter().collect();
        let visited = bfs_undirected(NodeId(1), &graph, Some(&valid));
        assert_eq!(visited.len(), 2);
        assert!(!visited.contains(&NodeId(3)));
    }
}
