use crate::model::graph::{NodeId, StreetGraph};
use std::collections::HashMap;

/// counts the physical street segments touching each node.
///
/// reciprocal directed pairs between the same endpoints collapse to one
/// street (leftover one-directional parallels count singly), and a
/// self-loop street contributes 2 to its node's count.
pub fn count_streets_per_node(graph: &StreetGraph) -> HashMap<NodeId, u32> {
    graph
        .node_ids()
        .into_iter()
        .map(|node_id| {
            let mut count: usize = 0;
            for neighbor in graph.neighbor_set(&node_id) {
                if neighbor == node_id {
                    continue;
                }
                let outgoing = graph.edges_between(&node_id, &neighbor).len();
                let incoming = graph.edges_between(&neighbor, &node_id).len();
                count += outgoing.max(incoming);
            }
            let directed_loops = graph.edges_between(&node_id, &node_id).len();
            count += 2 * directed_loops.div_ceil(2);
            (node_id, count as u32)
        })
        .collect()
}

/// nodes whose street count meets the threshold. the conventional threshold
/// of 2 counts every through node; 3 restricts to true intersections.
pub fn intersection_count(graph: &StreetGraph, min_streets: u32) -> usize {
    count_streets_per_node(graph)
        .values()
        .filter(|count| **count >= min_streets)
        .count()
}

/// unordered endpoint pairs carrying at least one edge.
pub fn street_segment_count(graph: &StreetGraph) -> usize {
    let mut pairs: Vec<(NodeId, NodeId)> = graph
        .edge_triples()
        .into_iter()
        .map(|(u, v, _)| if u <= v { (u, v) } else { (v, u) })
        .collect();
    pairs.sort();
    pairs.dedup();
    pairs.len()
}

/// total street length: each reciprocal directed pair counts once. for each
/// unordered pair the canonical (smaller id first) direction's parallel
/// lengths are summed when present, otherwise the opposite direction's.
pub fn street_length_total(graph: &StreetGraph) -> f64 {
    let mut pairs: Vec<(NodeId, NodeId)> = graph
        .edge_triples()
        .into_iter()
        .map(|(u, v, _)| if u <= v { (u, v) } else { (v, u) })
        .collect();
    pairs.sort();
    pairs.dedup();

    pairs
        .into_iter()
        .map(|(u, v)| {
            let canonical = graph.edges_between(&u, &v);
            let edges = if canonical.is_empty() {
                graph.edges_between(&v, &u)
            } else {
                canonical
            };
            edges
                .iter()
                .map(|e| e.length)
                .filter(|l| l.is_finite())
                .sum::<f64>()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::graph::{Crs, EdgeData, NodeData, NodeId, StreetGraph, WayId};

    fn bidirectional_chain() -> StreetGraph {
        let mut graph = StreetGraph::new(Crs::default_geographic(), "test");
        for id in 1..=3 {
            graph
                .add_node(NodeData::new(NodeId(id), 0.0, id as f64))
                .unwrap();
        }
        for (u, v) in [(1, 2), (2, 3)] {
            graph
                .add_edge(
                    NodeId(u),
                    NodeId(v),
                    EdgeData::new(WayId(10), 100.0, false, false),
                )
                .unwrap();
            graph
                .add_edge(
                    NodeId(v),
                    NodeId(u),
                    EdgeData::new(WayId(10), 100.0, false, true),
                )
                .unwrap();
        }
        graph
    }

    #[test]
    fn test_street_counts_collapse_reciprocal_pairs() {
        let graph = bidirectional_chain();
        let counts = count_streets_per_node(&graph);
        assert_eq!(counts.get(&NodeId(1)), Some(&1));
        assert_eq!(counts.get(&NodeId(2)), Some(&2));
        assert_eq!(counts.get(&NodeId(3)), Some(&1));
    }

    #[test]
    fn test_self_loop_contributes_two() {
        let mut graph = bidirectional_chain();
        graph
            .add_edge(
                NodeId(1),
                NodeId(1),
                EdgeData::new(WayId(99), 50.0, true, false),
            )
            .unwrap();
        let counts = count_streets_per_node(&graph);
        assert_eq!(counts.get(&NodeId(1)), Some(&3));
    }

    #[test]
    fn test_intersection_count_threshold() {
        let graph = bidirectional_chain();
        assert_eq!(intersection_count(&graph, 2), 1);
        assert_eq!(intersection_count(&graph, 1), 3);
        assert_eq!(intersection_count(&graph, 3), 0);
    }

    #[test]
    fn test_street_totals_count_reciprocals_once() {
        let graph = bidirectional_chain();
        assert_eq!(street_segment_count(&graph), 2);
        assert!((street_length_total(&graph) - 200.0).abs() < 1e-12);
    }
}
