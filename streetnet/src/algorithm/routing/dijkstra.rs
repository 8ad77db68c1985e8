use crate::model::graph::{EdgeData, NodeId, StreetGraph};
use crate::model::NetworkError;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// resolves a weight attribute on one edge. the structural attributes are
/// read from their fields; anything else falls through to the tag store.
pub fn edge_weight(edge: &EdgeData, attr: &str) -> Option<f64> {
    match attr {
        "length" => Some(edge.length),
        "travel_time" => edge.travel_time,
        "speed_kph" => edge.speed_kph,
        "grade" => edge.grade,
        "bearing" => edge.bearing,
        other => edge.tags.get(other).and_then(|v| v.as_f64()),
    }
}

/// search constraints used by spur exploration in the k-shortest routine.
#[derive(Default)]
pub(crate) struct Constraints {
    pub banned_nodes: HashSet<NodeId>,
    pub banned_edges: HashSet<(NodeId, NodeId)>,
}

#[derive(PartialEq)]
struct HeapEntry {
    cost: f64,
    node: NodeId,
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.cost
            .total_cmp(&other.cost)
            .then(self.node.cmp(&other.node))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// binary-heap Dijkstra over the multigraph, collapsing parallel edges by
/// their minimum weight. edges with missing, non-finite, or negative
/// weights are skipped and counted.
///
/// returns the settled distances and the predecessor tree. stops early when
/// `target` is settled.
pub(crate) fn dijkstra_core(
    graph: &StreetGraph,
    origin: NodeId,
    target: Option<NodeId>,
    weight: &str,
    cutoff: Option<f64>,
    constraints: &Constraints,
) -> (HashMap<NodeId, f64>, HashMap<NodeId, NodeId>) {
    let mut dist: HashMap<NodeId, f64> = HashMap::new();
    let mut prev: HashMap<NodeId, NodeId> = HashMap::new();
    let mut settled: HashSet<NodeId> = HashSet::new();
    let mut heap: BinaryHeap<Reverse<HeapEntry>> = BinaryHeap::new();
    let mut skipped_edges: usize = 0;

    dist.insert(origin, 0.0);
    heap.push(Reverse(HeapEntry {
        cost: 0.0,
        node: origin,
    }));

    while let Some(Reverse(HeapEntry { cost, node })) = heap.pop() {
        if !settled.insert(node) {
            continue;
        }
        if Some(node) == target {
            break;
        }
        if let Some(limit) = cutoff {
            if cost > limit {
                continue;
            }
        }
        for successor in graph.out_neighbors(&node) {
            if constraints.banned_nodes.contains(&successor)
                || constraints.banned_edges.contains(&(node, successor))
                || settled.contains(&successor)
            {
                continue;
            }
            // collapse the multiedge to its minimum usable weight
            let mut min_weight: Option<f64> = None;
            for edge in graph.edges_between(&node, &successor) {
                match edge_weight(edge, weight) {
                    Some(w) if w.is_finite() && w >= 0.0 => {
                        min_weight = Some(match min_weight {
                            Some(best) => best.min(w),
                            None => w,
                        });
                    }
                    _ => skipped_edges += 1,
                }
            }
            let Some(w) = min_weight else {
                continue;
            };
            let candidate = cost + w;
            let improved = dist
                .get(&successor)
                .map(|best| candidate < *best)
                .unwrap_or(true);
            if improved {
                dist.insert(successor, candidate);
                prev.insert(successor, node);
                heap.push(Reverse(HeapEntry {
                    cost: candidate,
                    node: successor,
                }));
            }
        }
    }

    if skipped_edges > 0 {
        log::warn!("dijkstra skipped {skipped_edges} edges with unusable '{weight}' weights");
    }
    (dist, prev)
}

pub(crate) fn reconstruct(
    prev: &HashMap<NodeId, NodeId>,
    origin: NodeId,
    destination: NodeId,
) -> Vec<NodeId> {
    let mut path = vec![destination];
    let mut current = destination;
    while current != origin {
        current = prev[&current];
        path.push(current);
    }
    path.reverse();
    path
}

/// weighted shortest path from `origin` to `destination` as a node
/// sequence. fails with [`NetworkError::NoPath`] when no directed path
/// exists.
pub fn shortest_path(
    graph: &StreetGraph,
    origin: NodeId,
    destination: NodeId,
    weight: &str,
) -> Result<Vec<NodeId>, NetworkError> {
    if !graph.has_node(&origin) {
        return Err(NetworkError::MissingNode(origin));
    }
    if !graph.has_node(&destination) {
        return Err(NetworkError::MissingNode(destination));
    }
    if origin == destination {
        return Ok(vec![origin]);
    }
    let constraints = Constraints::default();
    let (dist, prev) = dijkstra_core(graph, origin, Some(destination), weight, None, &constraints);
    if !dist.contains_key(&destination) {
        return Err(NetworkError::NoPath {
            origin,
            destination,
        });
    }
    Ok(reconstruct(&prev, origin, destination))
}

/// vectorized variant: same-length origin/destination slices produce
/// parallel results, None where a pair is unreachable.
pub fn shortest_paths(
    graph: &StreetGraph,
    origins: &[NodeId],
    destinations: &[NodeId],
    weight: &str,
) -> Result<Vec<Option<Vec<NodeId>>>, NetworkError> {
    if origins.len() != destinations.len() {
        return Err(NetworkError::InvalidInput(format!(
            "origins and destinations must be the same length ({} != {})",
            origins.len(),
            destinations.len()
        )));
    }
    origins
        .iter()
        .zip(destinations.iter())
        .map(|(o, d)| match shortest_path(graph, *o, *d, weight) {
            Ok(path) => Ok(Some(path)),
            Err(NetworkError::NoPath { .. }) => Ok(None),
            Err(e) => Err(e),
        })
        .collect()
}

/// settled weighted distances from a source, optionally bounded by a
/// cutoff. used for distance-based truncation.
pub fn single_source_distances(
    graph: &StreetGraph,
    origin: NodeId,
    weight: &str,
    cutoff: Option<f64>,
) -> Result<HashMap<NodeId, f64>, NetworkError> {
    if !graph.has_node(&origin) {
        return Err(NetworkError::MissingNode(origin));
    }
    let constraints = Constraints::default();
    let (dist, _) = dijkstra_core(graph, origin, None, weight, cutoff, &constraints);
    Ok(dist)
}

/// total weight of a node path, collapsing parallel edges by minimum
/// weight.
pub fn path_cost(graph: &StreetGraph, path: &[NodeId], weight: &str) -> Option<f64> {
    let mut total = 0.0;
    for pair in path.windows(2) {
        let best = graph
            .edges_between(&pair[0], &pair[1])
            .into_iter()
            .filter_map(|e| edge_weight(e, weight))
            .filter(|w| w.is_finite() && *w >= 0.0)
            .fold(None, |acc: Option<f64>, w| {
                Some(acc.map_or(w, |best| best.min(w)))
            })?;
        total += best;
    }
    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::graph::{Crs, EdgeData, NodeData, NodeId, StreetGraph, WayId};

    fn weighted_graph(edges: &[(i64, i64, f64)]) -> StreetGraph {
        let mut graph = StreetGraph::new(Crs::default_geographic(), "test");
        let mut seen = std::collections::HashSet::new();
        for (u, v, _) in edges {
            for id in [u, v] {
                if seen.insert(*id) {
                    graph
                        .add_node(NodeData::new(NodeId(*id), *id as f64, 0.0))
                        .unwrap();
                }
            }
        }
        for (u, v, w) in edges {
            graph
                .add_edge(
                    NodeId(*u),
                    NodeId(*v),
                    EdgeData::new(WayId(1), *w, true, false),
                )
                .unwrap();
        }
        graph
    }

    #[test]
    fn test_shortest_path_diamond() {
        let graph = weighted_graph(&[
            (1, 2, 1.0),
            (1, 3, 4.0),
            (2, 3, 1.0),
            (2, 4, 5.0),
            (3, 4, 1.0),
        ]);
        let path = shortest_path(&graph, NodeId(1), NodeId(4), "length").unwrap();
        assert_eq!(path, vec![NodeId(1), NodeId(2), NodeId(3), NodeId(4)]);
        assert_eq!(path_cost(&graph, &path, "length"), Some(3.0));
    }

    #[test]
    fn test_parallel_edges_collapse_to_min() {
        let mut graph = weighted_graph(&[(1, 2, 9.0)]);
        graph
            .add_edge(
                NodeId(1),
                NodeId(2),
                EdgeData::new(WayId(2), 2.0, true, false),
            )
            .unwrap();
        let path = shortest_path(&graph, NodeId(1), NodeId(2), "length").unwrap();
        assert_eq!(path_cost(&graph, &path, "length"), Some(2.0));
    }

    #[test]
    fn test_no_path_is_an_error() {
        let graph = weighted_graph(&[(1, 2, 1.0), (3, 4, 1.0)]);
        let result = shortest_path(&graph, NodeId(1), NodeId(4), "length");
        assert!(matches!(result, Err(NetworkError::NoPath { .. })));
    }

    #[test]
    fn test_direction_respected() {
        let graph = weighted_graph(&[(1, 2, 1.0)]);
        assert!(shortest_path(&graph, NodeId(2), NodeId(1), "length").is_err());
    }

    #[test]
    fn test_non_finite_weights_skipped() {
        let mut graph = weighted_graph(&[(1, 2, f64::NAN)]);
        // the NaN edge is unusable; a parallel finite edge routes
        graph
            .add_edge(
                NodeId(1),
                NodeId(2),
                EdgeData::new(WayId(2), 7.0, true, false),
            )
            .unwrap();
        let path = shortest_path(&graph, NodeId(1), NodeId(2), "length").unwrap();
        assert_eq!(path_cost(&graph, &path, "length"), Some(7.0));
    }

    #[test]
    fn test_vectorized_variant() {
        let graph = weighted_graph(&[(1, 2, 1.0), (2, 3, 1.0), (4, 5, 1.0)]);
        let results = shortest_paths(
            &graph,
            &[NodeId(1), NodeId(1)],
            &[NodeId(3), NodeId(5)],
            "length",
        )
        .unwrap();
        assert_eq!(
            results[0],
            Some(vec![NodeId(1), NodeId(2), NodeId(3)])
        );
        assert_eq!(results[1], None);
    }

    #[test]
    fn test_vectorized_length_mismatch() {
        let graph = weighted_graph(&[(1, 2, 1.0)]);
        let result = shortest_paths(&graph, &[NodeId(1)], &[], "length");
        assert!(matches!(result, Err(NetworkError::InvalidInput(_))));
    }

    #[test]
    fn test_trivial_path() {
        let graph = weighted_graph(&[(1, 2, 1.0)]);
        let path = shortest_path(&graph, NodeId(1), NodeId(1), "length").unwrap();
        assert_eq!(path, vec![NodeId(1)]);
    }

    #[test]
    fn test_single_source_distances_with_cutoff() {
        let graph = weighted_graph(&[(1, 2, 1.0), (2, 3, 1.0), (3, 4, 1.0)]);
        let dist = single_source_distances(&graph, NodeId(1), "length", Some(2.0)).unwrap();
        assert_eq!(dist.get(&NodeId(3)), Some(&2.0));
        // node 4 sits past the cutoff frontier
        assert!(dist.get(&NodeId(4)).is_none() || dist[&NodeId(4)] > 2.0);
    }
}
