use super::search::bfs_undirected;
use crate::model::graph::{NodeId, StreetGraph};
use crate::model::NetworkError;
use itertools::Itertools;
use std::collections::{HashMap, HashSet};

/// weakly connected components: BFS over the symmetric closure, seeded in
/// sorted node order so component order is deterministic. each component's
/// nodes are returned sorted.
pub fn weakly_connected_components(graph: &StreetGraph) -> Vec<Vec<NodeId>> {
    let mut components: Vec<Vec<NodeId>> = vec![];
    let mut assigned: HashSet<NodeId> = HashSet::new();
    for node_id in graph.node_ids() {
        if assigned.contains(&node_id) {
            continue;
        }
        let members = bfs_undirected(node_id, graph, None);
        assigned.extend(members.iter().copied());
        components.push(members.into_iter().sorted().collect_vec());
    }
    components
}

/// strongly connected components via Tarjan's algorithm, iterative so deep
/// chains cannot overflow the call stack. roots are visited in sorted node
/// order; each component's nodes are returned sorted.
pub fn strongly_connected_components(graph: &StreetGraph) -> Vec<Vec<NodeId>> {
    let nodes = graph.node_ids();
    let successors: HashMap<NodeId, Vec<NodeId>> = nodes
        .iter()
        .map(|n| (*n, graph.out_neighbors(n)))
        .collect();

    let mut index_of: HashMap<NodeId, usize> = HashMap::new();
    let mut lowlink: HashMap<NodeId, usize> = HashMap::new();
    let mut on_stack: HashSet<NodeId> = HashSet::new();
    let mut stack: Vec<NodeId> = vec![];
    let mut components: Vec<Vec<NodeId>> = vec![];
    let mut next_index: usize = 0;

    for root in nodes.iter() {
        if index_of.contains_key(root) {
            continue;
        }
        // explicit work stack of (node, next successor offset)
        let mut work: Vec<(NodeId, usize)> = vec![(*root, 0)];
        index_of.insert(*root, next_index);
        lowlink.insert(*root, next_index);
        next_index += 1;
        stack.push(*root);
        on_stack.insert(*root);

        while let Some((v, offset)) = work.pop() {
            let succ = &successors[&v];
            if offset < succ.len() {
                let w = succ[offset];
                work.push((v, offset + 1));
                if !index_of.contains_key(&w) {
                    index_of.insert(w, next_index);
                    lowlink.insert(w, next_index);
                    next_index += 1;
                    stack.push(w);
                    on_stack.insert(w);
                    work.push((w, 0));
                } else if on_stack.contains(&w) {
                    let candidate = index_of[&w];
                    let low = lowlink.get_mut(&v).expect("visited node has a lowlink");
                    *low = (*low).min(candidate);
                }
            } else {
                if lowlink[&v] == index_of[&v] {
                    let mut component = vec![];
                    loop {
                        let w = stack.pop().expect("tarjan stack holds the component root");
                        on_stack.remove(&w);
                        component.push(w);
                        if w == v {
                            break;
                        }
                    }
                    component.sort();
                    components.push(component);
                }
                if let Some((parent, _)) = work.last() {
                    let child_low = lowlink[&v];
                    let low = lowlink.get_mut(parent).expect("parent has a lowlink");
                    *low = (*low).min(child_low);
                }
            }
        }
    }
    components
}

/// picks the largest component by node count, first-found winning ties.
fn largest(components: Vec<Vec<NodeId>>) -> Option<Vec<NodeId>> {
    let mut best: Option<Vec<NodeId>> = None;
    for component in components.into_iter() {
        match &best {
            Some(current) if component.len() <= current.len() => {}
            _ => best = Some(component),
        }
    }
    best
}

/// the node set of the largest weakly (or strongly) connected component.
pub fn largest_component_nodes(
    graph: &StreetGraph,
    strongly: bool,
) -> Option<Vec<NodeId>> {
    let components = if strongly {
        strongly_connected_components(graph)
    } else {
        weakly_connected_components(graph)
    };
    largest(components)
}

/// extracts the subgraph induced by the largest weakly (or strongly)
/// connected component.
pub fn largest_component(
    graph: &StreetGraph,
    strongly: bool,
) -> Result<StreetGraph, NetworkError> {
    let components = if strongly {
        strongly_connected_components(graph)
    } else {
        weakly_connected_components(graph)
    };
    let n_components = components.len();
    let keep = largest(components).ok_or_else(|| {
        NetworkError::InvalidInput(String::from(
            "cannot take the largest component of an empty graph",
        ))
    })?;
    log::info!(
        "retaining largest of {} {} components ({} nodes)",
        n_components,
        if strongly { "strong" } else { "weak" },
        keep.len()
    );
    let keep_set: HashSet<NodeId> = keep.into_iter().collect();
    graph.subgraph(&keep_set)
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn test_weak_components() {
        let graph = graph_with_edges(5, &[(1, 2), (3, 2), (4, 5)]);
        let components = weakly_connected_components(&graph);
        assert_eq!(components.len(), 2);
        assert_eq!(components[0], vec![NodeId(1), NodeId(2), NodeId(3)]);
        assert_eq!(components[1], vec![NodeId(4), NodeId(5)]);
    }

    #[test]
    fn test_strong_components_directed_cycle() {
        // 1 -> 2 -> 3 -> 1 is one scc, 4 hangs off it
        let graph = graph_with_edges(4, &[(1, 2), (2, 3), (3, 1), (3, 4)]);
        let mut components = strongly_connected_components(&graph);
        components.sort_by_key(|c| c.len());
        assert_eq!(components.len(), 2);
        assert_eq!(components[0], vec![NodeId(4)]);
        assert_eq!(components[1], vec![NodeId(1), NodeId(2), NodeId(3)]);
    }

    #[test]
    fn test_strong_components_chain_is_singletons() {
        let graph = graph_with_edges(3, &[(1, 2), (2, 3)]);
        let components = strongly_connected_components(&graph);
        assert_eq!(components.len(), 3);
    }

    #[test]
    fn test_largest_weak_component_extraction() {
        let graph = graph_with_edges(5, &[(1, 2), (2, 3), (4, 5)]);
        let largest = largest_component(&graph, false).unwrap();
        assert_eq!(largest.n_nodes(), 3);
        assert_eq!(largest.n_edges(), 2);
        assert!(largest.has_node(&NodeId(1)));
        assert!(!largest.has_node(&NodeId(4)));
    }

    #[test]
    fn test_largest_strong_component_extraction() {
        let graph = graph_with_edges(5, &[(1, 2), (2, 1), (2, 3), (4, 5)]);
        let largest = largest_component(&graph, true).unwrap();
        assert_eq!(largest.n_nodes(), 2);
        assert!(largest.has_node(&NodeId(1)));
        assert!(largest.has_node(&NodeId(2)));
    }

    #[test]
    fn test_tie_broken_by_first_found() {
        let graph = graph_with_edges(4, &[(1, 2), (3, 4)]);
        let largest = largest_component(&graph, false).unwrap();
        assert!(largest.has_node(&NodeId(1)));
        assert!(largest.has_node(&NodeId(2)));
    }
}
