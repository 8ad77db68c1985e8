use super::dijkstra::{dijkstra_core, path_cost, reconstruct, shortest_path, Constraints};
use crate::model::graph::{NodeId, StreetGraph};
use crate::model::NetworkError;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

#[derive(PartialEq)]
struct Candidate {
    cost: f64,
    path: Vec<NodeId>,
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.cost
            .total_cmp(&other.cost)
            .then_with(|| self.path.cmp(&other.path))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// enumerates up to k loopless paths in non-decreasing cost order using
/// Yen's spur-deviation procedure.
///
/// candidates are kept in a priority structure deduplicated by exact node
/// sequence, so tied or repeated deviations can never emit the same path
/// twice. returns an empty list when origin cannot reach destination.
pub fn k_shortest_paths(
    graph: &StreetGraph,
    origin: NodeId,
    destination: NodeId,
    k: usize,
    weight: &str,
) -> Result<Vec<Vec<NodeId>>, NetworkError> {
    if k == 0 {
        return Ok(vec![]);
    }
    let seed = match shortest_path(graph, origin, destination, weight) {
        Ok(path) => path,
        Err(NetworkError::NoPath { .. }) => return Ok(vec![]),
        Err(e) => return Err(e),
    };

    let mut accepted: Vec<Vec<NodeId>> = vec![seed.clone()];
    let mut seen: HashSet<Vec<NodeId>> = HashSet::from([seed]);
    let mut candidates: BinaryHeap<Reverse<Candidate>> = BinaryHeap::new();

    while accepted.len() < k {
        let previous = accepted
            .last()
            .expect("accepted always holds the seed path")
            .clone();

        // deviate at every spur position except the destination
        for i in 0..previous.len() - 1 {
            let spur = previous[i];
            let root = &previous[0..=i];

            let mut constraints = Constraints::default();
            // forbid continuing the shared root the way any accepted path
            // already did
            for path in accepted.iter() {
                if path.len() > i + 1 && path[0..=i] == *root {
                    constraints.banned_edges.insert((path[i], path[i + 1]));
                }
            }
            // forbid re-entering the root interior (not the spur itself)
            for node in &root[0..i] {
                constraints.banned_nodes.insert(*node);
            }

            let (dist, prev) =
                dijkstra_core(graph, spur, Some(destination), weight, None, &constraints);
            if !dist.contains_key(&destination) {
                continue;
            }
            let spur_path = reconstruct(&prev, spur, destination);
            let mut total = root[0..i].to_vec();
            total.extend(spur_path);

            if seen.contains(&total) {
                continue;
            }
            let Some(cost) = path_cost(graph, &total, weight) else {
                continue;
            };
            seen.insert(total.clone());
            candidates.push(Reverse(Candidate { cost, path: total }));
        }

        match candidates.pop() {
            Some(Reverse(candidate)) => accepted.push(candidate.path),
            None => break,
        }
    }
    Ok(accepted)
}
