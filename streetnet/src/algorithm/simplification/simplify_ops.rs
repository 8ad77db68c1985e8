use super::endpoints::find_endpoints;
use crate::algorithm::stats;
use crate::model::graph::{AttrValue, EdgeData, NodeId, StreetGraph, WayId};
use crate::model::NetworkError;
use geo::{Coord, LineString};
use itertools::Itertools;
use kdam::tqdm;
use std::collections::HashSet;

/// upper bound on the nodes walked while tracing one chain; tripping it
/// means the input graph is malformed.
const MAX_PATH_STEPS: usize = 10_000;

/// collapses every chain of interstitial nodes into a single edge between
/// the surrounding endpoints, merging attributes and synthesizing the chain
/// geometry.
///
/// # Arguments
///
/// * `graph` - graph to simplify in place; must not already be simplified
/// * `track_merged` - record the original (u, v) pairs on each new edge
/// * `remove_rings` - drop nodes left with only a self-loop afterwards
pub fn simplify_graph(
    graph: &mut StreetGraph,
    track_merged: bool,
    remove_rings: bool,
) -> Result<(), NetworkError> {
    if graph.is_simplified() {
        return Err(NetworkError::AlreadySimplified);
    }
    let initial_nodes = graph.n_nodes();
    let initial_edges = graph.n_edges();

    let endpoints = find_endpoints(graph);
    log::info!(
        "simplifying graph: {} endpoints among {} nodes",
        endpoints.len(),
        initial_nodes
    );

    let paths = trace_all_paths(graph, &endpoints)?;

    let mut to_remove: HashSet<NodeId> = HashSet::new();
    let path_iter = tqdm!(paths.into_iter(), desc = "collapse chains");
    for path in path_iter {
        let merged = merge_path_edges(graph, &path, track_merged)?;
        let src = path[0];
        let dst = path[path.len() - 1];
        graph.add_edge(src, dst, merged)?;
        to_remove.extend(path[1..path.len() - 1].iter().copied());
    }
    for node_id in to_remove.iter().sorted() {
        graph.remove_node(node_id)?;
    }

    if remove_rings {
        remove_isolated_rings(graph)?;
    }

    graph.mark_simplified()?;
    let street_counts = stats::count_streets_per_node(graph);
    for (node_id, count) in street_counts.into_iter() {
        graph.node_mut(&node_id)?.street_count = Some(count);
    }

    log::info!(
        "simplified graph from {} to {} nodes, {} to {} edges",
        initial_nodes,
        graph.n_nodes(),
        initial_edges,
        graph.n_edges()
    );
    Ok(())
}

/// finds every maximal chain: from each endpoint, follow each interstitial
/// out-neighbor forward to the next endpoint.
fn trace_all_paths(
    graph: &StreetGraph,
    endpoints: &HashSet<NodeId>,
) -> Result<Vec<Vec<NodeId>>, NetworkError> {
    let mut paths = vec![];
    for endpoint in endpoints.iter().sorted() {
        for successor in graph.out_neighbors(endpoint) {
            if !endpoints.contains(&successor) {
                paths.push(trace_path(graph, *endpoint, successor, endpoints)?);
            }
        }
    }
    Ok(paths)
}

/// walks forward from an endpoint through interstitial nodes, choosing the
/// unique unvisited out-neighbor at each step, until another endpoint is
/// reached. rings close back onto the starting endpoint.
fn trace_path(
    graph: &StreetGraph,
    endpoint: NodeId,
    endpoint_successor: NodeId,
    endpoints: &HashSet<NodeId>,
) -> Result<Vec<NodeId>, NetworkError> {
    let mut path = vec![endpoint, endpoint_successor];
    let mut current = endpoint_successor;
    let mut steps: usize = 0;

    while !endpoints.contains(&current) {
        steps += 1;
        if steps > MAX_PATH_STEPS {
            return Err(NetworkError::GraphTooComplex(format!(
                "chain from node {endpoint} exceeded {MAX_PATH_STEPS} steps"
            )));
        }
        let successors = graph
            .out_neighbors(&current)
            .into_iter()
            .filter(|n| !path.contains(n))
            .collect_vec();
        match successors[..] {
            [next] => {
                path.push(next);
                current = next;
            }
            [] => {
                // a ring: every successor is already on the path. close it
                // back onto the origin endpoint when possible.
                if graph.out_neighbors(&current).contains(&endpoint) {
                    path.push(endpoint);
                }
                return Ok(path);
            }
            _ => {
                // should not occur when the endpoint predicate is correct
                log::warn!("unexpected branching while tracing through node {current}");
                return Ok(path);
            }
        }
    }
    Ok(path)
}

/// builds the replacement edge for a traced chain: lengths sum, way ids
/// accumulate in visit order, tag values deduplicate to a scalar or list,
/// and the geometry runs through the chain node coordinates.
fn merge_path_edges(
    graph: &StreetGraph,
    path: &[NodeId],
    track_merged: bool,
) -> Result<EdgeData, NetworkError> {
    if path.len() < 2 {
        return Err(NetworkError::SimplificationError(String::from(
            "cannot merge a path with fewer than two nodes",
        )));
    }

    let mut length_total: f64 = 0.0;
    let mut osmids: Vec<WayId> = vec![];
    let mut oneways: Vec<bool> = vec![];
    let mut reverses: Vec<bool> = vec![];
    let mut tag_values: Vec<(String, AttrValue)> = vec![];

    for (u, v) in path.iter().tuple_windows() {
        let multiedges = graph.edges_between(u, v);
        // parallel chain edges collapse to the lowest insertion key
        let edge = multiedges.first().ok_or_else(|| {
            NetworkError::SimplificationError(format!(
                "traced chain segment ({u})->({v}) has no edge"
            ))
        })?;
        if multiedges.len() > 1 {
            log::debug!(
                "multiple parallel edges on chain segment ({u})->({v}); merging the first"
            );
        }

        if edge.length.is_finite() {
            length_total += edge.length;
        }
        for osmid in edge.osmid.iter() {
            if !osmids.contains(osmid) {
                osmids.push(*osmid);
            }
        }
        oneways.push(edge.oneway);
        reverses.push(edge.reversed);
        for (key, value) in edge.tags.iter() {
            tag_values.push((key.clone(), value.clone()));
        }
    }

    let geometry = LineString(
        path.iter()
            .map(|node_id| {
                let node = graph.node(node_id)?;
                Ok(Coord::from((node.x, node.y)))
            })
            .collect::<Result<Vec<_>, NetworkError>>()?,
    );

    let mut merged = EdgeData {
        key: 0,
        osmid: osmids,
        length: length_total,
        oneway: oneways.iter().all_equal() && oneways[0],
        reversed: reverses.iter().all_equal() && reverses[0],
        geometry: Some(geometry),
        ..Default::default()
    };
    if track_merged {
        merged.merged_edges = path.iter().tuple_windows().map(|(u, v)| (*u, *v)).collect();
    }
    for key in tag_values.iter().map(|(k, _)| k.clone()).unique().collect_vec() {
        let values = tag_values
            .iter()
            .filter(|(k, _)| *k == key)
            .map(|(_, v)| v.clone())
            .collect_vec();
        if let Some(value) = AttrValue::merged(values) {
            merged.tags.insert(key, value);
        }
    }
    Ok(merged)
}

/// drops nodes whose only remaining connection is a self-loop.
fn remove_isolated_rings(graph: &mut StreetGraph) -> Result<(), NetworkError> {
    let ring_nodes = graph
        .node_ids()
        .into_iter()
        .filter(|n| {
            graph.has_self_loop(n) && graph.neighbor_set(n).iter().all(|m| m == n)
        })
        .collect_vec();
    if !ring_nodes.is_empty() {
        log::info!("removing {} isolated self-loop rings", ring_nodes.len());
    }
    for node_id in ring_nodes.into_iter() {
        graph.remove_node(&node_id)?;
    }
    Ok(())
}
