mod orientation;
mod streets;

pub use orientation::{add_edge_bearings, graph_bearings, orientation_entropy};
pub use streets::{
    count_streets_per_node, intersection_count, street_length_total, street_segment_count,
};

use crate::geometry::great_circle_distance;
use crate::model::graph::StreetGraph;
use crate::model::NetworkError;
use serde::Serialize;

/// sum of all finite directed edge lengths in meters.
pub fn edge_length_total(graph: &StreetGraph) -> f64 {
    graph
        .edges_iter()
        .map(|(_, _, edge)| edge.length)
        .filter(|length| length.is_finite())
        .sum()
}

/// share of directed edges that are self-loops.
pub fn self_loop_proportion(graph: &StreetGraph) -> Option<f64> {
    let total = graph.n_edges();
    if total == 0 {
        return None;
    }
    let loops = graph
        .edge_triples()
        .into_iter()
        .filter(|(u, v, _)| u == v)
        .count();
    Some(loops as f64 / total as f64)
}

/// mean ratio of edge length to the straight-line distance between its
/// endpoints. segments with a zero straight-line chord or a non-finite
/// length are skipped; None when no edge qualifies.
pub fn circuity_avg(graph: &StreetGraph) -> Result<Option<f64>, NetworkError> {
    let mut ratios: Vec<f64> = vec![];
    let mut skipped: usize = 0;
    for (src, dst, edge) in graph.edges_iter() {
        if !edge.length.is_finite() {
            skipped += 1;
            continue;
        }
        let u = graph.node(&src)?.point();
        let v = graph.node(&dst)?.point();
        let chord = match graph.crs() {
            crs if crs.is_projected() => crs.distance(u, v),
            _ => great_circle_distance(u, v),
        };
        if chord <= 0.0 {
            skipped += 1;
            continue;
        }
        ratios.push(edge.length / chord);
    }
    if skipped > 0 {
        log::warn!("circuity skipped {skipped} edges with zero chords or non-finite lengths");
    }
    if ratios.is_empty() {
        return Ok(None);
    }
    Ok(Some(ratios.iter().sum::<f64>() / ratios.len() as f64))
}

/// summary of the morphometric measures for one graph.
#[derive(Debug, Clone, Serialize)]
pub struct GraphStats {
    pub n_nodes: usize,
    pub n_edges: usize,
    pub edge_length_total: f64,
    pub street_length_total: f64,
    pub street_segment_count: usize,
    pub intersection_count: usize,
    pub self_loop_proportion: Option<f64>,
    pub circuity_avg: Option<f64>,
    pub orientation_entropy: Option<f64>,
}

/// computes the full stats summary. orientation entropy is only populated
/// for geographic graphs.
pub fn graph_stats(graph: &StreetGraph) -> Result<GraphStats, NetworkError> {
    let entropy = if graph.crs().is_projected() {
        None
    } else {
        let bearings = graph_bearings(graph)?;
        orientation_entropy(&bearings, 36)
    };
    Ok(GraphStats {
        n_nodes: graph.n_nodes(),
        n_edges: graph.n_edges(),
        edge_length_total: edge_length_total(graph),
        street_length_total: street_length_total(graph),
        street_segment_count: street_segment_count(graph),
        intersection_count: intersection_count(graph, 2),
        self_loop_proportion: self_loop_proportion(graph),
        circuity_avg: circuity_avg(graph)?,
        orientation_entropy: entropy,
    })
}
