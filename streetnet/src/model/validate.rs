use super::graph::StreetGraph;
use super::NetworkError;

/// checks the structural invariants an analysis-ready graph must hold:
/// finite node coordinates and finite, non-negative edge lengths.
///
/// findings are returned as warning strings (and logged). in strict mode
/// any finding fails with [`NetworkError::ValidationFailed`].
pub fn validate_graph(graph: &StreetGraph, strict: bool) -> Result<Vec<String>, NetworkError> {
    let mut warnings = vec![];

    for (node_id, node) in graph.nodes_iter() {
        if !node.has_finite_coords() {
            warnings.push(format!("node {node_id} has non-finite coordinates"));
        }
    }
    for (src, dst, edge) in graph.edges_iter() {
        if !edge.length.is_finite() || edge.length < 0.0 {
            warnings.push(format!(
                "edge ({src})-[{}]->({dst}) has invalid length {}",
                edge.key, edge.length
            ));
        }
    }

    for warning in warnings.iter() {
        log::warn!("{warning}");
    }
    if strict && !warnings.is_empty() {
        return Err(NetworkError::ValidationFailed(format!(
            "{} problems found; first: {}",
            warnings.len(),
            warnings[0]
        )));
    }
    Ok(warnings)
}
