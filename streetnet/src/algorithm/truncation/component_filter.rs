use crate::algorithm::components::largest_component_nodes;
use crate::model::graph::StreetGraph;
use crate::model::NetworkError;
use itertools::Itertools;
use std::collections::HashSet;

/// mutates the graph in place so only the largest weakly (or strongly)
/// connected component remains.
pub fn retain_largest_component(
    graph: &mut StreetGraph,
    strongly: bool,
) -> Result<(), NetworkError> {
    let keep: HashSet<_> = largest_component_nodes(graph, strongly)
        .ok_or_else(|| {
            NetworkError::InvalidInput(String::from(
                "cannot take the largest component of an empty graph",
            ))
        })?
        .into_iter()
        .collect();
    let to_remove = graph
        .node_ids()
        .into_iter()
        .filter(|node_id| !keep.contains(node_id))
        .collect_vec();
    let n_removed = to_remove.len();
    for node_id in to_remove.into_iter() {
        graph.remove_node(&node_id)?;
    }
    log::info!(
        "removed {n_removed} nodes outside the largest {} component; {} remain",
        if strongly { "strong" } else { "weak" },
        graph.n_nodes()
    );
    Ok(())
}
