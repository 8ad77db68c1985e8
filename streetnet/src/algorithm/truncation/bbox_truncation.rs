use crate::geometry::Bbox;
use crate::model::graph::{NodeId, StreetGraph};
use crate::model::NetworkError;
use geo::Intersects;
use itertools::Itertools;

/// drops every node outside the bbox.
///
/// with `truncate_by_edge`, an outside node is reprieved when any incident
/// edge's linestring (or the straight segment between its endpoints)
/// intersects the bbox polygon, so edges crossing the boundary keep both
/// ends.
pub fn truncate_graph_bbox(
    graph: &mut StreetGraph,
    bbox: &Bbox,
    truncate_by_edge: bool,
) -> Result<(), NetworkError> {
    let outside = graph
        .node_ids()
        .into_iter()
        .filter(|node_id| {
            graph
                .node(node_id)
                .map(|n| !bbox.contains(n.point()))
                .unwrap_or(false)
        })
        .collect_vec();
    log::info!(
        "{} of {} nodes lie outside the bbox {}",
        outside.len(),
        graph.n_nodes(),
        bbox
    );

    let to_remove = if truncate_by_edge {
        let bbox_polygon = bbox.polygon();
        let mut dropped = vec![];
        for node_id in outside.into_iter() {
            if !has_edge_into_bbox(graph, &node_id, &bbox_polygon)? {
                dropped.push(node_id);
            }
        }
        dropped
    } else {
        outside
    };

    let n_removed = to_remove.len();
    for node_id in to_remove.into_iter() {
        graph.remove_node(&node_id)?;
    }
    log::info!("removed {n_removed} nodes; {} remain", graph.n_nodes());
    Ok(())
}

/// whether any edge incident to the node crosses into the bbox polygon.
fn has_edge_into_bbox(
    graph: &StreetGraph,
    node_id: &NodeId,
    bbox_polygon: &geo::Polygon<f64>,
) -> Result<bool, NetworkError> {
    let node_point = graph.node(node_id)?.point();
    for neighbor in graph.neighbor_set(node_id) {
        let neighbor_point = graph.node(&neighbor)?.point();
        for edge in graph
            .edges_between(node_id, &neighbor)
            .into_iter()
            .chain(graph.edges_between(&neighbor, node_id))
        {
            let line = edge.linestring_or_straight(node_point, neighbor_point);
            if line.intersects(bbox_polygon) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::truncate_graph_bbox;
    use crate::geometry::Bbox;
    use crate::model::graph::{Crs, EdgeData, NodeData, NodeId, StreetGraph, WayId};

    /// node A inside the unit-square bbox, node B far outside, connected by
    /// a straight edge crossing the boundary.
    fn crossing_graph() -> StreetGraph {
        let mut graph = StreetGraph::new(Crs::default_geographic(), "test");
        graph.add_node(NodeData::new(NodeId(1), 0.5, 0.5)).unwrap();
        graph.add_node(NodeData::new(NodeId(2), 2.0, 2.0)).unwrap();
        graph
            .add_edge(
                NodeId(1),
                NodeId(2),
                EdgeData::new(WayId(1), 100.0, false, false),
            )
            .unwrap();
        graph
            .add_edge(
                NodeId(2),
                NodeId(1),
                EdgeData::new(WayId(1), 100.0, false, true),
            )
            .unwrap();
        graph
    }

    #[test]
    fn test_strict_truncation_drops_outside_node() {
        let mut graph = crossing_graph();
        let bbox = Bbox::new(1.0, 0.0, 1.0, 0.0).unwrap();
        truncate_graph_bbox(&mut graph, &bbox, false).unwrap();
        assert!(graph.has_node(&NodeId(1)));
        assert!(!graph.has_node(&NodeId(2)));
        assert_eq!(graph.n_edges(), 0);
    }

    #[test]
    fn test_edge_aware_truncation_reprieves_crossing_neighbor() {
        let mut graph = crossing_graph();
        let bbox = Bbox::new(1.0, 0.0, 1.0, 0.0).unwrap();
        truncate_graph_bbox(&mut graph, &bbox, true).unwrap();
        assert!(graph.has_node(&NodeId(2)));
        assert_eq!(graph.n_edges(), 2);
    }

    #[test]
    fn test_disconnected_outside_node_still_dropped() {
        let mut graph = crossing_graph();
        graph.add_node(NodeData::new(NodeId(3), 5.0, 5.0)).unwrap();
        let bbox = Bbox::new(1.0, 0.0, 1.0, 0.0).unwrap();
        truncate_graph_bbox(&mut graph, &bbox, true).unwrap();
        assert!(!graph.has_node(&NodeId(3)));
    }
}
