use crate::model::graph::StreetGraph;
use crate::model::NetworkError;
use crate::spatial::Quadrats;
use geo::{Geometry, MultiPolygon, Polygon};
use itertools::Itertools;
use std::collections::HashSet;

/// default quadrat width in coordinate units used to cut the clip polygon.
const DEFAULT_QUADRAT_WIDTH: f64 = 0.05;

/// drops every node whose point is not inside the polygon or multipolygon.
/// the containment tests run against quadrat pieces of the polygon so large
/// extents stay fast.
pub fn truncate_graph_polygon(
    graph: &mut StreetGraph,
    extent: &Geometry<f64>,
    quadrat_width: Option<f64>,
) -> Result<(), NetworkError> {
    let polygons: Vec<&Polygon<f64>> = match extent {
        Geometry::Polygon(p) => vec![p],
        Geometry::MultiPolygon(MultiPolygon(ps)) => ps.iter().collect(),
        _ => {
            return Err(NetworkError::InvalidInput(String::from(
                "truncation extent must be a POLYGON or MULTIPOLYGON",
            )))
        }
    };
    log::info!("identifying all nodes that lie outside the polygon");

    let node_ids = graph.node_ids();
    let points = node_ids
        .iter()
        .map(|node_id| graph.node(node_id).map(|n| n.point()))
        .collect::<Result<Vec<_>, _>>()?;

    let width = quadrat_width.unwrap_or(DEFAULT_QUADRAT_WIDTH);
    let mut inside: HashSet<usize> = HashSet::new();
    for polygon in polygons.into_iter() {
        let quadrats = Quadrats::new(polygon, width)?;
        inside.extend(quadrats.intersecting_points(&points));
    }

    let to_remove = node_ids
        .iter()
        .enumerate()
        .filter(|(index, _)| !inside.contains(index))
        .map(|(_, node_id)| *node_id)
        .collect_vec();
    let n_removed = to_remove.len();
    for node_id in to_remove.into_iter() {
        graph.remove_node(&node_id)?;
    }
    log::info!(
        "removed {n_removed} nodes outside the polygon; {} remain",
        graph.n_nodes()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::truncate_graph_polygon;
    use crate::model::graph::{Crs, EdgeData, NodeData, NodeId, StreetGraph, WayId};
    use geo::{polygon, Geometry};

    fn graph_around_origin() -> StreetGraph {
        let mut graph = StreetGraph::new(Crs::default_geographic(), "test");
        graph.add_node(NodeData::new(NodeId(1), 0.2, 0.2)).unwrap();
        graph.add_node(NodeData::new(NodeId(2), 0.8, 0.8)).unwrap();
        graph.add_node(NodeData::new(NodeId(3), 3.0, 3.0)).unwrap();
        graph
            .add_edge(
                NodeId(1),
                NodeId(2),
                EdgeData::new(WayId(1), 100.0, true, false),
            )
            .unwrap();
        graph
            .add_edge(
                NodeId(2),
                NodeId(3),
                EdgeData::new(WayId(2), 100.0, true, false),
            )
            .unwrap();
        graph
    }

    #[test]
    fn test_polygon_truncation_keeps_interior_nodes() {
        let mut graph = graph_around_origin();
        let extent = Geometry::Polygon(polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
        ]);
        truncate_graph_polygon(&mut graph, &extent, None).unwrap();
        assert!(graph.has_node(&NodeId(1)));
        assert!(graph.has_node(&NodeId(2)));
        assert!(!graph.has_node(&NodeId(3)));
        assert_eq!(graph.n_edges(), 1);
    }

    #[test]
    fn test_non_polygon_extent_rejected() {
        let mut graph = graph_around_origin();
        let extent = Geometry::Point(geo::Point::new(0.0, 0.0));
        let result = truncate_graph_polygon(&mut graph, &extent, None);
        assert!(result.is_err());
    }
}
