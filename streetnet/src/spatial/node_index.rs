use crate::model::graph::{Crs, NodeId, StreetGraph};
use crate::model::NetworkError;
use geo::Point;
use itertools::Itertools;
use rstar::{primitives::GeomWithData, RTree};

pub type IndexedNode = GeomWithData<[f64; 2], NodeId>;

/// planar candidates examined when refining a geographic nearest-node query
/// with the great-circle metric.
const REFINEMENT_CANDIDATES: usize = 16;

/// static spatial index over the graph's finite-coordinate nodes.
///
/// queries filter candidates with the planar tree and, for geographic
/// graphs, refine by great-circle distance so longitude compression at high
/// latitudes cannot flip the winner.
pub struct NodeIndex {
    tree: RTree<IndexedNode>,
    crs: Crs,
}

impl NodeIndex {
    pub fn new(graph: &StreetGraph) -> Result<NodeIndex, NetworkError> {
        let entries = graph
            .nodes_iter()
            .filter(|(_, node)| node.has_finite_coords())
            .map(|(node_id, node)| GeomWithData::new([node.x, node.y], *node_id))
            .collect_vec();
        if entries.is_empty() {
            return Err(NetworkError::InvalidInput(String::from(
                "cannot build a spatial index over a graph with no located nodes",
            )));
        }
        Ok(NodeIndex {
            tree: RTree::bulk_load(entries),
            crs: graph.crs().clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// id of the nearest node and its distance in meters.
    pub fn nearest_node(&self, point: Point<f64>) -> Option<(NodeId, f64)> {
        self.nearest_nodes(point, 1).into_iter().next()
    }

    /// the k nearest nodes by the graph's metric, closest first. ties break
    /// toward the smaller node id.
    pub fn nearest_nodes(&self, point: Point<f64>, k: usize) -> Vec<(NodeId, f64)> {
        let window = k.max(REFINEMENT_CANDIDATES);
        let candidates = self
            .tree
            .nearest_neighbor_iter(&[point.x(), point.y()])
            .take(window)
            .map(|obj| {
                let candidate = Point::new(obj.geom()[0], obj.geom()[1]);
                (obj.data, self.crs.distance(point, candidate))
            })
            .collect_vec();
        candidates
            .into_iter()
            .sorted_by(|a, b| {
                a.1.partial_cmp(&b.1)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.0.cmp(&b.0))
            })
            .take(k)
            .collect_vec()
    }

    /// all nodes within a meter radius of the point. the planar envelope is
    /// padded for geographic graphs, then every candidate is verified with
    /// the true metric.
    pub fn nodes_within(&self, point: Point<f64>, radius_m: f64) -> Vec<(NodeId, f64)> {
        let planar_radius = match &self.crs {
            Crs::Projected(_) => radius_m,
            Crs::Geographic(_) => {
                // meters to degrees, padded for longitude compression and
                // the diagonal of the degree-space envelope
                let meters_per_degree =
                    crate::geometry::EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
                let cos_lat = point.y().to_radians().cos().abs().max(1e-6);
                radius_m / meters_per_degree / cos_lat * std::f64::consts::SQRT_2
            }
        };
        self.tree
            .locate_within_distance([point.x(), point.y()], planar_radius * planar_radius)
            .map(|obj| {
                let candidate = Point::new(obj.geom()[0], obj.geom()[1]);
                (obj.data, self.crs.distance(point, candidate))
            })
            .filter(|(_, distance)| *distance <= radius_m)
            .sorted_by(|a, b| a.0.cmp(&b.0))
            .collect_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::NodeIndex;
    use crate::model::graph::{Crs, NodeData, NodeId, StreetGraph};
    use geo::Point;

    fn located_graph() -> StreetGraph {
        let mut graph = StreetGraph::new(Crs::default_geographic(), "test");
        graph
            .add_node(NodeData::new(NodeId(1), -105.0, 39.7))
            .unwrap();
        graph
            .add_node(NodeData::new(NodeId(2), -105.001, 39.7))
            .unwrap();
        graph
            .add_node(NodeData::new(NodeId(3), -105.1, 39.8))
            .unwrap();
        graph
    }

    #[test]
    fn test_nearest_node() {
        let index = NodeIndex::new(&located_graph()).unwrap();
        let (node_id, distance) = index.nearest_node(Point::new(-105.0001, 39.7)).unwrap();
        assert_eq!(node_id, NodeId(1));
        assert!(distance < 20.0);
    }

    #[test]
    fn test_nearest_nodes_ordered() {
        let index = NodeIndex::new(&located_graph()).unwrap();
        let nearest = index.nearest_nodes(Point::new(-105.0, 39.7), 2);
        assert_eq!(nearest.len(), 2);
        assert_eq!(nearest[0].0, NodeId(1));
        assert_eq!(nearest[1].0, NodeId(2));
        assert!(nearest[0].1 <= nearest[1].1);
    }

    #[test]
    fn test_nodes_within_radius() {
        let index = NodeIndex::new(&located_graph()).unwrap();
        // nodes 1 and 2 are ~86 m apart at this latitude
        let within = index.nodes_within(Point::new(-105.0, 39.7), 200.0);
        assert_eq!(within.len(), 2);
        let far = index.nodes_within(Point::new(-105.0, 39.7), 10.0);
        assert_eq!(far.len(), 1);
    }

    #[test]
    fn test_skips_unlocated_nodes() {
        let mut graph = located_graph();
        graph
            .add_node(NodeData::new(NodeId(9), f64::NAN, f64::NAN))
            .unwrap();
        let index = NodeIndex::new(&graph).unwrap();
        assert_eq!(index.len(), 3);
    }
}
