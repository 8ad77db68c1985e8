use super::{AttrValue, NodeId};
use geo::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// a graph vertex: a road junction or way terminus. may be an original
/// corpus record or a consolidation representative; representatives carry
/// the subsumed ids in `merged_nodes` and centroid coordinates.
///
/// note: when a representative is itself removed by a later truncation, its
/// `merged_nodes` record is dropped with it.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct NodeData {
    pub osmid: NodeId,
    /// longitude, or easting when the graph CRS is projected
    pub x: f64,
    /// latitude, or northing when the graph CRS is projected
    pub y: f64,
    pub street_count: Option<u32>,
    pub elevation: Option<f64>,
    /// ids subsumed by this node during consolidation
    pub merged_nodes: Vec<NodeId>,
    /// retained corpus tags (highway, junction, ref, ...)
    pub tags: BTreeMap<String, AttrValue>,
}

impl NodeData {
    pub fn new(osmid: NodeId, x: f64, y: f64) -> NodeData {
        NodeData {
            osmid,
            x,
            y,
            ..Default::default()
        }
    }

    pub fn point(&self) -> Point<f64> {
        Point::new(self.x, self.y)
    }

    /// a node retained in a graph intended for analysis has finite x,y.
    pub fn has_finite_coords(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}
