use super::{AttrValue, NodeId, WayId};
use geo::{Coord, LineString, Point};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// a directed road segment. parallel edges between the same ordered node
/// pair are distinguished by `key`, assigned at insertion and stable under
/// removal of sibling edges.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct EdgeData {
    pub key: usize,
    /// source way id(s); more than one after simplification merges ways
    pub osmid: Vec<WayId>,
    /// segment length in meters
    pub length: f64,
    pub oneway: bool,
    /// true when this edge runs opposite the source way's node order
    pub reversed: bool,
    /// full segment geometry in the graph CRS; absent edges are straight
    /// lines between their endpoint coordinates
    pub geometry: Option<LineString<f64>>,
    pub speed_kph: Option<f64>,
    pub travel_time: Option<f64>,
    pub bearing: Option<f64>,
    pub grade: Option<f64>,
    /// original (u, v) constituent pairs recorded by simplification when
    /// path tracking is enabled. parallel-edge keys are not preserved.
    pub merged_edges: Vec<(NodeId, NodeId)>,
    /// retained corpus tags (highway, maxspeed, name, ...)
    pub tags: BTreeMap<String, AttrValue>,
}

impl EdgeData {
    pub fn new(osmid: WayId, length: f64, oneway: bool, reversed: bool) -> EdgeData {
        EdgeData {
            osmid: vec![osmid],
            length,
            oneway,
            reversed,
            ..Default::default()
        }
    }

    /// the stored linestring, or a straight fallback between the provided
    /// endpoint coordinates.
    pub fn linestring_or_straight(&self, u: Point<f64>, v: Point<f64>) -> LineString<f64> {
        match &self.geometry {
            Some(ls) => ls.clone(),
            None => LineString(vec![Coord::from((u.x(), u.y())), Coord::from((v.x(), v.y()))]),
        }
    }
}
