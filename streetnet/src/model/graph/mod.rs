mod attr_value;
mod crs;
mod direction;
mod edge_data;
mod node_data;
mod node_id;
mod street_graph;
mod way_id;

pub use attr_value::AttrValue;
pub use crs::Crs;
pub use direction::Direction;
pub use edge_data::EdgeData;
pub use node_data::NodeData;
pub use node_id::NodeId;
pub use street_graph::{AdjacencyList, EdgesByOd, Nodes, StreetGraph};
pub use way_id::WayId;
