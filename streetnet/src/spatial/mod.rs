mod edge_index;
mod node_index;
mod quadrats;

pub use edge_index::EdgeIndex;
pub use node_index::NodeIndex;
pub use quadrats::Quadrats;
