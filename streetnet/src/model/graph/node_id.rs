use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Deserialize, Serialize, Hash,
)]
pub struct NodeId(pub i64);

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl NodeId {
    /// node ids cross the exchange boundary as strings. "lexicographic"
    /// orderings elsewhere in the crate are defined over this encoding.
    pub fn encoded(&self) -> String {
        self.0.to_string()
    }
}
