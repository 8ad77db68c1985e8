mod endpoints;
mod simplify_ops;

pub use endpoints::{find_endpoints, is_endpoint};
pub use simplify_ops::simplify_graph;
