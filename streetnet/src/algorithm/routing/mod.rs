mod dijkstra;
mod k_shortest;
mod speed_ops;

pub use dijkstra::{
    edge_weight, path_cost, shortest_path, shortest_paths, single_source_distances,
};
pub use k_shortest::k_shortest_paths;
pub use speed_ops::{
    add_edge_speeds, add_edge_travel_times, parse_maxspeed, parse_maxspeed_value,
};
