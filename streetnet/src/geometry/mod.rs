mod bbox;
mod great_circle;
mod lines;

pub use bbox::Bbox;
pub use great_circle::{
    bearing, destination, euclidean_distance, great_circle_distance, EARTH_RADIUS_M,
};
pub use lines::{buffer_polygon_meters, interpolate_point, line_length};
