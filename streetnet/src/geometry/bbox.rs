use super::great_circle::destination;
use crate::model::NetworkError;
use geo::{Coord, Point, Polygon, Rect};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// a bounding box in the fixed public order [north, south, east, west].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bbox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Bbox {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Result<Bbox, NetworkError> {
        if north < south {
            return Err(NetworkError::InvalidInput(format!(
                "bbox north {north} is south of bbox south {south}; order is [north, south, east, west]"
            )));
        }
        if east < west {
            return Err(NetworkError::InvalidInput(format!(
                "bbox east {east} is west of bbox west {west}; order is [north, south, east, west]"
            )));
        }
        Ok(Bbox {
            north,
            south,
            east,
            west,
        })
    }

    /// the box reaching `dist_m` meters from `center` in each cardinal
    /// direction, computed with great-circle destination offsets.
    pub fn from_point(center: Point<f64>, dist_m: f64) -> Bbox {
        let north = destination(center, 0.0, dist_m).y();
        let east = destination(center, 90.0, dist_m).x();
        let south = destination(center, 180.0, dist_m).y();
        let west = destination(center, 270.0, dist_m).x();
        Bbox {
            north,
            south,
            east,
            west,
        }
    }

    pub fn from_array(values: [f64; 4]) -> Result<Bbox, NetworkError> {
        Bbox::new(values[0], values[1], values[2], values[3])
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.north, self.south, self.east, self.west]
    }

    /// inclusive containment test.
    pub fn contains(&self, point: Point<f64>) -> bool {
        point.y() <= self.north
            && point.y() >= self.south
            && point.x() <= self.east
            && point.x() >= self.west
    }

    pub fn polygon(&self) -> Polygon<f64> {
        Rect::new(
            Coord::from((self.west, self.south)),
            Coord::from((self.east, self.north)),
        )
        .to_polygon()
    }
}

impl Display for Bbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.north, self.south, self.east, self.west
        )
    }
}
