use crate::geometry;
use geo::Point;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// coordinate reference system of a graph. distance semantics dispatch on
/// this variant rather than inspecting the code string: geographic graphs
/// measure great-circle meters over (lat, lon) degrees, projected graphs
/// measure planar meters over (x, y).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "code")]
pub enum Crs {
    Geographic(String),
    Projected(String),
}

impl Crs {
    pub const DEFAULT_GEOGRAPHIC_CODE: &'static str = "epsg:4326";

    pub fn default_geographic() -> Crs {
        Crs::Geographic(String::from(Self::DEFAULT_GEOGRAPHIC_CODE))
    }

    pub fn code(&self) -> &str {
        match self {
            Crs::Geographic(code) => code,
            Crs::Projected(code) => code,
        }
    }

    pub fn is_projected(&self) -> bool {
        matches!(self, Crs::Projected(_))
    }

    /// reconstructs the variant from a stored code string. UTM and other
    /// meter-unit codes are projected; the lat/lon codes are geographic.
    pub fn from_code(code: &str) -> Crs {
        let lower = code.to_lowercase();
        if lower == Self::DEFAULT_GEOGRAPHIC_CODE || lower == "epsg:4979" || lower == "crs84" {
            Crs::Geographic(lower)
        } else {
            Crs::Projected(lower)
        }
    }

    /// meter distance between two points under this reference system.
    pub fn distance(&self, a: Point<f64>, b: Point<f64>) -> f64 {
        match self {
            Crs::Geographic(_) => geometry::great_circle_distance(a, b),
            Crs::Projected(_) => geometry::euclidean_distance(a, b),
        }
    }
}

impl Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::Crs;

    #[test]
    fn test_from_code_roundtrip() {
        let crs = Crs::from_code("EPSG:4326");
        assert!(!crs.is_projected());
        assert_eq!(crs.code(), "epsg:4326");

        let utm = Crs::from_code("epsg:32613");
        assert!(utm.is_projected());
    }
}
