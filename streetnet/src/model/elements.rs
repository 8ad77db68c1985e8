use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

/// one batch of raw map elements, the unit of exchange with the element
/// fetcher and the local file loaders. batches arrive in order and each is
/// fully parsed before the next is requested.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementBatch {
    pub elements: Vec<RawElement>,
}

/// a raw corpus element. only nodes and ways participate in graph
/// construction; other element types are dropped by the loaders with a
/// logged count.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RawElement {
    Node {
        id: i64,
        lat: f64,
        lon: f64,
        #[serde(default)]
        tags: BTreeMap<String, String>,
    },
    Way {
        id: i64,
        #[serde(default)]
        nodes: Vec<i64>,
        #[serde(default)]
        tags: BTreeMap<String, String>,
    },
}

/// the travel modes a network can be built for. the type picks the way
/// filter and decides whether edges are emitted in both directions when no
/// oneway tag says otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum NetworkType {
    Drive,
    DriveService,
    Walk,
    Bike,
    All,
    AllPrivate,
}

impl Display for NetworkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            NetworkType::Drive => "drive",
            NetworkType::DriveService => "drive_service",
            NetworkType::Walk => "walk",
            NetworkType::Bike => "bike",
            NetworkType::All => "all",
            NetworkType::AllPrivate => "all_private",
        };
        write!(f, "{label}")
    }
}

/// highway values that never carry traffic regardless of network type.
/// see https://wiki.openstreetmap.org/wiki/Key:highway
const UNUSABLE_HIGHWAY_VALUES: [&str; 8] = [
    "abandoned",
    "construction",
    "no",
    "planned",
    "platform",
    "proposed",
    "raceway",
    "razed",
];

const NON_DRIVABLE_HIGHWAY_VALUES: [&str; 9] = [
    "bridleway",
    "corridor",
    "cycleway",
    "footway",
    "path",
    "pedestrian",
    "steps",
    "track",
    "elevator",
];

const NON_WALKABLE_HIGHWAY_VALUES: [&str; 2] = ["motorway", "motorway_link"];

impl NetworkType {
    /// decides whether a way participates in a network of this type.
    /// ways without a highway tag, mapped areas, and out-of-service roads
    /// are rejected for every type; the per-type rules narrow from there.
    pub fn accept_way(&self, tags: &BTreeMap<String, String>) -> bool {
        let highway = match tags.get("highway") {
            Some(h) => h.as_str(),
            None => return false,
        };
        if UNUSABLE_HIGHWAY_VALUES.contains(&highway) {
            return false;
        }
        if tags.get("area").map(|a| a == "yes").unwrap_or(false) {
            return false;
        }
        let private_access = tags.get("access").map(|a| a == "private").unwrap_or(false)
            || tags.get("service").map(|s| s == "private").unwrap_or(false);

        match self {
            NetworkType::Drive => {
                !private_access
                    && !NON_DRIVABLE_HIGHWAY_VALUES.contains(&highway)
                    && tags.get("service").map(|s| s != "parking_aisle").unwrap_or(true)
            }
            NetworkType::DriveService => {
                !private_access && !NON_DRIVABLE_HIGHWAY_VALUES.contains(&highway)
            }
            NetworkType::Walk => {
                !private_access
                    && !NON_WALKABLE_HIGHWAY_VALUES.contains(&highway)
                    && tags.get("foot").map(|f| f != "no").unwrap_or(true)
            }
            NetworkType::Bike => {
                !private_access
                    && !NON_WALKABLE_HIGHWAY_VALUES.contains(&highway)
                    && highway != "footway"
                    && tags.get("bicycle").map(|b| b != "no").unwrap_or(true)
            }
            NetworkType::All => !private_access,
            NetworkType::AllPrivate => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NetworkType, RawElement};
    use std::collections::BTreeMap;

    fn tags(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (String::from(*k), String::from(*v)))
            .collect()
    }

    #[test]
    fn test_deserialize_overpass_elements() {
        let raw = r#"{"type":"node","id":42,"lat":39.7,"lon":-104.9,"tags":{"highway":"crossing"}}"#;
        let element: RawElement = serde_json::from_str(raw).unwrap();
        match element {
            RawElement::Node { id, lat, lon, tags } => {
                assert_eq!(id, 42);
                assert!((lat - 39.7).abs() < f64::EPSILON);
                assert!((lon + 104.9).abs() < f64::EPSILON);
                assert_eq!(tags.get("highway").map(String::as_str), Some("crossing"));
            }
            _ => panic!("expected a node element"),
        }
    }

    #[test]
    fn test_drive_rejects_footways() {
        assert!(!NetworkType::Drive.accept_way(&tags(&[("highway", "footway")])));
        assert!(NetworkType::Walk.accept_way(&tags(&[("highway", "footway")])));
        assert!(NetworkType::Drive.accept_way(&tags(&[("highway", "residential")])));
    }

    #[test]
    fn test_all_types_reject_unusable_ways() {
        for network_type in [NetworkType::Drive, NetworkType::Walk, NetworkType::AllPrivate] {
            assert!(!network_type.accept_way(&tags(&[("highway", "proposed")])));
            assert!(!network_type.accept_way(&tags(&[("building", "yes")])));
        }
    }

    #[test]
    fn test_walk_rejects_motorways() {
        assert!(!NetworkType::Walk.accept_way(&tags(&[("highway", "motorway")])));
        assert!(NetworkType::Drive.accept_way(&tags(&[("highway", "motorway")])));
    }
}
