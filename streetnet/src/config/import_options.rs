use crate::model::elements::NetworkType;
use crate::model::NetworkError;
use serde::{Deserialize, Serialize};

/// defines the behaviors of one end-to-end network import: which ways are
/// kept, and which cleaning passes run in what configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    pub network_type: NetworkType,
    pub simplify: bool,
    /// record original (u, v) pairs on collapsed edges
    pub track_merged: bool,
    /// drop isolated self-loop rings after simplification
    pub remove_rings: bool,
    pub consolidate: bool,
    pub consolidation_tolerance_m: f64,
    /// optional [north, south, east, west] clip applied after building
    pub bbox: Option<[f64; 4]>,
    pub truncate_by_edge: bool,
    pub keep_largest_component: bool,
    /// when keeping the largest component, require strong connectivity
    pub strongly_connected: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions {
            network_type: NetworkType::Drive,
            simplify: true,
            track_merged: false,
            remove_rings: true,
            consolidate: false,
            consolidation_tolerance_m: 10.0,
            bbox: None,
            truncate_by_edge: true,
            keep_largest_component: true,
            strongly_connected: false,
        }
    }
}

impl TryFrom<&String> for ImportOptions {
    type Error = NetworkError;

    fn try_from(f: &String) -> Result<Self, Self::Error> {
        if f.ends_with(".toml") {
            let s = std::fs::read_to_string(f).map_err(|e| {
                NetworkError::ConfigurationError(format!("failure reading {f}: {e}"))
            })?;
            toml::from_str(&s).map_err(|e| {
                NetworkError::ConfigurationError(format!("failure decoding {f}: {e}"))
            })
        } else if f.ends_with(".json") {
            let s = std::fs::read_to_string(f).map_err(|e| {
                NetworkError::ConfigurationError(format!("failure reading {f}: {e}"))
            })?;
            serde_json::from_str(&s).map_err(|e| {
                NetworkError::ConfigurationError(format!("failure decoding {f}: {e}"))
            })
        } else {
            Err(NetworkError::ConfigurationError(format!(
                "unsupported import options file type: {f}"
            )))
        }
    }
}
