use crate::model::elements::NetworkType;
use crate::model::NetworkError;
use serde::{Deserialize, Serialize};

/// immutable crate-wide defaults. constructed once and passed by reference
/// into builders and collaborators; nothing in the crate mutates a settings
/// value after construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// CRS code stamped on newly built graphs
    pub default_crs: String,
    /// product tag stamped on newly built graphs as `created_with`
    pub product_tag: String,
    /// treat every way as oneway regardless of tags
    pub all_oneway: bool,
    /// network types whose ways are traversable in both directions when no
    /// oneway tag says otherwise
    pub bidirectional_network_types: Vec<NetworkType>,
    /// node tags retained during graph construction
    pub useful_tags_node: Vec<String>,
    /// way tags retained during graph construction
    pub useful_tags_way: Vec<String>,
    /// ceiling in square meters before a query polygon is subdivided;
    /// consumed by fetcher collaborators
    pub max_query_area_size: f64,
    /// network timeout passed through to fetcher/geocoder collaborators
    pub requests_timeout_secs: u64,
    /// user agent passed through to fetcher/geocoder collaborators
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            default_crs: String::from("epsg:4326"),
            product_tag: format!("streetnet {}", env!("CARGO_PKG_VERSION")),
            all_oneway: false,
            bidirectional_network_types: vec![NetworkType::Walk],
            useful_tags_node: ["ref", "highway", "junction", "railway", "ele"]
                .into_iter()
                .map(String::from)
                .collect(),
            useful_tags_way: [
                "bridge", "tunnel", "oneway", "lanes", "ref", "name", "highway", "maxspeed",
                "service", "access", "area", "landuse", "width", "est_width", "junction",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            max_query_area_size: 50.0 * 1000.0 * 50.0 * 1000.0,
            requests_timeout_secs: 180,
            user_agent: format!("streetnet/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl TryFrom<&String> for Settings {
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
                "unsupported settings file type: {f}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Settings;
    use crate::model::elements::NetworkType;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.default_crs, "epsg:4326");
        assert!(!settings.all_oneway);
        assert!(settings
            .bidirectional_network_types
            .contains(&NetworkType::Walk));
        assert!(settings.useful_tags_way.iter().any(|t| t == "maxspeed"));
    }
}
