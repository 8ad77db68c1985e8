use crate::model::elements::{ElementBatch, RawElement};
use crate::model::NetworkError;
use std::path::Path;

/// parses an Overpass-style JSON response document into one element batch.
/// elements other than nodes and ways (relations, areas) are dropped with
/// a logged count.
pub fn read_overpass_json(content: &str) -> Result<ElementBatch, NetworkError> {
    let document: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| NetworkError::JsonError(format!("response is not valid JSON: {e}")))?;
    let raw_elements = document
        .get("elements")
        .and_then(|v| v.as_array())
        .ok_or_else(|| {
            NetworkError::JsonError(String::from("response carries no 'elements' array"))
        })?;

    let mut elements = vec![];
    let mut skipped: usize = 0;
    for raw in raw_elements.iter() {
        match raw.get("type").and_then(|t| t.as_str()) {
            Some("node") | Some("way") => {
                let element: RawElement = serde_json::from_value(raw.clone()).map_err(|e| {
                    NetworkError::JsonError(format!("malformed element: {e}"))
                })?;
                elements.push(element);
            }
            _ => skipped += 1,
        }
    }
    if skipped > 0 {
        log::warn!("dropped {skipped} non-node, non-way elements from response");
    }
    log::info!("parsed {} elements from JSON response", elements.len());
    Ok(ElementBatch { elements })
}

pub fn load_overpass_json(path: &Path) -> Result<ElementBatch, NetworkError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| NetworkError::FileError(path.display().to_string(), e))?;
    read_overpass_json(&content)
}

#[cfg(test)]
mod tests {
    use super::read_overpass_json;
    use crate::model::elements::RawElement;

    const SAMPLE: &str = r#"{
  "version": 0.6,
  "elements": [
    {"type": "node", "id": 1, "lat": 39.7, "lon": -105.0},
    {"type": "node", "id": 2, "lat": 39.8, "lon": -105.1, "tags": {"highway": "crossing"}},
    {"type": "way", "id": 100, "nodes": [1, 2], "tags": {"highway": "residential"}},
    {"type": "relation", "id": 50, "members": []}
  ]
}"#;

    #[test]
    fn test_parses_elements() {
        let batch = read_overpass_json(SAMPLE).unwrap();
        assert_eq!(batch.elements.len(), 3);
        assert!(matches!(&batch.elements[2], RawElement::Way { id: 100, .. }));
    }

    #[test]
    fn test_missing_elements_array() {
        assert!(read_overpass_json("{}").is_err());
        assert!(read_overpass_json("not json").is_err());
    }
}
