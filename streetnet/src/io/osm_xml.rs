use crate::model::elements::{ElementBatch, RawElement};
use crate::model::NetworkError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;
use std::path::Path;

/// parses a local map-XML document into one element batch: `<node>` and
/// `<way>` elements with their `<tag>`/`<nd>` children. any other element
/// type is dropped with a logged count.
pub fn read_osm_xml(content: &str) -> Result<ElementBatch, NetworkError> {
    let mut reader = Reader::from_str(content);
    let xml = |e: quick_xml::Error| NetworkError::XmlError(e.to_string());

    enum Pending {
        Node {
            id: i64,
            lat: f64,
            lon: f64,
            tags: BTreeMap<String, String>,
        },
        Way {
            id: i64,
            nodes: Vec<i64>,
            tags: BTreeMap<String, String>,
        },
        None,
    }

    let mut elements = vec![];
    let mut pending = Pending::None;
    let mut skipped: usize = 0;

    loop {
        let event = reader.read_event().map_err(xml)?;
        let is_empty = matches!(event, Event::Empty(_));
        match event {
            Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                b"node" => {
                    let id = parse_attr_i64(&e, b"id")?;
                    let lat = parse_attr_f64(&e, b"lat")?;
                    let lon = parse_attr_f64(&e, b"lon")?;
                    if is_empty {
                        elements.push(RawElement::Node {
                            id,
                            lat,
                            lon,
                            tags: BTreeMap::new(),
                        });
                    } else {
                        pending = Pending::Node {
                            id,
                            lat,
                            lon,
                            tags: BTreeMap::new(),
                        };
                    }
                }
                b"way" => {
                    let id = parse_attr_i64(&e, b"id")?;
                    if is_empty {
                        log::warn!("way {id} has no node references");
                    } else {
                        pending = Pending::Way {
                            id,
                            nodes: vec![],
                            tags: BTreeMap::new(),
                        };
                    }
                }
                b"nd" => {
                    if let Pending::Way { nodes, .. } = &mut pending {
                        nodes.push(parse_attr_i64(&e, b"ref")?);
                    }
                }
                b"tag" => {
                    let key = attr_value(&e, b"k")?;
                    let value = attr_value(&e, b"v")?;
                    match &mut pending {
                        Pending::Node { tags, .. } | Pending::Way { tags, .. } => {
                            tags.insert(key, value);
                        }
                        Pending::None => {}
                    }
                }
                b"relation" => {
                    skipped += 1;
                }
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"node" => {
                    if let Pending::Node { id, lat, lon, tags } =
                        std::mem::replace(&mut pending, Pending::None)
                    {
                        elements.push(RawElement::Node { id, lat, lon, tags });
                    }
                }
                b"way" => {
                    if let Pending::Way { id, nodes, tags } =
                        std::mem::replace(&mut pending, Pending::None)
                    {
                        elements.push(RawElement::Way { id, nodes, tags });
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if skipped > 0 {
        log::warn!("dropped {skipped} relation elements from map-XML input");
    }
    log::info!("parsed {} elements from map-XML", elements.len());
    Ok(ElementBatch { elements })
}

pub fn load_osm_xml(path: &Path) -> Result<ElementBatch, NetworkError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| NetworkError::FileError(path.display().to_string(), e))?;
    read_osm_xml(&content)
}

fn attr_value(e: &BytesStart, name: &[u8]) -> Result<String, NetworkError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| NetworkError::XmlError(e.to_string()))?;
        if attr.key.as_ref() == name {
            return Ok(attr
                .unescape_value()
                .map_err(|e| NetworkError::XmlError(e.to_string()))?
                .to_string());
        }
    }
    Err(NetworkError::XmlError(format!(
        "element '{}' is missing required attribute '{}'",
        String::from_utf8_lossy(e.name().as_ref()),
        String::from_utf8_lossy(name)
    )))
}

fn parse_attr_i64(e: &BytesStart, name: &[u8]) -> Result<i64, NetworkError> {
    let raw = attr_value(e, name)?;
    raw.parse::<i64>().map_err(|_| {
        NetworkError::XmlError(format!(
            "attribute '{}' value '{raw}' is not an integer",
            String::from_utf8_lossy(name)
        ))
    })
}

fn parse_attr_f64(e: &BytesStart, name: &[u8]) -> Result<f64, NetworkError> {
    let raw = attr_value(e, name)?;
    raw.parse::<f64>().map_err(|_| {
        NetworkError::XmlError(format!(
            "attribute '{}' value '{raw}' is not a number",
            String::from_utf8_lossy(name)
        ))
    })
}
