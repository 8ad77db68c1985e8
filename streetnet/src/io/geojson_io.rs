use crate::model::graph::{AttrValue, Crs, EdgeData, NodeData, NodeId, StreetGraph, WayId};
use crate::model::NetworkError;
use geojson::{Feature, FeatureCollection, Geometry as GjGeometry, JsonObject, Value};
use itertools::Itertools;
use serde_json::json;

/// the two feature collections a graph exchanges as GeoJSON: point features
/// for nodes and linestring features for edges.
pub struct GraphFeatures {
    pub nodes: FeatureCollection,
    pub edges: FeatureCollection,
}

/// copies the graph out into GeoJSON feature collections. node features are
/// points carrying `id` plus all node attributes; edge features carry the
/// stored linestring (or the straight segment between endpoints) plus
/// `id`, `source`, `target`, and all edge attributes.
pub fn graph_to_geojson(graph: &StreetGraph) -> Result<GraphFeatures, NetworkError> {
    let mut node_features = vec![];
    for (node_id, node) in graph.nodes_iter() {
        node_features.push(node_feature(node_id, node));
    }

    let mut edge_features = vec![];
    for (src, dst, edge) in graph.edges_iter() {
        let u = graph.node(&src)?.point();
        let v = graph.node(&dst)?.point();
        edge_features.push(edge_feature(src, dst, edge, u, v));
    }

    Ok(GraphFeatures {
        nodes: FeatureCollection {
            bbox: None,
            features: node_features,
            foreign_members: None,
        },
        edges: FeatureCollection {
            bbox: None,
            features: edge_features,
            foreign_members: None,
        },
    })
}

fn node_feature(node_id: &NodeId, node: &NodeData) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert(String::from("id"), json!(node_id.0));
    properties.insert(String::from("x"), json!(node.x));
    properties.insert(String::from("y"), json!(node.y));
    if let Some(count) = node.street_count {
        properties.insert(String::from("street_count"), json!(count));
    }
    if let Some(elevation) = node.elevation {
        properties.insert(String::from("elevation"), json!(elevation));
    }
    if !node.merged_nodes.is_empty() {
        let ids = node.merged_nodes.iter().map(|id| id.0).collect_vec();
        properties.insert(String::from("merged_nodes"), json!(ids));
    }
    for (key, value) in node.tags.iter() {
        // structural attributes win over a colliding tag key
        properties
            .entry(key.clone())
            .or_insert_with(|| serde_json::to_value(value).unwrap_or(serde_json::Value::Null));
    }
    Feature {
        bbox: None,
        geometry: Some(GjGeometry::new(Value::Point(vec![node.x, node.y]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn edge_feature(
    src: NodeId,
    dst: NodeId,
    edge: &EdgeData,
    u: geo::Point<f64>,
    v: geo::Point<f64>,
) -> Feature {
    let line = edge.linestring_or_straight(u, v);
    let coordinates = line.0.iter().map(|c| vec![c.x, c.y]).collect_vec();

    let mut properties = JsonObject::new();
    properties.insert(String::from("id"), json!(edge.key));
    properties.insert(String::from("source"), json!(src.0));
    properties.insert(String::from("target"), json!(dst.0));
    let osmid = match edge.osmid.as_slice() {
        [single] => json!(single.0),
        many => json!(many.iter().map(|id| id.0).collect_vec()),
    };
    properties.insert(String::from("osmid"), osmid);
    properties.insert(String::from("length"), json!(edge.length));
    properties.insert(String::from("oneway"), json!(edge.oneway));
    properties.insert(String::from("reversed"), json!(edge.reversed));
    if let Some(kph) = edge.speed_kph {
        properties.insert(String::from("speed_kph"), json!(kph));
    }
    if let Some(seconds) = edge.travel_time {
        properties.insert(String::from("travel_time"), json!(seconds));
    }
    if let Some(bearing) = edge.bearing {
        properties.insert(String::from("bearing"), json!(bearing));
    }
    if let Some(grade) = edge.grade {
        properties.insert(String::from("grade"), json!(grade));
    }
    for (key, value) in edge.tags.iter() {
        // structural attributes win over a colliding tag key
        properties
            .entry(key.clone())
            .or_insert_with(|| serde_json::to_value(value).unwrap_or(serde_json::Value::Null));
    }
    Feature {
        bbox: None,
        geometry: Some(GjGeometry::new(Value::LineString(coordinates))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// inverts [`graph_to_geojson`]: node ids come from `osmid` or `id`
/// properties, edge endpoints from `u`/`v` or `source`/`target`. edges
/// referencing unknown nodes are skipped with a warning.
pub fn graph_from_features(
    nodes: &FeatureCollection,
    edges: &FeatureCollection,
    crs: Crs,
    created_with: &str,
) -> Result<StreetGraph, NetworkError> {
    let mut graph = StreetGraph::new(crs, created_with);

    for feature in nodes.features.iter() {
        let properties = feature.properties.as_ref().ok_or_else(|| {
            NetworkError::ValidationFailed(String::from("node feature has no properties"))
        })?;
        let id = property_i64(properties, "osmid")
            .or_else(|| property_i64(properties, "id"))
            .ok_or_else(|| {
                NetworkError::ValidationFailed(String::from(
                    "node feature carries neither 'osmid' nor 'id'",
                ))
            })?;
        let (x, y) = match feature.geometry.as_ref().map(|g| &g.value) {
            Some(Value::Point(coords)) if coords.len() >= 2 => (coords[0], coords[1]),
            _ => {
                let x = property_f64(properties, "x");
                let y = property_f64(properties, "y");
                match (x, y) {
                    (Some(x), Some(y)) => (x, y),
                    _ => {
                        return Err(NetworkError::ValidationFailed(format!(
                            "node feature {id} has neither a point geometry nor x/y properties"
                        )))
                    }
                }
            }
        };
        let mut node = NodeData::new(NodeId(id), x, y);
        if let Some(count) = property_i64(properties, "street_count") {
            node.street_count = Some(count as u32);
        }
        if let Some(elevation) = property_f64(properties, "elevation") {
            node.elevation = Some(elevation);
        }
        for (key, value) in properties.iter() {
            if matches!(
                key.as_str(),
                "id" | "osmid" | "x" | "y" | "street_count" | "elevation" | "merged_nodes"
            ) {
                continue;
            }
            node.tags.insert(key.clone(), json_to_attr(value));
        }
        graph.add_node(node)?;
    }

    let mut skipped: usize = 0;
    for feature in edges.features.iter() {
        let properties = feature.properties.as_ref().ok_or_else(|| {
            NetworkError::ValidationFailed(String::from("edge feature has no properties"))
        })?;
        let src = property_i64(properties, "u").or_else(|| property_i64(properties, "source"));
        let dst = property_i64(properties, "v").or_else(|| property_i64(properties, "target"));
        let (Some(src), Some(dst)) = (src, dst) else {
            return Err(NetworkError::ValidationFailed(String::from(
                "edge feature carries neither 'u'/'v' nor 'source'/'target'",
            )));
        };
        let (src, dst) = (NodeId(src), NodeId(dst));
        if !graph.has_node(&src) || !graph.has_node(&dst) {
            skipped += 1;
            continue;
        }

        let mut edge = EdgeData::default();
        match properties.get("osmid") {
            Some(serde_json::Value::Number(n)) => {
                edge.osmid = n.as_i64().map(WayId).into_iter().collect();
            }
            Some(serde_json::Value::Array(values)) => {
                edge.osmid = values
                    .iter()
                    .filter_map(|v| v.as_i64())
                    .map(WayId)
                    .collect();
            }
            _ => {}
        }
        edge.length = property_f64(properties, "length").unwrap_or(f64::NAN);
        edge.oneway = properties
            .get("oneway")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        edge.reversed = properties
            .get("reversed")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        edge.speed_kph = property_f64(properties, "speed_kph");
        edge.travel_time = property_f64(properties, "travel_time");
        edge.bearing = property_f64(properties, "bearing");
        edge.grade = property_f64(properties, "grade");
        if let Some(Value::LineString(coordinates)) = feature.geometry.as_ref().map(|g| &g.value)
        {
            let coords = coordinates
                .iter()
                .filter(|c| c.len() >= 2)
                .map(|c| geo::Coord { x: c[0], y: c[1] })
                .collect_vec();
            if coords.len() >= 2 {
                edge.geometry = Some(geo::LineString(coords));
            }
        }
        for (key, value) in properties.iter() {
            if matches!(
                key.as_str(),
                "id" | "u"
                    | "v"
                    | "source"
                    | "target"
                    | "osmid"
                    | "length"
                    | "oneway"
                    | "reversed"
                    | "speed_kph"
                    | "travel_time"
                    | "bearing"
                    | "grade"
                    | "merged_edges"
            ) {
                continue;
            }
            edge.tags.insert(key.clone(), json_to_attr(value));
        }
        graph.add_edge(src, dst, edge)?;
    }
    if skipped > 0 {
        log::warn!("skipped {skipped} edge features referencing unknown nodes");
    }
    Ok(graph)
}

fn property_i64(properties: &JsonObject, key: &str) -> Option<i64> {
    properties.get(key).and_then(|v| v.as_i64())
}

fn property_f64(properties: &JsonObject, key: &str) -> Option<f64> {
    properties.get(key).and_then(|v| v.as_f64())
}

/// narrows a JSON property into the matching tagged attribute variant.
fn json_to_attr(value: &serde_json::Value) -> AttrValue {
    match value {
        serde_json::Value::Bool(b) => AttrValue::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => AttrValue::Int(i),
            None => AttrValue::Num(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => AttrValue::Str(s.clone()),
        serde_json::Value::Array(values) => {
            if values.iter().all(|v| v.is_i64()) {
                AttrValue::IntList(values.iter().filter_map(|v| v.as_i64()).collect())
            } else if values.iter().all(|v| v.is_number()) {
                AttrValue::NumList(values.iter().filter_map(|v| v.as_f64()).collect())
            } else if values.iter().all(|v| v.is_string()) {
                AttrValue::StrList(
                    values
                        .iter()
                        .filter_map(|v| v.as_str().map(String::from))
                        .collect(),
                )
            } else {
                AttrValue::Json(value.clone())
            }
        }
        other => AttrValue::Json(other.clone()),
    }
}
