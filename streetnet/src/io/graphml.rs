use crate::model::graph::{
    AttrValue, Crs, EdgeData, NodeData, NodeId, StreetGraph, WayId,
};
use crate::model::NetworkError;
use itertools::Itertools;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use wkt::{ToWkt, TryFromWkt};

const GRAPHML_NS: &str = "http://graphml.graphdrawing.org/xmlns";

/// attribute scopes in a GraphML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Scope {
    Graph,
    Node,
    Edge,
}

impl Scope {
    fn label(&self) -> &'static str {
        match self {
            Scope::Graph => "graph",
            Scope::Node => "node",
            Scope::Edge => "edge",
        }
    }
}

/// the typed reparse applied to one stringified attribute on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    Bool,
    Int,
    Float,
    Str,
    IntList,
    FloatList,
    Geometry,
}

/// per-key coercions for each scope. every attribute serializes to a string
/// on write; this table recovers the types on read. the defaults cover the
/// standard keys; user-supplied entries override them.
#[derive(Debug, Clone)]
pub struct CoercionTable {
    pub graph: HashMap<String, AttrType>,
    pub node: HashMap<String, AttrType>,
    pub edge: HashMap<String, AttrType>,
}

impl Default for CoercionTable {
    fn default() -> Self {
        let graph = [("simplified", AttrType::Bool)]
            .into_iter()
            .map(|(k, t)| (String::from(k), t))
            .collect();
        let node = [
            ("x", AttrType::Float),
            ("y", AttrType::Float),
            ("elevation", AttrType::Float),
            ("osmid", AttrType::Int),
            ("street_count", AttrType::Int),
        ]
        .into_iter()
        .map(|(k, t)| (String::from(k), t))
        .collect();
        let edge = [
            ("osmid", AttrType::IntList),
            ("length", AttrType::Float),
            ("bearing", AttrType::Float),
            ("grade", AttrType::Float),
            ("speed_kph", AttrType::Float),
            ("travel_time", AttrType::Float),
            ("oneway", AttrType::Bool),
            ("reversed", AttrType::Bool),
            ("geometry", AttrType::Geometry),
        ]
        .into_iter()
        .map(|(k, t)| (String::from(k), t))
        .collect();
        CoercionTable { graph, node, edge }
    }
}

impl CoercionTable {
    /// layers user-supplied coercions over the defaults.
    pub fn with_overrides(
        graph: HashMap<String, AttrType>,
        node: HashMap<String, AttrType>,
        edge: HashMap<String, AttrType>,
    ) -> CoercionTable {
        let mut table = CoercionTable::default();
        table.graph.extend(graph);
        table.node.extend(node);
        table.edge.extend(edge);
        table
    }

    fn lookup(&self, scope: Scope, key: &str) -> Option<AttrType> {
        match scope {
            Scope::Graph => self.graph.get(key).copied(),
            Scope::Node => self.node.get(key).copied(),
            Scope::Edge => self.edge.get(key).copied(),
        }
    }
}

// ---------------------------------------------------------------------------
// writing

/// serializes the graph to a standards-compliant GraphML string: one `<key>`
/// declaration per attribute name and scope, one directed `<graph>`, one
/// `<node>` per node, one `<edge>` per directed edge keyed by its parallel
/// index.
pub fn graph_to_graphml(graph: &StreetGraph) -> Result<String, NetworkError> {
    let graph_attrs = graph_attribute_strings(graph);
    let node_rows: Vec<(NodeId, BTreeMap<String, String>)> = graph
        .nodes_iter()
        .map(|(node_id, node)| (*node_id, node_attribute_strings(node)))
        .collect_vec();
    let edge_rows: Vec<(NodeId, NodeId, usize, BTreeMap<String, String>)> = graph
        .edges_iter()
        .map(|(src, dst, edge)| (src, dst, edge.key, edge_attribute_strings(edge)))
        .collect_vec();

    // key declarations in first-seen order per scope
    let mut key_ids: HashMap<(Scope, String), String> = HashMap::new();
    let mut declarations: Vec<(String, Scope, String)> = vec![];
    let declare = |scope: Scope, name: &str, key_ids: &mut HashMap<(Scope, String), String>,
                   declarations: &mut Vec<(String, Scope, String)>| {
        let lookup = (scope, String::from(name));
        if !key_ids.contains_key(&lookup) {
            let id = format!("d{}", key_ids.len());
            key_ids.insert(lookup, id.clone());
            declarations.push((id, scope, String::from(name)));
        }
    };
    for name in graph_attrs.keys() {
        declare(Scope::Graph, name, &mut key_ids, &mut declarations);
    }
    for (_, attrs) in node_rows.iter() {
        for name in attrs.keys() {
            declare(Scope::Node, name, &mut key_ids, &mut declarations);
        }
    }
    for (_, _, _, attrs) in edge_rows.iter() {
        for name in attrs.keys() {
            declare(Scope::Edge, name, &mut key_ids, &mut declarations);
        }
    }

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    let xml = |e| NetworkError::XmlError(format!("{e}"));

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(xml)?;
    let mut root = BytesStart::new("graphml");
    root.push_attribute(("xmlns", GRAPHML_NS));
    writer.write_event(Event::Start(root)).map_err(xml)?;

    for (id, scope, name) in declarations.iter() {
        let mut key = BytesStart::new("key");
        key.push_attribute(("id", id.as_str()));
        key.push_attribute(("for", scope.label()));
        key.push_attribute(("attr.name", name.as_str()));
        key.push_attribute(("attr.type", "string"));
        writer.write_event(Event::Empty(key)).map_err(xml)?;
    }

    let mut graph_elem = BytesStart::new("graph");
    graph_elem.push_attribute(("edgedefault", "directed"));
    writer.write_event(Event::Start(graph_elem)).map_err(xml)?;

    for (name, value) in graph_attrs.iter() {
        write_data(&mut writer, &key_ids[&(Scope::Graph, name.clone())], value)?;
    }
    for (node_id, attrs) in node_rows.iter() {
        let mut node_elem = BytesStart::new("node");
        node_elem.push_attribute(("id", node_id.encoded().as_str()));
        writer.write_event(Event::Start(node_elem)).map_err(xml)?;
        for (name, value) in attrs.iter() {
            write_data(&mut writer, &key_ids[&(Scope::Node, name.clone())], value)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("node")))
            .map_err(xml)?;
    }
    for (src, dst, key, attrs) in edge_rows.iter() {
        let mut edge_elem = BytesStart::new("edge");
        edge_elem.push_attribute(("source", src.encoded().as_str()));
        edge_elem.push_attribute(("target", dst.encoded().as_str()));
        edge_elem.push_attribute(("id", key.to_string().as_str()));
        writer.write_event(Event::Start(edge_elem)).map_err(xml)?;
        for (name, value) in attrs.iter() {
            write_data(&mut writer, &key_ids[&(Scope::Edge, name.clone())], value)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("edge")))
            .map_err(xml)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("graph")))
        .map_err(xml)?;
    writer
        .write_event(Event::End(BytesEnd::new("graphml")))
        .map_err(xml)?;

    String::from_utf8(writer.into_inner())
        .map_err(|e| NetworkError::XmlError(format!("graphml output is not utf-8: {e}")))
}

pub fn save_graphml(graph: &StreetGraph, path: &Path) -> Result<(), NetworkError> {
    let document = graph_to_graphml(graph)?;
    std::fs::write(path, document)
        .map_err(|e| NetworkError::FileError(path.display().to_string(), e))?;
    log::info!("saved graph to {}", path.display());
    Ok(())
}

fn write_data(
    writer: &mut Writer<Vec<u8>>,
    key_id: &str,
    value: &str,
) -> Result<(), NetworkError> {
    let xml = |e| NetworkError::XmlError(format!("{e}"));
    let mut data = BytesStart::new("data");
    data.push_attribute(("key", key_id));
    writer.write_event(Event::Start(data)).map_err(xml)?;
    writer
        .write_event(Event::Text(BytesText::new(value)))
        .map_err(xml)?;
    writer
        .write_event(Event::End(BytesEnd::new("data")))
        .map_err(xml)?;
    Ok(())
}

fn graph_attribute_strings(graph: &StreetGraph) -> BTreeMap<String, String> {
    let mut attrs = BTreeMap::new();
    attrs.insert(String::from("crs"), graph.crs().code().to_string());
    attrs.insert(
        String::from("simplified"),
        AttrValue::Bool(graph.is_simplified()).to_string(),
    );
    attrs.insert(
        String::from("created_date"),
        graph.created_date().to_string(),
    );
    attrs.insert(
        String::from("created_with"),
        graph.created_with().to_string(),
    );
    attrs
}

fn node_attribute_strings(node: &NodeData) -> BTreeMap<String, String> {
    let mut attrs = BTreeMap::new();
    attrs.insert(String::from("x"), format!("{}", node.x));
    attrs.insert(String::from("y"), format!("{}", node.y));
    if let Some(count) = node.street_count {
        attrs.insert(String::from("street_count"), format!("{count}"));
    }
    if let Some(elevation) = node.elevation {
        attrs.insert(String::from("elevation"), format!("{elevation}"));
    }
    if !node.merged_nodes.is_empty() {
        let ids = node.merged_nodes.iter().map(|id| id.0).collect_vec();
        attrs.insert(
            String::from("merged_nodes"),
            serde_json::to_string(&ids).unwrap_or_default(),
        );
    }
    for (key, value) in node.tags.iter() {
        // structural attributes win over a colliding tag key
        attrs.entry(key.clone()).or_insert_with(|| value.to_string());
    }
    attrs
}

fn edge_attribute_strings(edge: &EdgeData) -> BTreeMap<String, String> {
    let mut attrs = BTreeMap::new();
    // a single source way serializes as a scalar, merged ways as a list
    let osmid = match edge.osmid.as_slice() {
        [single] => single.to_string(),
        many => {
            let ids = many.iter().map(|id| id.0).collect_vec();
            serde_json::to_string(&ids).unwrap_or_default()
        }
    };
    attrs.insert(String::from("osmid"), osmid);
    attrs.insert(String::from("length"), format!("{}", edge.length));
    attrs.insert(
        String::from("oneway"),
        AttrValue::Bool(edge.oneway).to_string(),
    );
    attrs.insert(
        String::from("reversed"),
        AttrValue::Bool(edge.reversed).to_string(),
    );
    if let Some(geometry) = &edge.geometry {
        attrs.insert(String::from("geometry"), geometry.wkt_string());
    }
    if let Some(kph) = edge.speed_kph {
        attrs.insert(String::from("speed_kph"), format!("{kph}"));
    }
    if let Some(seconds) = edge.travel_time {
        attrs.insert(String::from("travel_time"), format!("{seconds}"));
    }
    if let Some(bearing) = edge.bearing {
        attrs.insert(String::from("bearing"), format!("{bearing}"));
    }
    if let Some(grade) = edge.grade {
        attrs.insert(String::from("grade"), format!("{grade}"));
    }
    if !edge.merged_edges.is_empty() {
        let pairs = edge
            .merged_edges
            .iter()
            .map(|(u, v)| vec![u.0, v.0])
            .collect_vec();
        attrs.insert(
            String::from("merged_edges"),
            serde_json::to_string(&pairs).unwrap_or_default(),
        );
    }
    for (key, value) in edge.tags.iter() {
        // structural attributes win over a colliding tag key
        attrs.entry(key.clone()).or_insert_with(|| value.to_string());
    }
    attrs
}

// ---------------------------------------------------------------------------
// reading

/// parses a GraphML document back into a graph, applying the coercion
/// table to recover attribute types from their string forms.
pub fn graphml_to_graph(
    document: &str,
    coercions: &CoercionTable,
) -> Result<StreetGraph, NetworkError> {
    let mut reader = Reader::from_str(document);
    let xml = |e: quick_xml::Error| NetworkError::XmlError(e.to_string());

    let mut key_names: HashMap<String, (Scope, String)> = HashMap::new();
    let mut graph_attrs: BTreeMap<String, String> = BTreeMap::new();
    let mut nodes: Vec<(NodeId, BTreeMap<String, String>)> = vec![];
    let mut edges: Vec<(NodeId, NodeId, BTreeMap<String, String>)> = vec![];

    // parser state: which element owns the <data> entries we are reading
    enum Holder {
        Graph,
        Node(NodeId),
        Edge(NodeId, NodeId),
        None,
    }
    let mut holder = Holder::None;
    let mut attrs: BTreeMap<String, String> = BTreeMap::new();
    let mut current_key: Option<String> = None;
    let mut current_text = String::new();

    loop {
        let event = reader.read_event().map_err(xml)?;
        let is_empty = matches!(event, Event::Empty(_));
        match event {
            Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                b"key" => {
                    let mut id = None;
                    let mut scope = None;
                    let mut name = None;
                    for attr in e.attributes() {
                        let attr = attr.map_err(|e| NetworkError::XmlError(e.to_string()))?;
                        let value = attr
                            .unescape_value()
                            .map_err(|e| NetworkError::XmlError(e.to_string()))?
                            .to_string();
                        match attr.key.as_ref() {
                            b"id" => id = Some(value),
                            b"for" => {
                                scope = match value.as_str() {
                                    "graph" => Some(Scope::Graph),
                                    "node" => Some(Scope::Node),
                                    "edge" => Some(Scope::Edge),
                                    _ => None,
                                }
                            }
                            b"attr.name" => name = Some(value),
                            _ => {}
                        }
                    }
                    if let (Some(id), Some(scope), Some(name)) = (id, scope, name) {
                        key_names.insert(id, (scope, name));
                    }
                }
                b"graph" => {
                    holder = Holder::Graph;
                    attrs.clear();
                }
                b"node" => {
                    let id = required_attr(&e, b"id")?;
                    let node_id = NodeId(id.parse::<i64>().map_err(|_| {
                        NetworkError::ValidationFailed(format!(
                            "node id '{id}' is not an integer"
                        ))
                    })?);
                    // graph-level data all precedes the first node
                    if matches!(holder, Holder::Graph) {
                        graph_attrs = std::mem::take(&mut attrs);
                    }
                    if is_empty {
                        nodes.push((node_id, BTreeMap::new()));
                        holder = Holder::None;
                    } else {
                        holder = Holder::Node(node_id);
                        attrs = BTreeMap::new();
                    }
                }
                b"edge" => {
                    let source = required_attr(&e, b"source")?;
                    let target = required_attr(&e, b"target")?;
                    let src = NodeId(source.parse::<i64>().map_err(|_| {
                        NetworkError::ValidationFailed(format!(
                            "edge source '{source}' is not an integer"
                        ))
                    })?);
                    let dst = NodeId(target.parse::<i64>().map_err(|_| {
                        NetworkError::ValidationFailed(format!(
                            "edge target '{target}' is not an integer"
                        ))
                    })?);
                    if matches!(holder, Holder::Graph) {
                        graph_attrs = std::mem::take(&mut attrs);
                    }
                    if is_empty {
                        edges.push((src, dst, BTreeMap::new()));
                        holder = Holder::None;
                    } else {
                        holder = Holder::Edge(src, dst);
                        attrs = BTreeMap::new();
                    }
                }
                b"data" => {
                    let key_id = required_attr(&e, b"key")?;
                    if is_empty {
                        if let Some((_, name)) = key_names.get(&key_id) {
                            attrs.insert(name.clone(), String::new());
                        }
                    } else {
                        current_key = Some(key_id);
                        current_text.clear();
                    }
                }
                _ => {}
            },
            Event::Text(t) => {
                if current_key.is_some() {
                    current_text.push_str(
                        &t.unescape()
                            .map_err(|e| NetworkError::XmlError(e.to_string()))?,
                    );
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"data" => {
                    if let Some(key_id) = current_key.take() {
                        if let Some((_, name)) = key_names.get(&key_id) {
                            attrs.insert(name.clone(), current_text.clone());
                        }
                    }
                    current_text.clear();
                }
                b"node" => {
                    if let Holder::Node(node_id) = holder {
                        nodes.push((node_id, std::mem::take(&mut attrs)));
                    }
                    holder = Holder::None;
                }
                b"edge" => {
                    if let Holder::Edge(src, dst) = holder {
                        edges.push((src, dst, std::mem::take(&mut attrs)));
                    }
                    holder = Holder::None;
                }
                b"graph" => {
                    if matches!(holder, Holder::Graph) {
                        graph_attrs = std::mem::take(&mut attrs);
                    }
                    holder = Holder::None;
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    build_graph(graph_attrs, nodes, edges, coercions)
}

pub fn load_graphml(
    path: &Path,
    coercions: &CoercionTable,
) -> Result<StreetGraph, NetworkError> {
    let document = std::fs::read_to_string(path)
        .map_err(|e| NetworkError::FileError(path.display().to_string(), e))?;
    let graph = graphml_to_graph(&document, coercions)?;
    log::info!(
        "loaded graph with {} nodes and {} edges from {}",
        graph.n_nodes(),
        graph.n_edges(),
        path.display()
    );
    Ok(graph)
}

fn required_attr(e: &BytesStart, name: &[u8]) -> Result<String, NetworkError> {
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

fn build_graph(
    graph_attrs: BTreeMap<String, String>,
    nodes: Vec<(NodeId, BTreeMap<String, String>)>,
    edges: Vec<(NodeId, NodeId, BTreeMap<String, String>)>,
    coercions: &CoercionTable,
) -> Result<StreetGraph, NetworkError> {
    let crs = graph_attrs
        .get("crs")
        .map(|code| Crs::from_code(code))
        .unwrap_or_else(Crs::default_geographic);
    let simplified = match graph_attrs.get("simplified") {
        Some(value) => matches!(
            coerce(value, AttrType::Bool, "simplified")?,
            AttrValue::Bool(true)
        ),
        None => false,
    };
    let created_date = graph_attrs
        .get("created_date")
        .cloned()
        .unwrap_or_default();
    let created_with = graph_attrs
        .get("created_with")
        .cloned()
        .unwrap_or_default();
    let mut graph = StreetGraph::with_metadata(crs, simplified, &created_date, &created_with);

    for (node_id, attrs) in nodes.into_iter() {
        let mut node = NodeData::new(node_id, f64::NAN, f64::NAN);
        for (name, raw) in attrs.into_iter() {
            let attr_type = coercions.lookup(Scope::Node, &name);
            match (name.as_str(), attr_type) {
                ("x", _) => node.x = parse_float(&raw, "x")?,
                ("y", _) => node.y = parse_float(&raw, "y")?,
                ("elevation", _) => node.elevation = Some(parse_float(&raw, "elevation")?),
                ("street_count", _) => {
                    node.street_count = Some(parse_int(&raw, "street_count")? as u32)
                }
                ("merged_nodes", _) => {
                    let ids: Vec<i64> = serde_json::from_str(&raw).map_err(|e| {
                        NetworkError::ValidationFailed(format!(
                            "merged_nodes '{raw}' is not an integer list: {e}"
                        ))
                    })?;
                    node.merged_nodes = ids.into_iter().map(NodeId).collect();
                }
                (_, Some(attr_type)) => {
                    node.tags.insert(name.clone(), coerce(&raw, attr_type, &name)?);
                }
                (_, None) => {
                    node.tags.insert(name, AttrValue::Str(raw));
                }
            }
        }
        graph.add_node(node)?;
    }

    let mut skipped: usize = 0;
    for (src, dst, attrs) in edges.into_iter() {
        if !graph.has_node(&src) || !graph.has_node(&dst) {
            skipped += 1;
            continue;
        }
        let mut edge = EdgeData::default();
        for (name, raw) in attrs.into_iter() {
            let attr_type = coercions.lookup(Scope::Edge, &name);
            match (name.as_str(), attr_type) {
                ("osmid", _) => edge.osmid = parse_id_list(&raw)?,
                ("length", _) => edge.length = parse_float(&raw, "length")?,
                ("oneway", _) => {
                    edge.oneway = matches!(coerce(&raw, AttrType::Bool, "oneway")?, AttrValue::Bool(true))
                }
                ("reversed", _) => {
                    edge.reversed =
                        matches!(coerce(&raw, AttrType::Bool, "reversed")?, AttrValue::Bool(true))
                }
                ("geometry", _) => {
                    edge.geometry = Some(geo::LineString::try_from_wkt_str(&raw).map_err(
                        |e| NetworkError::InvalidWkt(format!("edge geometry '{raw}': {e}")),
                    )?)
                }
                ("speed_kph", _) => edge.speed_kph = Some(parse_float(&raw, "speed_kph")?),
                ("travel_time", _) => edge.travel_time = Some(parse_float(&raw, "travel_time")?),
                ("bearing", _) => edge.bearing = Some(parse_float(&raw, "bearing")?),
                ("grade", _) => edge.grade = Some(parse_float(&raw, "grade")?),
                ("merged_edges", _) => {
                    let pairs: Vec<Vec<i64>> = serde_json::from_str(&raw).map_err(|e| {
                        NetworkError::ValidationFailed(format!(
                            "merged_edges '{raw}' is not a pair list: {e}"
                        ))
                    })?;
                    edge.merged_edges = pairs
                        .into_iter()
                        .filter(|pair| pair.len() == 2)
                        .map(|pair| (NodeId(pair[0]), NodeId(pair[1])))
                        .collect();
                }
                (_, Some(attr_type)) => {
                    edge.tags.insert(name.clone(), coerce(&raw, attr_type, &name)?);
                }
                (_, None) => {
                    edge.tags.insert(name, AttrValue::Str(raw));
                }
            }
        }
        graph.add_edge(src, dst, edge)?;
    }
    if skipped > 0 {
        log::warn!("skipped {skipped} edges referencing unknown nodes");
    }
    Ok(graph)
}

fn coerce(raw: &str, attr_type: AttrType, name: &str) -> Result<AttrValue, NetworkError> {
    match attr_type {
        AttrType::Str => Ok(AttrValue::Str(String::from(raw))),
        AttrType::Bool => match raw {
            "True" | "true" => Ok(AttrValue::Bool(true)),
            "False" | "false" => Ok(AttrValue::Bool(false)),
            _ => Err(NetworkError::ValidationFailed(format!(
                "attribute '{name}' value '{raw}' is not a boolean"
            ))),
        },
        AttrType::Int => Ok(AttrValue::Int(parse_int(raw, name)?)),
        AttrType::Float => Ok(AttrValue::Num(parse_float(raw, name)?)),
        AttrType::IntList => {
            if raw.trim_start().starts_with('[') {
                let values: Vec<i64> = serde_json::from_str(raw).map_err(|e| {
                    NetworkError::ValidationFailed(format!(
                        "attribute '{name}' value '{raw}' is not an integer list: {e}"
                    ))
                })?;
                Ok(AttrValue::IntList(values))
            } else {
                Ok(AttrValue::Int(parse_int(raw, name)?))
            }
        }
        AttrType::FloatList => {
            if raw.trim_start().starts_with('[') {
                let values: Vec<f64> = serde_json::from_str(raw).map_err(|e| {
                    NetworkError::ValidationFailed(format!(
                        "attribute '{name}' value '{raw}' is not a number list: {e}"
                    ))
                })?;
                Ok(AttrValue::NumList(values))
            } else {
                Ok(AttrValue::Num(parse_float(raw, name)?))
            }
        }
        AttrType::Geometry => {
            let line = geo::LineString::try_from_wkt_str(raw)
                .map_err(|e| NetworkError::InvalidWkt(format!("'{raw}': {e}")))?;
            let _: geo::LineString<f64> = line;
            Ok(AttrValue::Str(String::from(raw)))
        }
    }
}

fn parse_float(raw: &str, name: &str) -> Result<f64, NetworkError> {
    raw.parse::<f64>().map_err(|_| {
        NetworkError::ValidationFailed(format!(
            "attribute '{name}' value '{raw}' is not a number"
        ))
    })
}

fn parse_int(raw: &str, name: &str) -> Result<i64, NetworkError> {
    raw.parse::<i64>().map_err(|_| {
        NetworkError::ValidationFailed(format!(
            "attribute '{name}' value '{raw}' is not an integer"
        ))
    })
}

fn parse_id_list(raw: &str) -> Result<Vec<WayId>, NetworkError> {
    if raw.trim_start().starts_with('[') {
        let ids: Vec<i64> = serde_json::from_str(raw).map_err(|e| {
            NetworkError::ValidationFailed(format!("osmid '{raw}' is not an id list: {e}"))
        })?;
        Ok(ids.into_iter().map(WayId).collect())
    } else {
        Ok(vec![WayId(parse_int(raw, "osmid")?)])
    }
}

#[cfg(test)]
mod tests {
    use super::{graph_to_graphml, graphml_to_graph, CoercionTable};
    use crate::model::graph::{
        AttrValue, Crs, EdgeData, NodeData, NodeId, StreetGraph, WayId,
    };
    use geo::line_string;

    fn sample_graph() -> StreetGraph {
        let mut graph = StreetGraph::new(Crs::default_geographic(), "streetnet test");
        let mut a = NodeData::new(NodeId(1), -105.0, 39.7);
        a.street_count = Some(1);
        a.tags.insert(
            String::from("highway"),
            AttrValue::Str(String::from("crossing")),
        );
        graph.add_node(a).unwrap();
        graph
            .add_node(NodeData::new(NodeId(2), -105.001, 39.701))
            .unwrap();

        let mut edge = EdgeData::new(WayId(77), 140.2, true, false);
        edge.geometry = Some(line_string![
            (x: -105.0, y: 39.7),
            (x: -105.001, y: 39.701),
        ]);
        edge.speed_kph = Some(40.0);
        edge.tags.insert(
            String::from("highway"),
            AttrValue::Str(String::from("residential")),
        );
        graph.add_edge(NodeId(1), NodeId(2), edge).unwrap();

        let mut merged = EdgeData::new(WayId(78), 90.0, false, true);
        merged.osmid.push(WayId(79));
        graph.add_edge(NodeId(1), NodeId(2), merged).unwrap();
        graph
    }

    #[test]
    fn test_document_structure() {
        let document = graph_to_graphml(&sample_graph()).unwrap();
        assert!(document.contains(r#"<graph edgedefault="directed">"#));
        assert!(document.contains(r#"for="node" attr.name="x""#));
        assert!(document.contains(r#"<node id="1">"#));
        assert!(document.contains(r#"source="1" target="2""#));
        // booleans serialize in title case
        assert!(document.contains(">True<"));
        assert!(document.contains(">False<"));
        // geometry serializes as WKT
        assert!(document.contains("LINESTRING"));
    }

    #[test]
    fn test_roundtrip_preserves_graph() {
        let original = sample_graph();
        let document = graph_to_graphml(&original).unwrap();
        let loaded = graphml_to_graph(&document, &CoercionTable::default()).unwrap();

        assert_eq!(loaded.n_nodes(), original.n_nodes());
        assert_eq!(loaded.n_edges(), original.n_edges());
        assert_eq!(loaded.crs(), original.crs());
        assert_eq!(loaded.is_simplified(), original.is_simplified());

        let node = loaded.node(&NodeId(1)).unwrap();
        assert!((node.x - -105.0).abs() < 1e-12);
        assert_eq!(node.street_count, Some(1));
        assert_eq!(
            node.tags.get("highway"),
            Some(&AttrValue::Str(String::from("crossing")))
        );

        let edge = loaded.edge(&NodeId(1), &NodeId(2), 0).unwrap();
        assert_eq!(edge.osmid, vec![WayId(77)]);
        assert!((edge.length - 140.2).abs() < 1e-12);
        assert!(edge.oneway);
        assert!(!edge.reversed);
        assert_eq!(edge.speed_kph, Some(40.0));
        assert_eq!(edge.geometry.as_ref().unwrap().0.len(), 2);

        let merged = loaded.edge(&NodeId(1), &NodeId(2), 1).unwrap();
        assert_eq!(merged.osmid, vec![WayId(78), WayId(79)]);
        assert!(merged.reversed);
    }

    #[test]
    fn test_simplified_flag_roundtrip() {
        let mut graph = sample_graph();
        graph.mark_simplified().unwrap();
        let document = graph_to_graphml(&graph).unwrap();
        let loaded = graphml_to_graph(&document, &CoercionTable::default()).unwrap();
        assert!(loaded.is_simplified());
    }

    #[test]
    fn test_edge_with_unknown_endpoint_skipped() {
        let document = r#"<?xml version="1.0" encoding="utf-8"?>
<graphml xmlns="http://graphml.graphdrawing.org/xmlns">
  <key id="d0" for="node" attr.name="x" attr.type="string"/>
  <key id="d1" for="node" attr.name="y" attr.type="string"/>
  <graph edgedefault="directed">
    <node id="1"><data key="d0">0</data><data key="d1">0</data></node>
    <edge source="1" target="99" id="0"></edge>
  </graph>
</graphml>"#;
        let loaded = graphml_to_graph(document, &CoercionTable::default()).unwrap();
        assert_eq!(loaded.n_nodes(), 1);
        assert_eq!(loaded.n_edges(), 0);
    }

    #[test]
    fn test_user_coercions_override_defaults() {
        let mut graph = sample_graph();
        graph
            .edge_mut(&NodeId(1), &NodeId(2), 0)
            .unwrap()
            .tags
            .insert(String::from("lanes"), AttrValue::Str(String::from("2")));
        let document = graph_to_graphml(&graph).unwrap();

        let table = CoercionTable::with_overrides(
            Default::default(),
            Default::default(),
            [(String::from("lanes"), super::AttrType::Int)]
                .into_iter()
                .collect(),
        );
        let loaded = graphml_to_graph(&document, &table).unwrap();
        let edge = loaded.edge(&NodeId(1), &NodeId(2), 0).unwrap();
        assert_eq!(edge.tags.get("lanes"), Some(&AttrValue::Int(2)));
    }
}
