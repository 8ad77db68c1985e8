use crate::model::graph::{AttrValue, StreetGraph};
use crate::model::NetworkError;
use itertools::Itertools;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

const MPH_TO_KPH: f64 = 1.60934;

/// implicit maxspeed values keyed by the region shorthand the corpus uses
/// in place of a number. see
/// https://wiki.openstreetmap.org/wiki/Key:maxspeed#Values
const IMPLICIT_SPEEDS_KPH: [(&str, f64); 12] = [
    ("walk", 5.0),
    ("living_street", 7.0),
    ("AT:urban", 50.0),
    ("AT:rural", 100.0),
    ("DE:living_street", 7.0),
    ("DE:urban", 50.0),
    ("DE:rural", 100.0),
    ("FR:urban", 50.0),
    ("FR:rural", 80.0),
    ("GB:nsl_single", 60.0 * MPH_TO_KPH),
    ("GB:nsl_dual", 70.0 * MPH_TO_KPH),
    ("GB:motorway", 70.0 * MPH_TO_KPH),
];

fn speed_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*([0-9]+(?:\.[0-9]+)?)\s*(mph|km/h|kmh|kph)?\s*$")
            .expect("speed pattern is valid")
    })
}

/// parses one maxspeed entry into km/h: a bare number (km/h by
/// convention), a number with a unit, or an implicit region key.
/// unparsable entries yield None.
pub fn parse_maxspeed(entry: &str) -> Option<f64> {
    let trimmed = entry.trim();
    if let Some((_, kph)) = IMPLICIT_SPEEDS_KPH
        .iter()
        .find(|(key, _)| *key == trimmed)
    {
        return Some(*kph);
    }
    let captures = speed_pattern().captures(trimmed)?;
    let value: f64 = captures.get(1)?.as_str().parse().ok()?;
    if value <= 0.0 {
        return None;
    }
    match captures.get(2).map(|m| m.as_str()) {
        Some("mph") => Some(value * MPH_TO_KPH),
        _ => Some(value),
    }
}

/// parses a full maxspeed tag value, which may be a `|`-separated (or
/// `;`/`,`-separated) list; the mean of the parsable entries is returned.
pub fn parse_maxspeed_value(value: &str) -> Option<f64> {
    let parsed = value
        .split(['|', ';', ','])
        .filter_map(parse_maxspeed)
        .collect_vec();
    if parsed.is_empty() {
        return None;
    }
    Some(parsed.iter().sum::<f64>() / parsed.len() as f64)
}

/// the parsable speed of one edge's maxspeed tag. simplification can leave
/// a list of values behind; the mean of the parsable ones wins.
fn edge_maxspeed(tags: &std::collections::BTreeMap<String, AttrValue>) -> Option<f64> {
    let entries: Vec<String> = match tags.get("maxspeed") {
        Some(AttrValue::Str(s)) => vec![s.clone()],
        Some(AttrValue::StrList(ss)) => ss.clone(),
        Some(AttrValue::Num(n)) if *n > 0.0 => return Some(*n),
        Some(AttrValue::Int(i)) if *i > 0 => return Some(*i as f64),
        _ => return None,
    };
    let parsed = entries
        .iter()
        .filter_map(|s| parse_maxspeed_value(s))
        .collect_vec();
    if parsed.is_empty() {
        return None;
    }
    Some(parsed.iter().sum::<f64>() / parsed.len() as f64)
}

/// the highway class label used to bucket speeds; a merged list falls back
/// to its first value.
fn highway_class(tags: &std::collections::BTreeMap<String, AttrValue>) -> Option<String> {
    match tags.get("highway") {
        Some(AttrValue::Str(s)) => Some(s.clone()),
        Some(AttrValue::StrList(ss)) => ss.first().cloned(),
        _ => None,
    }
}

/// stamps `speed_kph` on every edge.
///
/// edges with a parsable maxspeed keep it. the rest are filled from, in
/// order: the caller's per-class speeds, the mean of parsed speeds within
/// the edge's highway class, the caller's fallback constant, and finally
/// the global mean across classes. edges that none of these can cover stay
/// unset and are counted at WARN.
pub fn add_edge_speeds(
    graph: &mut StreetGraph,
    hwy_speeds: &HashMap<String, f64>,
    fallback: Option<f64>,
) -> Result<(), NetworkError> {
    let mut parsed: HashMap<(crate::model::graph::NodeId, crate::model::graph::NodeId, usize), f64> =
        HashMap::new();
    let mut class_values: HashMap<String, Vec<f64>> = HashMap::new();

    for (src, dst, edge) in graph.edges_iter() {
        if let Some(kph) = edge_maxspeed(&edge.tags) {
            parsed.insert((src, dst, edge.key), kph);
            if let Some(class) = highway_class(&edge.tags) {
                class_values.entry(class).or_default().push(kph);
            }
        }
    }

    let class_means: HashMap<String, f64> = class_values
        .into_iter()
        .map(|(class, values)| {
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            (class, mean)
        })
        .collect();
    let global_mean: Option<f64> = if class_means.is_empty() {
        None
    } else {
        Some(class_means.values().sum::<f64>() / class_means.len() as f64)
    };

    let mut unfilled: usize = 0;
    for (src, dst, key) in graph.edge_triples() {
        let speed = match parsed.get(&(src, dst, key)) {
            Some(kph) => Some(*kph),
            None => {
                let class = highway_class(&graph.edge(&src, &dst, key)?.tags);
                class
                    .as_ref()
                    .and_then(|c| hwy_speeds.get(c).copied())
                    .or_else(|| class.as_ref().and_then(|c| class_means.get(c).copied()))
                    .or(fallback)
                    .or(global_mean)
            }
        };
        match speed {
            Some(kph) => graph.edge_mut(&src, &dst, key)?.speed_kph = Some(kph),
            None => unfilled += 1,
        }
    }
    if unfilled > 0 {
        log::warn!("{unfilled} edges have no parsable or imputable speed");
    }
    Ok(())
}

/// stamps `travel_time` in seconds on every edge carrying a finite length
/// and a positive finite speed. edges missing either are counted at WARN.
pub fn add_edge_travel_times(graph: &mut StreetGraph) -> Result<(), NetworkError> {
    let mut skipped: usize = 0;
    for (src, dst, key) in graph.edge_triples() {
        let edge = graph.edge(&src, &dst, key)?;
        let applicable = edge.length.is_finite()
            && edge
                .speed_kph
                .map(|kph| kph.is_finite() && kph > 0.0)
                .unwrap_or(false);
        if !applicable {
            skipped += 1;
            continue;
        }
        let kph = edge.speed_kph.expect("speed checked above");
        let seconds = (edge.length / 1000.0) / (kph / 3600.0);
        graph.edge_mut(&src, &dst, key)?.travel_time = Some(seconds);
    }
    if skipped > 0 {
        log::warn!("{skipped} edges lack the length or speed needed for a travel time");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::graph::{AttrValue, Crs, EdgeData, NodeData, NodeId, StreetGraph, WayId};

    #[test]
    fn test_parse_plain_number_is_kph() {
        assert_eq!(parse_maxspeed("50"), Some(50.0));
        assert_eq!(parse_maxspeed(" 30 "), Some(30.0));
    }

    #[test]
    fn test_parse_mph_converts() {
        let kph = parse_maxspeed("45 mph").unwrap();
        assert!((kph - 45.0 * 1.60934).abs() < 1e-9);
        assert!((parse_maxspeed("45mph").unwrap() - kph).abs() < 1e-9);
    }

    #[test]
    fn test_parse_implicit_keys() {
        assert_eq!(parse_maxspeed("walk"), Some(5.0));
        assert_eq!(parse_maxspeed("DE:urban"), Some(50.0));
        assert_eq!(parse_maxspeed("signals"), None);
    }

    #[test]
    fn test_parse_list_takes_mean() {
        assert_eq!(parse_maxspeed_value("50|30"), Some(40.0));
        assert_eq!(parse_maxspeed_value("50;unknown"), Some(50.0));
        assert_eq!(parse_maxspeed_value("unknown"), None);
    }

    fn speed_graph() -> StreetGraph {
        let mut graph = StreetGraph::new(Crs::default_geographic(), "test");
        for id in 1..=4 {
            graph
                .add_node(NodeData::new(NodeId(id), id as f64, 0.0))
                .unwrap();
        }
        // two residential edges, one tagged 40, one untagged; one untagged
        // primary edge
        let mut tagged = EdgeData::new(WayId(1), 1000.0, true, false);
        tagged.tags.insert(
            String::from("highway"),
            AttrValue::Str(String::from("residential")),
        );
        tagged
            .tags
            .insert(String::from("maxspeed"), AttrValue::Str(String::from("40")));
        graph.add_edge(NodeId(1), NodeId(2), tagged).unwrap();

        let mut untagged = EdgeData::new(WayId(2), 1000.0, true, false);
        untagged.tags.insert(
            String::from("highway"),
            AttrValue::Str(String::from("residential")),
        );
        graph.add_edge(NodeId(2), NodeId(3), untagged).unwrap();

        let mut primary = EdgeData::new(WayId(3), 1000.0, true, false);
        primary.tags.insert(
            String::from("highway"),
            AttrValue::Str(String::from("primary")),
        );
        graph.add_edge(NodeId(3), NodeId(4), primary).unwrap();
        graph
    }

    #[test]
    fn test_fill_from_class_mean_then_global_mean() {
        let mut graph = speed_graph();
        add_edge_speeds(&mut graph, &HashMap::new(), None).unwrap();
        // tagged edge keeps its parsed value
        assert_eq!(
            graph.edge(&NodeId(1), &NodeId(2), 0).unwrap().speed_kph,
            Some(40.0)
        );
        // untagged residential edge takes the residential mean
        assert_eq!(
            graph.edge(&NodeId(2), &NodeId(3), 0).unwrap().speed_kph,
            Some(40.0)
        );
        // untagged primary edge falls back to the global mean across classes
        assert_eq!(
            graph.edge(&NodeId(3), &NodeId(4), 0).unwrap().speed_kph,
            Some(40.0)
        );
    }

    #[test]
    fn test_caller_overrides_take_precedence_for_unparsed() {
        let mut graph = speed_graph();
        let overrides: HashMap<String, f64> =
            [(String::from("primary"), 90.0)].into_iter().collect();
        add_edge_speeds(&mut graph, &overrides, None).unwrap();
        assert_eq!(
            graph.edge(&NodeId(3), &NodeId(4), 0).unwrap().speed_kph,
            Some(90.0)
        );
        // parsed values are never overridden
        assert_eq!(
            graph.edge(&NodeId(1), &NodeId(2), 0).unwrap().speed_kph,
            Some(40.0)
        );
    }

    #[test]
    fn test_travel_time_formula() {
        let mut graph = speed_graph();
        add_edge_speeds(&mut graph, &HashMap::new(), None).unwrap();
        add_edge_travel_times(&mut graph).unwrap();
        // 1000 m at 40 km/h is 90 seconds
        let tt = graph
            .edge(&NodeId(1), &NodeId(2), 0)
            .unwrap()
            .travel_time
            .unwrap();
        assert!((tt - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_travel_time_requires_positive_speed() {
        let mut graph = speed_graph();
        add_edge_travel_times(&mut graph).unwrap();
        assert_eq!(
            graph.edge(&NodeId(1), &NodeId(2), 0).unwrap().travel_time,
            None
        );
    }
}
