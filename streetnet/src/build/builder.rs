use crate::algorithm::stats;
use crate::config::Settings;
use crate::geometry::great_circle_distance;
use crate::model::elements::{ElementBatch, NetworkType, RawElement};
use crate::model::graph::{AttrValue, Crs, EdgeData, NodeData, NodeId, StreetGraph, WayId};
use crate::model::NetworkError;
use itertools::Itertools;
use std::collections::{BTreeMap, HashMap};

/// the oneway tag values that denote one-directional travel, and the subset
/// denoting travel opposite the node order. see
/// https://wiki.openstreetmap.org/wiki/Key:oneway
const ONEWAY_VALUES: [&str; 7] = ["yes", "true", "1", "-1", "reverse", "T", "F"];
const REVERSED_VALUES: [&str; 3] = ["-1", "reverse", "T"];

/// converts ordered batches of raw map elements into a street graph.
///
/// nodes become vertices; each way becomes a run of directed edges between
/// consecutive node references, doubled in reverse when the way is
/// two-directional for the requested network type. every edge is stamped
/// with its great-circle endpoint length.
pub struct GraphBuilder<'a> {
    settings: &'a Settings,
    network_type: NetworkType,
}

struct PathRecord {
    osmid: WayId,
    nodes: Vec<NodeId>,
    tags: BTreeMap<String, String>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(settings: &'a Settings, network_type: NetworkType) -> GraphBuilder<'a> {
        GraphBuilder {
            settings,
            network_type,
        }
    }

    /// builds the graph. fails with [`NetworkError::EmptyResponse`] when the
    /// batches contain neither nodes nor ways.
    pub fn build(&self, batches: &[ElementBatch]) -> Result<StreetGraph, NetworkError> {
        let (nodes, paths) = self.partition(batches);
        if nodes.is_empty() && paths.is_empty() {
            return Err(NetworkError::EmptyResponse);
        }
        log::info!(
            "building graph from {} nodes and {} paths",
            nodes.len(),
            paths.len()
        );

        let mut graph = StreetGraph::new(
            Crs::from_code(&self.settings.default_crs),
            &self.settings.product_tag,
        );
        for node in nodes.into_values().sorted_by_key(|n| n.osmid) {
            graph.add_node(node)?;
        }

        let mut skipped_pairs: usize = 0;
        for path in paths.into_values() {
            skipped_pairs += self.add_path(&mut graph, path)?;
        }
        if skipped_pairs > 0 {
            log::warn!("skipped {skipped_pairs} edge pairs referencing nodes absent from the response");
        }

        let street_counts = stats::count_streets_per_node(&graph);
        for (node_id, count) in street_counts.into_iter() {
            graph.node_mut(&node_id)?.street_count = Some(count);
        }

        log::info!(
            "built graph with {} nodes and {} edges",
            graph.n_nodes(),
            graph.n_edges()
        );
        Ok(graph)
    }

    /// splits raw elements into the node and path dictionaries, keeping only
    /// the configured useful tags and deduplicating consecutive repeated
    /// node references within each way.
    fn partition(
        &self,
        batches: &[ElementBatch],
    ) -> (HashMap<NodeId, NodeData>, BTreeMap<WayId, PathRecord>) {
        let mut nodes: HashMap<NodeId, NodeData> = HashMap::new();
        let mut paths: BTreeMap<WayId, PathRecord> = BTreeMap::new();

        for batch in batches.iter() {
            for element in batch.elements.iter() {
                match element {
                    RawElement::Node { id, lat, lon, tags } => {
                        let mut node = NodeData::new(NodeId(*id), *lon, *lat);
                        for key in self.settings.useful_tags_node.iter() {
                            if let Some(value) = tags.get(key) {
                                node.tags
                                    .insert(key.clone(), AttrValue::Str(value.trim().to_string()));
                            }
                        }
                        nodes.insert(node.osmid, node);
                    }
                    RawElement::Way { id, nodes: refs, tags } => {
                        let mut node_refs = refs.iter().map(|r| NodeId(*r)).collect_vec();
                        node_refs.dedup();
                        if node_refs.len() < 2 {
                            log::warn!("way {id} has fewer than two distinct consecutive nodes");
                            continue;
                        }
                        let kept_tags = tags
                            .iter()
                            .filter(|(k, _)| self.settings.useful_tags_way.contains(k))
                            .map(|(k, v)| (k.clone(), v.trim().to_string()))
                            .collect();
                        paths.insert(
                            WayId(*id),
                            PathRecord {
                                osmid: WayId(*id),
                                nodes: node_refs,
                                tags: kept_tags,
                            },
                        );
                    }
                }
            }
        }
        (nodes, paths)
    }

    /// decides directionality for one way. rules apply in order: the global
    /// oneway override, the bidirectional network types, the oneway tag
    /// values, and the roundabout convention.
    fn is_oneway(&self, tags: &BTreeMap<String, String>) -> bool {
        if self.settings.all_oneway {
            return true;
        }
        if self
            .settings
            .bidirectional_network_types
            .contains(&self.network_type)
        {
            return false;
        }
        if let Some(oneway) = tags.get("oneway") {
            if ONEWAY_VALUES.contains(&oneway.trim()) {
                return true;
            }
        }
        // roundabouts are oneway but rarely tagged as such
        tags.get("junction").map(|j| j.trim() == "roundabout").unwrap_or(false)
    }

    fn is_reversed(&self, tags: &BTreeMap<String, String>) -> bool {
        tags.get("oneway")
            .map(|oneway| REVERSED_VALUES.contains(&oneway.trim()))
            .unwrap_or(false)
    }

    /// emits the edges for one path. returns the number of node pairs that
    /// had to be skipped because an endpoint was absent from the response.
    fn add_path(&self, graph: &mut StreetGraph, path: PathRecord) -> Result<usize, NetworkError> {
        if !self.network_type.accept_way(&path.tags) {
            return Ok(0);
        }

        let oneway = self.is_oneway(&path.tags);
        let mut node_sequence = path.nodes;
        if oneway && self.is_reversed(&path.tags) {
            // reversal is applied to the sequence, not the reversed flag
            node_sequence.reverse();
        }

        // the oneway tag is consumed by the direction decision; the edge
        // carries the decision as its structural oneway flag
        let edge_tags: BTreeMap<String, AttrValue> = path
            .tags
            .into_iter()
            .filter(|(k, _)| k != "oneway")
            .map(|(k, v)| (k, AttrValue::Str(v)))
            .collect();

        let mut skipped: usize = 0;
        for (src, dst) in node_sequence.into_iter().tuple_windows() {
            if !graph.has_node(&src) || !graph.has_node(&dst) {
                skipped += 1;
                continue;
            }
            let length = great_circle_distance(graph.node(&src)?.point(), graph.node(&dst)?.point());

            let mut forward = EdgeData::new(path.osmid, length, oneway, false);
            forward.tags = edge_tags.clone();
            graph.add_edge(src, dst, forward)?;

            if !oneway {
                let mut reciprocal = EdgeData::new(path.osmid, length, oneway, true);
                reciprocal.tags = edge_tags.clone();
                graph.add_edge(dst, src, reciprocal)?;
            }
        }
        Ok(skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::GraphBuilder;
    use crate::config::Settings;
    use crate::geometry::great_circle_distance;
    use crate::model::elements::{ElementBatch, NetworkType, RawElement};
    use crate::model::graph::NodeId;
    use crate::model::NetworkError;
    use std::collections::BTreeMap;

    fn way_tags(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (String::from(*k), String::from(*v)))
            .collect()
    }

    fn batch_with_way(tags: BTreeMap<String, String>) -> ElementBatch {
        ElementBatch {
            elements: vec![
                RawElement::Node {
                    id: 1,
                    lat: 0.0,
                    lon: 0.0,
                    tags: BTreeMap::new(),
                },
                RawElement::Node {
                    id: 2,
                    lat: 0.001,
                    lon: 0.0,
                    tags: BTreeMap::new(),
                },
                RawElement::Node {
                    id: 3,
                    lat: 0.002,
                    lon: 0.0,
                    tags: BTreeMap::new(),
                },
                RawElement::Way {
                    id: 100,
                    nodes: vec![1, 2, 3],
                    tags,
                },
            ],
        }
    }

    #[test]
    fn test_reverse_oneway_reverses_sequence_not_flag() {
        let settings = Settings::default();
        let builder = GraphBuilder::new(&settings, NetworkType::Drive);
        let batch = batch_with_way(way_tags(&[("highway", "residential"), ("oneway", "-1")]));
        let graph = builder.build(&[batch]).unwrap();

        assert_eq!(graph.n_edges(), 2);
        let e32 = graph.edge(&NodeId(3), &NodeId(2), 0).unwrap();
        let e21 = graph.edge(&NodeId(2), &NodeId(1), 0).unwrap();
        assert!(!e32.reversed);
        assert!(!e21.reversed);
        assert!(e32.oneway);
        assert!(graph.edges_between(&NodeId(1), &NodeId(2)).is_empty());
    }

    #[test]
    fn test_bidirectional_way_emits_reciprocal_edges() {
        let settings = Settings::default();
        let builder = GraphBuilder::new(&settings, NetworkType::Drive);
        let batch = batch_with_way(way_tags(&[("highway", "residential")]));
        let graph = builder.build(&[batch]).unwrap();

        assert_eq!(graph.n_edges(), 4);
        assert!(!graph.edge(&NodeId(1), &NodeId(2), 0).unwrap().reversed);
        assert!(graph.edge(&NodeId(2), &NodeId(1), 0).unwrap().reversed);
    }

    #[test]
    fn test_roundabout_is_oneway() {
        let settings = Settings::default();
        let builder = GraphBuilder::new(&settings, NetworkType::Drive);
        let batch = batch_with_way(way_tags(&[
            ("highway", "residential"),
            ("junction", "roundabout"),
        ]));
        let graph = builder.build(&[batch]).unwrap();
        assert_eq!(graph.n_edges(), 2);
        assert!(graph.edge(&NodeId(1), &NodeId(2), 0).unwrap().oneway);
    }

    #[test]
    fn test_walk_network_ignores_oneway_tags() {
        let settings = Settings::default();
        let builder = GraphBuilder::new(&settings, NetworkType::Walk);
        let batch = batch_with_way(way_tags(&[("highway", "residential"), ("oneway", "yes")]));
        let graph = builder.build(&[batch]).unwrap();
        assert_eq!(graph.n_edges(), 4);
    }

    #[test]
    fn test_all_oneway_override() {
        let settings = Settings {
            all_oneway: true,
            ..Default::default()
        };
        let builder = GraphBuilder::new(&settings, NetworkType::Drive);
        let batch = batch_with_way(way_tags(&[("highway", "residential")]));
        let graph = builder.build(&[batch]).unwrap();
        assert_eq!(graph.n_edges(), 2);
    }

    #[test]
    fn test_empty_response() {
        let settings = Settings::default();
        let builder = GraphBuilder::new(&settings, NetworkType::Drive);
        let result = builder.build(&[ElementBatch::default()]);
        assert!(matches!(result, Err(NetworkError::EmptyResponse)));
    }

    #[test]
    fn test_lengths_match_great_circle() {
        let settings = Settings::default();
        let builder = GraphBuilder::new(&settings, NetworkType::Drive);
        let batch = batch_with_way(way_tags(&[("highway", "residential")]));
        let graph = builder.build(&[batch]).unwrap();

        let u = graph.node(&NodeId(1)).unwrap().point();
        let v = graph.node(&NodeId(2)).unwrap().point();
        let edge = graph.edge(&NodeId(1), &NodeId(2), 0).unwrap();
        assert!((edge.length - great_circle_distance(u, v)).abs() < 1e-9);
        assert!(edge.length > 0.0);
    }

    #[test]
    fn test_street_count_stamped() {
        let settings = Settings::default();
        let builder = GraphBuilder::new(&settings, NetworkType::Drive);
        let batch = batch_with_way(way_tags(&[("highway", "residential")]));
        let graph = builder.build(&[batch]).unwrap();
        // interior node touches two street segments, termini touch one
        assert_eq!(graph.node(&NodeId(2)).unwrap().street_count, Some(2));
        assert_eq!(graph.node(&NodeId(1)).unwrap().street_count, Some(1));
    }
}
