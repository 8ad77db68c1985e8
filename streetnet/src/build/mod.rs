mod builder;

pub use builder::GraphBuilder;

use crate::algorithm::{consolidation, simplification, truncation};
use crate::config::{ImportOptions, Settings};
use crate::geometry::Bbox;
use crate::model::elements::ElementBatch;
use crate::model::graph::StreetGraph;
use crate::model::NetworkError;

/// the end-to-end import pipeline: build the graph from raw element
/// batches, then run the configured cleaning passes in order
/// (simplification, consolidation, truncation, component selection).
pub fn import_network(
    batches: &[ElementBatch],
    settings: &Settings,
    options: &ImportOptions,
) -> Result<StreetGraph, NetworkError> {
    let builder = GraphBuilder::new(settings, options.network_type);
    let mut graph = builder.build(batches)?;

    if options.simplify {
        simplification::simplify_graph(&mut graph, options.track_merged, options.remove_rings)?;
    }
    if options.consolidate {
        graph = consolidation::consolidate_intersections(&graph, options.consolidation_tolerance_m)?;
    }
    if let Some(values) = options.bbox {
        let bbox = Bbox::from_array(values)?;
        truncation::truncate_graph_bbox(&mut graph, &bbox, options.truncate_by_edge)?;
    }
    if options.keep_largest_component && graph.n_nodes() > 0 {
        truncation::retain_largest_component(&mut graph, options.strongly_connected)?;
    }
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::import_network;
    use crate::config::{ImportOptions, Settings};
    use crate::model::elements::{ElementBatch, NetworkType, RawElement};
    use crate::model::graph::NodeId;
    use std::collections::BTreeMap;

    fn residential_tags() -> BTreeMap<String, String> {
        [(String::from("highway"), String::from("residential"))]
            .into_iter()
            .collect()
    }

    /// a four-node chain plus a disconnected two-node stub
    fn sample_batch() -> ElementBatch {
        let mut elements = vec![];
        for (id, lat) in [(1, 0.0), (2, 0.001), (3, 0.002), (4, 0.003), (8, 0.5), (9, 0.501)] {
            elements.push(RawElement::Node {
                id,
                lat,
                lon: 0.0,
                tags: BTreeMap::new(),
            });
        }
        elements.push(RawElement::Way {
            id: 100,
            nodes: vec![1, 2, 3, 4],
            tags: residential_tags(),
        });
        elements.push(RawElement::Way {
            id: 101,
            nodes: vec![8, 9],
            tags: residential_tags(),
        });
        ElementBatch { elements }
    }

    #[test]
    fn test_pipeline_simplifies_and_keeps_largest_component() {
        let settings = Settings::default();
        let options = ImportOptions {
            network_type: NetworkType::Drive,
            simplify: true,
            keep_largest_component: true,
            ..Default::default()
        };
        let graph = import_network(&[sample_batch()], &settings, &options).unwrap();
        assert!(graph.is_simplified());
        // the chain collapsed to its termini; the stub component is gone
        assert_eq!(graph.node_ids(), vec![NodeId(1), NodeId(4)]);
        assert_eq!(graph.n_edges(), 2);
    }

    #[test]
    fn test_pipeline_bbox_clip() {
        let settings = Settings::default();
        let options = ImportOptions {
            network_type: NetworkType::Drive,
            simplify: false,
            keep_largest_component: false,
            bbox: Some([0.1, -0.1, 0.1, -0.1]),
            truncate_by_edge: false,
            ..Default::default()
        };
        let graph = import_network(&[sample_batch()], &settings, &options).unwrap();
        assert!(graph.has_node(&NodeId(1)));
        assert!(!graph.has_node(&NodeId(8)));
    }
}
