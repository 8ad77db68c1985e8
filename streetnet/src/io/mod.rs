mod geojson_io;
pub mod graphml;
mod osm_xml;
mod overpass_json;

pub use geojson_io::{graph_from_features, graph_to_geojson, GraphFeatures};
pub use graphml::{graph_to_graphml, graphml_to_graph, load_graphml, save_graphml, CoercionTable};
pub use osm_xml::{load_osm_xml, read_osm_xml};
pub use overpass_json::{load_overpass_json, read_overpass_json};
