use thiserror::Error;

use super::graph::NodeId;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("response contained no node and no way elements")]
    EmptyResponse,
    #[error("graph has already been simplified")]
    AlreadySimplified,
    #[error("no path exists from node '{origin}' to node '{destination}'")]
    NoPath { origin: NodeId, destination: NodeId },
    #[error("geocoder returned no usable result: {0}")]
    GeocodeMiss(String),
    #[error("graph or feature collection failed validation: {0}")]
    ValidationFailed(String),
    #[error("element fetcher failed: {0}")]
    FetcherFailure(String),
    #[error("path tracing exceeded the step limit: {0}")]
    GraphTooComplex(String),
    #[error("attempting to get node '{0}' not in graph")]
    MissingNode(NodeId),
    #[error("attempting to get edge ({0})-[{2}]->({1}) not in graph")]
    MissingEdge(NodeId, NodeId, usize),
    #[error("failure simplifying graph: {0}")]
    SimplificationError(String),
    #[error("failure consolidating graph: {0}")]
    ConsolidationError(String),
    #[error("failure reading or writing {0}: {1}")]
    FileError(String, std::io::Error),
    #[error("failure encoding or decoding XML: {0}")]
    XmlError(String),
    #[error("failure encoding or decoding JSON: {0}")]
    JsonError(String),
    #[error("unable to deserialize WKT into geometry: {0}")]
    InvalidWkt(String),
    #[error("invalid configuration: {0}")]
    ConfigurationError(String),
    #[error("{0}")]
    InternalError(String),
}
