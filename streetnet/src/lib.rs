//! street-network graphs from crowd-sourced map data.
//!
//! this crate turns raw map elements (fetched remotely or loaded from local
//! JSON/XML files) into a directed multigraph whose nodes are road
//! junctions and termini and whose edges are road segments, then cleans and
//! analyzes it:
//!
//! - [`build`]: graph construction with oneway inference and length
//!   stamping
//! - [`algorithm::simplification`]: collapsing interstitial node chains
//! - [`algorithm::consolidation`]: merging spatially proximate junctions
//! - [`algorithm::truncation`]: bbox/polygon/distance clipping and
//!   connected-component selection
//! - [`algorithm::routing`]: weighted shortest paths, k-shortest loopless
//!   paths, and speed/travel-time augmentation
//! - [`algorithm::stats`]: morphometric measures
//! - [`spatial`]: nearest-node/nearest-edge queries and quadrat-accelerated
//!   polygon tests
//! - [`io`]: GraphML and GeoJSON exchange plus local element-file loaders

pub mod algorithm;
pub mod build;
pub mod config;
pub mod geometry;
pub mod io;
pub mod model;
pub mod provider;
pub mod spatial;

pub use config::{ImportOptions, Settings};
pub use model::graph::StreetGraph;
pub use model::NetworkError;
