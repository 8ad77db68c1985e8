use crate::model::elements::ElementBatch;
use crate::model::NetworkError;
use geojson::FeatureCollection;

/// a source of raw map elements: the network fetcher, or one of the local
/// file loaders wrapped to the same contract. batches arrive in order, each
/// fully parsed before the next is requested, and any failure aborts the
/// whole acquisition.
pub trait ElementSource {
    fn next_batch(&mut self) -> Result<Option<ElementBatch>, NetworkError>;
}

/// gazetteer collaborator: place names or ids to coordinates and polygons.
pub trait Geocoder {
    /// best (lat, lon) for a free-form query.
    fn geocode(&self, query: &str) -> Result<(f64, f64), NetworkError>;

    /// full result features for a query, sorted by importance. with
    /// `by_osmid` the query is treated as a corpus element id rather than a
    /// place name. a `which_result` beyond the result list, or zero usable
    /// results, is a [`NetworkError::GeocodeMiss`].
    fn geocode_to_features(
        &self,
        query: &str,
        which_result: Option<usize>,
        by_osmid: bool,
    ) -> Result<FeatureCollection, NetworkError>;
}

/// coordinate projection collaborator.
pub trait Projector {
    fn project(
        &self,
        from_crs: &str,
        to_crs: &str,
        coord: [f64; 2],
    ) -> Result<[f64; 2], NetworkError>;
}

/// drains an element source into memory, preserving batch order and
/// failing fast on the first bad batch.
pub fn collect_batches(
    source: &mut dyn ElementSource,
) -> Result<Vec<ElementBatch>, NetworkError> {
    let mut batches = vec![];
    while let Some(batch) = source.next_batch()? {
        batches.push(batch);
    }
    Ok(batches)
}

/// UTM zone covering a longitude.
pub fn utm_zone(center_lon: f64) -> u32 {
    (((center_lon + 180.0) / 6.0).floor() as i64 + 1).clamp(1, 60) as u32
}

/// EPSG code of the UTM zone covering a point: 32600 + zone in the
/// northern hemisphere, 32700 + zone in the southern.
pub fn utm_crs_code(center_lon: f64, center_lat: f64) -> String {
    let zone = utm_zone(center_lon);
    let base = if center_lat >= 0.0 { 32600 } else { 32700 };
    format!("epsg:{}", base + zone)
}
