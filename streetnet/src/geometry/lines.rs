use super::great_circle::EARTH_RADIUS_M;
use crate::model::graph::Crs;
use crate::model::NetworkError;
use geo::{LineString, MapCoords, MultiPolygon, Point, Polygon};
use geo_buffer::buffer_polygon;

/// arc length of a linestring in meters under the graph's reference system.
pub fn line_length(line: &LineString<f64>, crs: &Crs) -> f64 {
    line.0
        .windows(2)
        .map(|pair| crs.distance(Point(pair[0]), Point(pair[1])))
        .sum()
}

/// the point at `fraction` of the way along a linestring's arc length.
/// fractions outside [0, 1] clamp to the nearest terminus. returns None for
/// an empty linestring.
pub fn interpolate_point(
    line: &LineString<f64>,
    fraction: f64,
    crs: &Crs,
) -> Option<Point<f64>> {
    let coords = &line.0;
    match coords.len() {
        0 => return None,
        1 => return Some(Point(coords[0])),
        _ => {}
    }
    let total = line_length(line, crs);
    if total <= 0.0 || fraction <= 0.0 {
        return Some(Point(coords[0]));
    }
    if fraction >= 1.0 {
        return Some(Point(coords[coords.len() - 1]));
    }

    let mut remaining = fraction * total;
    for pair in coords.windows(2) {
        let segment = crs.distance(Point(pair[0]), Point(pair[1]));
        if segment >= remaining && segment > 0.0 {
            let t = remaining / segment;
            let x = pair[0].x + (pair[1].x - pair[0].x) * t;
            let y = pair[0].y + (pair[1].y - pair[0].y) * t;
            return Some(Point::new(x, y));
        }
        remaining -= segment;
    }
    Some(Point(coords[coords.len() - 1]))
}

/// buffers a polygon outward by a meter distance.
///
/// projected polygons buffer directly in their planar frame. geographic
/// polygons are first scaled into a locally-square frame (longitude
/// compressed by cos of the centroid latitude), buffered in degree units,
/// and scaled back.
pub fn buffer_polygon_meters(
    polygon: &Polygon<f64>,
    meters: f64,
    crs: &Crs,
) -> Result<MultiPolygon<f64>, NetworkError> {
    if !meters.is_finite() || meters < 0.0 {
        return Err(NetworkError::InvalidInput(format!(
            "buffer distance must be a non-negative number of meters, got {meters}"
        )));
    }
    if crs.is_projected() {
        return Ok(buffer_polygon(polygon, meters));
    }

    let center_lat = mean_latitude(polygon);
    let cos_lat = center_lat.to_radians().cos().max(1e-12);
    let meters_per_degree = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
    let degrees = meters / meters_per_degree;

    let squared = polygon.map_coords(|c| geo::Coord {
        x: c.x * cos_lat,
        y: c.y,
    });
    let buffered = buffer_polygon(&squared, degrees);
    let unsquared = buffered.map_coords(|c| geo::Coord {
        x: c.x / cos_lat,
        y: c.y,
    });
    Ok(unsquared)
}

fn mean_latitude(polygon: &Polygon<f64>) -> f64 {
    let exterior = polygon.exterior();
    if exterior.0.is_empty() {
        return 0.0;
    }
    exterior.0.iter().map(|c| c.y).sum::<f64>() / exterior.0.len() as f64
}
