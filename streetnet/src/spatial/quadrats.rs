use crate::model::NetworkError;
use geo::{BooleanOps, BoundingRect, Contains, Coord, Geometry, Intersects, MultiPolygon, Point, Polygon, Rect};
use std::collections::HashSet;

/// a polygon cut into a uniform grid of square quadrats for accelerated
/// intersection testing.
///
/// each grid cell of the requested width covering the polygon's bounding
/// box is intersected with the polygon; tests against the polygon then run
/// per piece, with a bounding-box cull ahead of every precise predicate.
pub struct Quadrats {
    pieces: Vec<(Rect<f64>, MultiPolygon<f64>)>,
}

impl Quadrats {
    pub fn new(polygon: &Polygon<f64>, quadrat_width: f64) -> Result<Quadrats, NetworkError> {
        if !quadrat_width.is_finite() || quadrat_width <= 0.0 {
            return Err(NetworkError::InvalidInput(format!(
                "quadrat width must be a positive number, got {quadrat_width}"
            )));
        }
        let bbox = polygon.bounding_rect().ok_or_else(|| {
            NetworkError::InvalidInput(String::from(
                "cannot build quadrats over an empty polygon",
            ))
        })?;

        let cols = ((bbox.width() / quadrat_width).ceil() as usize).max(1);
        let rows = ((bbox.height() / quadrat_width).ceil() as usize).max(1);
        let mut pieces = vec![];
        for row in 0..rows {
            for col in 0..cols {
                let min = Coord {
                    x: bbox.min().x + col as f64 * quadrat_width,
                    y: bbox.min().y + row as f64 * quadrat_width,
                };
                let max = Coord {
                    x: (min.x + quadrat_width).min(bbox.max().x),
                    y: (min.y + quadrat_width).min(bbox.max().y),
                };
                if max.x <= min.x || max.y <= min.y {
                    continue;
                }
                let cell = Rect::new(min, max);
                let piece = cell.to_polygon().intersection(polygon);
                if piece.0.is_empty() {
                    continue;
                }
                let piece_bbox = match piece.bounding_rect() {
                    Some(rect) => rect,
                    None => continue,
                };
                pieces.push((piece_bbox, piece));
            }
        }
        log::info!(
            "cut polygon into {} quadrat pieces ({} x {} grid)",
            pieces.len(),
            cols,
            rows
        );
        Ok(Quadrats { pieces })
    }

    pub fn n_pieces(&self) -> usize {
        self.pieces.len()
    }

    /// indices of the points that fall inside the polygon. the boundary
    /// counts as inside.
    pub fn intersecting_points(&self, points: &[Point<f64>]) -> HashSet<usize> {
        let mut inside: HashSet<usize> = HashSet::new();
        for (bbox, piece) in self.pieces.iter() {
            for (index, point) in points.iter().enumerate() {
                if inside.contains(&index) {
                    continue;
                }
                // bbox cull before the precise point-in-polygon test
                if !bbox_contains(bbox, point) {
                    continue;
                }
                if piece.contains(point) || piece.intersects(point) {
                    inside.insert(index);
                }
            }
        }
        log::info!(
            "{} of {} points intersect the polygon",
            inside.len(),
            points.len()
        );
        inside
    }

    /// indices of the geometries that intersect the polygon. geometries
    /// without a bounding box (empty ones) are skipped with a warning count.
    pub fn intersecting_geometries(&self, geometries: &[Geometry<f64>]) -> HashSet<usize> {
        let mut hits: HashSet<usize> = HashSet::new();
        let mut unbounded: usize = 0;
        let bboxes = geometries
            .iter()
            .map(|g| {
                let rect = g.bounding_rect();
                if rect.is_none() {
                    unbounded += 1;
                }
                rect
            })
            .collect::<Vec<_>>();
        if unbounded > 0 {
            log::warn!("skipped {unbounded} geometries with no extent during intersection tests");
        }

        for (piece_bbox, piece) in self.pieces.iter() {
            for (index, geometry) in geometries.iter().enumerate() {
                if hits.contains(&index) {
                    continue;
                }
                let bbox = match &bboxes[index] {
                    Some(rect) => rect,
                    None => continue,
                };
                if !rects_intersect(piece_bbox, bbox) {
                    continue;
                }
                if piece.intersects(geometry) {
                    hits.insert(index);
                }
            }
        }
        log::info!(
            "{} of {} geometries intersect the polygon",
            hits.len(),
            geometries.len()
        );
        hits
    }
}

fn bbox_contains(rect: &Rect<f64>, point: &Point<f64>) -> bool {
    point.x() >= rect.min().x
        && point.x() <= rect.max().x
        && point.y() >= rect.min().y
        && point.y() <= rect.max().y
}

fn rects_intersect(a: &Rect<f64>, b: &Rect<f64>) -> bool {
    a.min().x <= b.max().x
        && b.min().x <= a.max().x
        && a.min().y <= b.max().y
        && b.min().y <= a.max().y
}

#[cfg(test)]
mod tests {
    use super::Quadrats;
    use geo::{line_string, polygon, Geometry, Point};

    fn unit_square() -> geo::Polygon<f64> {
        polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
        ]
    }

    #[test]
    fn test_grid_covers_polygon() {
        let quadrats = Quadrats::new(&unit_square(), 0.25).unwrap();
        assert_eq!(quadrats.n_pieces(), 16);
    }

    #[test]
    fn test_point_membership() {
        let quadrats = Quadrats::new(&unit_square(), 0.3).unwrap();
        let points = vec![
            Point::new(0.5, 0.5),
            Point::new(2.0, 2.0),
            Point::new(0.99, 0.01),
        ];
        let inside = quadrats.intersecting_points(&points);
        assert!(inside.contains(&0));
        assert!(!inside.contains(&1));
        assert!(inside.contains(&2));
    }

    #[test]
    fn test_geometry_intersection() {
        let quadrats = Quadrats::new(&unit_square(), 0.5).unwrap();
        let crossing = Geometry::LineString(line_string![(x: -1.0, y: 0.5), (x: 2.0, y: 0.5)]);
        let outside = Geometry::LineString(line_string![(x: 2.0, y: 2.0), (x: 3.0, y: 3.0)]);
        let hits = quadrats.intersecting_geometries(&[crossing, outside]);
        assert!(hits.contains(&0));
        assert!(!hits.contains(&1));
    }

    #[test]
    fn test_invalid_width_rejected() {
        assert!(Quadrats::new(&unit_square(), 0.0).is_err());
        assert!(Quadrats::new(&unit_square(), f64::NAN).is_err());
    }
}
