use crate::geometry::EARTH_RADIUS_M;
use crate::model::graph::{Crs, NodeId, StreetGraph};
use crate::model::NetworkError;
use geo::{BoundingRect, LineString, Point, Rect};
use rayon::prelude::*;

/// nearest-edge queries over a graph.
///
/// this is the reference O(|E|) scan with a bounding-box cull: edges whose
/// envelope cannot beat the best distance found so far are skipped without
/// a precise point-to-segment test. edges without stored geometry are
/// treated as straight lines between their endpoint coordinates.
pub struct EdgeIndex {
    crs: Crs,
    edges: Vec<EdgeEntry>,
}

struct EdgeEntry {
    src: NodeId,
    dst: NodeId,
    key: usize,
    line: LineString<f64>,
    envelope: Rect<f64>,
}

impl EdgeIndex {
    pub fn new(graph: &StreetGraph) -> Result<EdgeIndex, NetworkError> {
        let mut edges = vec![];
        for (src, dst, edge) in graph.edges_iter() {
            let u = graph.node(&src)?.point();
            let v = graph.node(&dst)?.point();
            let line = edge.linestring_or_straight(u, v);
            let envelope = match line.bounding_rect() {
                Some(rect) => rect,
                None => continue,
            };
            edges.push(EdgeEntry {
                src,
                dst,
                key: edge.key,
                line,
                envelope,
            });
        }
        if edges.is_empty() {
            return Err(NetworkError::InvalidInput(String::from(
                "cannot run nearest-edge queries over a graph with no edges",
            )));
        }
        Ok(EdgeIndex {
            crs: graph.crs().clone(),
            edges,
        })
    }

    /// the edge nearest to the query point, identified by (src, dst, key),
    /// with the meter distance to it. ties keep the first edge seen in
    /// sorted (src, dst, key) order.
    pub fn nearest_edge(&self, point: Point<f64>) -> ((NodeId, NodeId, usize), f64) {
        let frame = MeterFrame::at(point, &self.crs);
        let query = frame.apply(point.x(), point.y());

        let mut best: Option<((NodeId, NodeId, usize), f64)> = None;
        for entry in self.edges.iter() {
            if let Some((_, best_distance)) = best {
                if frame.rect_lower_bound(query, &entry.envelope) > best_distance {
                    continue;
                }
            }
            let distance = frame.point_to_line(query, &entry.line);
            let better = match best {
                Some((_, best_distance)) => distance < best_distance,
                None => true,
            };
            if better {
                best = Some(((entry.src, entry.dst, entry.key), distance));
            }
        }
        best.expect("edge index is never empty")
    }

    /// batch variant; queries run in parallel and results keep input order.
    pub fn nearest_edges(&self, points: &[Point<f64>]) -> Vec<((NodeId, NodeId, usize), f64)> {
        points
            .par_iter()
            .map(|point| self.nearest_edge(*point))
            .collect()
    }
}

/// a local planar frame in which coordinate offsets are meters. projected
/// coordinates pass through; geographic coordinates are scaled by the
/// meridian degree length, with longitude compressed by cos(lat) at the
/// query point.
struct MeterFrame {
    scale_x: f64,
    scale_y: f64,
}

impl MeterFrame {
    fn at(point: Point<f64>, crs: &Crs) -> MeterFrame {
        match crs {
            Crs::Projected(_) => MeterFrame {
                scale_x: 1.0,
                scale_y: 1.0,
            },
            Crs::Geographic(_) => {
                let meters_per_degree = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
                let cos_lat = point.y().to_radians().cos().abs().max(1e-6);
                MeterFrame {
                    scale_x: meters_per_degree * cos_lat,
                    scale_y: meters_per_degree,
                }
            }
        }
    }

    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.scale_x, y * self.scale_y)
    }

    /// meter distance from the query to the nearest point of the segment
    /// chain.
    fn point_to_line(&self, query: (f64, f64), line: &LineString<f64>) -> f64 {
        let coords = &line.0;
        if coords.len() == 1 {
            let p = self.apply(coords[0].x, coords[0].y);
            return hypot(query, p);
        }
        coords
            .windows(2)
            .map(|pair| {
                let a = self.apply(pair[0].x, pair[0].y);
                let b = self.apply(pair[1].x, pair[1].y);
                point_to_segment(query, a, b)
            })
            .fold(f64::INFINITY, f64::min)
    }

    /// meter distance from the query to the envelope rectangle; zero when
    /// the query is inside. a valid lower bound for any point on the edge.
    fn rect_lower_bound(&self, query: (f64, f64), rect: &Rect<f64>) -> f64 {
        let min = self.apply(rect.min().x, rect.min().y);
        let max = self.apply(rect.max().x, rect.max().y);
        let dx = (min.0 - query.0).max(query.0 - max.0).max(0.0);
        let dy = (min.1 - query.1).max(query.1 - max.1).max(0.0);
        (dx * dx + dy * dy).sqrt()
    }
}

fn hypot(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

fn point_to_segment(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let ab = (b.0 - a.0, b.1 - a.1);
    let ap = (p.0 - a.0, p.1 - a.1);
    let len_sq = ab.0 * ab.0 + ab.1 * ab.1;
    if len_sq <= 0.0 {
        return hypot(p, a);
    }
    let t = ((ap.0 * ab.0 + ap.1 * ab.1) / len_sq).clamp(0.0, 1.0);
    let closest = (a.0 + ab.0 * t, a.1 + ab.1 * t);
    hypot(p, closest)
}
