use geo::{Distance, Euclidean, Point};

/// mean earth radius in meters, shared by every great-circle computation in
/// the crate so results are identical across platforms.
pub const EARTH_RADIUS_M: f64 = 6_371_009.0;

/// haversine distance in meters between two (lon, lat) degree points.
/// the intermediate `h` is clamped to <= 1 so antipodal rounding noise
/// cannot push `asin` out of domain.
pub fn great_circle_distance(a: Point<f64>, b: Point<f64>) -> f64 {
    let lat1 = a.y().to_radians();
    let lat2 = b.y().to_radians();
    let dlat = (b.y() - a.y()).to_radians();
    let dlon = (b.x() - a.x()).to_radians();

    let h = (dlat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let h = h.min(1.0);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// planar meter distance between two projected points.
pub fn euclidean_distance(a: Point<f64>, b: Point<f64>) -> f64 {
    Euclidean.distance(a, b)
}

/// initial compass bearing in [0, 360) degrees from `a` to `b`, where 0 is
/// north and angles increase clockwise.
pub fn bearing(a: Point<f64>, b: Point<f64>) -> f64 {
    let lat1 = a.y().to_radians();
    let lat2 = b.y().to_radians();
    let dlon = (b.x() - a.x()).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    let degrees = y.atan2(x).to_degrees();
    (degrees + 360.0) % 360.0
}

/// destination point after traveling `distance_m` meters from `origin` on
/// the given initial compass bearing.
pub fn destination(origin: Point<f64>, bearing_deg: f64, distance_m: f64) -> Point<f64> {
    let delta = distance_m / EARTH_RADIUS_M;
    let theta = bearing_deg.to_radians();
    let lat1 = origin.y().to_radians();
    let lon1 = origin.x().to_radians();

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
    let lon2 = lon1
        + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());
    Point::new(lon2.to_degrees(), lat2.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;

    #[test]
    fn test_zero_distance() {
        let p = Point::new(-104.9903, 39.7392);
        assert_eq!(great_circle_distance(p, p), 0.0);
    }

    #[test]
    fn test_one_degree_latitude_near_111_km() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(0.0, 1.0);
        let d = great_circle_distance(a, b);
        // one degree of latitude on the 6371009 m sphere
        let expected = EARTH_RADIUS_M * 1.0_f64.to_radians();
        assert!((d - expected).abs() < 1e-6, "got {d}, expected {expected}");
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = Point::new(0.0, 0.0);
        assert!((bearing(origin, Point::new(0.0, 1.0)) - 0.0).abs() < 1e-9);
        assert!((bearing(origin, Point::new(1.0, 0.0)) - 90.0).abs() < 1e-9);
        assert!((bearing(origin, Point::new(0.0, -1.0)) - 180.0).abs() < 1e-9);
        assert!((bearing(origin, Point::new(-1.0, 0.0)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_destination_inverts_distance() {
        let origin = Point::new(-104.9903, 39.7392);
        let there = destination(origin, 45.0, 1000.0);
        let d = great_circle_distance(origin, there);
        assert!((d - 1000.0).abs() < 1e-3, "got {d}");
    }

    #[test]
    fn test_antipodal_clamp_stays_in_domain() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(180.0, 0.0);
        let d = great_circle_distance(a, b);
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_M).abs() < 1.0);
    }
}
