use crate::geometry;
use crate::model::graph::StreetGraph;
use crate::model::NetworkError;

/// stamps every non-loop edge with the initial compass bearing from its
/// source to its destination node. bearings are only meaningful for
/// geographic coordinates, so projected graphs are rejected.
pub fn add_edge_bearings(graph: &mut StreetGraph) -> Result<(), NetworkError> {
    if graph.crs().is_projected() {
        return Err(NetworkError::InvalidInput(String::from(
            "edge bearings require an unprojected geographic graph",
        )));
    }
    for (src, dst, key) in graph.edge_triples() {
        if src == dst {
            continue;
        }
        let u = graph.node(&src)?.point();
        let v = graph.node(&dst)?.point();
        let bearing = geometry::bearing(u, v);
        graph.edge_mut(&src, &dst, key)?.bearing = Some(bearing);
    }
    Ok(())
}

/// collects the bearings of all non-loop edges, computing them on the fly
/// when not already stamped.
pub fn graph_bearings(graph: &StreetGraph) -> Result<Vec<f64>, NetworkError> {
    let mut bearings = vec![];
    for (src, dst, edge) in graph.edges_iter() {
        if src == dst {
            continue;
        }
        match edge.bearing {
            Some(b) => bearings.push(b),
            None => {
                let u = graph.node(&src)?.point();
                let v = graph.node(&dst)?.point();
                bearings.push(geometry::bearing(u, v));
            }
        }
    }
    Ok(bearings)
}

/// Shannon entropy (natural log) of the street orientation histogram.
///
/// bearings are binned twice as finely as requested, the final fine bin is
/// rolled to the front, and adjacent fine bins are merged pairwise. the
/// merged bins are therefore centered on the cardinal directions rather
/// than split across them. returns None when no bearings are provided.
pub fn orientation_entropy(bearings: &[f64], bins: usize) -> Option<f64> {
    if bearings.is_empty() || bins == 0 {
        return None;
    }
    let fine_bins = bins * 2;
    let width = 360.0 / fine_bins as f64;

    let mut fine_counts = vec![0usize; fine_bins];
    for bearing in bearings.iter().filter(|b| b.is_finite()) {
        let normalized = bearing.rem_euclid(360.0);
        let index = ((normalized / width) as usize).min(fine_bins - 1);
        fine_counts[index] += 1;
    }

    // roll the last fine bin to the front, then merge adjacent pairs
    fine_counts.rotate_right(1);
    let counts: Vec<usize> = fine_counts
        .chunks(2)
        .map(|pair| pair.iter().sum())
        .collect();

    let total: usize = counts.iter().sum();
    if total == 0 {
        return None;
    }
    let entropy = counts
        .iter()
        .filter(|count| **count > 0)
        .map(|count| {
            let p = *count as f64 / total as f64;
            -p * p.ln()
        })
        .sum();
    Some(entropy)
}

#[cfg(test)]
mod tests {
    use super::orientation_entropy;

    #[test]
    fn test_uniform_bearings_reach_max_entropy() {
        // one bearing per degree fills every bin evenly
        let bearings: Vec<f64> = (0..360).map(|d| d as f64).collect();
        let entropy = orientation_entropy(&bearings, 36).unwrap();
        assert!((entropy - (36.0_f64).ln()).abs() < 1e-9);
    }

    #[test]
    fn test_single_direction_zero_entropy() {
        let bearings = vec![90.0; 100];
        let entropy = orientation_entropy(&bearings, 36).unwrap();
        assert!(entropy.abs() < 1e-12);
    }

    #[test]
    fn test_empty_bearings() {
        assert_eq!(orientation_entropy(&[], 36), None);
    }

    #[test]
    fn test_bearings_near_north_share_a_bin() {
        // 359.9 and 0.1 fall in the same merged bin after the roll
        let entropy = orientation_entropy(&[359.9, 0.1], 36).unwrap();
        assert!(entropy.abs() < 1e-12);
    }
}
