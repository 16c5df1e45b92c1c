//! Within-cluster dispersion `W_k`.
//!
//! For a clustering into `k` clusters `C_1 .. C_k` with sizes `n_r`:
//!
//! ```text
//! D_r = Σ_{i ∈ C_r} Σ_{i' ∈ C_r} ||x_i - x_i'||²
//! W_k = Σ_r D_r / (2 n_r)
//! ```
//!
//! `D_r` runs over ordered pairs, so `W_k` equals the pooled sum of squared
//! distances to the cluster means. The pairwise form is evaluated directly:
//! identical members then contribute exactly zero, which the gap estimator
//! relies on to detect degenerate clusterings.

use super::point_set::{squared_distance, ClusteringResult, PointSet};
use crate::error::{Error, Result};

/// Computes `W_k` for `points` partitioned by `clustering`.
///
/// # Errors
///
/// - `InvalidInput` if the assignments do not cover every point or name a
///   cluster id outside `0..k`.
/// - `EmptyCluster` if some cluster id in `0..k` has no members.
pub fn within_dispersion(points: &PointSet, clustering: &ClusteringResult) -> Result<f64> {
    let k = clustering.k();
    if clustering.assignments.len() != points.len() {
        return Err(Error::InvalidInput(format!(
            "clustering assigns {} points, point set has {}",
            clustering.assignments.len(),
            points.len()
        )));
    }

    let mut members: Vec<Vec<usize>> = vec![Vec::new(); k];
    for (i, &c) in clustering.assignments.iter().enumerate() {
        match members.get_mut(c) {
            Some(cluster) => cluster.push(i),
            None => {
                return Err(Error::InvalidInput(format!(
                    "point {} assigned to cluster {} but k = {}",
                    i, c, k
                )))
            }
        }
    }

    if let Some(cluster) = members.iter().position(Vec::is_empty) {
        return Err(Error::EmptyCluster {
            k,
            cluster,
            partial: Vec::new(),
        });
    }

    Ok(members
        .iter()
        .map(|cluster| pairwise_sum(points, cluster) / cluster.len() as f64)
        .sum())
}

/// `W_1`: the dispersion of all points taken as a single cluster.
pub fn total_dispersion(points: &PointSet) -> f64 {
    let all: Vec<usize> = (0..points.len()).collect();
    pairwise_sum(points, &all) / points.len() as f64
}

/// Sum of squared distances over unordered pairs of `members`.
fn pairwise_sum(points: &PointSet, members: &[usize]) -> f64 {
    let mut sum = 0.0;
    for (a, &i) in members.iter().enumerate() {
        for &j in &members[a + 1..] {
            sum += squared_distance(points.point(i), points.point(j));
        }
    }
    sum
}
