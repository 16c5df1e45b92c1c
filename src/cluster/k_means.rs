use log::debug;
use ndarray::Array2;
use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, RngCore};

use super::oracle::ClusteringOracle;
use super::point_set::{squared_distance, ClusteringResult, PointSet};
use crate::error::{Error, Result};

/// Lloyd's k-means with k-means++ seeding, the default clustering oracle.
#[derive(Debug, Clone)]
pub struct KMeans {
    /// Maximum number of Lloyd iterations per run.
    pub max_iterations: usize,
    /// Convergence tolerance. If the movement of all centroids is below this,
    /// a run stops early.
    pub tolerance: f64,
}

impl Default for KMeans {
    fn default() -> Self {
        Self::new()
    }
}

impl KMeans {
    /// Create a new k-means with default values for max_iterations (300) and tolerance (1e-4).
    pub fn new() -> Self {
        Self {
            max_iterations: 300,
            tolerance: 1e-4,
        }
    }

    /// Customize the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Customize the convergence tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Runs a single k-means fit, returning the assignment of every point and
    /// the final centroids.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `k` is 0 or greater than the number of points.
    ///
    /// # Example
    ///
    /// ```
    /// use gapstat::{KMeans, PointSet};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha20Rng;
    ///
    /// let points = PointSet::from_rows(&[
    ///     vec![1.0, 2.0],
    ///     vec![1.5, 1.8],
    ///     vec![5.0, 8.0],
    ///     vec![8.0, 8.0],
    /// ])
    /// .unwrap();
    ///
    /// let mut rng = ChaCha20Rng::seed_from_u64(7);
    /// let result = KMeans::new().fit(&points, 2, &mut rng).unwrap();
    /// assert_eq!(result.assignments.len(), 4);
    /// assert_eq!(result.k(), 2);
    /// ```
    pub fn fit<R: Rng + ?Sized>(
        &self,
        points: &PointSet,
        k: usize,
        rng: &mut R,
    ) -> Result<ClusteringResult> {
        let n = points.len();
        if k == 0 || k > n {
            return Err(Error::InvalidInput(format!(
                "invalid number of clusters k = {} for dataset of size {}",
                k, n
            )));
        }
        let dim = points.dimensions();

        let mut centroids = seed_centroids(points, k, rng);
        let mut assignments = vec![0_usize; n];
        let mut first_pass = true;

        for _iter in 0..self.max_iterations {
            let mut changed = first_pass;
            first_pass = false;

            // 1. Assignment step: assign each point to the nearest centroid
            for (i, assignment) in assignments.iter_mut().enumerate() {
                let point = points.point(i);
                let mut best_cluster = *assignment;
                let mut best_dist = squared_distance(point, centroids.row(best_cluster));
                for cluster_idx in 0..k {
                    let dist = squared_distance(point, centroids.row(cluster_idx));
                    if dist < best_dist {
                        best_dist = dist;
                        best_cluster = cluster_idx;
                    }
                }
                if best_cluster != *assignment {
                    *assignment = best_cluster;
                    changed = true;
                }
            }

            // An emptied cluster takes over the point farthest from its centroid.
            let mut counts = vec![0_usize; k];
            for &c in &assignments {
                counts[c] += 1;
            }
            for cluster_idx in 0..k {
                if counts[cluster_idx] > 0 {
                    continue;
                }
                if let Some(far) = farthest_point(points, &assignments, &centroids, &counts) {
                    counts[assignments[far]] -= 1;
                    assignments[far] = cluster_idx;
                    counts[cluster_idx] = 1;
                    centroids.row_mut(cluster_idx).assign(&points.point(far));
                    changed = true;
                }
            }

            // 2. Update step: recompute centroids based on the new assignments
            let mut sums = Array2::<f64>::zeros((k, dim));
            for (i, &c) in assignments.iter().enumerate() {
                let mut row = sums.row_mut(c);
                row += &points.point(i);
            }

            let mut max_centroid_shift_sq: f64 = 0.0;
            for cluster_idx in 0..k {
                if counts[cluster_idx] == 0 {
                    continue;
                }
                let new_centroid = sums.row(cluster_idx).mapv(|s| s / counts[cluster_idx] as f64);
                let shift_sq = squared_distance(centroids.row(cluster_idx), new_centroid.view());
                max_centroid_shift_sq = max_centroid_shift_sq.max(shift_sq);
                centroids.row_mut(cluster_idx).assign(&new_centroid);
            }

            if !changed || max_centroid_shift_sq < self.tolerance * self.tolerance {
                break;
            }
        }

        Ok(ClusteringResult::new(assignments, centroids))
    }
}

impl ClusteringOracle for KMeans {
    fn cluster(
        &self,
        points: &PointSet,
        k: usize,
        initialization_retries: usize,
        rng: &mut dyn RngCore,
    ) -> Result<ClusteringResult> {
        if initialization_retries == 0 {
            return Err(Error::InvalidInput(
                "initialization_retries must be at least 1".into(),
            ));
        }

        let mut best: Option<(f64, ClusteringResult)> = None;
        for _ in 0..initialization_retries {
            let result = self.fit(points, k, rng)?;
            let inertia = result.inertia(points);
            if best.as_ref().map_or(true, |(b, _)| inertia < *b) {
                best = Some((inertia, result));
            }
        }

        let (inertia, result) = best.ok_or_else(|| {
            Error::InvalidInput("k-means produced no result".into())
        })?;
        debug!(
            "k-means k={} best inertia {:.6} over {} starts",
            k, inertia, initialization_retries
        );
        Ok(result)
    }
}

/// k-means++ seeding: the first centroid is a uniformly chosen point, every
/// further one is drawn with probability proportional to its squared distance
/// from the nearest centroid chosen so far.
fn seed_centroids<R: Rng + ?Sized>(points: &PointSet, k: usize, rng: &mut R) -> Array2<f64> {
    let n = points.len();
    let mut centroids = Array2::<f64>::zeros((k, points.dimensions()));
    let first = rng.gen_range(0..n);
    centroids.row_mut(0).assign(&points.point(first));

    let mut nearest: Vec<f64> = (0..n)
        .map(|i| squared_distance(points.point(i), centroids.row(0)))
        .collect();

    for c in 1..k {
        // All weights zero means fewer distinct points than k; fall back to uniform.
        let chosen = match WeightedIndex::new(&nearest) {
            Ok(dist) => dist.sample(rng),
            Err(_) => rng.gen_range(0..n),
        };
        centroids.row_mut(c).assign(&points.point(chosen));
        for (i, d) in nearest.iter_mut().enumerate() {
            *d = d.min(squared_distance(points.point(i), centroids.row(c)));
        }
    }

    centroids
}

/// Index of the point farthest from its own centroid, among points whose
/// cluster can spare a member.
fn farthest_point(
    points: &PointSet,
    assignments: &[usize],
    centroids: &Array2<f64>,
    counts: &[usize],
) -> Option<usize> {
    assignments
        .iter()
        .enumerate()
        .filter(|(_, &c)| counts[c] > 1)
        .map(|(i, &c)| (i, squared_distance(points.point(i), centroids.row(c))))
        .fold(None, |best: Option<(usize, f64)>, (i, d)| match best {
            Some((_, bd)) if bd >= d => best,
            _ => Some((i, d)),
        })
        .map(|(i, _)| i)
}
