use rand::RngCore;

use super::point_set::{ClusteringResult, PointSet};
use crate::error::Result;

/// Anything that can partition a point set into `k` clusters.
///
/// The gap estimator only ever talks to clustering through this trait. An
/// implementation must accept every `k` in `1..=points.len()` and should use
/// `initialization_retries` independent starts, keeping its best result, so
/// that the estimator is not misled by a single poor local minimum. All
/// randomness must come from `rng`; the estimator hands every call its own
/// seeded stream.
pub trait ClusteringOracle: Send + Sync {
    fn cluster(
        &self,
        points: &PointSet,
        k: usize,
        initialization_retries: usize,
        rng: &mut dyn RngCore,
    ) -> Result<ClusteringResult>;
}

impl<O: ClusteringOracle + ?Sized> ClusteringOracle for &O {
    fn cluster(
        &self,
        points: &PointSet,
        k: usize,
        initialization_retries: usize,
        rng: &mut dyn RngCore,
    ) -> Result<ClusteringResult> {
        (**self).cluster(points, k, initialization_retries, rng)
    }
}
