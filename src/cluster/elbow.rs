//! Elbow curve: within-cluster dispersion and variance explained per k.
//!
//! The "elbow" is read off the curve by eye: the k after which extra clusters
//! stop buying much reduction in dispersion. No automatic selection is made.

use std::ops::RangeInclusive;

use rand::Rng;

use super::dispersion::{total_dispersion, within_dispersion};
use super::oracle::ClusteringOracle;
use super::point_set::PointSet;
use crate::error::{DispersionSource, Error, Result};

/// One point of the elbow curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElbowPoint {
    pub k: usize,
    /// Within-cluster dispersion `W_k`.
    pub dispersion: f64,
    /// `1 - W_k / W_1`: share of the total sum of squares explained by the clustering.
    pub variance_explained: f64,
}

/// Clusters `points` for every k in `k_range` and reports dispersion and variance explained.
///
/// # Errors
///
/// `InvalidInput` for an empty range, k = 0 or k beyond the number of points;
/// `DegenerateDispersion` when all points coincide (nothing to explain);
/// any error raised by the oracle or the dispersion calculator.
pub fn elbow_curve<O, R>(
    oracle: &O,
    points: &PointSet,
    k_range: RangeInclusive<usize>,
    initialization_retries: usize,
    rng: &mut R,
) -> Result<Vec<ElbowPoint>>
where
    O: ClusteringOracle + ?Sized,
    R: Rng,
{
    if k_range.is_empty() || *k_range.start() == 0 || *k_range.end() > points.len() {
        return Err(Error::InvalidInput(format!(
            "k range {}..={} must lie within 1..={}",
            k_range.start(),
            k_range.end(),
            points.len()
        )));
    }

    let total = total_dispersion(points);
    if total <= 0.0 {
        return Err(Error::DegenerateDispersion {
            k: 1,
            data: DispersionSource::Observed,
            partial: Vec::new(),
        });
    }

    k_range
        .map(|k| {
            let clustering = oracle.cluster(points, k, initialization_retries, &mut *rng)?;
            let dispersion = within_dispersion(points, &clustering)?;
            Ok(ElbowPoint {
                k,
                dispersion,
                variance_explained: 1.0 - dispersion / total,
            })
        })
        .collect()
}
