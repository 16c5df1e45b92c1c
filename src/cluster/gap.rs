//! The gap statistic (Tibshirani, Walther & Hastie, 2001).
//!
//! # Algorithm
//!
//! 1. Cluster the observed data for every k in the range and compute the
//!    within-cluster dispersion `W_k`.
//! 2. Generate B reference data sets (see [`ReferenceGenerator`]), cluster each
//!    of them for every k and compute `W*_kb`.
//! 3. `Gap(k) = (1/B) Σ_b log(W*_kb) - log(W_k)`, with `sd_k` the (population)
//!    standard deviation of the `log(W*_kb)` and `s_k = sd_k · sqrt(1 + 1/B)`.
//! 4. Choose the smallest k such that `Gap(k) >= Gap(k+1) - s_{k+1}`.
//!
//! # Known limitation
//!
//! k = 1 is evaluated as a baseline and can be chosen. On data with a few
//! clusters whose separation is small relative to their spread the criterion
//! sometimes stops at k = 1 even though a larger k is visibly better. The
//! estimator does not second-guess this: [`GapEstimate::recommends_single_cluster`]
//! flags the outcome and the full record sequence is returned so callers can
//! apply their own judgement.
//!
//! # Reproducibility
//!
//! All randomness comes from the `rng` passed to [`GapStatistic::estimate`].
//! Each clustering call receives its own ChaCha20 stream derived from one seed
//! drawn from that rng, so results are identical whether k values and
//! replicates are evaluated sequentially or in parallel.

use std::ops::RangeInclusive;

use log::{debug, info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;

use super::dispersion::within_dispersion;
use super::k_means::KMeans;
use super::oracle::ClusteringOracle;
use super::point_set::PointSet;
use super::reference::{ReferenceGenerator, ReferenceMethod};
use crate::error::{DispersionSource, Error, Result};

/// What to do when the evaluation of a single k fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// Abort the whole estimate at the first failing k.
    #[default]
    FailFast,
    /// Skip failing k values and select among the rest.
    TolerateFailures,
}

/// Configuration options for the gap statistic.
#[derive(Debug, Clone)]
pub struct GapConfig {
    /// Number of reference replicates (B).
    pub replicates: usize,
    /// Independent starts per clustering call.
    pub initialization_retries: usize,
    /// Reference distribution.
    pub reference_method: ReferenceMethod,
    /// Evaluate k values and replicates on the rayon thread pool.
    pub parallel: bool,
    pub failure_mode: FailureMode,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            replicates: 10,
            initialization_retries: 10,
            reference_method: ReferenceMethod::Uniform,
            parallel: false,
            failure_mode: FailureMode::FailFast,
        }
    }
}

impl GapConfig {
    /// Create a config with 10 replicates and 10 initialization retries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Customize the number of reference replicates.
    pub fn with_replicates(mut self, replicates: usize) -> Self {
        self.replicates = replicates;
        self
    }

    /// Customize the number of starts per clustering call.
    pub fn with_initialization_retries(mut self, retries: usize) -> Self {
        self.initialization_retries = retries;
        self
    }

    pub fn with_reference_method(mut self, method: ReferenceMethod) -> Self {
        self.reference_method = method;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = mode;
        self
    }
}

/// Gap statistic values for one k.
#[derive(Debug, Clone, PartialEq)]
pub struct GapRecord {
    pub k: usize,
    /// `log(W_k)` of the observed data.
    pub log_dispersion: f64,
    /// Mean of `log(W*_kb)` over the reference replicates.
    pub expected_log_dispersion: f64,
    pub gap: f64,
    /// Population standard deviation of `log(W*_kb)`.
    pub std_dev: f64,
    /// `s_k = sd_k · sqrt(1 + 1/B)`.
    pub standard_error: f64,
    /// `Gap(k) - (Gap(k+1) - s_{k+1})`; `None` when k has no successor.
    pub first_difference: Option<f64>,
}

/// A k whose evaluation failed under [`FailureMode::TolerateFailures`].
#[derive(Debug)]
pub struct KFailure {
    pub k: usize,
    pub error: Error,
}

/// Outcome of [`GapStatistic::estimate`].
#[derive(Debug)]
pub struct GapEstimate {
    /// One record per evaluated k, ascending.
    pub records: Vec<GapRecord>,
    /// Smallest k with a non-negative first difference.
    pub recommended_k: usize,
    /// Failed k values; always empty in [`FailureMode::FailFast`].
    pub failures: Vec<KFailure>,
}

impl GapEstimate {
    /// True when the criterion stopped at k = 1.
    ///
    /// This is a legitimate result of the selection rule but also its best
    /// known false positive; inspect [`GapEstimate::records`] before trusting it.
    pub fn recommends_single_cluster(&self) -> bool {
        self.recommended_k == 1
    }

    pub fn record(&self, k: usize) -> Option<&GapRecord> {
        self.records.iter().find(|r| r.k == k)
    }
}

/// Gap statistic estimator over a pluggable clustering oracle.
///
/// # Example
///
/// ```
/// use gapstat::datasets::make_blobs;
/// use gapstat::{GapConfig, GapStatistic, KMeans};
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha20Rng;
///
/// let mut rng = ChaCha20Rng::seed_from_u64(2024);
/// let centers = vec![vec![-10.0, -10.0], vec![10.0, 10.0]];
/// let blobs = make_blobs(40, &centers, 0.5, &mut rng).unwrap();
///
/// let estimator = GapStatistic::new(KMeans::new(), GapConfig::new().with_replicates(5));
/// let estimate = estimator.estimate(&blobs.points, 1..=4, &mut rng).unwrap();
/// assert_eq!(estimate.records.len(), 4);
/// assert_eq!(estimate.recommended_k, 2);
/// ```
#[derive(Debug, Clone)]
pub struct GapStatistic<O> {
    oracle: O,
    config: GapConfig,
}

impl Default for GapStatistic<KMeans> {
    fn default() -> Self {
        Self::new(KMeans::new(), GapConfig::default())
    }
}

impl<O: ClusteringOracle> GapStatistic<O> {
    pub fn new(oracle: O, config: GapConfig) -> Self {
        Self { oracle, config }
    }

    pub fn config(&self) -> &GapConfig {
        &self.config
    }

    /// Computes a [`GapRecord`] for every k in `k_range` and selects k.
    ///
    /// Pass a range starting at 1 to include the single-cluster baseline.
    /// Ranges starting above 1 are accepted and simply leave the baseline out;
    /// k = 1 can then never be recommended.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for a range with fewer than two values (k = 1..=1 has
    ///   no successor to compare against), a range starting at 0 or ending
    ///   beyond the number of points, or zero replicates or retries.
    /// - `EmptyCluster` / `DegenerateDispersion` at the first failing k, with
    ///   the records of smaller k attached. In tolerant mode this is raised
    ///   only when fewer than two k values survive, and carries the surviving
    ///   records.
    /// - `NoElbowFound` with every record (and every tolerated failure)
    ///   attached when no k qualifies.
    pub fn estimate<R: Rng + ?Sized>(
        &self,
        points: &PointSet,
        k_range: RangeInclusive<usize>,
        rng: &mut R,
    ) -> Result<GapEstimate> {
        self.validate(points, &k_range)?;

        let references = ReferenceGenerator::new(self.config.reference_method).generate(
            points,
            self.config.replicates,
            rng,
        )?;
        let seed: u64 = rng.gen();

        let ks: Vec<usize> = k_range.collect();
        debug!(
            "gap statistic over k = {}..={} with {} replicates",
            ks[0],
            ks[ks.len() - 1],
            references.len()
        );

        let outcomes: Vec<(usize, Result<GapRecord>)> = if self.config.parallel {
            ks.par_iter()
                .map(|&k| (k, self.evaluate(points, &references, k, seed)))
                .collect()
        } else {
            let mut outcomes = Vec::with_capacity(ks.len());
            for &k in &ks {
                let outcome = self.evaluate(points, &references, k, seed);
                let failed = outcome.is_err();
                outcomes.push((k, outcome));
                if failed && self.config.failure_mode == FailureMode::FailFast {
                    break;
                }
            }
            outcomes
        };

        let mut records = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for (k, outcome) in outcomes {
            match outcome {
                Ok(record) => records.push(record),
                Err(error) => match self.config.failure_mode {
                    FailureMode::FailFast => return Err(error.with_partial(records)),
                    FailureMode::TolerateFailures => {
                        warn!("gap statistic: skipping k = {}: {}", k, error);
                        failures.push(KFailure { k, error });
                    }
                },
            }
        }

        if records.len() < 2 && !failures.is_empty() {
            let first = failures.remove(0);
            return Err(first.error.with_partial(records));
        }

        fill_first_differences(&mut records);
        match select_k(&records) {
            Some(recommended_k) => {
                info!("gap statistic recommends k = {}", recommended_k);
                if recommended_k == 1 {
                    warn!(
                        "gap statistic stopped at k = 1; inspect the gap curve before trusting it"
                    );
                }
                Ok(GapEstimate {
                    records,
                    recommended_k,
                    failures,
                })
            }
            None => Err(Error::NoElbowFound { records, failures }),
        }
    }

    fn validate(&self, points: &PointSet, k_range: &RangeInclusive<usize>) -> Result<()> {
        let (first, last) = (*k_range.start(), *k_range.end());
        if k_range.is_empty() {
            return Err(Error::InvalidInput(format!("empty k range {}..={}", first, last)));
        }
        if first == 0 {
            return Err(Error::InvalidInput("k range must start at 1 or above".into()));
        }
        if first == last {
            return Err(Error::InvalidInput(format!(
                "k range {}..={} has no successor to compare Gap(k) against",
                first, last
            )));
        }
        if last > points.len() {
            return Err(Error::InvalidInput(format!(
                "k = {} exceeds the number of points ({})",
                last,
                points.len()
            )));
        }
        if self.config.replicates == 0 {
            return Err(Error::InvalidInput("replicates must be at least 1".into()));
        }
        if self.config.initialization_retries == 0 {
            return Err(Error::InvalidInput(
                "initialization_retries must be at least 1".into(),
            ));
        }
        Ok(())
    }

    fn evaluate(
        &self,
        points: &PointSet,
        references: &[PointSet],
        k: usize,
        seed: u64,
    ) -> Result<GapRecord> {
        let log_dispersion = self.log_dispersion(
            points,
            k,
            task_rng(seed, k, 0),
            DispersionSource::Observed,
        )?;

        let reference_log = |(b, reference): (usize, &PointSet)| {
            self.log_dispersion(
                reference,
                k,
                task_rng(seed, k, b + 1),
                DispersionSource::Reference(b),
            )
        };
        // Collected in replicate order so the reported failure does not depend on scheduling.
        let reference_logs: Vec<Result<f64>> = if self.config.parallel {
            references.par_iter().enumerate().map(reference_log).collect()
        } else {
            references.iter().enumerate().map(reference_log).collect()
        };
        let reference_logs = reference_logs.into_iter().collect::<Result<Vec<f64>>>()?;

        let b = reference_logs.len() as f64;
        let expected_log_dispersion = reference_logs.iter().sum::<f64>() / b;
        let std_dev = (reference_logs
            .iter()
            .map(|l| (l - expected_log_dispersion).powi(2))
            .sum::<f64>()
            / b)
            .sqrt();
        let record = GapRecord {
            k,
            log_dispersion,
            expected_log_dispersion,
            gap: expected_log_dispersion - log_dispersion,
            std_dev,
            standard_error: std_dev * (1.0 + 1.0 / b).sqrt(),
            first_difference: None,
        };
        debug!(
            "k = {}: log W = {:.4}, E*[log W] = {:.4}, gap = {:.4}, s = {:.4}",
            k, record.log_dispersion, record.expected_log_dispersion, record.gap, record.standard_error
        );
        Ok(record)
    }

    fn log_dispersion(
        &self,
        points: &PointSet,
        k: usize,
        mut rng: ChaCha20Rng,
        data: DispersionSource,
    ) -> Result<f64> {
        let clustering = self
            .oracle
            .cluster(points, k, self.config.initialization_retries, &mut rng)?;
        let w = within_dispersion(points, &clustering)?;
        if w > 0.0 {
            Ok(w.ln())
        } else {
            Err(Error::DegenerateDispersion {
                k,
                data,
                partial: Vec::new(),
            })
        }
    }
}

/// Stream `set` of `seed` for the clustering call on point set `set` at `k`
/// (set 0 is the observed data, set b + 1 the b-th replicate).
///
/// Both `k` and `set` must fit in 32 bits or streams would collide.
fn task_rng(seed: u64, k: usize, set: usize) -> ChaCha20Rng {
    debug_assert!(
        (k as u64) >> 32 == 0 && (set as u64) >> 32 == 0,
        "k = {} or set = {} does not fit in 32 bits",
        k,
        set
    );
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    rng.set_stream(((k as u64) << 32) | set as u64);
    rng
}

/// Sets `first_difference` on every record whose successor k + 1 is present.
fn fill_first_differences(records: &mut [GapRecord]) {
    for i in 1..records.len() {
        let (head, tail) = records.split_at_mut(i);
        let current = &mut head[i - 1];
        let next = &tail[0];
        if next.k == current.k + 1 {
            current.first_difference = Some(current.gap - (next.gap - next.standard_error));
        }
    }
}

/// Smallest k with `Gap(k) >= Gap(k+1) - s_{k+1}`.
fn select_k(records: &[GapRecord]) -> Option<usize> {
    records
        .iter()
        .find(|r| r.first_difference.is_some_and(|d| d >= 0.0))
        .map(|r| r.k)
}
