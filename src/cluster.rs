//! Choosing the number of clusters for k-means.
//!
//! ## Gap statistic
//!
//! Compares the observed within-cluster dispersion `W_k` with its expectation
//! under a structureless (uniform) reference distribution:
//!
//! ```text
//! Gap(k) = E*[log W_k] - log W_k
//! ```
//!
//! and picks the smallest k whose gap is within one standard error of the
//! next one. See [`gap`] for details and [`GapStatistic`] for the entry point.
//!
//! ## Elbow curve
//!
//! Dispersion and variance explained for a range of k, for reading the
//! "elbow" by eye. See [`elbow_curve`].
//!
//! ## Clustering
//!
//! Clustering itself is behind the [`ClusteringOracle`] trait; [`KMeans`] is
//! the bundled implementation.

pub mod dispersion;
pub mod elbow;
pub mod gap;
pub mod k_means;
pub mod oracle;
pub mod point_set;
mod principal_axes;
pub mod reference;

pub use dispersion::{total_dispersion, within_dispersion};
pub use elbow::{elbow_curve, ElbowPoint};
pub use gap::{FailureMode, GapConfig, GapEstimate, GapRecord, GapStatistic, KFailure};
pub use k_means::KMeans;
pub use oracle::ClusteringOracle;
pub use point_set::{ClusteringResult, PointSet};
pub use reference::{ReferenceGenerator, ReferenceMethod};
