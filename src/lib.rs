//! Choosing the number of clusters `k` for k-means.
//!
//! The centrepiece is the gap statistic of Tibshirani, Walther & Hastie
//! (2001): cluster the data and a set of uniform reference replicates for a
//! range of k, and pick the smallest k whose gap over the reference is within
//! one standard error of the next. An elbow curve (dispersion and variance
//! explained per k) and a Gaussian blob generator are included.
//!
//! ```rust
//! use gapstat::datasets::make_blobs;
//! use gapstat::{GapConfig, GapStatistic, KMeans};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha20Rng;
//!
//! let mut rng = ChaCha20Rng::seed_from_u64(7);
//! let centers = vec![vec![0.0, 0.0], vec![20.0, 0.0], vec![10.0, 20.0]];
//! let blobs = make_blobs(60, &centers, 1.0, &mut rng).unwrap();
//!
//! let estimator = GapStatistic::new(KMeans::new(), GapConfig::default());
//! match estimator.estimate(&blobs.points, 1..=6, &mut rng) {
//!     Ok(estimate) => println!("k = {}", estimate.recommended_k),
//!     Err(e) => println!("no recommendation: {}", e),
//! }
//! ```

pub mod cluster;
pub mod datasets;
pub mod error;

pub use cluster::{
    elbow_curve, total_dispersion, within_dispersion, ClusteringOracle, ClusteringResult,
    ElbowPoint, FailureMode, GapConfig, GapEstimate, GapRecord, GapStatistic, KFailure, KMeans,
    PointSet, ReferenceGenerator, ReferenceMethod,
};
pub use error::{DispersionSource, Error, Result};
