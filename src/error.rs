use std::fmt;

use thiserror::Error;

use crate::cluster::{GapRecord, KFailure};

/// Which point set produced a zero dispersion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispersionSource {
    /// The caller's data.
    Observed,
    /// The reference replicate with this index.
    Reference(usize),
}

impl fmt::Display for DispersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispersionSource::Observed => write!(f, "observed data"),
            DispersionSource::Reference(b) => write!(f, "reference replicate {}", b),
        }
    }
}

/// Errors returned while estimating the number of clusters.
///
/// None of these are fatal: each one describes a parameter choice or a data
/// shape the caller can react to (wider k range, more replicates, deduplicated
/// input). Variants raised mid-estimation carry the records of every k that
/// completed before the failure.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed point set, k range, or parameter.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The clustering for `k` names a cluster with no members.
    #[error("cluster {cluster} of the k = {k} clustering has no members")]
    EmptyCluster {
        /// Requested number of clusters.
        k: usize,
        /// The empty cluster id.
        cluster: usize,
        /// Records computed for smaller k before the failure.
        partial: Vec<GapRecord>,
    },

    /// A within-cluster dispersion of zero makes its logarithm undefined.
    #[error("zero within-cluster dispersion at k = {k} on the {data}")]
    DegenerateDispersion {
        /// Requested number of clusters.
        k: usize,
        /// Point set whose clustering had zero dispersion.
        data: DispersionSource,
        /// Records computed for smaller k before the failure.
        partial: Vec<GapRecord>,
    },

    /// No k in the range satisfied `Gap(k) >= Gap(k+1) - s(k+1)`.
    #[error("no k among {} evaluated values satisfies Gap(k) >= Gap(k+1) - s(k+1)", .records.len())]
    NoElbowFound {
        /// Every record computed, for manual inspection.
        records: Vec<GapRecord>,
        /// k values skipped in tolerant mode; empty when failing fast.
        failures: Vec<KFailure>,
    },
}

impl Error {
    /// The k at which the error occurred, if it is tied to one.
    pub fn k(&self) -> Option<usize> {
        match self {
            Error::EmptyCluster { k, .. } | Error::DegenerateDispersion { k, .. } => Some(*k),
            Error::InvalidInput(_) | Error::NoElbowFound { .. } => None,
        }
    }

    /// Records that were computed before the error was raised.
    pub fn partial_records(&self) -> &[GapRecord] {
        match self {
            Error::EmptyCluster { partial, .. } | Error::DegenerateDispersion { partial, .. } => {
                partial
            }
            Error::NoElbowFound { records, .. } => records,
            Error::InvalidInput(_) => &[],
        }
    }

    pub(crate) fn with_partial(mut self, records: Vec<GapRecord>) -> Self {
        match &mut self {
            Error::EmptyCluster { partial, .. } | Error::DegenerateDispersion { partial, .. } => {
                *partial = records;
            }
            Error::InvalidInput(_) | Error::NoElbowFound { .. } => {}
        }
        self
    }
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
