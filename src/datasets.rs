//! Synthetic data: isotropic Gaussian blobs.

use ndarray::Array2;
use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};

use crate::cluster::PointSet;
use crate::error::{Error, Result};

/// Labeled blob data.
#[derive(Debug, Clone)]
pub struct Blobs {
    pub points: PointSet,
    /// Index of the center each point was drawn around.
    pub labels: Vec<usize>,
}

/// Draws `n_samples` points around `centers` with standard deviation
/// `cluster_std` in every dimension.
///
/// Samples are split evenly between centers; the first `n_samples % centers.len()`
/// centers get one extra point. Points are emitted center by center.
///
/// # Errors
///
/// `InvalidInput` if there are no samples or centers, the centers have
/// different dimensions, or `cluster_std` is negative or not finite.
pub fn make_blobs<R: Rng + ?Sized>(
    n_samples: usize,
    centers: &[Vec<f64>],
    cluster_std: f64,
    rng: &mut R,
) -> Result<Blobs> {
    if n_samples == 0 || centers.is_empty() {
        return Err(Error::InvalidInput(
            "make_blobs needs at least one sample and one center".into(),
        ));
    }
    let dim = centers[0].len();
    if dim == 0 || centers.iter().any(|c| c.len() != dim) {
        return Err(Error::InvalidInput(
            "centers must share a non-zero dimension".into(),
        ));
    }
    let noise = Normal::new(0.0, cluster_std)
        .map_err(|e| Error::InvalidInput(format!("cluster_std {}: {}", cluster_std, e)))?;

    let per_center = n_samples / centers.len();
    let extra = n_samples % centers.len();

    let mut data = Array2::<f64>::zeros((n_samples, dim));
    let mut labels = Vec::with_capacity(n_samples);
    let mut row = 0;
    for (label, center) in centers.iter().enumerate() {
        let count = per_center + usize::from(label < extra);
        for _ in 0..count {
            for (j, &c) in center.iter().enumerate() {
                data[[row, j]] = c + noise.sample(rng);
            }
            labels.push(label);
            row += 1;
        }
    }

    Ok(Blobs {
        points: PointSet::new(data)?,
        labels,
    })
}

/// Draws `count` centers uniformly inside `[low, high)` in every dimension.
pub fn random_centers<R: Rng + ?Sized>(
    count: usize,
    dimensions: usize,
    (low, high): (f64, f64),
    rng: &mut R,
) -> Result<Vec<Vec<f64>>> {
    if !(low < high) || !low.is_finite() || !high.is_finite() {
        return Err(Error::InvalidInput(format!(
            "center box [{}, {}) is empty or unbounded",
            low, high
        )));
    }
    let dist = Uniform::new(low, high);
    Ok((0..count)
        .map(|_| (0..dimensions).map(|_| dist.sample(rng)).collect())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_blob_sizes_and_labels() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let centers = vec![vec![0.0, 0.0], vec![5.0, 5.0], vec![-5.0, 5.0]];
        let blobs = make_blobs(10, &centers, 0.1, &mut rng).unwrap();

        assert_eq!(blobs.points.len(), 10);
        assert_eq!(blobs.labels, vec![0, 0, 0, 0, 1, 1, 1, 2, 2, 2]);
        for (i, &label) in blobs.labels.iter().enumerate() {
            let p = blobs.points.point(i);
            assert!((p[0] - centers[label][0]).abs() < 1.0);
            assert!((p[1] - centers[label][1]).abs() < 1.0);
        }
    }

    #[test]
    fn test_invalid_blob_parameters() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let centers = vec![vec![0.0, 0.0]];
        assert!(make_blobs(0, &centers, 1.0, &mut rng).is_err());
        assert!(make_blobs(5, &[], 1.0, &mut rng).is_err());
        assert!(make_blobs(5, &centers, -1.0, &mut rng).is_err());
        assert!(make_blobs(5, &[vec![0.0], vec![0.0, 1.0]], 1.0, &mut rng).is_err());
    }

    #[test]
    fn test_random_centers_in_box() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let centers = random_centers(4, 3, (-10.0, 10.0), &mut rng).unwrap();
        assert_eq!(centers.len(), 4);
        assert!(centers
            .iter()
            .all(|c| c.len() == 3 && c.iter().all(|v| (-10.0..10.0).contains(v))));
        assert!(random_centers(4, 3, (1.0, 1.0), &mut rng).is_err());
    }
}
