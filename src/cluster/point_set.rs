use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

use crate::error::{Error, Result};

/// An immutable N × m set of points with finite coordinates.
///
/// A point set always holds at least one point of at least one dimension, so
/// every component that receives one can rely on non-empty bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSet {
    data: Array2<f64>,
}

impl PointSet {
    /// Wraps an `n_points × n_features` matrix.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the matrix has no rows, no columns, or a non-finite value.
    pub fn new(data: Array2<f64>) -> Result<Self> {
        if data.nrows() == 0 {
            return Err(Error::InvalidInput("point set has no points".into()));
        }
        if data.ncols() == 0 {
            return Err(Error::InvalidInput("points must have at least one feature".into()));
        }
        if let Some(((i, j), v)) = data.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(Error::InvalidInput(format!(
                "point {} feature {} is not finite ({})",
                i, j, v
            )));
        }
        Ok(Self { data })
    }

    /// Builds a point set from row vectors.
    ///
    /// # Example
    ///
    /// ```
    /// use gapstat::PointSet;
    ///
    /// let points = PointSet::from_rows(&[vec![0.0, 1.0], vec![2.0, 3.0]]).unwrap();
    /// assert_eq!(points.len(), 2);
    /// assert_eq!(points.dimensions(), 2);
    /// ```
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let dim = rows.first().map_or(0, Vec::len);
        let mut flat = Vec::with_capacity(rows.len() * dim);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != dim {
                return Err(Error::InvalidInput(format!(
                    "point {} has {} features, expected {}",
                    i,
                    row.len(),
                    dim
                )));
            }
            flat.extend_from_slice(row);
        }
        let data = Array2::from_shape_vec((rows.len(), dim), flat)
            .map_err(|e| Error::InvalidInput(e.to_string()))?;
        Self::new(data)
    }

    /// Number of points (N).
    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    /// Always false; kept for API symmetry with collections.
    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    /// Number of features per point (m).
    pub fn dimensions(&self) -> usize {
        self.data.ncols()
    }

    pub fn point(&self, i: usize) -> ArrayView1<'_, f64> {
        self.data.row(i)
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// `(min, max)` of every feature.
    pub fn feature_bounds(&self) -> Vec<(f64, f64)> {
        self.data
            .axis_iter(Axis(1))
            .map(|column| {
                column.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                })
            })
            .collect()
    }
}

/// The output of one clustering call: a label per point and a centroid per cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusteringResult {
    /// Cluster id (in `0..k`) of every point.
    pub assignments: Vec<usize>,
    /// `k × m` centroid matrix.
    pub centroids: Array2<f64>,
}

impl ClusteringResult {
    pub fn new(assignments: Vec<usize>, centroids: Array2<f64>) -> Self {
        Self {
            assignments,
            centroids,
        }
    }

    /// Number of clusters this result was produced for.
    pub fn k(&self) -> usize {
        self.centroids.nrows()
    }

    /// Member count of every cluster id in `0..k`. Out-of-range ids are ignored.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.k()];
        for &c in &self.assignments {
            if let Some(size) = sizes.get_mut(c) {
                *size += 1;
            }
        }
        sizes
    }

    /// Sum of squared distances of each point to its assigned centroid.
    pub fn inertia(&self, points: &PointSet) -> f64 {
        self.assignments
            .iter()
            .enumerate()
            .map(|(i, &c)| squared_distance(points.point(i), self.centroids.row(c)))
            .sum()
    }
}

/// Squared Euclidean distance between two points of the same dimension.
pub(crate) fn squared_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .fold(0.0, |acc, (&x, &y)| acc + (x - y).powi(2))
}
