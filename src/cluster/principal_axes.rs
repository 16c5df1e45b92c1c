use ndarray::Array2;

const MAX_SWEEPS: usize = 100;
const OFF_DIAGONAL_TOLERANCE: f64 = 1e-22;

/// Eigenvectors (as columns) of a symmetric matrix, by cyclic Jacobi rotations.
///
/// Eigenvalues are not sorted; callers only need an orthonormal basis aligned
/// with the principal axes.
pub(crate) fn symmetric_eigenvectors(matrix: &Array2<f64>) -> Array2<f64> {
    let m = matrix.nrows();
    let mut a = matrix.clone();
    let mut v = Array2::<f64>::eye(m);

    let scale: f64 = a.iter().map(|x| x * x).sum::<f64>().max(f64::MIN_POSITIVE);

    for _sweep in 0..MAX_SWEEPS {
        let mut off = 0.0;
        for p in 0..m {
            for q in p + 1..m {
                off += a[[p, q]] * a[[p, q]];
            }
        }
        if off <= OFF_DIAGONAL_TOLERANCE * scale {
            break;
        }

        for p in 0..m {
            for q in p + 1..m {
                let apq = a[[p, q]];
                if apq == 0.0 {
                    continue;
                }
                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..m {
                    let akp = a[[k, p]];
                    let akq = a[[k, q]];
                    a[[k, p]] = c * akp - s * akq;
                    a[[k, q]] = s * akp + c * akq;
                }
                for k in 0..m {
                    let apk = a[[p, k]];
                    let aqk = a[[q, k]];
                    a[[p, k]] = c * apk - s * aqk;
                    a[[q, k]] = s * apk + c * aqk;
                }
                for k in 0..m {
                    let vkp = v[[k, p]];
                    let vkq = v[[k, q]];
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_diagonalizes_symmetric_matrix() {
        let c = array![[4.0, 1.0, 0.5], [1.0, 3.0, 0.2], [0.5, 0.2, 1.0]];
        let v = symmetric_eigenvectors(&c);

        let identity = v.t().dot(&v);
        let diagonal = v.t().dot(&c).dot(&v);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(identity[[i, j]], expected, epsilon = 1e-10);
                if i != j {
                    assert_abs_diff_eq!(diagonal[[i, j]], 0.0, epsilon = 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_zero_matrix_keeps_identity() {
        let v = symmetric_eigenvectors(&Array2::zeros((2, 2)));
        assert_eq!(v, Array2::<f64>::eye(2));
    }
}
