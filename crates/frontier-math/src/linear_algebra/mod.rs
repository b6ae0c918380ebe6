//! Linear algebra utilities.
//!
//! Small dense helpers used by the portfolio engine. The hot-path helpers
//! ([`dot`], [`quadratic_form`]) do not validate lengths; callers check
//! dimensions once up front with [`ensure_len`] and then evaluate freely.

use crate::error::{MathError, MathResult};
use nalgebra::DMatrix;

/// Default absolute tolerance for symmetry and PSD checks.
pub const DEFAULT_MATRIX_TOLERANCE: f64 = 1e-10;

/// Returns an error unless `actual == expected`.
pub fn ensure_len(expected: usize, actual: usize) -> MathResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(MathError::dimension_mismatch(expected, actual))
    }
}

/// Dot product over the common prefix of `a` and `b`.
#[must_use]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Computes `xᵀ · M · x`.
///
/// ```text
/// q = Σ_i Σ_j x[i] · M[i,j] · x[j]
/// ```
///
/// Indices beyond `min(M.nrows(), x.len())` are ignored.
#[must_use]
pub fn quadratic_form(matrix: &DMatrix<f64>, x: &[f64]) -> f64 {
    let n = matrix.nrows().min(matrix.ncols()).min(x.len());
    let mut acc = 0.0;
    for i in 0..n {
        if x[i] == 0.0 {
            continue;
        }
        let mut row = 0.0;
        for j in 0..n {
            row += matrix[(i, j)] * x[j];
        }
        acc += x[i] * row;
    }
    acc
}

/// Returns `true` if the matrix is square and `|M[i,j] - M[j,i]| <= tol`.
#[must_use]
pub fn is_symmetric(matrix: &DMatrix<f64>, tolerance: f64) -> bool {
    if !matrix.is_square() {
        return false;
    }
    let n = matrix.nrows();
    for i in 0..n {
        for j in (i + 1)..n {
            if (matrix[(i, j)] - matrix[(j, i)]).abs() > tolerance {
                return false;
            }
        }
    }
    true
}

/// Smallest eigenvalue of a symmetric matrix.
///
/// Only the lower triangle is read, so a slightly asymmetric input is
/// treated as its symmetrized counterpart.
pub fn min_eigenvalue(matrix: &DMatrix<f64>) -> MathResult<f64> {
    if !matrix.is_square() {
        return Err(MathError::NotSquare {
            rows: matrix.nrows(),
            cols: matrix.ncols(),
        });
    }
    if matrix.is_empty() {
        return Err(MathError::invalid_input("Empty matrix has no eigenvalues"));
    }
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(MathError::non_finite("eigenvalue input"));
    }

    let eigen = matrix.clone().symmetric_eigen();
    Ok(eigen.eigenvalues.iter().copied().fold(f64::INFINITY, f64::min))
}

/// Returns `true` if the matrix is symmetric and its smallest eigenvalue is
/// at least `-tolerance` (scaled by the largest diagonal entry).
#[must_use]
pub fn is_positive_semidefinite(matrix: &DMatrix<f64>, tolerance: f64) -> bool {
    if !is_symmetric(matrix, tolerance) {
        return false;
    }
    let scale = matrix
        .diagonal()
        .iter()
        .fold(1.0_f64, |acc, v| acc.max(v.abs()));
    match min_eigenvalue(matrix) {
        Ok(lambda) => lambda >= -tolerance * scale,
        Err(_) => false,
    }
}

/// Nearest positive semi-definite matrix in the Frobenius norm.
///
/// Negative eigenvalues are clipped to zero and the matrix is recomposed as
/// `V · max(Λ, 0) · Vᵀ`, then symmetrized so the result is exactly symmetric.
/// Only the lower triangle of the input is read.
pub fn clip_to_positive_semidefinite(matrix: &DMatrix<f64>) -> MathResult<DMatrix<f64>> {
    // validates shape and finiteness
    min_eigenvalue(matrix)?;

    let eigen = matrix.clone().symmetric_eigen();
    let clipped = eigen.eigenvalues.map(|lambda| lambda.max(0.0));
    let vectors = &eigen.eigenvectors;
    let recomposed = vectors * DMatrix::from_diagonal(&clipped) * vectors.transpose();

    Ok((&recomposed + recomposed.transpose()) * 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_dot() {
        assert_relative_eq!(dot(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
        assert_relative_eq!(dot(&[], &[]), 0.0);
    }

    #[test]
    fn test_quadratic_form() {
        let m = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 3.0]);
        // [1, 2] · M · [1, 2]ᵀ = 2 + 2 + 2 + 12
        assert_relative_eq!(quadratic_form(&m, &[1.0, 2.0]), 18.0, epsilon = 1e-12);
        assert_relative_eq!(quadratic_form(&m, &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_ensure_len() {
        assert!(ensure_len(3, 3).is_ok());
        assert!(matches!(
            ensure_len(3, 2),
            Err(MathError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_symmetry() {
        let sym = DMatrix::from_row_slice(2, 2, &[1.0, 0.5, 0.5, 1.0]);
        let asym = DMatrix::from_row_slice(2, 2, &[1.0, 0.5, 0.4, 1.0]);
        let rect = DMatrix::from_row_slice(1, 2, &[1.0, 0.5]);

        assert!(is_symmetric(&sym, DEFAULT_MATRIX_TOLERANCE));
        assert!(!is_symmetric(&asym, DEFAULT_MATRIX_TOLERANCE));
        assert!(!is_symmetric(&rect, DEFAULT_MATRIX_TOLERANCE));
    }

    #[test]
    fn test_min_eigenvalue() {
        let m = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 2.0]);
        assert_relative_eq!(min_eigenvalue(&m).unwrap(), 1.0, epsilon = 1e-10);

        let rect = DMatrix::<f64>::zeros(2, 3);
        assert!(matches!(
            min_eigenvalue(&rect),
            Err(MathError::NotSquare { rows: 2, cols: 3 })
        ));
    }

    #[test]
    fn test_positive_semidefinite() {
        let psd = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]);
        let indefinite = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]);

        assert!(is_positive_semidefinite(&psd, DEFAULT_MATRIX_TOLERANCE));
        assert!(!is_positive_semidefinite(
            &indefinite,
            DEFAULT_MATRIX_TOLERANCE
        ));
    }

    #[test]
    fn test_clip_to_positive_semidefinite() {
        // Perfect correlations A~B, B~C with A~-C cannot coexist.
        let indefinite = DMatrix::from_row_slice(
            3,
            3,
            &[1.0, 1.0, -1.0, 1.0, 1.0, 1.0, -1.0, 1.0, 1.0],
        );
        assert!(min_eigenvalue(&indefinite).unwrap() < -0.5);

        let repaired = clip_to_positive_semidefinite(&indefinite).unwrap();
        assert!(is_symmetric(&repaired, 0.0));
        assert!(is_positive_semidefinite(&repaired, 1e-12));

        let psd = DMatrix::from_row_slice(2, 2, &[0.04, 0.01, 0.01, 0.09]);
        let unchanged = clip_to_positive_semidefinite(&psd).unwrap();
        for (a, b) in unchanged.iter().zip(psd.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-15);
        }

        let rect = DMatrix::<f64>::zeros(2, 3);
        assert!(clip_to_positive_semidefinite(&rect).is_err());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn gram_matrix_is_psd(values in prop::collection::vec(-5.0_f64..5.0, 12)) {
                // BᵀB is PSD for any B.
                let b = DMatrix::from_row_slice(4, 3, &values);
                let gram = b.transpose() * &b;
                let gram = (&gram + gram.transpose()) * 0.5;
                prop_assert!(is_positive_semidefinite(&gram, 1e-9));
            }

            #[test]
            fn quadratic_form_matches_dot(x in prop::collection::vec(-3.0_f64..3.0, 3)) {
                let m = DMatrix::from_row_slice(3, 3, &[2.0, 0.5, 0.0, 0.5, 1.0, 0.2, 0.0, 0.2, 3.0]);
                let mx = &m * nalgebra::DVector::from_column_slice(&x);
                let expected = dot(&x, mx.as_slice());
                prop_assert!((quadratic_form(&m, &x) - expected).abs() <= 1e-12 * (1.0 + expected.abs()));
            }
        }
    }
}
