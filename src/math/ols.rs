//! Least squares solver.
//!
//! The ARMA estimator solves small regression problems in two places:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! - the Hannan–Rissanen start (regress on lagged values and lagged residuals)
//! - every Gauss–Newton step (regress residuals on the Jacobian)
//!
//! The design matrices are tall and can be close to rank deficient (an MA term
//! with θ near zero has an almost flat Jacobian column), so we use SVD with a
//! short ladder of tolerances rather than QR.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Build a design matrix from row vectors of equal length.
pub fn design_matrix(rows: &[Vec<f64>]) -> Option<DMatrix<f64>> {
    let ncols = rows.first()?.len();
    if ncols == 0 || rows.iter().any(|r| r.len() != ncols) {
        return None;
    }
    Some(DMatrix::from_fn(rows.len(), ncols, |i, j| rows[i][j]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn design_matrix_rejects_ragged_rows() {
        assert!(design_matrix(&[vec![1.0, 2.0], vec![3.0]]).is_none());
        assert!(design_matrix(&[]).is_none());
        let m = design_matrix(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        assert_eq!(m.shape(), (3, 2));
        assert_eq!(m[(2, 1)], 6.0);
    }
}
