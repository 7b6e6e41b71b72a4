//! Least-squares fit of DLR coefficients to scattered imaginary-time data

use nalgebra::linalg::ColPivQR;
use nalgebra::DVector;
use ndarray::Array2;

use crate::basis::DlrBasis;
use crate::error::{Error, Result};
use crate::kernel::kernel_it_rel;
use crate::linalg::{to_dmatrix, upper_tri_solve};
use crate::rrqr::absolute_pivots;

/// Fit DLR coefficients to samples (τ_i, G(τ_i)), τ in relative format.
///
/// Solves min ‖A·c − g‖₂ with A_{ij} = K(τ_i, ω_j) by QR with column
/// pivoting; rank-deficient sample sets are truncated at the numerical rank,
/// which is returned alongside the coefficients.
pub fn fit_it(basis: &DlrBasis, tau: &[f64], values: &[f64]) -> Result<(Vec<f64>, usize)> {
    if tau.is_empty() {
        return Err(Error::invalid("no imaginary-time samples given"));
    }
    if tau.len() != values.len() {
        return Err(Error::invalid(format!(
            "{} sample points but {} values",
            tau.len(),
            values.len()
        )));
    }
    let m = tau.len();
    let r = basis.rank();
    let w = basis.dlrrf();

    let a = Array2::from_shape_fn((m, r), |(i, j)| kernel_it_rel(tau[i], w[j]));
    let qr = ColPivQR::new(to_dmatrix(&a));
    let pivots = absolute_pivots(&qr, r);
    let rmat = qr.r();

    // Numerical rank from the trailing diagonal of R
    let k = m.min(r);
    let tol = f64::EPSILON * (m.max(r) as f64) * rmat[(0, 0)].abs();
    let mut rank = k;
    for i in 0..k {
        if rmat[(i, i)].abs() <= tol {
            rank = i;
            break;
        }
    }
    if rank == 0 {
        return Err(Error::invalid("sample matrix is numerically zero"));
    }

    // y = R⁻¹ Qᵀ g on the leading rank block, zero beyond
    let qtb = qr.q().transpose() * DVector::from_column_slice(values);
    let mut y: Vec<f64> = qtb.iter().copied().collect();
    upper_tri_solve(&rmat, &mut y, rank);

    let mut coeffs = vec![0.0; r];
    for i in 0..rank {
        coeffs[pivots[i]] = y[i];
    }
    Ok((coeffs, rank))
}
