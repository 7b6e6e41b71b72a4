//! DLR basis construction
//!
//! Two successive pivoted-QR sweeps over the fine kernel matrix select the
//! real-frequency support points and the imaginary-time interpolation nodes.

use ndarray::{Array1, Array2};
use num_complex::Complex64;

use crate::error::{Error, Result};
use crate::fine::FineGrid;
use crate::kernel::{kernel_it_abs, kernel_mf};
use crate::rrqr::{pivoted_qr_adaptive, pivoted_qr_pivots};
use crate::traits::StatisticsType;

/// Discrete Lehmann representation basis for a given cutoff Λ and accuracy ε.
///
/// Immutable once built. Imaginary-time nodes are stored in relative format;
/// frequency nodes are in the scaled units ω ∈ [−Λ, Λ]. Node lists keep the
/// pivot order of the selection and are deliberately unsorted.
#[derive(Debug, Clone)]
pub struct DlrBasis {
    lambda: f64,
    eps: f64,
    rank: usize,
    dlrrf: Array1<f64>,
    oidx: Vec<usize>,
    dlrit: Array1<f64>,
    tidx: Vec<usize>,
    fine_err: [f64; 2],
}

impl DlrBasis {
    /// Build the DLR basis for cutoff `lambda` and target accuracy `eps`.
    ///
    /// `max_rank` caps the discovered ε-rank; the conventional choice is 500.
    pub fn build(lambda: f64, eps: f64, max_rank: usize) -> Result<Self> {
        if !(eps > 0.0 && eps < 1.0) {
            return Err(Error::invalid(format!("accuracy must lie in (0, 1), got {}", eps)));
        }
        if max_rank == 0 {
            return Err(Error::invalid("rank cap must be positive"));
        }

        let fine = FineGrid::build(lambda)?;
        let fine_err = fine.err;
        if fine_err[0].max(fine_err[1]) > 100.0 * eps {
            log::warn!(
                "fine discretization self-check error {:.3e} exceeds target accuracy {:.1e}",
                fine_err[0].max(fine_err[1]),
                eps
            );
        }

        // Frequency selection: adaptive pivoted QR over the columns
        let (perm_o, rank) = pivoted_qr_adaptive(&fine.kmat, eps);
        if rank > max_rank {
            return Err(Error::RankOverflow { rank, max_rank });
        }
        let oidx: Vec<usize> = perm_o[..rank].to_vec();
        let dlrrf = Array1::from_iter(oidx.iter().map(|&j| fine.om[j]));

        // Imaginary-time selection: fixed-rank pivoted QR over the τ rows
        // restricted to the selected frequency columns
        let nt = fine.nt();
        let restricted =
            Array2::from_shape_fn((rank, nt), |(k, i)| fine.kmat[[i, oidx[k]]]);
        let perm_t = pivoted_qr_pivots(&restricted);
        let tidx: Vec<usize> = perm_t[..rank].to_vec();
        let dlrit = Array1::from_iter(tidx.iter().map(|&i| fine.t[i]));

        log::debug!("DLR basis: lambda={}, eps={:.1e}, rank={}", lambda, eps, rank);

        Ok(Self {
            lambda,
            eps,
            rank,
            dlrrf,
            oidx,
            dlrit,
            tidx,
            fine_err,
        })
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn eps(&self) -> f64 {
        self.eps
    }

    /// Basis rank r.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Selected real-frequency support points, scaled units.
    pub fn dlrrf(&self) -> &Array1<f64> {
        &self.dlrrf
    }

    /// Selected imaginary-time nodes, relative format.
    pub fn dlrit(&self) -> &Array1<f64> {
        &self.dlrit
    }

    /// Fine-grid column indices of the frequency nodes (diagnostics).
    pub fn oidx(&self) -> &[usize] {
        &self.oidx
    }

    /// Fine-grid row indices of the imaginary-time nodes (diagnostics).
    pub fn tidx(&self) -> &[usize] {
        &self.tidx
    }

    /// Panel-interpolation self-check error of the dropped fine grid.
    pub fn fine_err(&self) -> [f64; 2] {
        self.fine_err
    }

    /// Imaginary-time nodes in absolute format on [0, 1].
    pub fn tau_abs(&self) -> Array1<f64> {
        self.dlrit.mapv(crate::taufuncs::rel2abs)
    }

    /// Evaluate a DLR expansion at a relative-format imaginary time.
    ///
    /// For τ < 0 the kernel symmetry K(1 + τ, ω) = K(−τ, −ω) is used, which
    /// preserves relative precision near τ = 1.
    pub fn eval_it(&self, coeffs: &[f64], tau: f64) -> f64 {
        debug_assert_eq!(coeffs.len(), self.rank);
        if tau >= 0.0 {
            coeffs
                .iter()
                .zip(self.dlrrf.iter())
                .map(|(&c, &w)| c * kernel_it_abs(tau, w))
                .sum()
        } else {
            coeffs
                .iter()
                .zip(self.dlrrf.iter())
                .map(|(&c, &w)| c * kernel_it_abs(-tau, -w))
                .sum()
        }
    }

    /// Evaluate a DLR expansion at the Matsubara index n (scaled units).
    pub fn eval_mf<S: StatisticsType>(&self, coeffs: &[f64], n: i64) -> Complex64 {
        debug_assert_eq!(coeffs.len(), self.rank);
        coeffs
            .iter()
            .zip(self.dlrrf.iter())
            .map(|(&c, &w)| c * kernel_mf(n, w, S::STATISTICS))
            .sum()
    }
}
