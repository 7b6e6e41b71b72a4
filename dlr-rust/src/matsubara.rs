//! Matsubara-frequency node selection and transforms
//!
//! Works in scaled units throughout: the kernel is 1/(iπ(2n + ζ) − ω̃) with
//! ω̃ = βω, so node selection and the coefficient maps are independent of β.
//! Physical frequencies are available from [`MatsubaraPack::frequencies`].

use std::marker::PhantomData;

use ndarray::{Array1, Array2};
use num_complex::Complex64;

use crate::basis::DlrBasis;
use crate::error::{Error, Result};
use crate::kernel::kernel_mf;
use crate::linalg::Lu;
use crate::rrqr::pivoted_qr_pivots_complex;
use crate::traits::StatisticsType;

/// Selected Matsubara interpolation nodes and the complex r×r maps between
/// DLR coefficients and Matsubara node values.
pub struct MatsubaraPack<S: StatisticsType> {
    beta: f64,
    nmax: i64,
    rank: usize,
    dlrmf: Vec<i64>,
    dlrrf: Array1<f64>,
    cf2mf: Array2<Complex64>,
    mf2cf: Lu<Complex64>,
    _statistics: PhantomData<S>,
}

impl<S: StatisticsType> MatsubaraPack<S> {
    /// Select r Matsubara nodes from the window |n| ≤ nmax and factor the
    /// coefficient maps.
    pub fn new(basis: &DlrBasis, beta: f64, nmax: i64) -> Result<Self> {
        if !(beta > 0.0) {
            return Err(Error::invalid(format!(
                "inverse temperature must be positive, got {}",
                beta
            )));
        }
        let r = basis.rank();
        if nmax < 0 || 2 * nmax + 1 < r as i64 {
            return Err(Error::invalid(format!(
                "Matsubara window |n| <= {} is too small for rank {}",
                nmax, r
            )));
        }
        let dlrrf = basis.dlrrf().clone();

        // Fixed-rank pivoted QR over the frequency columns of the
        // Fourier-transformed kernel
        let ncols = (2 * nmax + 1) as usize;
        let kmf = Array2::from_shape_fn((r, ncols), |(k, m)| {
            kernel_mf(m as i64 - nmax, dlrrf[k], S::STATISTICS)
        });
        let pivots = pivoted_qr_pivots_complex(&kmf);
        let dlrmf: Vec<i64> = pivots[..r].iter().map(|&m| m as i64 - nmax).collect();

        let cf2mf = Array2::from_shape_fn((r, r), |(i, j)| {
            kernel_mf(dlrmf[i], dlrrf[j], S::STATISTICS)
        });
        let mf2cf = Lu::new(&cf2mf);

        log::debug!(
            "Matsubara nodes ({}): nmax={}, rank={}",
            S::STATISTICS.as_str(),
            nmax,
            r
        );

        Ok(Self {
            beta,
            nmax,
            rank: r,
            dlrmf,
            dlrrf,
            cf2mf,
            mf2cf,
            _statistics: PhantomData,
        })
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn nmax(&self) -> i64 {
        self.nmax
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Selected Matsubara indices, pivot order.
    pub fn nodes(&self) -> &[i64] {
        &self.dlrmf
    }

    /// Coefficients → Matsubara-values matrix, (i, j) ↦ K(iν_{n_i}, ω_j).
    pub fn cf2mf(&self) -> &Array2<Complex64> {
        &self.cf2mf
    }

    /// Physical frequencies iν_n = i(2n + ζ)π/β of the selected nodes.
    pub fn frequencies(&self) -> Vec<Complex64> {
        let zeta = S::STATISTICS.zeta();
        self.dlrmf
            .iter()
            .map(|&n| Complex64::new(0.0, (2 * n + zeta) as f64 * std::f64::consts::PI / self.beta))
            .collect()
    }

    /// Evaluate real DLR coefficients on the Matsubara nodes.
    pub fn mf_from_coeffs(&self, coeffs: &[f64]) -> Vec<Complex64> {
        assert_eq!(coeffs.len(), self.rank);
        (0..self.rank)
            .map(|i| {
                coeffs
                    .iter()
                    .enumerate()
                    .map(|(j, &c)| self.cf2mf[[i, j]] * c)
                    .sum()
            })
            .collect()
    }

    /// Evaluate complex DLR coefficients on the Matsubara nodes.
    pub fn mf_from_coeffs_complex(&self, coeffs: &[Complex64]) -> Vec<Complex64> {
        assert_eq!(coeffs.len(), self.rank);
        let c = Array1::from_iter(coeffs.iter().copied());
        self.cf2mf.dot(&c).to_vec()
    }

    /// Recover DLR coefficients from Matsubara node values.
    ///
    /// The coefficients of a physical (Hermitian-symmetric) function are real
    /// up to roundoff; the imaginary parts are returned untouched so callers
    /// can inspect them.
    pub fn coeffs_from_mf(&self, values: &[Complex64]) -> Result<Vec<Complex64>> {
        self.mf2cf.solve_slice(values, "Matsubara values to coefficients")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{Bosonic, Fermionic};

    fn setup(lambda: f64, eps: f64) -> (DlrBasis, MatsubaraPack<Fermionic>) {
        let basis = DlrBasis::build(lambda, eps, 500).unwrap();
        let nmax = lambda as i64;
        let pack = MatsubaraPack::<Fermionic>::new(&basis, 1.0, nmax).unwrap();
        (basis, pack)
    }

    #[test]
    fn test_window_validation() {
        let basis = DlrBasis::build(100.0, 1e-12, 500).unwrap();
        let r = basis.rank() as i64;
        assert!(MatsubaraPack::<Fermionic>::new(&basis, 1.0, r / 2 - 1).is_err());
        assert!(MatsubaraPack::<Fermionic>::new(&basis, -1.0, 100).is_err());
    }

    #[test]
    fn test_nodes_distinct_and_in_window() {
        let (basis, pack) = setup(100.0, 1e-12);
        let mut n = pack.nodes().to_vec();
        assert_eq!(n.len(), basis.rank());
        n.sort_unstable();
        n.dedup();
        assert_eq!(n.len(), basis.rank());
        for &m in pack.nodes() {
            assert!(m.abs() <= pack.nmax());
        }
    }

    #[test]
    fn test_roundtrip_through_matsubara() {
        let (basis, pack) = setup(100.0, 1e-12);
        let r = basis.rank();
        let coeffs: Vec<f64> = (0..r).map(|k| ((k * k) as f64 * 0.1).cos() / (1 + k) as f64).collect();
        let mf = pack.mf_from_coeffs(&coeffs);
        let back = pack.coeffs_from_mf(&mf).unwrap();
        let mf2 = pack.mf_from_coeffs_complex(&back);
        let scale: f64 = mf.iter().fold(0.0f64, |m, v| m.max(v.norm()));
        for (a, b) in mf.iter().zip(mf2.iter()) {
            assert!((a - b).norm() < 1e-10 * scale.max(1.0));
        }
    }

    #[test]
    fn test_frequencies_match_convention() {
        let basis = DlrBasis::build(20.0, 1e-10, 500).unwrap();
        let beta = 4.0;
        let fpack = MatsubaraPack::<Fermionic>::new(&basis, beta, 40).unwrap();
        for (&n, nu) in fpack.nodes().iter().zip(fpack.frequencies()) {
            let expected = (2 * n + 1) as f64 * std::f64::consts::PI / beta;
            assert!((nu.im - expected).abs() < 1e-14 * expected.abs().max(1.0));
            assert!(nu.re == 0.0);
        }
        let bpack = MatsubaraPack::<Bosonic>::new(&basis, beta, 40).unwrap();
        for (&n, nu) in bpack.nodes().iter().zip(bpack.frequencies()) {
            let expected = (2 * n) as f64 * std::f64::consts::PI / beta;
            assert!((nu.im - expected).abs() < 1e-14 * expected.abs().max(1.0));
        }
    }
}
