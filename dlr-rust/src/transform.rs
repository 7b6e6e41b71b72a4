//! Transforms between DLR coefficients and imaginary-time node values

use ndarray::{Array1, Array2};
use num_complex::Complex64;

use crate::basis::DlrBasis;
use crate::error::{Error, Result};
use crate::kernel::kernel_it_rel;
use crate::linalg::Lu;
use crate::taufuncs::rel2abs;

/// Dense r×r maps between the coefficient and imaginary-time-value
/// representations of a DLR expansion, plus the τ ↦ β − τ reflection.
///
/// A pure function of (basis, β); independent packs may coexist.
pub struct TransformPack {
    beta: f64,
    rank: usize,
    dlrit: Array1<f64>,
    dlrrf: Array1<f64>,
    cf2it: Array2<f64>,
    it2cf: Lu<f64>,
    it2cf_t: Lu<f64>,
    it2itr: Array2<f64>,
}

impl TransformPack {
    pub fn new(basis: &DlrBasis, beta: f64) -> Result<Self> {
        if !(beta > 0.0) {
            return Err(Error::invalid(format!(
                "inverse temperature must be positive, got {}",
                beta
            )));
        }
        let r = basis.rank();
        let dlrit = basis.dlrit().clone();
        let dlrrf = basis.dlrrf().clone();

        let cf2it =
            Array2::from_shape_fn((r, r), |(i, j)| kernel_it_rel(dlrit[i], dlrrf[j]));
        let it2cf = Lu::new(&cf2it);
        // nalgebra's LU has no transpose solve, so the transpose is factored
        // separately; r is small enough that this is negligible.
        let it2cf_t = Lu::new(&cf2it.t().to_owned());

        // Reflection: the node −τ_i in relative format is the point β − τ_i,
        // so the reflected sampling matrix right-composed with values →
        // coefficients gives the values → reflected-values map.
        let refl =
            Array2::from_shape_fn((r, r), |(i, j)| kernel_it_rel(-dlrit[i], dlrrf[j]));
        let it2itr = it2cf_t
            .solve_mat(&refl.t().to_owned(), "reflection operator")?
            .t()
            .to_owned();

        Ok(Self {
            beta,
            rank: r,
            dlrit,
            dlrrf,
            cf2it,
            it2cf,
            it2cf_t,
            it2itr,
        })
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Coefficients → values sampling matrix, (i, j) ↦ K(τ_i, ω_j).
    pub fn cf2it(&self) -> &Array2<f64> {
        &self.cf2it
    }

    /// Values → reflected-values matrix for τ ↦ β − τ.
    pub fn it2itr(&self) -> &Array2<f64> {
        &self.it2itr
    }

    /// Imaginary-time nodes in physical units on [0, β].
    pub fn tau(&self) -> Array1<f64> {
        self.dlrit.mapv(|t| rel2abs(t) * self.beta)
    }

    /// Imaginary-time nodes in relative format.
    pub fn dlrit(&self) -> &Array1<f64> {
        &self.dlrit
    }

    /// Frequency nodes in scaled units.
    pub fn dlrrf(&self) -> &Array1<f64> {
        &self.dlrrf
    }

    /// Recover DLR coefficients from values on the imaginary-time nodes.
    pub fn coeffs_from_values(&self, values: &[f64]) -> Result<Vec<f64>> {
        self.it2cf.solve_slice(values, "values to coefficients")
    }

    /// Evaluate a coefficient vector on the imaginary-time nodes.
    pub fn values_from_coeffs(&self, coeffs: &[f64]) -> Vec<f64> {
        assert_eq!(coeffs.len(), self.rank);
        let c = Array1::from_iter(coeffs.iter().copied());
        self.cf2it.dot(&c).to_vec()
    }

    /// Complex variant of [`Self::values_from_coeffs`]; the sampling matrix
    /// is real.
    pub fn values_from_coeffs_complex(&self, coeffs: &[Complex64]) -> Vec<Complex64> {
        assert_eq!(coeffs.len(), self.rank);
        (0..self.rank)
            .map(|i| {
                coeffs
                    .iter()
                    .enumerate()
                    .map(|(j, &c)| c * self.cf2it[[i, j]])
                    .sum()
            })
            .collect()
    }

    /// Column-wise values → coefficients for stacked data.
    pub fn coeffs_from_values_2d(&self, values: &Array2<f64>) -> Result<Array2<f64>> {
        self.it2cf.solve_mat(values, "values to coefficients")
    }

    /// Column-wise coefficients → values for stacked data.
    pub fn values_from_coeffs_2d(&self, coeffs: &Array2<f64>) -> Array2<f64> {
        assert_eq!(coeffs.nrows(), self.rank);
        self.cf2it.dot(coeffs)
    }

    /// Apply the reflection τ ↦ β − τ to node values.
    pub fn reflect(&self, values: &[f64]) -> Vec<f64> {
        assert_eq!(values.len(), self.rank);
        let v = Array1::from_iter(values.iter().copied());
        self.it2itr.dot(&v).to_vec()
    }

    /// Right-compose a matrix acting on coefficients with the values →
    /// coefficients solve, yielding a matrix acting on node values.
    pub(crate) fn compose_values(&self, a: &Array2<f64>) -> Result<Array2<f64>> {
        let x = self
            .it2cf_t
            .solve_mat(&a.t().to_owned(), "coefficient composition")?;
        Ok(x.t().to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pack(lambda: f64, eps: f64, beta: f64) -> TransformPack {
        let basis = DlrBasis::build(lambda, eps, 500).unwrap();
        TransformPack::new(&basis, beta).unwrap()
    }

    #[test]
    fn test_rejects_bad_beta() {
        let basis = DlrBasis::build(10.0, 1e-10, 500).unwrap();
        assert!(TransformPack::new(&basis, 0.0).is_err());
    }

    #[test]
    fn test_coeff_value_roundtrip() {
        let tp = pack(100.0, 1e-12, 1.0);
        let r = tp.rank();
        // Smooth coefficient vector
        let coeffs: Vec<f64> = (0..r).map(|k| (0.3 * k as f64).sin() / (1 + k) as f64).collect();
        let values = tp.values_from_coeffs(&coeffs);
        let back = tp.coeffs_from_values(&values).unwrap();
        let scale: f64 = values.iter().fold(0.0f64, |m, v| m.max(v.abs()));
        for (a, b) in coeffs.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-10 * scale.max(1.0), "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_2d_matches_1d() {
        let tp = pack(40.0, 1e-10, 1.0);
        let r = tp.rank();
        let coeffs: Vec<f64> = (0..r).map(|k| 1.0 / (1 + k * k) as f64).collect();
        let c2 = Array2::from_shape_fn((r, 2), |(i, j)| coeffs[i] * (j + 1) as f64);
        let v2 = tp.values_from_coeffs_2d(&c2);
        let v1 = tp.values_from_coeffs(&coeffs);
        for i in 0..r {
            assert!((v2[[i, 0]] - v1[i]).abs() < 1e-13);
            assert!((v2[[i, 1]] - 2.0 * v1[i]).abs() < 1e-13);
        }
        let back = tp.coeffs_from_values_2d(&v2).unwrap();
        for i in 0..r {
            assert!((back[[i, 0]] - coeffs[i]).abs() < 1e-10);
        }
    }

    #[test]
    fn test_tau_nodes_scale_with_beta() {
        let beta = 7.5;
        let tp = pack(20.0, 1e-10, beta);
        for (&tau, &rel) in tp.tau().iter().zip(tp.dlrit().iter()) {
            assert!((tau - rel2abs(rel) * beta).abs() < 1e-14 * beta);
            assert!(tau > 0.0 && tau < beta);
        }
    }

    #[test]
    fn test_reflection_involution() {
        // it2itr applied twice is the identity up to conditioning
        let tp = pack(100.0, 1e-12, 1.0);
        let r = tp.rank();
        let g: Vec<f64> = tp
            .dlrit()
            .iter()
            .map(|&t| kernel_it_rel(t, 0.37 * 100.0))
            .collect();
        let gr = tp.reflect(&g);
        let grr = tp.reflect(&gr);
        for i in 0..r {
            assert!(
                (grr[i] - g[i]).abs() < 1e-9,
                "involution failure at {}: {} vs {}",
                i,
                grr[i],
                g[i]
            );
        }
    }
}
