//! Imaginary-time convolution on the DLR grid
//!
//! The tensor φ contracts with the DLR coefficients of g to give the matrix
//! of convolution by g. Off-diagonal entries are divided differences of the
//! kernel; the diagonal carries the τ-weighted confluent limit.

use ndarray::{Array2, Array3};
use twofloat::TwoFloat;
use xprec_lu::{demote, LuFactors};

use crate::basis::DlrBasis;
use crate::error::{Error, Result};
use crate::kernel::{
    expfun, expfun_xp, kernel_it_abs, kernel_it_abs_xp, kernel_it_rel, kernel_it_rel_xp,
};
use crate::traits::Statistics;
use crate::transform::TransformPack;

/// Convolution tensor φ[j, k, l], scaled by β.
///
/// Contracting the l index with the coefficients of g yields the r×r matrix
/// whose action maps the second factor to the node values of g ∗ f. The
/// standard variant keeps both trailing indices in the coefficient
/// representation; the extended-precision variant pre-composes both with the
/// values → coefficients solve.
pub struct ConvTensor {
    beta: f64,
    values_based: bool,
    phi: Array3<f64>,
}

impl ConvTensor {
    /// Build the convolution tensor in IEEE double.
    pub fn new(basis: &DlrBasis, beta: f64, statistics: Statistics) -> Result<Self> {
        if !(beta > 0.0) {
            return Err(Error::invalid(format!(
                "inverse temperature must be positive, got {}",
                beta
            )));
        }
        let r = basis.rank();
        let t = basis.dlrit();
        let w = basis.dlrrf();
        let xi = statistics.xi();

        let kv = Array2::from_shape_fn((r, r), |(j, l)| kernel_it_rel(t[j], w[l]));
        let e: Vec<f64> = w.iter().map(|&wk| expfun(wk, xi)).collect();
        let k0: Vec<f64> = w.iter().map(|&wk| kernel_it_abs(0.0, wk)).collect();
        let k1: Vec<f64> = w.iter().map(|&wk| kernel_it_abs(1.0, wk)).collect();

        let phi = Array3::from_shape_fn((r, r, r), |(j, k, l)| {
            if k != l {
                beta * (kv[[j, l]] * e[k] - kv[[j, k]] * e[l]) / (w[k] - w[l])
            } else if t[j] >= 0.0 {
                beta * (t[j] * e[k] + xi * k1[k]) * kv[[j, k]]
            } else {
                beta * (t[j] * e[k] + k0[k]) * kv[[j, k]]
            }
        });

        Ok(Self {
            beta,
            values_based: false,
            phi,
        })
    }

    /// Build the values-to-values tensor entirely in double-double
    /// arithmetic, then down-cast.
    ///
    /// The off-diagonal divided difference (ω_k − ω_l)⁻¹ loses relative
    /// precision for near-degenerate frequency pairs at extreme Λ; this path
    /// keeps the assembly and both coefficient solves in extended precision.
    pub fn new_xprec(basis: &DlrBasis, beta: f64, statistics: Statistics) -> Result<Self> {
        if !(beta > 0.0) {
            return Err(Error::invalid(format!(
                "inverse temperature must be positive, got {}",
                beta
            )));
        }
        let r = basis.rank();
        let xi = statistics.xi();
        let zero = TwoFloat::from(0.0);
        let t: Vec<TwoFloat> = basis.dlrit().iter().map(|&x| TwoFloat::from(x)).collect();
        let w: Vec<TwoFloat> = basis.dlrrf().iter().map(|&x| TwoFloat::from(x)).collect();
        let beta_q = TwoFloat::from(beta);

        let kv = Array2::from_shape_fn((r, r), |(j, l)| kernel_it_rel_xp(t[j], w[l]));
        let e: Vec<TwoFloat> = w.iter().map(|&wk| expfun_xp(wk, xi)).collect();
        let k0: Vec<TwoFloat> = w.iter().map(|&wk| kernel_it_abs_xp(zero, wk)).collect();
        let k1: Vec<TwoFloat> = w
            .iter()
            .map(|&wk| kernel_it_abs_xp(TwoFloat::from(1.0), wk))
            .collect();
        let xi_q = TwoFloat::from(xi);

        // Sampling matrix and its transposed LU, both in double-double
        let lu_t = LuFactors::new(kv.t().to_owned())
            .map_err(|_| Error::SingularSystem("extended-precision coefficient map"))?;

        let mut phi = Array3::zeros((r, r, r));
        for j in 0..r {
            let slab = Array2::from_shape_fn((r, r), |(k, l)| {
                if k != l {
                    beta_q * (kv[[j, l]] * e[k] - kv[[j, k]] * e[l]) / (w[k] - w[l])
                } else if t[j] >= zero {
                    beta_q * (t[j] * e[k] + xi_q * k1[k]) * kv[[j, k]]
                } else {
                    beta_q * (t[j] * e[k] + k0[k]) * kv[[j, k]]
                }
            });
            // Compose both trailing indices with the values → coefficients
            // solve: P ← (Mᵀ)⁻¹ P, then P ← ((Mᵀ)⁻¹ Pᵀ)ᵀ
            let p1 = lu_t.solve_matrix(&slab);
            let p2 = lu_t.solve_matrix(&p1.t().to_owned());
            let p2 = demote(&p2);
            for k in 0..r {
                for l in 0..r {
                    phi[[j, k, l]] = p2[[l, k]];
                }
            }
        }

        Ok(Self {
            beta,
            values_based: true,
            phi,
        })
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn rank(&self) -> usize {
        self.phi.shape()[0]
    }

    /// Whether the trailing indices contract with node values rather than
    /// coefficients.
    pub fn is_values_based(&self) -> bool {
        self.values_based
    }

    /// The raw tensor, indexed [τ-node, second factor, first factor].
    pub fn tensor(&self) -> &Array3<f64> {
        &self.phi
    }

    /// Raw contraction of the l index: A[j, k] = Σ_l φ[j, k, l]·g_l.
    pub fn apply(&self, g: &[f64]) -> Array2<f64> {
        let r = self.rank();
        assert_eq!(g.len(), r);
        let mut a = Array2::zeros((r, r));
        for j in 0..r {
            for k in 0..r {
                let mut s = 0.0;
                for l in 0..r {
                    s += self.phi[[j, k, l]] * g[l];
                }
                a[[j, k]] = s;
            }
        }
        a
    }

    /// Convolution matrix acting on node values, from the node values of g.
    ///
    /// For the coefficient-based tensor this solves g to coefficients,
    /// contracts, and right-composes the result with the values →
    /// coefficients map; the extended-precision tensor contracts directly.
    pub fn conv_matrix(&self, tp: &TransformPack, g_values: &[f64]) -> Result<Array2<f64>> {
        if tp.rank() != self.rank() {
            return Err(Error::invalid(format!(
                "transform rank {} does not match tensor rank {}",
                tp.rank(),
                self.rank()
            )));
        }
        if self.values_based {
            Ok(self.apply(g_values))
        } else {
            let gc = tp.coeffs_from_values(g_values)?;
            let a = self.apply(&gc);
            tp.compose_values(&a)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Statistics;

    fn setup(lambda: f64, beta: f64) -> (DlrBasis, TransformPack, ConvTensor) {
        let basis = DlrBasis::build(lambda, 1e-12, 500).unwrap();
        let tp = TransformPack::new(&basis, beta).unwrap();
        let conv = ConvTensor::new(&basis, beta, Statistics::Fermionic).unwrap();
        (basis, tp, conv)
    }

    #[test]
    fn test_tensor_shape() {
        let (basis, _, conv) = setup(20.0, 1.0);
        let r = basis.rank();
        assert_eq!(conv.phi.shape(), &[r, r, r]);
        assert!(!conv.is_values_based());
    }

    #[test]
    fn test_apply_is_linear() {
        let (basis, _, conv) = setup(20.0, 1.0);
        let r = basis.rank();
        let c1: Vec<f64> = (0..r).map(|k| (k as f64 * 0.4).sin()).collect();
        let c2: Vec<f64> = (0..r).map(|k| 1.0 / (1 + k) as f64).collect();
        let mix: Vec<f64> = c1.iter().zip(&c2).map(|(a, b)| 2.0 * a - 0.5 * b).collect();
        let a1 = conv.apply(&c1);
        let a2 = conv.apply(&c2);
        let am = conv.apply(&mix);
        for j in 0..r {
            for k in 0..r {
                let lin = 2.0 * a1[[j, k]] - 0.5 * a2[[j, k]];
                assert!((am[[j, k]] - lin).abs() < 1e-10 * lin.abs().max(1.0));
            }
        }
    }

    #[test]
    fn test_diagonal_continuous_across_midpoint() {
        // The two diagonal branches must agree where τ crosses 1/2
        for &stat in &[Statistics::Fermionic, Statistics::Bosonic] {
            let xi = stat.xi();
            for &omega in &[-7.0, 0.3, 12.0] {
                let e = expfun(omega, xi);
                let up = (0.5 * e + xi * kernel_it_abs(1.0, omega)) * kernel_it_abs(0.5, omega);
                let down = (-0.5 * e + kernel_it_abs(0.0, omega)) * kernel_it_rel(-0.5, omega);
                assert!(
                    (up - down).abs() < 1e-14 * up.abs().max(1.0),
                    "branch mismatch at ω={} ({})",
                    omega,
                    stat.as_str()
                );
            }
        }
    }

    #[test]
    fn test_xprec_matches_standard() {
        let lambda = 50.0;
        let beta = 2.0;
        let basis = DlrBasis::build(lambda, 1e-10, 500).unwrap();
        let tp = TransformPack::new(&basis, beta).unwrap();
        let std_tensor = ConvTensor::new(&basis, beta, Statistics::Fermionic).unwrap();
        let xp_tensor = ConvTensor::new_xprec(&basis, beta, Statistics::Fermionic).unwrap();
        assert!(xp_tensor.is_values_based());

        let g: Vec<f64> = basis
            .dlrit()
            .iter()
            .map(|&t| kernel_it_rel(t, 0.4 * lambda))
            .collect();
        let a = std_tensor.conv_matrix(&tp, &g).unwrap();
        let b = xp_tensor.conv_matrix(&tp, &g).unwrap();
        let scale = a.iter().fold(0.0f64, |m, v| m.max(v.abs()));
        for j in 0..basis.rank() {
            for k in 0..basis.rank() {
                assert!(
                    (a[[j, k]] - b[[j, k]]).abs() < 1e-8 * scale,
                    "mismatch at ({}, {}): {} vs {}",
                    j,
                    k,
                    a[[j, k]],
                    b[[j, k]]
                );
            }
        }
    }
}
