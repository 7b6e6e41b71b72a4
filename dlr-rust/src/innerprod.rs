//! L² inner product on the DLR grid
//!
//! The weight matrix turns node values into the integral ∫₀^β f(τ)g(τ) dτ.
//! Assembly runs in double-double arithmetic: the closed-form kernel overlap
//! cancels catastrophically when ω_j + ω_k is small compared to the
//! individual frequencies, which double precision cannot absorb at large Λ.

use ndarray::Array2;
use twofloat::TwoFloat;
use xprec_lu::{demote, LuFactors};

use crate::basis::DlrBasis;
use crate::error::{Error, Result};
use crate::kernel::{kernel_it_abs_xp, kernel_it_rel_xp};

/// Overlap ∫₀¹ K(τ, a) K(τ, b) dτ via the expm1 closed form, stable for
/// either sign of a + b.
///
/// Writing K(τ, ω) = K(0, ω) e^{−τω} gives (1 − e^{−s})/s · K(0,a)K(0,b)
/// with s = a + b; for s < 0 the reflected form in K(1, ·) keeps every
/// exponential argument non-positive.
fn kernel_overlap(a: TwoFloat, b: TwoFloat) -> TwoFloat {
    let zero = TwoFloat::from(0.0);
    let one = TwoFloat::from(1.0);
    let s = a + b;
    if s >= zero {
        let f = if s == zero { one } else { -(-s).exp_m1() / s };
        f * kernel_it_abs_xp(zero, a) * kernel_it_abs_xp(zero, b)
    } else {
        let f = s.exp_m1() / s;
        f * kernel_it_abs_xp(one, a) * kernel_it_abs_xp(one, b)
    }
}

/// Inner-product weight matrix, composed on both sides with the values →
/// coefficients map and scaled by β; down-cast to double at the end.
pub fn innerproduct_weight(basis: &DlrBasis, beta: f64) -> Result<Array2<f64>> {
    if !(beta > 0.0) {
        return Err(Error::invalid(format!(
            "inverse temperature must be positive, got {}",
            beta
        )));
    }
    let r = basis.rank();
    let t: Vec<TwoFloat> = basis.dlrit().iter().map(|&x| TwoFloat::from(x)).collect();
    let w: Vec<TwoFloat> = basis.dlrrf().iter().map(|&x| TwoFloat::from(x)).collect();

    // Coefficient overlap S and the sampling matrix M, both double-double
    let overlap = Array2::from_shape_fn((r, r), |(j, k)| kernel_overlap(w[j], w[k]));
    let m = Array2::from_shape_fn((r, r), |(i, j)| kernel_it_rel_xp(t[i], w[j]));
    let lu_t = LuFactors::new(m.t().to_owned())
        .map_err(|_| Error::SingularSystem("inner-product coefficient map"))?;

    // ipmat = β · M⁻ᵀ S M⁻¹
    let x1 = lu_t.solve_matrix(&overlap);
    let x2 = lu_t.solve_matrix(&x1.t().to_owned());
    let beta_q = TwoFloat::from(beta);
    let scaled = x2.t().mapv(|v| v * beta_q);

    Ok(demote(&scaled))
}
