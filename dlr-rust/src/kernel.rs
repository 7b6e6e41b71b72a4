//! Lehmann kernel primitives
//!
//! The imaginary-time kernel is evaluated in the rescaled variables
//! τ ∈ [0, 1], ω ∈ [−Λ, Λ] (both measured in units of β). All branches are
//! arranged so that every exponential argument is non-positive; the kernels
//! never overflow for finite ω.

use num_complex::Complex64;
use twofloat::TwoFloat;

use crate::traits::Statistics;

/// Imaginary-time kernel K(τ, ω) = e^{−τω}/(1 + e^{−ω}) in absolute format,
/// τ ∈ [0, 1].
///
/// For ω < 0 the algebraically identical form e^{(1−τ)ω}/(1 + e^{ω}) is used
/// so that no exponential argument is positive.
pub fn kernel_it_abs(tau: f64, omega: f64) -> f64 {
    if omega >= 0.0 {
        (-tau * omega).exp() / (1.0 + (-omega).exp())
    } else {
        ((1.0 - tau) * omega).exp() / (1.0 + omega.exp())
    }
}

/// Imaginary-time kernel in relative format.
///
/// τ ≥ 0 is the absolute point; τ < 0 encodes the absolute point 1 + τ and
/// is evaluated through the symmetry K(1 + τ, ω) = K(−τ, −ω), which keeps
/// full relative precision near τ = 1.
pub fn kernel_it_rel(tau: f64, omega: f64) -> f64 {
    if tau >= 0.0 {
        kernel_it_abs(tau, omega)
    } else {
        kernel_it_abs(-tau, -omega)
    }
}

/// Matsubara-frequency kernel K(iν_n, ω) = 1/(iν_n − ω) in scaled units,
/// with ν_n = (2n + ζ)π, ζ = 1 (fermionic) or 0 (bosonic).
pub fn kernel_mf(n: i64, omega: f64, statistics: Statistics) -> Complex64 {
    let nu = std::f64::consts::PI * (2 * n + statistics.zeta()) as f64;
    Complex64::new(-omega, nu).inv()
}

/// Statistical weight e(ω) = (1 − ξ e^{−ω})/(1 + e^{−ω}).
///
/// ξ = −1 gives identically 1 (fermions); ξ = +1 gives tanh(ω/2) (bosons).
/// Evaluated branch-symmetrically so that neither exponential overflows.
pub fn expfun(omega: f64, xi: f64) -> f64 {
    if omega >= 0.0 {
        let e = (-omega).exp();
        (1.0 - xi * e) / (1.0 + e)
    } else {
        let e = omega.exp();
        (e - xi) / (e + 1.0)
    }
}

// Double-double twins of the imaginary-time kernels, used by the
// inner-product weight and the extended-precision convolution tensor.

/// Absolute-format kernel in double-double arithmetic.
pub fn kernel_it_abs_xp(tau: TwoFloat, omega: TwoFloat) -> TwoFloat {
    let one = TwoFloat::from(1.0);
    if omega >= TwoFloat::from(0.0) {
        (-tau * omega).exp() / (one + (-omega).exp())
    } else {
        ((one - tau) * omega).exp() / (one + omega.exp())
    }
}

/// Relative-format kernel in double-double arithmetic.
pub fn kernel_it_rel_xp(tau: TwoFloat, omega: TwoFloat) -> TwoFloat {
    if tau >= TwoFloat::from(0.0) {
        kernel_it_abs_xp(tau, omega)
    } else {
        kernel_it_abs_xp(-tau, -omega)
    }
}

/// Statistical weight e(ω) in double-double arithmetic.
pub fn expfun_xp(omega: TwoFloat, xi: f64) -> TwoFloat {
    let one = TwoFloat::from(1.0);
    let xi = TwoFloat::from(xi);
    if omega >= TwoFloat::from(0.0) {
        let e = (-omega).exp();
        (one - xi * e) / (one + e)
    } else {
        let e = omega.exp();
        (e - xi) / (e + one)
    }
}
