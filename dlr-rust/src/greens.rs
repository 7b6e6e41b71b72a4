//! Single-pole reference Green's functions
//!
//! Convenience evaluators for G(τ) of an isolated level, with the
//! (anti-)periodic extension to τ ∈ (−β, 2β). Used by the test suite to
//! build reference data and exported for callers doing the same.

use crate::traits::{Statistics, StatisticsType};

/// Fold τ into [0, β] and return the statistics sign picked up on the way.
///
/// β itself is interpreted as the left limit β⁻ and stays unwrapped.
fn fold_tau(tau: f64, beta: f64, stat: Statistics) -> (f64, f64) {
    let sign = match stat {
        Statistics::Fermionic => -1.0,
        Statistics::Bosonic => 1.0,
    };
    if tau < 0.0 {
        (tau + beta, sign)
    } else if tau > beta {
        (tau - beta, sign)
    } else {
        (tau, 1.0)
    }
}

/// Fermionic single-pole Green's function
/// G(τ) = −e^{−ωτ}/(1 + e^{−βω}), with G(τ + β) = −G(τ).
pub fn fermionic_single_pole(tau: f64, omega: f64, beta: f64) -> f64 {
    let (t, sign) = fold_tau(tau, beta, Statistics::Fermionic);
    // Evaluate with non-positive exponents on either sign of ω
    let g = if omega >= 0.0 {
        -(-omega * t).exp() / (1.0 + (-beta * omega).exp())
    } else {
        -(omega * (beta - t)).exp() / ((beta * omega).exp() + 1.0)
    };
    sign * g
}

/// Bosonic single-pole Green's function
/// G(τ) = e^{−ωτ}/(1 − e^{−βω}), with G(τ + β) = G(τ).
pub fn bosonic_single_pole(tau: f64, omega: f64, beta: f64) -> f64 {
    let (t, _) = fold_tau(tau, beta, Statistics::Bosonic);
    if omega >= 0.0 {
        (-omega * t).exp() / (1.0 - (-beta * omega).exp())
    } else {
        -(omega * (beta - t)).exp() / (1.0 - (beta * omega).exp())
    }
}

/// Statistics-generic single-pole Green's function.
pub fn gtau_single_pole<S: StatisticsType>(tau: f64, omega: f64, beta: f64) -> f64 {
    match S::STATISTICS {
        Statistics::Fermionic => fermionic_single_pole(tau, omega, beta),
        Statistics::Bosonic => bosonic_single_pole(tau, omega, beta),
    }
}
