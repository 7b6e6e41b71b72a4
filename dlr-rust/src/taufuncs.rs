//! Relative/absolute imaginary-time formats and test grids
//!
//! The library stores τ ∈ (1/2, 1) as the signed value τ − 1 < 0, which keeps
//! full relative precision near τ = 1. The right endpoint itself is carried
//! as the literal 1.

/// Convert a relative-format point to absolute format on [0, 1].
pub fn rel2abs(t: f64) -> f64 {
    if t < 0.0 {
        t + 1.0
    } else {
        t
    }
}

/// Convert an absolute point on [0, 1] to relative format.
pub fn abs2rel(t: f64) -> f64 {
    if t > 0.5 {
        t - 1.0
    } else {
        t
    }
}

/// Equispaced grid on [0, 1] in relative format, endpoints included.
///
/// The first half is stored as-is, the second half as negative offsets from
/// 1; the right endpoint is the literal 1.
pub fn eqpts_rel(n: usize) -> Vec<f64> {
    assert!(n >= 2, "equispaced grid needs at least two points");
    let h = 1.0 / (n - 1) as f64;
    (0..n)
        .map(|j| {
            if j == n - 1 {
                1.0
            } else if 2 * j <= n - 1 {
                j as f64 * h
            } else {
                -((n - 1 - j) as f64) * h
            }
        })
        .collect()
}
