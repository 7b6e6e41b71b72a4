//! Chebyshev collocation nodes and barycentric interpolation
//!
//! Nodes of the first kind on [−1, 1], used per panel by the composite fine
//! discretization, plus the barycentric form of the interpolant for the
//! discretization self-check.

use std::f64::consts::PI;

/// Chebyshev points of the first kind on [−1, 1], in ascending order.
pub fn cheb_points(n: usize) -> Vec<f64> {
    (0..n)
        .map(|j| -(PI * (2 * j + 1) as f64 / (2 * n) as f64).cos())
        .collect()
}

/// Barycentric weights for the first-kind Chebyshev points.
///
/// Valid for the ascending node ordering of [`cheb_points`]; the overall
/// sign is immaterial in the barycentric formula.
pub fn cheb_bary_weights(n: usize) -> Vec<f64> {
    (0..n)
        .map(|j| {
            let s = (PI * (2 * j + 1) as f64 / (2 * n) as f64).sin();
            if j % 2 == 0 {
                s
            } else {
                -s
            }
        })
        .collect()
}

/// Evaluate the barycentric interpolant through (xi, fi) at x.
pub fn bary_interp(x: f64, xi: &[f64], fi: &[f64], wi: &[f64]) -> f64 {
    debug_assert_eq!(xi.len(), fi.len());
    debug_assert_eq!(xi.len(), wi.len());

    // On-grid points are returned exactly
    for (k, &xk) in xi.iter().enumerate() {
        if x == xk {
            return fi[k];
        }
    }

    let mut num = 0.0;
    let mut den = 0.0;
    for k in 0..xi.len() {
        let q = wi[k] / (x - xi[k]);
        num += q * fi[k];
        den += q;
    }
    num / den
}

/// Map a [−1, 1] reference point into the panel [a, b].
pub fn to_panel(x: f64, a: f64, b: f64) -> f64 {
    a + (b - a) * 0.5 * (x + 1.0)
}
