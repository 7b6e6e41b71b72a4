//! Common test utilities

#![allow(dead_code)]

/// Initialize logging for a test binary; safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Gauss–Legendre quadrature rule on [−1, 1].
///
/// Newton iteration on the three-term recurrence; accurate to roundoff for
/// the modest orders used in the tests.
pub fn gauss_legendre(n: usize) -> (Vec<f64>, Vec<f64>) {
    assert!(n >= 2);
    let mut x = vec![0.0; n];
    let mut w = vec![0.0; n];
    let m = (n + 1) / 2;

    for i in 0..m {
        // Tricomi initial guess
        let mut z = (std::f64::consts::PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let mut dp = 0.0;
        for _ in 0..100 {
            // Legendre recurrence: (k+1) P_{k+1} = (2k+1) x P_k − k P_{k−1}
            let mut p0 = 1.0;
            let mut p1 = z;
            for k in 1..n {
                let p2 = ((2 * k + 1) as f64 * z * p1 - k as f64 * p0) / (k + 1) as f64;
                p0 = p1;
                p1 = p2;
            }
            dp = n as f64 * (z * p1 - p0) / (z * z - 1.0);
            let dz = p1 / dp;
            z -= dz;
            if dz.abs() < 1e-15 {
                break;
            }
        }
        x[i] = -z;
        x[n - 1 - i] = z;
        let wi = 2.0 / ((1.0 - z * z) * dp * dp);
        w[i] = wi;
        w[n - 1 - i] = wi;
    }
    (x, w)
}

/// Max absolute difference of two slices.
pub fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .fold(0.0f64, |m, (x, y)| m.max((x - y).abs()))
}

/// Max absolute value of a slice.
pub fn max_abs(a: &[f64]) -> f64 {
    a.iter().fold(0.0f64, |m, x| m.max(x.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gauss_legendre_integrates_polynomials() {
        let (x, w) = gauss_legendre(8);
        // Degree up to 2n−1 = 15 is exact
        let integral: f64 = x.iter().zip(&w).map(|(&xi, &wi)| wi * xi.powi(14)).sum();
        assert!((integral - 2.0 / 15.0).abs() < 1e-14);
        let total: f64 = w.iter().sum();
        assert!((total - 2.0).abs() < 1e-14);
    }
}
