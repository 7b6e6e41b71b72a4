//! Dyson equation solvers
//!
//! The nonlinear Dyson equation G = G₀ + G₀ ∗ Σ[G] ∗ G is solved by a
//! weighted fixed-point iteration. Each step evaluates the caller's
//! self-energy on the imaginary-time grid and performs one linear solve:
//! dense in the imaginary-time domain, diagonal in the Matsubara domain.

use ndarray::Array2;
use num_complex::Complex64;

use crate::conv::ConvTensor;
use crate::error::{Error, Result};
use crate::linalg::Lu;
use crate::matsubara::MatsubaraPack;
use crate::traits::StatisticsType;
use crate::transform::TransformPack;

/// Fixed-point iteration controls.
#[derive(Debug, Clone, Copy)]
pub struct DysonOptions {
    /// Mixing weight w ∈ (0, 1]; g ← w·g_new + (1 − w)·g.
    pub weight: f64,
    /// Convergence threshold on max_i |g_new_i − g_i|.
    pub fptol: f64,
    /// Iteration cap.
    pub maxit: usize,
}

impl Default for DysonOptions {
    fn default() -> Self {
        Self {
            weight: 0.5,
            fptol: 1e-12,
            maxit: 1000,
        }
    }
}

impl DysonOptions {
    fn validate(&self) -> Result<()> {
        if !(self.weight > 0.0 && self.weight <= 1.0) {
            return Err(Error::invalid(format!(
                "mixing weight must lie in (0, 1], got {}",
                self.weight
            )));
        }
        if !(self.fptol > 0.0) {
            return Err(Error::invalid(format!(
                "fixed-point tolerance must be positive, got {}",
                self.fptol
            )));
        }
        if self.maxit == 0 {
            return Err(Error::invalid("iteration cap must be positive"));
        }
        Ok(())
    }
}

/// Result of a Dyson solve. Non-convergence is reported here, not as an
/// error; `g` then holds the last iterate.
#[derive(Debug, Clone)]
pub struct DysonSolution {
    /// Green's function on the imaginary-time grid.
    pub g: Vec<f64>,
    /// Number of fixed-point iterations performed.
    pub iterations: usize,
    /// Whether the fixed-point residual dropped below fptol.
    pub converged: bool,
}

fn check_beta(a: f64, b: f64) -> Result<()> {
    if a != b {
        return Err(Error::invalid(format!(
            "inconsistent inverse temperatures: {} vs {}",
            a, b
        )));
    }
    Ok(())
}

/// Solve the Dyson equation in the imaginary-time domain.
///
/// `g0` holds the free Green's function on the imaginary-time grid and
/// doubles as the initial iterate. The self-energy closure maps node values
/// to node values and may carry its own captured state.
pub fn dyson_it<F>(
    tp: &TransformPack,
    phi: &ConvTensor,
    g0: &[f64],
    sigma: F,
    opts: &DysonOptions,
) -> Result<DysonSolution>
where
    F: FnMut(&[f64]) -> Vec<f64>,
{
    dyson_it_with_callback(tp, phi, g0, sigma, opts, |_, _| true)
}

/// Imaginary-time Dyson solve with a per-iteration callback.
///
/// The callback receives the iteration count and the current fixed-point
/// residual; returning false cancels the iteration, which surfaces as a
/// non-converged solution with the current count.
pub fn dyson_it_with_callback<F, C>(
    tp: &TransformPack,
    phi: &ConvTensor,
    g0: &[f64],
    mut sigma: F,
    opts: &DysonOptions,
    mut callback: C,
) -> Result<DysonSolution>
where
    F: FnMut(&[f64]) -> Vec<f64>,
    C: FnMut(usize, f64) -> bool,
{
    opts.validate()?;
    check_beta(tp.beta(), phi.beta())?;
    let r = tp.rank();
    if g0.len() != r {
        return Err(Error::invalid(format!(
            "free Green's function length {} does not match rank {}",
            g0.len(),
            r
        )));
    }

    let g0mat = phi.conv_matrix(tp, g0)?;
    let ident = Array2::<f64>::eye(r);
    let mut g = g0.to_vec();

    for it in 1..=opts.maxit {
        let sig = sigma(&g);
        if sig.len() != r {
            return Err(Error::invalid(format!(
                "self-energy returned {} values, expected {}",
                sig.len(),
                r
            )));
        }
        let sigmat = phi.conv_matrix(tp, &sig)?;
        let sysmat = &ident - &g0mat.dot(&sigmat);
        let gnew = Lu::new(&sysmat).solve_slice(g0, "Dyson imaginary-time system")?;

        let diff = residual(&gnew, &g);
        if diff < opts.fptol {
            return Ok(DysonSolution {
                g: gnew,
                iterations: it,
                converged: true,
            });
        }
        if !callback(it, diff) {
            log::debug!("Dyson iteration cancelled at step {}", it);
            return Ok(DysonSolution {
                g: gnew,
                iterations: it,
                converged: false,
            });
        }
        mix(&mut g, &gnew, opts.weight);
    }

    Ok(DysonSolution {
        g,
        iterations: opts.maxit,
        converged: false,
    })
}

/// Solve the Dyson equation in the Matsubara domain.
///
/// `g0_mf` holds the free Green's function on the Matsubara grid (scaled
/// convention). Each step transforms the self-energy to the Matsubara grid,
/// inverts the diagonal relation g = g0/(1 − β²·g0·σ), and transforms back;
/// the returned Green's function lives on the imaginary-time grid.
pub fn dyson_mf<S, F>(
    tp: &TransformPack,
    mp: &MatsubaraPack<S>,
    g0_mf: &[Complex64],
    sigma: F,
    opts: &DysonOptions,
) -> Result<DysonSolution>
where
    S: StatisticsType,
    F: FnMut(&[f64]) -> Vec<f64>,
{
    dyson_mf_with_callback(tp, mp, g0_mf, sigma, opts, |_, _| true)
}

/// Matsubara-domain Dyson solve with a per-iteration cancellation callback,
/// as in [`dyson_it_with_callback`].
pub fn dyson_mf_with_callback<S, F, C>(
    tp: &TransformPack,
    mp: &MatsubaraPack<S>,
    g0_mf: &[Complex64],
    mut sigma: F,
    opts: &DysonOptions,
    mut callback: C,
) -> Result<DysonSolution>
where
    S: StatisticsType,
    F: FnMut(&[f64]) -> Vec<f64>,
    C: FnMut(usize, f64) -> bool,
{
    opts.validate()?;
    check_beta(tp.beta(), mp.beta())?;
    let r = tp.rank();
    if g0_mf.len() != r {
        return Err(Error::invalid(format!(
            "free Green's function length {} does not match rank {}",
            g0_mf.len(),
            r
        )));
    }
    let beta2 = tp.beta() * tp.beta();

    let g0c = mp.coeffs_from_mf(g0_mf)?;
    let mut g: Vec<f64> = tp
        .values_from_coeffs_complex(&g0c)
        .iter()
        .map(|z| z.re)
        .collect();

    for it in 1..=opts.maxit {
        let sig = sigma(&g);
        if sig.len() != r {
            return Err(Error::invalid(format!(
                "self-energy returned {} values, expected {}",
                sig.len(),
                r
            )));
        }
        let sigc = tp.coeffs_from_values(&sig)?;
        let sig_mf = mp.mf_from_coeffs(&sigc);

        let mut gmf = vec![Complex64::default(); r];
        for q in 0..r {
            let den = Complex64::new(1.0, 0.0) - beta2 * g0_mf[q] * sig_mf[q];
            if den.norm() == 0.0 || !den.is_finite() {
                return Err(Error::SingularSystem("Dyson Matsubara denominator"));
            }
            gmf[q] = g0_mf[q] / den;
        }

        let gc = mp.coeffs_from_mf(&gmf)?;
        let gnew: Vec<f64> = tp
            .values_from_coeffs_complex(&gc)
            .iter()
            .map(|z| z.re)
            .collect();

        let diff = residual(&gnew, &g);
        if diff < opts.fptol {
            return Ok(DysonSolution {
                g: gnew,
                iterations: it,
                converged: true,
            });
        }
        if !callback(it, diff) {
            log::debug!("Dyson iteration cancelled at step {}", it);
            return Ok(DysonSolution {
                g: gnew,
                iterations: it,
                converged: false,
            });
        }
        mix(&mut g, &gnew, opts.weight);
    }

    Ok(DysonSolution {
        g,
        iterations: opts.maxit,
        converged: false,
    })
}

fn residual(gnew: &[f64], g: &[f64]) -> f64 {
    gnew.iter()
        .zip(g.iter())
        .fold(0.0f64, |m, (a, b)| m.max((a - b).abs()))
}

fn mix(g: &mut [f64], gnew: &[f64], w: f64) {
    for (gi, &ni) in g.iter_mut().zip(gnew.iter()) {
        *gi = w * ni + (1.0 - w) * *gi;
    }
}
