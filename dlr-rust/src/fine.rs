//! Composite fine discretization of the Lehmann kernel
//!
//! Panels are dyadically graded toward τ = 0, τ = 1 and ω = 0, with a fixed
//! number of first-kind Chebyshev nodes per panel. Only the first half of the
//! τ grid is sampled; the second half follows from K(1−τ, −ω) = K(τ, ω) and
//! is stored in relative format.

use ndarray::{Array1, Array2};

use crate::cheb::{bary_interp, cheb_bary_weights, cheb_points, to_panel};
use crate::error::{Error, Result};
use crate::kernel::kernel_it_abs;

/// Chebyshev degree per panel.
pub const PANEL_ORDER: usize = 24;

/// Dense sampling of the Lehmann kernel on the composite Chebyshev grid.
#[derive(Debug, Clone)]
pub struct FineGrid {
    order: usize,
    npt: usize,
    npo: usize,
    /// τ nodes; entries past nt/2 are negative (relative format).
    pub t: Array1<f64>,
    /// ω nodes on [−Λ, Λ].
    pub om: Array1<f64>,
    /// Sampled kernel, nt × no.
    pub kmat: Array2<f64>,
    /// Self-measured panel-interpolation error in (τ, ω).
    pub err: [f64; 2],
}

/// Panel counts for a given cutoff.
fn grid_params(lambda: f64) -> (usize, usize) {
    let l2 = lambda.log2().ceil() as i64;
    let npt = (l2 - 2).max(1) as usize;
    let npo = l2.max(1) as usize;
    (npt, npo)
}

/// τ panel break points: 0, 2^{−npt}, …, 1/2.
fn tau_breaks(npt: usize) -> Vec<f64> {
    let mut b = vec![0.0];
    for i in 0..npt {
        b.push(0.5f64.powi((npt - i) as i32));
    }
    b
}

/// ω panel break points: −Λ, …, −Λ/2^{npo−1}, 0, Λ/2^{npo−1}, …, Λ.
fn omega_breaks(lambda: f64, npo: usize) -> Vec<f64> {
    let mut b = vec![0.0; 2 * npo + 1];
    for j in 0..npo {
        let v = lambda * 0.5f64.powi((npo - 1 - j) as i32);
        b[npo + 1 + j] = v;
        b[npo - 1 - j] = -v;
    }
    b
}

impl FineGrid {
    /// Build the composite discretization for cutoff Λ.
    pub fn build(lambda: f64) -> Result<Self> {
        if !(lambda > 0.0) {
            return Err(Error::invalid(format!("cutoff must be positive, got {}", lambda)));
        }

        let order = PANEL_ORDER;
        let (npt, npo) = grid_params(lambda);
        let nt = 2 * order * npt;
        let no = 2 * order * npo;
        log::debug!(
            "fine grid: lambda={}, order={}, npt={}, npo={}, nt={}, no={}",
            lambda,
            order,
            npt,
            npo,
            nt,
            no
        );

        let xi = cheb_points(order);
        let tb = tau_breaks(npt);
        let ob = omega_breaks(lambda, npo);

        // τ nodes: first half sampled, second half mirrored into relative
        // format
        let mut t = Array1::zeros(nt);
        for ip in 0..npt {
            let (a, b) = (tb[ip], tb[ip + 1]);
            for (k, &x) in xi.iter().enumerate() {
                t[ip * order + k] = to_panel(x, a, b);
            }
        }
        for i in nt / 2..nt {
            t[i] = -t[nt - 1 - i];
        }

        let mut om = Array1::zeros(no);
        for ip in 0..2 * npo {
            let (a, b) = (ob[ip], ob[ip + 1]);
            for (k, &x) in xi.iter().enumerate() {
                om[ip * order + k] = to_panel(x, a, b);
            }
        }

        // Sample the first τ half directly, fill the rest by symmetry
        let mut kmat = Array2::zeros((nt, no));
        for i in 0..nt / 2 {
            for j in 0..no {
                kmat[[i, j]] = kernel_it_abs(t[i], om[j]);
            }
        }
        for i in nt / 2..nt {
            for j in 0..no {
                kmat[[i, j]] = kmat[[nt - 1 - i, no - 1 - j]];
            }
        }

        let err = self_check(order, npt, npo, &tb, &ob, &t, &om, &kmat);
        log::debug!("fine grid self-check: err_tau={:.3e}, err_omega={:.3e}", err[0], err[1]);

        Ok(Self {
            order,
            npt,
            npo,
            t,
            om,
            kmat,
            err,
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn npt(&self) -> usize {
        self.npt
    }

    pub fn npo(&self) -> usize {
        self.npo
    }

    /// Number of τ nodes.
    pub fn nt(&self) -> usize {
        self.t.len()
    }

    /// Number of ω nodes.
    pub fn no(&self) -> usize {
        self.om.len()
    }
}

/// Compare the stored p-node panel interpolants against the kernel at 2p
/// fresh Chebyshev nodes per panel; returns the relative L∞ error in each
/// variable.
#[allow(clippy::too_many_arguments)]
fn self_check(
    order: usize,
    npt: usize,
    npo: usize,
    tb: &[f64],
    ob: &[f64],
    t: &Array1<f64>,
    om: &Array1<f64>,
    kmat: &Array2<f64>,
) -> [f64; 2] {
    let nt = t.len();
    let no = om.len();
    let xi = cheb_points(order);
    let wi = cheb_bary_weights(order);
    let x2 = cheb_points(2 * order);

    // τ direction: interpolate down each column on every sampled τ panel
    let mut err_t = 0.0f64;
    let mut norm_t = 0.0f64;
    let mut stored = vec![0.0; order];
    for j in 0..no {
        for ip in 0..npt {
            let (a, b) = (tb[ip], tb[ip + 1]);
            for k in 0..order {
                stored[k] = kmat[[ip * order + k, j]];
            }
            for &x in &x2 {
                let exact = kernel_it_abs(to_panel(x, a, b), om[j]);
                let approx = bary_interp(x, &xi, &stored, &wi);
                err_t = err_t.max((exact - approx).abs());
                norm_t = norm_t.max(exact.abs());
            }
        }
    }

    // ω direction: interpolate along each sampled row on every ω panel
    let mut err_o = 0.0f64;
    let mut norm_o = 0.0f64;
    for i in 0..nt / 2 {
        for ip in 0..2 * npo {
            let (a, b) = (ob[ip], ob[ip + 1]);
            for k in 0..order {
                stored[k] = kmat[[i, ip * order + k]];
            }
            for &x in &x2 {
                let exact = kernel_it_abs(t[i], to_panel(x, a, b));
                let approx = bary_interp(x, &xi, &stored, &wi);
                err_o = err_o.max((exact - approx).abs());
                norm_o = norm_o.max(exact.abs());
            }
        }
    }

    [err_t / norm_t.max(f64::MIN_POSITIVE), err_o / norm_o.max(f64::MIN_POSITIVE)]
}
