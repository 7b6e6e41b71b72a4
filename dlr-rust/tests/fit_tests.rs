//! Least-squares fitting of scattered imaginary-time data

mod common;

use dlr_rust::{eqpts_rel, fit_it, kernel_it_rel, DlrBasis, TransformPack};

#[test]
fn test_fit_matches_interpolation() {
    // Oversampled data from a multi-pole function: the least-squares fit
    // and the square interpolatory transform must agree
    common::init_logging();
    let lambda = 100.0;
    let basis = DlrBasis::build(lambda, 1e-12, 500).unwrap();
    let tp = TransformPack::new(&basis, 1.0).unwrap();
    let poles = [-0.6 * lambda, 0.05 * lambda, 0.8 * lambda];
    let gfun =
        |t: f64| -> f64 { poles.iter().map(|&w| kernel_it_rel(t, w)).sum::<f64>() };

    let tau = eqpts_rel(6 * basis.rank());
    let values: Vec<f64> = tau.iter().map(|&t| gfun(t)).collect();
    let (fitted, rank) = fit_it(&basis, &tau, &values).unwrap();
    assert_eq!(rank, basis.rank());

    let node_values: Vec<f64> = basis.dlrit().iter().map(|&t| gfun(t)).collect();
    let interp = tp.coeffs_from_values(&node_values).unwrap();

    // Compare the two expansions pointwise rather than coefficient-wise
    for &t in &eqpts_rel(333) {
        let a = basis.eval_it(&fitted, t);
        let b = basis.eval_it(&interp, t);
        assert!(
            (a - b).abs() < 1e-9,
            "fit/interp mismatch {:.3e} at τ={}",
            (a - b).abs(),
            t
        );
    }
}

#[test]
fn test_fit_handles_noisy_oversampling() {
    // A deterministic perturbation well above ε: the fit must stay within
    // the noise level instead of blowing up
    let lambda = 20.0;
    let basis = DlrBasis::build(lambda, 1e-10, 500).unwrap();
    let omega = 0.4 * lambda;
    let tau = eqpts_rel(10 * basis.rank());
    let noise = 1e-6;
    let values: Vec<f64> = tau
        .iter()
        .enumerate()
        .map(|(i, &t)| kernel_it_rel(t, omega) + noise * ((i * 7919) as f64).sin())
        .collect();
    let (coeffs, _) = fit_it(&basis, &tau, &values).unwrap();
    for &t in &[0.1, 0.33, -0.2] {
        let err = (basis.eval_it(&coeffs, t) - kernel_it_rel(t, omega)).abs();
        assert!(err < 100.0 * noise, "fit error {:.3e} at τ={}", err, t);
    }
}
