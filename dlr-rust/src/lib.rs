//! # dlr-rust: Discrete Lehmann Representation in Rust
//!
//! Compact, provably accurate representation of imaginary-time Green's
//! functions for finite-temperature quantum many-body calculations. Given a
//! dimensionless cutoff Λ and a target accuracy ε, the construction selects
//! O(log(Λ)·log(1/ε)) real-frequency support points together with matching
//! imaginary-time and Matsubara-frequency interpolation nodes, by pivoted
//! rank-revealing QR on a composite Chebyshev discretization of the Lehmann
//! kernel.
//!
//! On top of the basis the crate provides the transforms between the
//! coefficient, imaginary-time and Matsubara representations, imaginary-time
//! convolution, the L² inner product, least-squares fitting of scattered
//! data, and a weighted fixed-point solver for the nonlinear Dyson equation.
//!
//! All imaginary-time arguments use the relative format: τ ∈ (1/2, 1) is
//! stored as τ − 1 < 0, preserving relative accuracy near τ = β.

pub mod basis;
pub mod cheb;
pub mod conv;
pub mod dyson;
pub mod error;
pub mod fine;
pub mod fit;
pub mod greens;
pub mod innerprod;
pub mod kernel;
pub mod matsubara;
pub mod taufuncs;
pub mod traits;
pub mod transform;

mod linalg;
mod rrqr;

// Re-export commonly used types and functions
pub use basis::DlrBasis;
pub use conv::ConvTensor;
pub use dyson::{
    dyson_it, dyson_it_with_callback, dyson_mf, dyson_mf_with_callback, DysonOptions,
    DysonSolution,
};
pub use error::{Error, Result};
pub use fine::FineGrid;
pub use fit::fit_it;
pub use greens::{bosonic_single_pole, fermionic_single_pole, gtau_single_pole};
pub use innerprod::innerproduct_weight;
pub use kernel::{expfun, kernel_it_abs, kernel_it_rel, kernel_mf};
pub use matsubara::MatsubaraPack;
pub use taufuncs::{abs2rel, eqpts_rel, rel2abs};
pub use traits::{Bosonic, Fermionic, Statistics, StatisticsType};
pub use transform::TransformPack;

// Re-export external dependencies for convenience
pub use ndarray::{Array1, Array2, Array3};
pub use num_complex::Complex64;
pub use twofloat::TwoFloat;
