//! Extended-precision dense LU factorization.
//!
//! Provides partial-pivoted LU factorization and triangular solves generic
//! over a [`Precision`] scalar, with implementations for `f64` and the
//! double-double type [`twofloat::TwoFloat`]. The extended-precision path is
//! meant for small, severely ill-conditioned systems where divided
//! differences cancel catastrophically in IEEE double.

use ndarray::Array2;
use twofloat::TwoFloat;

/// Scalar abstraction over f64 and double-double arithmetic.
///
/// Mirrors the operations the factorization actually needs; conversions to
/// and from f64 are exact in one direction and rounding in the other.
pub trait Precision:
    Copy
    + PartialOrd
    + std::fmt::Debug
    + std::ops::Add<Output = Self>
    + std::ops::Sub<Output = Self>
    + std::ops::Mul<Output = Self>
    + std::ops::Div<Output = Self>
    + std::ops::Neg<Output = Self>
{
    fn from_f64(x: f64) -> Self;
    fn to_f64(self) -> f64;
    fn zero() -> Self;
    fn one() -> Self;
    /// Machine epsilon of the representation.
    fn epsilon() -> Self;
    fn abs(self) -> Self;
}

impl Precision for f64 {
    fn from_f64(x: f64) -> Self {
        x
    }
    fn to_f64(self) -> f64 {
        self
    }
    fn zero() -> Self {
        0.0
    }
    fn one() -> Self {
        1.0
    }
    fn epsilon() -> Self {
        f64::EPSILON
    }
    fn abs(self) -> Self {
        self.abs()
    }
}

impl Precision for TwoFloat {
    fn from_f64(x: f64) -> Self {
        TwoFloat::from(x)
    }
    fn to_f64(self) -> f64 {
        self.hi() + self.lo()
    }
    fn zero() -> Self {
        TwoFloat::from(0.0)
    }
    fn one() -> Self {
        TwoFloat::from(1.0)
    }
    fn epsilon() -> Self {
        // eps^2 / 2 for a double-double significand
        TwoFloat::from(f64::EPSILON * f64::EPSILON / 2.0)
    }
    fn abs(self) -> Self {
        self.abs()
    }
}

/// Factorization failure: no usable pivot at the given elimination step.
#[derive(Debug, thiserror::Error)]
#[error("singular matrix: zero pivot at elimination step {step}")]
pub struct SingularMatrix {
    pub step: usize,
}

/// Packed LU factors of a square matrix, P·A = L·U.
///
/// L is unit lower triangular and shares storage with U. `piv[k]` records the
/// row swapped into position k at step k.
#[derive(Debug, Clone)]
pub struct LuFactors<T> {
    lu: Array2<T>,
    piv: Vec<usize>,
}

impl<T: Precision> LuFactors<T> {
    /// Factor a square matrix with partial (row) pivoting.
    pub fn new(mut a: Array2<T>) -> Result<Self, SingularMatrix> {
        let n = a.nrows();
        assert_eq!(n, a.ncols(), "LU factorization requires a square matrix");

        let mut piv = vec![0usize; n];
        for k in 0..n {
            // Pivot search in column k
            let mut p = k;
            let mut pmax = a[[k, k]].abs();
            for i in (k + 1)..n {
                let v = a[[i, k]].abs();
                if v > pmax {
                    pmax = v;
                    p = i;
                }
            }
            if !(pmax > T::zero()) {
                return Err(SingularMatrix { step: k });
            }
            piv[k] = p;
            if p != k {
                for j in 0..n {
                    let tmp = a[[k, j]];
                    a[[k, j]] = a[[p, j]];
                    a[[p, j]] = tmp;
                }
            }

            let pivot = a[[k, k]];
            for i in (k + 1)..n {
                let m = a[[i, k]] / pivot;
                a[[i, k]] = m;
                for j in (k + 1)..n {
                    let upd = a[[i, j]] - m * a[[k, j]];
                    a[[i, j]] = upd;
                }
            }
        }

        Ok(Self { lu: a, piv })
    }

    pub fn dim(&self) -> usize {
        self.lu.nrows()
    }

    /// Solve A·x = b.
    pub fn solve(&self, b: &[T]) -> Vec<T> {
        let n = self.dim();
        assert_eq!(b.len(), n, "right-hand side length must match matrix dimension");
        let mut x = b.to_vec();

        // Apply row permutation
        for k in 0..n {
            let p = self.piv[k];
            if p != k {
                x.swap(k, p);
            }
        }
        // Forward substitution with unit lower triangle
        for i in 1..n {
            let mut s = x[i];
            for j in 0..i {
                s = s - self.lu[[i, j]] * x[j];
            }
            x[i] = s;
        }
        // Back substitution
        for i in (0..n).rev() {
            let mut s = x[i];
            for j in (i + 1)..n {
                s = s - self.lu[[i, j]] * x[j];
            }
            x[i] = s / self.lu[[i, i]];
        }
        x
    }

    /// Solve A·X = B column by column.
    pub fn solve_matrix(&self, b: &Array2<T>) -> Array2<T> {
        let n = self.dim();
        assert_eq!(b.nrows(), n, "right-hand side rows must match matrix dimension");
        let mut out = b.clone();
        let mut col = vec![T::zero(); n];
        for j in 0..b.ncols() {
            for i in 0..n {
                col[i] = b[[i, j]];
            }
            let x = self.solve(&col);
            for i in 0..n {
                out[[i, j]] = x[i];
            }
        }
        out
    }
}

/// Down-cast an extended-precision matrix to f64.
pub fn demote(a: &Array2<TwoFloat>) -> Array2<f64> {
    Array2::from_shape_fn(a.dim(), |(i, j)| Precision::to_f64(a[[i, j]]))
}
