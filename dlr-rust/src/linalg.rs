//! Adapters between the ndarray data model and nalgebra factorizations

use nalgebra::linalg::LU;
use nalgebra::{DMatrix, DVector, Dyn};
use ndarray::Array2;

use crate::error::{Error, Result};

pub(crate) fn to_dmatrix<T: nalgebra::Scalar + Copy>(a: &Array2<T>) -> DMatrix<T> {
    DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| a[[i, j]])
}

pub(crate) fn to_array2<T: nalgebra::Scalar + Copy>(m: &DMatrix<T>) -> Array2<T> {
    Array2::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| m[(i, j)])
}

/// LU factorization with partial pivoting of a square matrix, with solves
/// that surface singular systems as errors instead of panics.
#[derive(Debug, Clone)]
pub(crate) struct Lu<T: nalgebra::ComplexField> {
    lu: LU<T, Dyn, Dyn>,
    dim: usize,
}

impl<T: nalgebra::ComplexField + Copy> Lu<T> {
    pub fn new(a: &Array2<T>) -> Self {
        assert_eq!(a.nrows(), a.ncols(), "LU factorization requires a square matrix");
        Self {
            lu: LU::new(to_dmatrix(a)),
            dim: a.nrows(),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn solve_slice(&self, b: &[T], context: &'static str) -> Result<Vec<T>> {
        if b.len() != self.dim {
            return Err(Error::invalid(format!(
                "right-hand side length {} does not match system dimension {}",
                b.len(),
                self.dim
            )));
        }
        let rhs = DVector::from_column_slice(b);
        self.lu
            .solve(&rhs)
            .map(|x| x.iter().copied().collect())
            .ok_or(Error::SingularSystem(context))
    }

    pub fn solve_mat(&self, b: &Array2<T>, context: &'static str) -> Result<Array2<T>> {
        if b.nrows() != self.dim {
            return Err(Error::invalid(format!(
                "right-hand side rows {} do not match system dimension {}",
                b.nrows(),
                self.dim
            )));
        }
        self.lu
            .solve(&to_dmatrix(b))
            .map(|x| to_array2(&x))
            .ok_or(Error::SingularSystem(context))
    }
}

/// Back-substitution on the leading rank×rank block of an upper-triangular
/// factor; entries past `rank` are left untouched.
pub(crate) fn upper_tri_solve(r: &DMatrix<f64>, y: &mut [f64], rank: usize) {
    for i in (0..rank).rev() {
        let mut s = y[i];
        for j in (i + 1)..rank {
            s -= r[(i, j)] * y[j];
        }
        y[i] = s / r[(i, i)];
    }
}
