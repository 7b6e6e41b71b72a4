//! Pivoted-QR node selection primitives
//!
//! Thin wrappers around nalgebra's Businger–Golub QR with column pivoting.
//! The factorization reports its pivots as a sequence of column swaps; the
//! wrappers compose the swaps into an absolute permutation so that the first
//! r entries index the selected fine-grid columns directly.

use nalgebra::linalg::ColPivQR;
use nalgebra::{Dyn, RowDVector};
use ndarray::Array2;
use num_complex::Complex64;

use crate::linalg::to_dmatrix;

pub(crate) fn absolute_pivots<T: nalgebra::ComplexField>(
    qr: &ColPivQR<T, Dyn, Dyn>,
    ncols: usize,
) -> Vec<usize> {
    let mut idx = RowDVector::<usize>::from_iterator(ncols, 0..ncols);
    qr.p().permute_columns(&mut idx);
    idx.iter().copied().collect()
}

/// Column-pivoted QR with rank detected from the trailing diagonal of R.
///
/// Returns the absolute pivot order over all columns and the index at which
/// |R_ii| first drops below rtol·|R_00|. The greedy pivot choices do not
/// depend on steps beyond the break point, so truncating the full sweep is
/// equivalent to stopping it early.
pub(crate) fn pivoted_qr_adaptive(a: &Array2<f64>, rtol: f64) -> (Vec<usize>, usize) {
    let k = a.nrows().min(a.ncols());
    let qr = ColPivQR::new(to_dmatrix(a));
    let r = qr.r();

    let r00 = r[(0, 0)].abs();
    let mut rank = k;
    if r00 == 0.0 {
        rank = 0;
    } else {
        for i in 0..k {
            if r[(i, i)].abs() < rtol * r00 {
                rank = i;
                break;
            }
        }
    }
    (absolute_pivots(&qr, a.ncols()), rank)
}

/// Full column-pivot order of a real matrix; callers truncate to the rank
/// they need.
pub(crate) fn pivoted_qr_pivots(a: &Array2<f64>) -> Vec<usize> {
    let qr = ColPivQR::new(to_dmatrix(a));
    absolute_pivots(&qr, a.ncols())
}

/// Full column-pivot order of a complex matrix.
pub(crate) fn pivoted_qr_pivots_complex(a: &Array2<Complex64>) -> Vec<usize> {
    let qr = ColPivQR::new(to_dmatrix(a));
    absolute_pivots(&qr, a.ncols())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_pivots_are_a_permutation() {
        let a = array![
            [1.0, 2.0, 3.0, 4.0],
            [0.5, 1.0, 2.0, 8.0],
            [0.1, 0.2, 0.3, 0.4]
        ];
        let mut p = pivoted_qr_pivots(&a);
        p.sort_unstable();
        assert_eq!(p, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_first_pivot_is_largest_column() {
        // Column 2 has by far the largest norm
        let a = array![[1.0, 0.0, 10.0], [0.0, 1.0, 10.0]];
        let p = pivoted_qr_pivots(&a);
        assert_eq!(p[0], 2);
    }

    #[test]
    fn test_adaptive_rank_deficient() {
        // Third column is the sum of the first two
        let a = array![
            [1.0, 0.0, 1.0],
            [0.0, 1.0, 1.0],
            [1.0, 1.0, 2.0],
            [2.0, -1.0, 1.0]
        ];
        let (_, rank) = pivoted_qr_adaptive(&a, 1e-12);
        assert_eq!(rank, 2);
    }

    #[test]
    fn test_adaptive_full_rank() {
        let a = array![[1.0, 0.0], [0.0, 1e-3], [0.0, 0.0]];
        let (p, rank) = pivoted_qr_adaptive(&a, 1e-8);
        assert_eq!(rank, 2);
        assert_eq!(p[0], 0);
    }

    #[test]
    fn test_adaptive_exponential_decay() {
        // Outer products with sharply decaying scales: rank tracks the
        // tolerance cut
        let m = 20;
        let a = Array2::from_shape_fn((m, m), |(i, j)| {
            (0..6)
                .map(|k| {
                    let s = 10f64.powi(-(3 * k as i32));
                    s * ((i * (k + 1)) as f64).sin() * ((j + k) as f64).cos()
                })
                .sum()
        });
        let (_, rank) = pivoted_qr_adaptive(&a, 1e-8);
        assert!((3..=5).contains(&rank), "rank = {}", rank);
    }
}
