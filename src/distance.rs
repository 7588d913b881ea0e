//! Building condensed distance vectors for the linkage engine.
//!
//! Metrics stay pluggable: callers pass any `Fn(&[f64], &[f64]) -> f64`.
//! This module only handles packing — either computing all pairs from
//! observation vectors, or flattening an already-computed `m x m`
//! distance matrix into condensed form.

use crate::error::{Error, Result};
use ndarray::ArrayView2;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Euclidean distance between two equal-length vectors.
///
/// Reference metric for examples and tests; any metric closure works
/// with [`pairwise_condensed`].
#[inline]
pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// Condensed pairwise distances for `data` under `metric`, in packed
/// upper-triangle order (pair `(i, j)`, `i < j`).
///
/// Each pair is independent, so with the `parallel` feature the pairs
/// are computed across threads.
///
/// # Errors
///
/// [`Error::EmptyInput`] for no observations;
/// [`Error::DimensionMismatch`] when rows have differing lengths.
pub fn pairwise_condensed<F>(data: &[Vec<f64>], metric: F) -> Result<Vec<f64>>
where
    F: Fn(&[f64], &[f64]) -> f64 + Sync,
{
    if data.is_empty() {
        return Err(Error::EmptyInput);
    }
    let d = data[0].len();
    if let Some(row) = data.iter().find(|row| row.len() != d) {
        return Err(Error::DimensionMismatch {
            expected: d,
            found: row.len(),
        });
    }

    let n = data.len();

    #[cfg(feature = "parallel")]
    {
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .collect();
        Ok(pairs
            .par_iter()
            .map(|&(i, j)| metric(&data[i], &data[j]))
            .collect())
    }

    #[cfg(not(feature = "parallel"))]
    {
        let mut condensed = Vec::with_capacity(n * (n - 1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                condensed.push(metric(&data[i], &data[j]));
            }
        }
        Ok(condensed)
    }
}

/// Flatten an `m x m` distance matrix into condensed form.
///
/// The matrix must be square and symmetric with a zero diagonal (NaN
/// entries are accepted off-diagonal and must match their mirror).
///
/// # Errors
///
/// [`Error::ShapeMismatch`] for a non-square matrix;
/// [`Error::InvalidParameter`] for a nonzero diagonal or asymmetry.
pub fn condensed_from_square(square: ArrayView2<'_, f64>) -> Result<Vec<f64>> {
    let (rows, cols) = square.dim();
    if rows != cols {
        return Err(Error::ShapeMismatch {
            expected: "square matrix".to_string(),
            actual: format!("{rows}x{cols}"),
        });
    }

    let mut condensed = Vec::with_capacity(rows * rows.saturating_sub(1) / 2);
    for i in 0..rows {
        if square[(i, i)] != 0.0 {
            return Err(Error::InvalidParameter {
                name: "square",
                message: "diagonal must be zero",
            });
        }
        for j in (i + 1)..rows {
            let upper = square[(i, j)];
            let lower = square[(j, i)];
            let mirrored = upper == lower || (upper.is_nan() && lower.is_nan());
            if !mirrored {
                return Err(Error::InvalidParameter {
                    name: "square",
                    message: "matrix must be symmetric",
                });
            }
            condensed.push(upper);
        }
    }
    Ok(condensed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_euclidean() {
        assert_eq!(euclidean(&[0.0, 0.0], &[3.0, 4.0]), 5.0);
        assert_eq!(euclidean(&[1.0], &[1.0]), 0.0);
    }

    #[test]
    fn test_pairwise_condensed_order() {
        let data = vec![vec![0.0], vec![1.0], vec![10.0], vec![11.0]];
        let condensed = pairwise_condensed(&data, euclidean).unwrap();
        assert_eq!(condensed, vec![1.0, 10.0, 11.0, 9.0, 10.0, 1.0]);
    }

    #[test]
    fn test_pairwise_rejects_bad_input() {
        assert_eq!(
            pairwise_condensed(&[], euclidean).unwrap_err(),
            Error::EmptyInput
        );
        let ragged = vec![vec![0.0, 0.0], vec![1.0]];
        assert_eq!(
            pairwise_condensed(&ragged, euclidean).unwrap_err(),
            Error::DimensionMismatch {
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_condensed_from_square() {
        let sq = array![[0.0, 1.0, 4.0], [1.0, 0.0, 2.0], [4.0, 2.0, 0.0]];
        let condensed = condensed_from_square(sq.view()).unwrap();
        assert_eq!(condensed, vec![1.0, 4.0, 2.0]);
    }

    #[test]
    fn test_condensed_from_square_rejects_asymmetry() {
        let sq = array![[0.0, 1.0], [2.0, 0.0]];
        assert!(matches!(
            condensed_from_square(sq.view()),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_condensed_from_square_rejects_nonzero_diagonal() {
        let sq = array![[0.5, 1.0], [1.0, 0.0]];
        assert!(matches!(
            condensed_from_square(sq.view()),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_condensed_from_square_rejects_non_square() {
        let sq = ndarray::Array2::<f64>::zeros((2, 3));
        assert!(matches!(
            condensed_from_square(sq.view()),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_square_accepts_matching_nans() {
        let sq = array![[0.0, f64::NAN], [f64::NAN, 0.0]];
        let condensed = condensed_from_square(sq.view()).unwrap();
        assert!(condensed[0].is_nan());
    }
}
