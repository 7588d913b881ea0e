//! Packed upper-triangle storage for pairwise distances.
//!
//! For `m` observations the `m(m-1)/2` distances are stored flat, pair
//! `(i, j)` with `i < j` at offset `((2m - 1 - i)*i)/2 + (j - i - 1)`.
//! The linkage engine mutates this storage in place and recycles one
//! row/col per merge, so the logically active submatrix shrinks by one
//! each step while the backing vector stays fixed.

/// Condensed pairwise-distance matrix, owned by a single linkage run.
#[derive(Debug, Clone)]
pub(crate) struct CondensedMatrix {
    data: Vec<f64>,
    m: usize,
}

impl CondensedMatrix {
    /// Copy the caller's condensed vector. The engine owns and destroys
    /// its working copy; the caller's input is never mutated.
    pub fn from_slice(condensed: &[f64], m: usize) -> Self {
        debug_assert_eq!(condensed.len(), m * (m - 1) / 2);
        Self {
            data: condensed.to_vec(),
            m,
        }
    }

    /// Number of observations (side of the square matrix).
    pub fn size(&self) -> usize {
        self.m
    }

    #[inline]
    fn offset(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < j && j < self.m);
        ((2 * self.m - 1 - i) * i) / 2 + (j - i - 1)
    }

    /// Distance between clusters at positions `a` and `b` (`a != b`).
    #[inline]
    pub fn get(&self, a: usize, b: usize) -> f64 {
        let (i, j) = if a < b { (a, b) } else { (b, a) };
        self.data[self.offset(i, j)]
    }

    /// Overwrite the distance between positions `a` and `b`.
    #[inline]
    pub fn set(&mut self, a: usize, b: usize, value: f64) {
        let (i, j) = if a < b { (a, b) } else { (b, a) };
        let at = self.offset(i, j);
        self.data[at] = value;
    }

    /// Move the retiring leftmost row/col `bc` into the freed slot `k`.
    ///
    /// After a merge the cluster that lived at `bc` takes over position
    /// `k`, so every distance `d(bc, q)` becomes `d(k, q)`. The pair
    /// `(bc, k)` itself is dropped: it was the cluster's distance to the
    /// slot it now occupies.
    pub fn fold_into(&mut self, bc: usize, k: usize) {
        debug_assert!(bc < k);
        for q in (bc + 1)..self.m {
            if q == k {
                continue;
            }
            let value = self.get(bc, q);
            self.set(k, q, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(m: usize) -> CondensedMatrix {
        // d(i, j) = 10*i + j, distinct per pair
        let mut data = Vec::new();
        for i in 0..m {
            for j in (i + 1)..m {
                data.push((10 * i + j) as f64);
            }
        }
        CondensedMatrix::from_slice(&data, m)
    }

    #[test]
    fn test_packed_order_matches_pair() {
        let y = fill(5);
        for i in 0..5 {
            for j in (i + 1)..5 {
                assert_eq!(y.get(i, j), (10 * i + j) as f64);
                // order-insensitive lookup
                assert_eq!(y.get(j, i), y.get(i, j));
            }
        }
    }

    #[test]
    fn test_set_roundtrip() {
        let mut y = fill(4);
        y.set(2, 1, -7.0);
        assert_eq!(y.get(1, 2), -7.0);
        assert_eq!(y.get(0, 1), 1.0);
    }

    #[test]
    fn test_fold_into_moves_leftmost_column() {
        let mut y = fill(5);
        // retire row/col 0 into slot 2
        y.fold_into(0, 2);
        assert_eq!(y.get(1, 2), 1.0); // was d(0, 1)
        assert_eq!(y.get(2, 3), 3.0); // was d(0, 3)
        assert_eq!(y.get(2, 4), 4.0); // was d(0, 4)
        // untouched pairs keep their values
        assert_eq!(y.get(1, 3), 13.0);
        assert_eq!(y.get(3, 4), 34.0);
    }
}
