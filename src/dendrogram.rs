//! Dendrogram: the merge history produced by agglomerative linkage.
//!
//! A dendrogram is a binary tree over the original observations. Ids
//! follow the MATLAB/SciPy linkage convention, 1-based:
//!
//! ```text
//!         7  (height 9.0)
//!        / \
//!       5   6  (heights 1.0)
//!      / \ / \
//!     1  2 3  4  (leaves)
//! ```
//!
//! Leaves are `1..=m`; the record at index `i` (0-based) creates cluster
//! id `m + i + 1`. Cut the tree at any height to get flat clusters.

use crate::cut::{check_cut, label_tree, FlatClusters};
use crate::error::{Error, Result};

/// A single merge in the dendrogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    /// Smaller branch id of the merged pair (leaf or earlier cluster).
    pub left: usize,
    /// Larger branch id of the merged pair.
    pub right: usize,
    /// Distance at which the merge occurred. NaN when the input
    /// distances were exhausted before this step.
    pub height: f64,
}

/// Merge history of one agglomerative clustering run: exactly `m - 1`
/// records for `m` observations, immutable once produced.
#[derive(Debug, Clone)]
pub struct Dendrogram {
    merges: Vec<Merge>,
    n_obs: usize,
}

impl Dendrogram {
    pub(crate) fn new(n_obs: usize) -> Self {
        Self {
            merges: Vec::with_capacity(n_obs.saturating_sub(1)),
            n_obs,
        }
    }

    pub(crate) fn push(&mut self, left: usize, right: usize, height: f64) {
        debug_assert!(left < right);
        self.merges.push(Merge {
            left,
            right,
            height,
        });
    }

    /// Number of original observations.
    pub fn n_observations(&self) -> usize {
        self.n_obs
    }

    /// Number of merges recorded.
    pub fn n_merges(&self) -> usize {
        self.merges.len()
    }

    /// The merge records, in merge order.
    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    /// The merge heights, in merge order.
    pub fn heights(&self) -> Vec<f64> {
        self.merges.iter().map(|mg| mg.height).collect()
    }

    /// Cut the tree at a distance threshold and label every leaf.
    ///
    /// A cutoff above the maximum height yields one cluster; below the
    /// minimum (any negative value for metric distances) yields one
    /// singleton per observation. `+inf`/`-inf` are valid cutoffs.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] for a NaN cutoff.
    pub fn cut_at(&self, cutoff: f64) -> Result<FlatClusters> {
        if cutoff.is_nan() {
            return Err(Error::InvalidParameter {
                name: "cutoff",
                message: "cutoff must not be NaN",
            });
        }
        let conn = check_cut(self, cutoff);
        Ok(FlatClusters::from_raw(label_tree(self, &conn)))
    }

    /// Cut the tree so that roughly `k` flat clusters result.
    ///
    /// Picks a threshold halfway between the merge heights that separate
    /// `k` clusters, then delegates to [`Dendrogram::cut_at`]. Ties or
    /// non-monotone height sequences (centroid/median inversions) can
    /// make the exact count unreachable.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidClusterCount`] when `k` is zero or exceeds the
    /// number of observations.
    pub fn cut_to_k(&self, k: usize) -> Result<FlatClusters> {
        let m = self.n_obs;
        if k == 0 || k > m {
            return Err(Error::InvalidClusterCount {
                requested: k,
                n_items: m,
            });
        }
        if k == m {
            return self.cut_at(f64::NEG_INFINITY);
        }

        let mut heights: Vec<f64> = self
            .merges
            .iter()
            .map(|mg| mg.height)
            .filter(|h| h.is_finite())
            .collect();
        heights.sort_by(|a, b| a.total_cmp(b));

        let allowed = m - k; // merges that may complete
        if allowed >= heights.len() {
            return self.cut_at(f64::INFINITY);
        }
        let threshold = (heights[allowed - 1] + heights[allowed]) / 2.0;
        self.cut_at(threshold)
    }
}
