//! Agglomerative linkage: condensed distances in, dendrogram out.
//!
//! Starting from `m` singleton clusters, repeatedly merge the two closest
//! clusters until one remains, recording each merge and its distance.
//! Cluster-to-cluster distance after a merge is redefined by the chosen
//! [`Linkage`] criterion via the Lance-Williams recurrence, so raw
//! observations are never revisited:
//!
//! | Criterion | New distance to cluster q |
//! |-----------|---------------------------|
//! | Single    | `min(d(k,q), d(l,q))` |
//! | Complete  | `max(d(k,q), d(l,q))` |
//! | Average   | `(nk*d(k,q) + nl*d(l,q)) / (nk+nl)` |
//! | Weighted  | `(d(k,q) + d(l,q)) / 2` |
//! | Centroid  | `(nk*d(k,q) + nl*d(l,q))/(nk+nl) - nk*nl*d(k,l)/(nk+nl)^2` |
//! | Median    | `(d(k,q) + d(l,q))/2 - d(k,l)/4` |
//! | Ward      | `((nk+nq)*d(k,q) + (nl+nq)*d(l,q) - nq*d(k,l)) / (nk+nl+nq)` |
//!
//! # Finding the minimum without a full rescan
//!
//! The naive engine scans all remaining distances at every step. This one
//! keeps a short sorted cache of the smallest distances seen and pops its
//! head; the condensed matrix is rescanned only when the cache runs dry. Merged-away rows invalidate cache
//! entries, and the retiring leftmost row/col of the matrix is folded
//! into the freed slot so the active submatrix shrinks by one per step.
//!
//! # NaN policy
//!
//! NaN distances compare as larger than any finite value and never enter
//! the candidate cache. If every remaining distance is NaN before the
//! tree completes, the remaining merge records are emitted with NaN
//! heights over adjacent leftover slots; this is not an error.

mod candidates;
mod condensed;

use crate::dendrogram::Dendrogram;
use crate::error::{Error, Result};
use candidates::CandidateList;
use condensed::CondensedMatrix;

/// Linkage criterion for agglomerative clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Linkage {
    /// Minimum distance between clusters. Chaining; elongated clusters.
    Single,
    /// Maximum distance between clusters. Compact clusters.
    Complete,
    /// Size-weighted mean distance (UPGMA).
    #[default]
    Average,
    /// Unweighted mean of the two distances (WPGMA).
    Weighted,
    /// Distance between cluster centroids (UPGMC).
    Centroid,
    /// Weighted centroid distance (WPGMC).
    Median,
    /// Minimize within-cluster variance.
    Ward,
}

impl Linkage {
    /// Criteria whose update formula reads cluster cardinalities.
    fn uses_cardinality(self) -> bool {
        matches!(self, Linkage::Average | Linkage::Centroid | Linkage::Ward)
    }
}

/// Lance-Williams parameters for one merge, precomputed so the inner
/// loop over remaining clusters dispatches on a plain enum tag.
enum Update {
    Single,
    Complete,
    Average { rk: f64, rl: f64 },
    Weighted,
    Centroid { rk: f64, rl: f64, shift: f64 },
    Median { shift: f64 },
    Ward { t1: f64, nk: f64, nl: f64 },
}

impl Update {
    fn prepare(method: Linkage, t1: f64, nk: usize, nl: usize) -> Self {
        let (fnk, fnl) = (nk as f64, nl as f64);
        let total = fnk + fnl;
        match method {
            Linkage::Single => Update::Single,
            Linkage::Complete => Update::Complete,
            Linkage::Average => Update::Average {
                rk: fnk / total,
                rl: fnl / total,
            },
            Linkage::Weighted => Update::Weighted,
            Linkage::Centroid => Update::Centroid {
                rk: fnk / total,
                rl: fnl / total,
                shift: t1 * fnk * fnl / (total * total),
            },
            Linkage::Median => Update::Median { shift: t1 / 4.0 },
            Linkage::Ward => Update::Ward {
                t1,
                nk: fnk,
                nl: fnl,
            },
        }
    }

    /// New distance from the merged cluster to the cluster at `q`, from
    /// the two pre-merge distances. For min/max criteria a NaN side
    /// loses to the other side.
    #[inline]
    fn apply(&self, dkq: f64, dlq: f64, nq: usize) -> f64 {
        match *self {
            Update::Single => {
                if dkq < dlq || dlq.is_nan() {
                    dkq
                } else {
                    dlq
                }
            }
            Update::Complete => {
                if dkq > dlq || dlq.is_nan() {
                    dkq
                } else {
                    dlq
                }
            }
            Update::Average { rk, rl } => dkq * rk + dlq * rl,
            Update::Weighted => (dkq + dlq) / 2.0,
            Update::Centroid { rk, rl, shift } => dkq * rk + dlq * rl - shift,
            Update::Median { shift } => (dkq + dlq) / 2.0 - shift,
            Update::Ward { t1, nk, nl } => {
                let nq = nq as f64;
                ((nk + nq) * dkq + (nl + nq) * dlq - nq * t1) / (nk + nl + nq)
            }
        }
    }
}

/// Build the agglomerative cluster tree for `m` observations from their
/// condensed pairwise distances.
///
/// `condensed` holds the upper triangle of the symmetric distance matrix
/// in packed order (pair `(i, j)`, `i < j`) and must have length
/// `m(m-1)/2`; see [`crate::distance`] for helpers that produce it. The
/// input is copied, never mutated.
///
/// Returns `m - 1` merge records. Ids are 1-based: `1..=m` are the
/// original observations and record `i` (0-based) creates cluster id
/// `m + i + 1`. Heights carry the units of the input distances.
///
/// # Errors
///
/// [`Error::DimensionMismatch`] when the condensed length does not match
/// `m`. Zero or one observation yields an empty dendrogram. All-NaN
/// distances are not an error; see the module docs.
///
/// # Example
///
/// ```rust
/// use agglo::{linkage, Linkage};
///
/// // Four points on a line at 0, 1, 10, 11.
/// let condensed = [1.0, 10.0, 11.0, 9.0, 10.0, 1.0];
/// let z = linkage(&condensed, 4, Linkage::Single).unwrap();
/// assert_eq!(z.n_merges(), 3);
/// let heights = z.heights();
/// assert_eq!(heights[0], 1.0);
/// assert_eq!(heights[2], 9.0);
/// ```
pub fn linkage(condensed: &[f64], m: usize, method: Linkage) -> Result<Dendrogram> {
    let expected = if m < 2 { 0 } else { m * (m - 1) / 2 };
    if condensed.len() != expected {
        return Err(Error::DimensionMismatch {
            expected,
            found: condensed.len(),
        });
    }

    let mut z = Dendrogram::new(m);
    if m < 2 {
        return Ok(z);
    }

    let mut y = CondensedMatrix::from_slice(condensed, m);
    let bn = m - 1;
    let mut obp: Vec<usize> = (0..m).collect();
    let uses_scl = method.uses_cardinality();
    let mut scl: Vec<usize> = if uses_scl { vec![1; m] } else { Vec::new() };

    let mut cands = CandidateList::new(m, method == Linkage::Single);
    let mut t3 = f64::INFINITY;

    let mut bc = 0;
    while bc < bn {
        // Candidates below the smallest distance produced by the last
        // merge are still trustworthy; the rest may have been undercut.
        cands.truncate_at(t3);
        t3 = f64::INFINITY;
        if cands.is_empty() {
            cands.rebuild(&y, bc);
        }

        // Still empty after a rescan: only NaNs remain.
        let Some(best) = cands.pop_min() else { break };
        let (k, l, t1) = (best.row, best.col, best.dist);
        cands.retire(k, l, bc);

        // Smaller branch pointer goes in the left column; ids are 1-based.
        if obp[k] < obp[l] {
            z.push(obp[k] + 1, obp[l] + 1, t1);
        } else {
            z.push(obp[l] + 1, obp[k] + 1, t1);
        }

        // The cluster at the retiring leftmost slot takes over `k`; the
        // merged cluster occupies `l`.
        obp[k] = obp[bc];
        obp[l] = m + bc;

        let (nk, nl) = if uses_scl {
            let (nk, nl) = (scl[k], scl[l]);
            scl[k] = scl[bc];
            scl[l] = nk + nl;
            (nk, nl)
        } else {
            (1, 1)
        };
        let update = Update::prepare(method, t1, nk, nl);

        // Recompute the distance from the merged cluster to every other
        // active cluster, tracking the smallest new value for the next
        // round of candidate trimming.
        for q in bc..m {
            if q == k || q == l {
                continue;
            }
            let dkq = y.get(k, q);
            let dlq = y.get(l, q);
            let nq = if uses_scl { scl[q] } else { 1 };
            let t2 = update.apply(dkq, dlq, nq);
            if t2 < t3 {
                t3 = t2;
            }
            y.set(l, q, t2);
        }

        if k != bc {
            y.fold_into(bc, k);
        }
        bc += 1;
    }

    // Distances exhausted early: pad the tail with NaN heights over
    // adjacent leftover slots.
    while bc < bn {
        let (k, l) = (bc, bc + 1);
        if obp[k] < obp[l] {
            z.push(obp[k] + 1, obp[l] + 1, f64::NAN);
        } else {
            z.push(obp[l] + 1, obp[k] + 1, f64::NAN);
        }
        obp[l] = m + bc;
        bc += 1;
    }

    Ok(z)
}
