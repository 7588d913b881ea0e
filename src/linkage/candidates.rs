//! Bounded sorted list of the smallest known-valid pairwise distances.
//!
//! Rescanning the whole condensed matrix for the minimum at every merge
//! step is O(m^3) over a run. Instead the engine keeps the `N` smallest
//! distances it has seen, tagged with their `(row, col)` positions, and
//! pops the head each step. Entries become stale when an endpoint is
//! merged away or when a newly computed distance could undercut them;
//! the matrix is rescanned only when the list runs dry.

use super::condensed::CondensedMatrix;

/// One cached distance with its position in the condensed matrix
/// (`row < col` always holds).
#[derive(Debug, Clone, Copy)]
pub(crate) struct Candidate {
    pub dist: f64,
    pub row: usize,
    pub col: usize,
}

/// Sorted ascending, bounded by a capacity chosen from the problem size.
#[derive(Debug)]
pub(crate) struct CandidateList {
    entries: Vec<Candidate>,
    cap: usize,
}

impl CandidateList {
    /// Capacity ladder: 16 entries up to m = 63, doubling at 64/128/256/
    /// 512/1024 and topping out at 512. Single linkage invalidates
    /// candidates much faster than it uses them, so its list is halved.
    pub fn new(m: usize, single: bool) -> Self {
        let mut cap = if m > 1023 {
            512
        } else if m > 511 {
            256
        } else if m > 255 {
            128
        } else if m > 127 {
            64
        } else if m > 63 {
            32
        } else {
            16
        };
        if single {
            cap /= 2;
        }
        Self {
            entries: Vec::with_capacity(cap),
            cap,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop the tail from the first entry whose distance is not smaller
    /// than `bound`. Everything below `bound` (the smallest distance
    /// produced by the previous merge) is still guaranteed to be a
    /// global minimum; everything at or above it may have been
    /// superseded by a distance that never entered the list.
    pub fn truncate_at(&mut self, bound: f64) {
        let keep = self
            .entries
            .iter()
            .position(|c| !(c.dist < bound))
            .unwrap_or(self.entries.len());
        self.entries.truncate(keep);
    }

    /// Full rescan of the active submatrix (positions `bc..m`), keeping
    /// the `N` smallest finite distances. NaN never enters the list.
    pub fn rebuild(&mut self, y: &CondensedMatrix, bc: usize) {
        self.entries.clear();
        let m = y.size();
        for i in bc..m {
            for j in (i + 1)..m {
                self.insert(y.get(i, j), i, j);
            }
        }
    }

    fn insert(&mut self, dist: f64, row: usize, col: usize) {
        if dist.is_nan() {
            return;
        }
        if self.entries.len() == self.cap {
            match self.entries.last() {
                Some(last) if dist <= last.dist => {
                    self.entries.pop();
                }
                _ => return,
            }
        }
        let at = self.entries.partition_point(|c| c.dist < dist);
        self.entries.insert(at, Candidate { dist, row, col });
    }

    /// Pop the global minimum.
    pub fn pop_min(&mut self) -> Option<Candidate> {
        if self.entries.is_empty() {
            None
        } else {
            Some(self.entries.remove(0))
        }
    }

    /// After merging the clusters at `k` and `l`: drop entries touching
    /// either position (their distances are about to be recomputed) and
    /// re-home entries that referenced the retiring leftmost row `bc`
    /// to its new position `k`, keeping `row < col`.
    pub fn retire(&mut self, k: usize, l: usize, bc: usize) {
        self.entries.retain_mut(|c| {
            if c.row == k || c.row == l || c.col == k || c.col == l {
                return false;
            }
            if c.row == bc {
                if k > c.col {
                    c.row = c.col;
                    c.col = k;
                } else {
                    c.row = k;
                }
            }
            true
        });
    }
}
