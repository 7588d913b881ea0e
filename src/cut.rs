//! Cutting a dendrogram into flat clusters at a distance threshold.
//!
//! Two passes over the merge records:
//!
//! 1. [`check_cut`] decides, per internal node, whether its entire
//!    subtree merged at or below the cutoff ("connected"). A node with a
//!    too-high merge anywhere beneath it is split by the cut.
//! 2. [`label_tree`] propagates candidate cluster ids down from every
//!    split node; each leaf under a maximal connected subtree ends up
//!    with that subtree's id.
//!
//! [`crate::Dendrogram::cut_at`] runs both and compresses the sparse
//! candidate ids into dense labels.

use crate::dendrogram::Dendrogram;

/// Flat cluster assignment produced by cutting a dendrogram.
///
/// Labels are dense 0-based ids, one per original observation. The
/// per-leaf vector is the primary result; the distinct-id set is a
/// derived view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatClusters {
    labels: Vec<usize>,
    n_clusters: usize,
}

impl FlatClusters {
    /// Compress sparse candidate ids into dense labels, renumbering to
    /// consecutive integers.
    pub(crate) fn from_raw(raw: Vec<usize>) -> Self {
        let mut unique: Vec<usize> = raw.to_vec();
        unique.sort_unstable();
        unique.dedup();

        let labels = raw
            .iter()
            .map(|&l| unique.iter().position(|&u| u == l).unwrap_or(0))
            .collect();
        Self {
            labels,
            n_clusters: unique.len(),
        }
    }

    /// Cluster label per original observation.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Number of distinct clusters.
    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    /// The distinct cluster ids in use.
    pub fn distinct_ids(&self) -> Vec<usize> {
        (0..self.n_clusters).collect()
    }
}

/// Per internal node: true iff the node's own merge height is at or
/// below `cutoff` and every non-leaf child is itself connected.
///
/// NaN heights compare as above any cutoff, so NaN-padded tail records
/// always count as split.
pub fn check_cut(z: &Dendrogram, cutoff: f64) -> Vec<bool> {
    let n = z.n_merges();
    let m = z.n_observations();
    let merges = z.merges();

    let mut conn: Vec<bool> = merges.iter().map(|mg| mg.height <= cutoff).collect();

    // Only nodes that are below the cutoff themselves and have at least
    // one non-leaf child can still change.
    let mut todo: Vec<bool> = merges
        .iter()
        .enumerate()
        .map(|(i, mg)| conn[i] && (mg.left > m || mg.right > m))
        .collect();

    // Bottom-up fixpoint: a node is finalized once both children are. A
    // leaf child is trivially done; a non-leaf child is done when it is
    // no longer pending, at which point its connectivity is folded in.
    loop {
        let mut progressed = false;
        let mut remaining = false;
        for i in 0..n {
            if !todo[i] {
                continue;
            }
            let mut done = true;
            for child in [merges[i].left, merges[i].right] {
                if child <= m {
                    continue;
                }
                let c = child - m - 1;
                if todo[c] {
                    done = false;
                } else {
                    conn[i] = conn[i] && conn[c];
                }
            }
            if done {
                todo[i] = false;
                progressed = true;
            } else {
                remaining = true;
            }
        }
        if !remaining || !progressed {
            break;
        }
    }

    conn
}

/// Assign a candidate cluster id to every leaf by propagating split
/// decisions down the tree.
///
/// Each internal node starts with a distinct candidate id per child
/// slot. Split nodes (not connected) hand their slot ids to their
/// children: a leaf child takes the id directly; a connected non-leaf
/// child has both of its own slots overwritten with the id and is
/// queued to push it further down on the next round. Returns the raw
/// (sparse) per-leaf ids; callers compress them via
/// [`FlatClusters::from_raw`].
pub fn label_tree(z: &Dendrogram, conn: &[bool]) -> Vec<usize> {
    let n = z.n_merges();
    let m = z.n_observations();
    let merges = z.merges();

    // With no split anywhere, every leaf stays in cluster 1.
    let mut leaf = vec![1usize; m];
    if n == 0 {
        return leaf;
    }

    let mut conn = conn.to_vec();
    let mut todo = vec![true; n];

    // Distinct candidate id per (node, slot): left slots get 1..=n,
    // right slots n+1..=2n.
    let mut slots: Vec<[usize; 2]> = (0..n).map(|i| [i + 1, n + i + 1]).collect();

    loop {
        // Nodes that are split but not yet processed.
        let rows: Vec<usize> = (0..n).filter(|&i| todo[i] && !conn[i]).collect();
        if rows.is_empty() {
            break;
        }
        for &r in &rows {
            for (j, &child) in [merges[r].left, merges[r].right].iter().enumerate() {
                let id = slots[r][j];
                if child <= m {
                    leaf[child - 1] = id;
                } else {
                    let c = child - m - 1;
                    if conn[c] {
                        // The child's subtree stays whole: it inherits
                        // this slot's id and propagates it next round.
                        slots[c] = [id, id];
                        conn[c] = false;
                    }
                }
            }
            todo[r] = false;
        }
    }

    leaf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linkage::{linkage, Linkage};
    use rand::prelude::*;

    fn line_dendrogram() -> Dendrogram {
        // Points at 0, 1, 10, 11; single linkage.
        let condensed = [1.0, 10.0, 11.0, 9.0, 10.0, 1.0];
        linkage(&condensed, 4, Linkage::Single).unwrap()
    }

    #[test]
    fn test_check_cut_mid_threshold() {
        let z = line_dendrogram();
        let conn = check_cut(&z, 5.0);
        // Both pair merges survive, the root (height 9) is split.
        assert_eq!(conn, vec![true, true, false]);
    }

    #[test]
    fn test_check_cut_disconnects_ancestors_of_split_nodes() {
        let z = line_dendrogram();
        // Cutting below everything splits the whole tree.
        let conn = check_cut(&z, 0.5);
        assert_eq!(conn, vec![false, false, false]);
    }

    #[test]
    fn test_label_tree_two_groups() {
        let z = line_dendrogram();
        let conn = check_cut(&z, 5.0);
        let flat = FlatClusters::from_raw(label_tree(&z, &conn));
        assert_eq!(flat.n_clusters(), 2);
        let t = flat.labels();
        assert_eq!(t[0], t[1]);
        assert_eq!(t[2], t[3]);
        assert_ne!(t[0], t[2]);
    }

    #[test]
    fn test_cut_above_max_height_single_cluster() {
        let z = line_dendrogram();
        let flat = z.cut_at(f64::INFINITY).unwrap();
        assert_eq!(flat.n_clusters(), 1);
        assert_eq!(flat.labels(), &[0, 0, 0, 0]);
        assert_eq!(flat.distinct_ids(), vec![0]);
    }

    #[test]
    fn test_cut_below_min_height_all_singletons() {
        let z = line_dendrogram();
        let flat = z.cut_at(-1.0).unwrap();
        assert_eq!(flat.n_clusters(), 4);
        let mut labels = flat.labels().to_vec();
        labels.sort_unstable();
        assert_eq!(labels, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_cluster_count_monotone_in_threshold() {
        let m = 25;
        let mut rng = StdRng::seed_from_u64(11);
        let condensed: Vec<f64> = (0..m * (m - 1) / 2)
            .map(|_| rng.random_range(0.1..50.0))
            .collect();
        let z = linkage(&condensed, m, Linkage::Average).unwrap();

        let mut last = usize::MAX;
        for c in [0.0, 5.0, 10.0, 20.0, 30.0, 40.0, 60.0] {
            let k = z.cut_at(c).unwrap().n_clusters();
            assert!(k <= last, "count increased at threshold {c}");
            last = k;
        }
    }

    #[test]
    fn test_nan_heights_count_as_split() {
        let m = 4;
        let z = linkage(&vec![f64::NAN; 6], m, Linkage::Single).unwrap();
        let conn = check_cut(&z, f64::INFINITY);
        assert!(conn.iter().all(|&c| !c));
        // Every observation becomes its own cluster.
        let flat = z.cut_at(f64::INFINITY).unwrap();
        assert_eq!(flat.n_clusters(), m);
    }

    #[test]
    fn test_labels_partition_matches_subtrees() {
        // Random instance: every label must be shared exactly by the
        // leaves of one maximal connected subtree.
        let m = 20;
        let mut rng = StdRng::seed_from_u64(5);
        let condensed: Vec<f64> = (0..m * (m - 1) / 2)
            .map(|_| rng.random_range(0.1..10.0))
            .collect();
        let z = linkage(&condensed, m, Linkage::Complete).unwrap();
        let cutoff = 6.0;

        let flat = z.cut_at(cutoff).unwrap();
        let labels = flat.labels();

        // Union-find over merges below the cutoff gives the same
        // partition. (Complete linkage heights are monotone, so the
        // connected subtrees are exactly the sub-cutoff merges.)
        let mut parent: Vec<usize> = (0..2 * m).collect();
        fn find(parent: &mut Vec<usize>, mut x: usize) -> usize {
            while parent[x] != x {
                parent[x] = parent[parent[x]];
                x = parent[x];
            }
            x
        }
        for (i, mg) in z.merges().iter().enumerate() {
            if mg.height <= cutoff {
                let node = m + i;
                let a = find(&mut parent, mg.left - 1);
                let b = find(&mut parent, mg.right - 1);
                parent[a] = node;
                parent[b] = node;
            }
        }
        for i in 0..m {
            for j in (i + 1)..m {
                let together = find(&mut parent, i) == find(&mut parent, j);
                assert_eq!(labels[i] == labels[j], together, "leaves {i} and {j}");
            }
        }
    }
}
