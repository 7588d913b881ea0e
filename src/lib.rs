//! # agglo
//!
//! Agglomerative hierarchical clustering: build a dendrogram from
//! pairwise distances, then cut it at any height to get flat clusters.
//!
//! # Pipeline
//!
//! ```text
//! observations ──► condensed distances ──► linkage ──► Dendrogram
//!                  (distance module)                        │
//!                                              cut_at / cut_to_k
//!                                                           ▼
//!                                                    FlatClusters
//! ```
//!
//! The linkage engine implements all seven Lance-Williams criteria
//! (single, complete, average, weighted, centroid, median, ward) over a
//! packed upper-triangle distance matrix, using a bounded candidate
//! cache to avoid rescanning all distances at every merge.
//!
//! # Example
//!
//! ```rust
//! use agglo::{linkage, pairwise_condensed, euclidean, Linkage};
//!
//! // Two tight pairs on a line.
//! let data = vec![vec![0.0], vec![1.0], vec![10.0], vec![11.0]];
//! let condensed = pairwise_condensed(&data, euclidean).unwrap();
//!
//! let z = linkage(&condensed, data.len(), Linkage::Single).unwrap();
//! let flat = z.cut_at(5.0).unwrap();
//!
//! assert_eq!(flat.n_clusters(), 2);
//! assert_eq!(flat.labels()[0], flat.labels()[1]);
//! assert_ne!(flat.labels()[0], flat.labels()[2]);
//! ```
//!
//! # NaN handling
//!
//! NaN distances are treated as larger than any finite distance. When
//! NaNs exhaust the remaining candidates, linkage completes with
//! NaN-height records instead of failing; see [`linkage`].

pub mod cut;
pub mod dendrogram;
pub mod distance;
/// Error types used across `agglo`.
pub mod error;
pub mod linkage;

pub use cut::{check_cut, label_tree, FlatClusters};
pub use dendrogram::{Dendrogram, Merge};
pub use distance::{condensed_from_square, euclidean, pairwise_condensed};
pub use error::{Error, Result};
pub use linkage::{linkage, Linkage};
