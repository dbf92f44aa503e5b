//! Result types for clustering operations.
//!
//! A [`ClusteringResult`] holds the same partition in two shapes: per-point
//! labels and per-cluster member lists with a centroid each.

use thiserror::Error;

use crate::union_find::UnionFind;

/// Output of a ToMaTo run.
///
/// # Examples
/// ```
/// use topologyx_core::{ClusterId, ClusteringResult};
///
/// let result = ClusteringResult::from_clusters(vec![vec![1, 2], vec![0]], vec![2, 0])?;
/// assert_eq!(result.cluster_count(), 2);
/// assert_eq!(result.assignments()[0], ClusterId::new(1));
/// assert_eq!(result.roots(), [0, 2, 2]);
/// # Ok::<(), topologyx_core::ClusterLayoutError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusteringResult {
    assignments: Vec<ClusterId>,
    roots: Vec<usize>,
    clusters: Vec<Vec<usize>>,
    centroids: Vec<usize>,
    n_neighbors: usize,
    escalations: usize,
}

/// Error returned when member lists do not partition `0..n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ClusterLayoutError {
    /// Each cluster needs exactly one centroid.
    #[error("{clusters} clusters but {centroids} centroids")]
    CentroidCountMismatch {
        /// Number of member lists.
        clusters: usize,
        /// Number of centroids.
        centroids: usize,
    },
    /// A cluster had no members.
    #[error("cluster {cluster} is empty")]
    EmptyCluster {
        /// Position of the empty cluster.
        cluster: usize,
    },
    /// A centroid was not a member of its own cluster.
    #[error("centroid of cluster {cluster} is not one of its members")]
    CentroidNotMember {
        /// Position of the cluster.
        cluster: usize,
    },
    /// A point appeared in more than one cluster or twice in one.
    #[error("point {point} is assigned more than once")]
    DuplicatePoint {
        /// The repeated point.
        point: usize,
    },
    /// A point index was outside `0..n` or no cluster claimed it.
    #[error("point {point} is missing from the layout")]
    MissingPoint {
        /// The unassigned point.
        point: usize,
    },
}

impl ClusteringResult {
    /// Rebuilds the per-point view from member lists and centroids.
    ///
    /// The members must partition `0..n` where `n` is the total member count.
    /// Cluster `i` receives [`ClusterId`] `i`. Provenance fields
    /// ([`Self::n_neighbors`], [`Self::escalations`]) are zero.
    ///
    /// # Errors
    /// Returns [`ClusterLayoutError`] when the lists do not form a partition
    /// or a centroid lies outside its cluster.
    pub fn from_clusters(
        clusters: Vec<Vec<usize>>,
        centroids: Vec<usize>,
    ) -> Result<Self, ClusterLayoutError> {
        if clusters.len() != centroids.len() {
            return Err(ClusterLayoutError::CentroidCountMismatch {
                clusters: clusters.len(),
                centroids: centroids.len(),
            });
        }

        let points: usize = clusters.iter().map(Vec::len).sum();
        let mut labels: Vec<Option<usize>> = vec![None; points];
        for (cluster, (members, centroid)) in clusters.iter().zip(&centroids).enumerate() {
            if members.is_empty() {
                return Err(ClusterLayoutError::EmptyCluster { cluster });
            }
            if !members.contains(centroid) {
                return Err(ClusterLayoutError::CentroidNotMember { cluster });
            }
            for &point in members {
                let Some(slot) = labels.get_mut(point) else {
                    return Err(ClusterLayoutError::MissingPoint { point });
                };
                if slot.replace(cluster).is_some() {
                    return Err(ClusterLayoutError::DuplicatePoint { point });
                }
            }
        }

        let mut assignments = Vec::with_capacity(points);
        let mut roots = Vec::with_capacity(points);
        for (point, label) in labels.into_iter().enumerate() {
            let cluster = label.ok_or(ClusterLayoutError::MissingPoint { point })?;
            assignments.push(ClusterId::from_index(cluster));
            roots.push(centroids[cluster]);
        }

        Ok(Self {
            assignments,
            roots,
            clusters,
            centroids,
            n_neighbors: 0,
            escalations: 0,
        })
    }

    /// Materialises the sets of `forest` over points `0..points`.
    ///
    /// Clusters follow root insertion order and members their own insertion
    /// order; each root is its cluster's centroid.
    pub(crate) fn from_forest(
        forest: &mut UnionFind<usize>,
        points: usize,
        n_neighbors: usize,
        escalations: usize,
    ) -> Result<Self, ClusterLayoutError> {
        forest.insert_objects(&(0..points).collect::<Vec<_>>());
        let (centroids, clusters) = forest.sets().into_iter().unzip();
        let mut result = Self::from_clusters(clusters, centroids)?;
        result.n_neighbors = n_neighbors;
        result.escalations = escalations;
        Ok(result)
    }

    /// Cluster of each point, by point index.
    #[must_use]
    pub fn assignments(&self) -> &[ClusterId] {
        &self.assignments
    }

    /// Root (centroid) point of each point's cluster, by point index.
    #[must_use]
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Member lists, indexed by [`ClusterId`].
    #[must_use]
    pub fn clusters(&self) -> &[Vec<usize>] {
        &self.clusters
    }

    /// Centroid point of each cluster, indexed by [`ClusterId`].
    #[must_use]
    pub fn centroids(&self) -> &[usize] {
        &self.centroids
    }

    /// Number of clusters.
    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Neighbourhood width that produced this partition.
    #[must_use]
    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    /// Number of widening steps taken to meet the cluster target.
    #[must_use]
    pub fn escalations(&self) -> usize {
        self.escalations
    }

    /// Cluster labels as plain integers, by point index.
    #[must_use]
    pub fn labels(&self) -> Vec<usize> {
        self.assignments.iter().map(|id| id.index()).collect()
    }
}

/// Identifier assigned to a cluster.
///
/// # Examples
/// ```
/// use topologyx_core::ClusterId;
///
/// let id = ClusterId::new(4);
/// assert_eq!(id.get(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterId(u64);

impl ClusterId {
    /// Creates a new cluster identifier.
    #[rustfmt::skip]
    #[must_use]
    pub const fn new(id: u64) -> Self { Self(id) }

    /// Returns the underlying numeric identifier.
    #[rustfmt::skip]
    #[must_use]
    pub const fn get(self) -> u64 { self.0 }

    fn from_index(index: usize) -> Self {
        Self(u64::try_from(index).unwrap_or(u64::MAX))
    }

    fn index(self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn forest_sets_become_clusters() {
        let mut forest = UnionFind::new();
        forest.insert_objects(&[3_usize, 0, 2, 1]);
        forest.union(&3, &1);
        forest.union(&0, &2);

        let result = ClusteringResult::from_forest(&mut forest, 4, 6, 2).expect("forest is valid");

        assert_eq!(result.clusters(), [vec![3, 1], vec![0, 2]]);
        assert_eq!(result.centroids(), [3, 0]);
        assert_eq!(result.labels(), [1, 0, 1, 0]);
        assert_eq!(result.roots(), [0, 3, 0, 3]);
        assert_eq!(result.n_neighbors(), 6);
        assert_eq!(result.escalations(), 2);
    }

    #[test]
    fn missing_forest_points_become_singletons() {
        let mut forest = UnionFind::new();
        forest.union(&0_usize, &1);

        let result = ClusteringResult::from_forest(&mut forest, 3, 1, 0).expect("forest is valid");

        assert_eq!(result.cluster_count(), 2);
        assert_eq!(result.centroids(), [0, 2]);
    }

    #[rstest]
    #[case(vec![vec![0]], vec![], ClusterLayoutError::CentroidCountMismatch { clusters: 1, centroids: 0 })]
    #[case(vec![vec![0], vec![]], vec![0, 1], ClusterLayoutError::EmptyCluster { cluster: 1 })]
    #[case(vec![vec![0, 1]], vec![2], ClusterLayoutError::CentroidNotMember { cluster: 0 })]
    #[case(vec![vec![0, 1], vec![1]], vec![0, 1], ClusterLayoutError::DuplicatePoint { point: 1 })]
    #[case(vec![vec![0, 5]], vec![0], ClusterLayoutError::MissingPoint { point: 5 })]
    fn rejects_invalid_layouts(
        #[case] clusters: Vec<Vec<usize>>,
        #[case] centroids: Vec<usize>,
        #[case] expected: ClusterLayoutError,
    ) {
        let err = ClusteringResult::from_clusters(clusters, centroids)
            .expect_err("layout must be rejected");
        assert_eq!(err, expected);
    }
}
