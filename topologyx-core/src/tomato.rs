//! ToMaTo (Topological Mode Analysis Tool) cluster assignment.
//!
//! Points are visited from the densest down. A point with no denser neighbour
//! starts a new cluster at a local mode; otherwise it joins its densest
//! neighbour's cluster, and any other neighbouring cluster whose peak is less
//! than `tau` above the current point is merged in as well.

use std::sync::Arc;

use tracing::{Span, debug, field, info, instrument, warn};

use crate::{
    Result,
    datasource::DataSource,
    density::DensityEstimator,
    error::TomatoError,
    filtration::{ModeFiltration, by_density_descending, validate_densities},
    neighbors::{BruteForceIndex, NeighborIndex, RankedNeighbors},
    result::ClusteringResult,
    union_find::UnionFind,
};

/// Builds the ToMaTo forest over `vertices`.
///
/// `densities` is indexed by point; `vertices` may list any subset of the
/// points in any order and is processed by density, highest first, ties by
/// index. Neighbours outside `vertices` are ignored. A fresh [`UnionFind`] is
/// returned on every call.
///
/// # Errors
/// - [`TomatoError::UnknownVertex`] when a vertex has no density value.
/// - [`TomatoError::DataSource`] when a neighbour query fails.
///
/// # Examples
/// ```
/// use topologyx_core::{BruteForceIndex, PointCloud, define_clusters};
///
/// let cloud = PointCloud::from_rows("line", vec![vec![0.0], vec![1.0], vec![2.0]])?;
/// let mut forest = define_clusters(&[0, 1, 2], &[3.0, 1.0, 2.0], &BruteForceIndex::new(&cloud), 1, 0.0)?;
/// assert_eq!(forest.set_count(), 2);
/// assert!(forest.connected(&0, &1));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[instrument(
    name = "tomato.define_clusters",
    err,
    skip(vertices, densities, index),
    fields(data_source = %index.name(), vertices = vertices.len(), clusters = field::Empty),
)]
pub fn define_clusters<N: NeighborIndex + ?Sized>(
    vertices: &[usize],
    densities: &[f64],
    index: &N,
    n_neighbors: usize,
    tau: f64,
) -> Result<UnionFind<usize>> {
    if let Some(&vertex) = vertices.iter().find(|&&vertex| vertex >= densities.len()) {
        return Err(TomatoError::UnknownVertex { vertex });
    }

    let mut order = vertices.to_vec();
    order.sort_by(|&a, &b| by_density_descending(densities, a, b));
    order.dedup();

    let mut rank: Vec<Option<usize>> = vec![None; densities.len()];
    for (position, &vertex) in order.iter().enumerate() {
        rank[vertex] = Some(position);
    }

    let mut forest = UnionFind::with_capacity(order.len());
    for (position, &vertex) in order.iter().enumerate() {
        let candidates: Vec<usize> = index
            .query(vertex, n_neighbors)
            .map_err(|error| TomatoError::wrap_data_source(index.name(), error))?
            .into_iter()
            .filter(|&neighbour| {
                rank.get(neighbour)
                    .copied()
                    .flatten()
                    .is_some_and(|earlier| earlier < position)
            })
            .collect();

        let Some(densest) = candidates
            .iter()
            .copied()
            .reduce(|best, candidate| {
                if densities[candidate] > densities[best] {
                    candidate
                } else {
                    best
                }
            })
        else {
            forest.find(&vertex);
            continue;
        };

        let mut parent = densest;
        forest.union(&parent, &vertex);
        for &candidate in candidates.iter().filter(|&&candidate| candidate != densest) {
            let root = forest.find(&candidate);
            if root != parent
                && densities[parent].min(densities[root]) < densities[vertex] + tau
            {
                forest.union(&parent, &root);
                parent = forest.find(&root);
            }
        }
    }

    Span::current().record("clusters", forest.set_count());
    Ok(forest)
}

/// ToMaTo state for one data source: its density map, filtration and the
/// neighbour rankings shared by every width.
///
/// # Examples
/// ```
/// use topologyx_core::{PointCloud, TomatoClustering};
///
/// let cloud = PointCloud::from_rows(
///     "pairs",
///     vec![vec![0.0], vec![0.5], vec![10.0], vec![10.5]],
/// )?;
/// let tomato = TomatoClustering::from_densities(&cloud, vec![2.0, 1.0, 2.0, 1.0], 1)?;
/// let result = tomato.fit_predict(None, 0.01, 1)?;
/// assert_eq!(result.cluster_count(), 2);
/// assert_eq!(result.centroids(), [0, 2]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct TomatoClustering<'a, D: ?Sized> {
    source: &'a D,
    neighbours: RankedNeighbors,
    filtration: ModeFiltration,
}

impl<'a, D: DataSource + ?Sized> TomatoClustering<'a, D> {
    /// Estimates densities with `estimator` and builds the filtration.
    ///
    /// # Errors
    /// Returns [`TomatoError::EmptySource`] for an empty source,
    /// [`TomatoError::Density`] when estimation fails, and any error from
    /// [`ModeFiltration::build`].
    pub fn new<E: DensityEstimator + ?Sized>(
        source: &'a D,
        estimator: &E,
        n_neighbors: usize,
    ) -> Result<Self> {
        let densities = Self::estimate_density(source, estimator)?;
        Self::from_densities(source, densities, n_neighbors)
    }

    /// Uses a caller-supplied density map instead of estimating one.
    ///
    /// # Errors
    /// Returns [`TomatoError::EmptySource`] for an empty source and any error
    /// from [`ModeFiltration::build`].
    pub fn from_densities(source: &'a D, densities: Vec<f64>, n_neighbors: usize) -> Result<Self> {
        ensure_not_empty(source)?;
        let neighbours = RankedNeighbors::build(&BruteForceIndex::new(source))
            .map_err(|error| TomatoError::wrap_data_source(source.name(), error))?;
        let filtration = ModeFiltration::build(densities, &neighbours, n_neighbors)?;
        Ok(Self {
            source,
            neighbours,
            filtration,
        })
    }

    /// Estimates the density of every point of `source`.
    ///
    /// # Errors
    /// Returns [`TomatoError::EmptySource`] for an empty source and
    /// [`TomatoError::Density`] when estimation fails.
    pub fn estimate_density<E: DensityEstimator + ?Sized>(
        source: &D,
        estimator: &E,
    ) -> Result<Vec<f64>> {
        ensure_not_empty(source)?;
        let densities = estimator
            .estimate(source)
            .map_err(|error| TomatoError::Density {
                data_source: Arc::from(source.name()),
                error,
            })?;
        validate_densities(source.len(), &densities)?;
        Ok(densities)
    }

    /// Rebuilds the cached filtration with a different neighbourhood width.
    ///
    /// # Errors
    /// Returns any error from [`ModeFiltration::build`].
    pub fn estimate_clusters(&mut self, n_neighbors: usize) -> Result<&ModeFiltration> {
        let densities = self.filtration.densities().to_vec();
        self.filtration = ModeFiltration::build(densities, &self.neighbours, n_neighbors)?;
        Ok(&self.filtration)
    }

    /// Source being clustered.
    #[must_use]
    pub fn source(&self) -> &'a D {
        self.source
    }

    /// Cached density map.
    #[must_use]
    pub fn densities(&self) -> &[f64] {
        self.filtration.densities()
    }

    /// Cached filtration.
    #[must_use]
    pub fn filtration(&self) -> &ModeFiltration {
        &self.filtration
    }

    /// Cached neighbour rankings.
    #[must_use]
    pub fn neighbours(&self) -> &RankedNeighbors {
        &self.neighbours
    }

    /// Runs [`define_clusters`] over every point at width `n_neighbors`.
    ///
    /// # Errors
    /// Returns any error from [`define_clusters`].
    pub fn define_clusters(&self, n_neighbors: usize, tau: f64) -> Result<UnionFind<usize>> {
        define_clusters(
            self.filtration.vertex_order(),
            self.filtration.densities(),
            &self.neighbours,
            n_neighbors,
            tau,
        )
    }

    /// Clusters the source, widening the neighbourhood until at most
    /// `n_clusters` clusters remain.
    ///
    /// Widths exceeding `len - 1` are clamped. Each widening step adds two
    /// neighbours and stops at `len - 1`; the step with the fewest clusters
    /// wins.
    ///
    /// # Errors
    /// - [`TomatoError::InvalidTau`], [`TomatoError::InvalidNeighborCount`]
    ///   and [`TomatoError::InvalidClusterTarget`] for invalid parameters.
    /// - Any error from [`define_clusters`].
    #[instrument(
        name = "tomato.fit_predict",
        err,
        skip(self),
        fields(
            data_source = %self.source.name(),
            points = self.source.len(),
            width = field::Empty,
            clusters = field::Empty,
        ),
    )]
    pub fn fit_predict(
        &self,
        n_clusters: Option<usize>,
        tau: f64,
        n_neighbors: usize,
    ) -> Result<ClusteringResult> {
        crate::builder::validate_parameters(tau, n_neighbors, n_clusters)?;

        let points = self.source.len();
        let limit = points.saturating_sub(1);
        let mut width = n_neighbors.min(limit);
        let initial = self.define_clusters(width, tau)?;
        let mut latest = initial.set_count();
        let mut best = (initial, width);
        let mut escalations = 0_usize;

        if let Some(target) = n_clusters {
            while latest > target && width < limit {
                width = (width + 2).min(limit);
                escalations += 1;
                let forest = self.define_clusters(width, tau)?;
                latest = forest.set_count();
                debug!(width, clusters = latest, target, "widened neighbourhood");
                if latest < best.0.set_count() {
                    best = (forest, width);
                }
            }
            if latest > target {
                warn!(
                    target,
                    clusters = best.0.set_count(),
                    width,
                    "cluster target not reached at the dataset limit",
                );
            }
        }

        let (mut forest, chosen) = best;
        let result = ClusteringResult::from_forest(&mut forest, points, chosen, escalations)?;

        let span = Span::current();
        span.record("width", chosen);
        span.record("clusters", result.cluster_count());
        record_metrics(escalations, result.cluster_count());
        info!(
            clusters = result.cluster_count(),
            width = chosen,
            escalations,
            "tomato clustering complete",
        );
        Ok(result)
    }
}

fn ensure_not_empty<D: DataSource + ?Sized>(source: &D) -> Result<()> {
    if source.is_empty() {
        warn!(data_source = source.name(), "data source is empty, returning error");
        return Err(TomatoError::EmptySource {
            data_source: Arc::from(source.name()),
        });
    }
    Ok(())
}

#[cfg(feature = "metrics")]
#[expect(
    clippy::cast_precision_loss,
    reason = "cluster counts are reported as gauge values"
)]
fn record_metrics(escalations: usize, clusters: usize) {
    metrics::counter!("tomato_escalation_steps").increment(u64::try_from(escalations).unwrap_or(u64::MAX));
    metrics::gauge!("tomato_clusters").set(clusters as f64);
}

#[cfg(not(feature = "metrics"))]
fn record_metrics(_escalations: usize, _clusters: usize) {}
