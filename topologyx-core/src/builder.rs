//! Builder utilities for configuring ToMaTo runs.
//!
//! [`TomatoBuilder`] validates the clustering parameters once and produces a
//! [`Tomato`] runner that can be applied to any number of data sources.

use tracing::instrument;

use crate::{
    Result,
    datasource::DataSource,
    density::{Bandwidth, GaussianKde},
    error::TomatoError,
    result::ClusteringResult,
    tomato::TomatoClustering,
};

/// Default stability threshold.
pub const DEFAULT_TAU: f64 = 0.01;
/// Default neighbourhood width.
pub const DEFAULT_N_NEIGHBORS: usize = 6;

/// Configures and constructs [`Tomato`] runners.
///
/// # Examples
/// ```
/// use topologyx_core::{Bandwidth, TomatoBuilder};
///
/// let tomato = TomatoBuilder::new()
///     .with_tau(0.2)
///     .with_n_neighbors(8)
///     .with_n_clusters(3)
///     .with_bandwidth(Bandwidth::Silverman)
///     .build()
///     .expect("builder configuration is valid");
/// assert_eq!(tomato.n_neighbors(), 8);
/// assert_eq!(tomato.n_clusters(), Some(3));
/// ```
#[derive(Debug, Clone)]
pub struct TomatoBuilder {
    tau: f64,
    n_neighbors: usize,
    n_clusters: Option<usize>,
    bandwidth: Bandwidth,
}

impl Default for TomatoBuilder {
    fn default() -> Self {
        Self {
            tau: DEFAULT_TAU,
            n_neighbors: DEFAULT_N_NEIGHBORS,
            n_clusters: None,
            bandwidth: Bandwidth::Scott,
        }
    }
}

impl TomatoBuilder {
    /// Creates a builder populated with default parameters.
    ///
    /// # Examples
    /// ```
    /// use topologyx_core::{Bandwidth, TomatoBuilder};
    ///
    /// let builder = TomatoBuilder::new();
    /// assert_eq!(builder.tau(), 0.01);
    /// assert_eq!(builder.n_neighbors(), 6);
    /// assert_eq!(builder.n_clusters(), None);
    /// assert_eq!(builder.bandwidth(), Bandwidth::Scott);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the stability threshold below which neighbouring clusters
    /// merge.
    #[must_use]
    pub fn with_tau(mut self, tau: f64) -> Self {
        self.tau = tau;
        self
    }

    /// Returns the configured stability threshold.
    #[must_use]
    pub fn tau(&self) -> f64 {
        self.tau
    }

    /// Overrides the initial neighbourhood width.
    #[must_use]
    pub fn with_n_neighbors(mut self, n_neighbors: usize) -> Self {
        self.n_neighbors = n_neighbors;
        self
    }

    /// Returns the configured neighbourhood width.
    #[must_use]
    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    /// Sets an upper bound on the number of clusters.
    ///
    /// The neighbourhood is widened until the bound holds.
    #[must_use]
    pub fn with_n_clusters(mut self, n_clusters: usize) -> Self {
        self.n_clusters = Some(n_clusters);
        self
    }

    /// Returns the configured cluster bound.
    #[must_use]
    pub fn n_clusters(&self) -> Option<usize> {
        self.n_clusters
    }

    /// Selects the density bandwidth rule.
    #[must_use]
    pub fn with_bandwidth(mut self, bandwidth: Bandwidth) -> Self {
        self.bandwidth = bandwidth;
        self
    }

    /// Returns the configured bandwidth rule.
    #[must_use]
    pub fn bandwidth(&self) -> Bandwidth {
        self.bandwidth
    }

    /// Validates the configuration and constructs a [`Tomato`] runner.
    ///
    /// # Errors
    /// - [`TomatoError::InvalidTau`] when `tau` is negative or NaN.
    /// - [`TomatoError::InvalidNeighborCount`] when `n_neighbors` is zero.
    /// - [`TomatoError::InvalidClusterTarget`] when `n_clusters` is zero.
    /// - [`TomatoError::Density`] when a fixed bandwidth factor is invalid.
    ///
    /// # Examples
    /// ```
    /// use topologyx_core::{TomatoBuilder, TomatoErrorCode};
    ///
    /// let err = TomatoBuilder::new().with_tau(-1.0).build().unwrap_err();
    /// assert_eq!(err.code(), TomatoErrorCode::InvalidTau);
    /// ```
    pub fn build(self) -> Result<Tomato> {
        validate_parameters(self.tau, self.n_neighbors, self.n_clusters)?;
        if let Bandwidth::Factor(_) = self.bandwidth {
            self.bandwidth
                .factor(1, 1)
                .map_err(|error| TomatoError::Density {
                    data_source: "configuration".into(),
                    error,
                })?;
        }

        Ok(Tomato {
            tau: self.tau,
            n_neighbors: self.n_neighbors,
            n_clusters: self.n_clusters,
            estimator: GaussianKde::new(self.bandwidth),
        })
    }
}

/// Checks the ToMaTo parameters shared by the builder and
/// [`TomatoClustering::fit_predict`].
pub(crate) fn validate_parameters(
    tau: f64,
    n_neighbors: usize,
    n_clusters: Option<usize>,
) -> Result<()> {
    if tau.is_nan() || tau < 0.0 {
        return Err(TomatoError::InvalidTau { got: tau });
    }
    if n_neighbors == 0 {
        return Err(TomatoError::InvalidNeighborCount { got: n_neighbors });
    }
    if n_clusters == Some(0) {
        return Err(TomatoError::InvalidClusterTarget { got: 0 });
    }
    Ok(())
}

/// Validated ToMaTo runner.
///
/// # Examples
/// ```
/// use topologyx_core::{PointCloud, TomatoBuilder};
///
/// let cloud = PointCloud::from_rows(
///     "squares",
///     vec![
///         vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0],
///         vec![5.0, 5.0], vec![6.0, 5.0], vec![5.0, 6.0], vec![6.0, 6.0],
///     ],
/// )?;
/// let result = TomatoBuilder::new().with_n_neighbors(3).build()?.run(&cloud)?;
/// assert_eq!(result.cluster_count(), 2);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Tomato {
    tau: f64,
    n_neighbors: usize,
    n_clusters: Option<usize>,
    estimator: GaussianKde,
}

impl Tomato {
    /// Returns the stability threshold.
    #[must_use]
    pub fn tau(&self) -> f64 {
        self.tau
    }

    /// Returns the initial neighbourhood width.
    #[must_use]
    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    /// Returns the cluster bound, if any.
    #[must_use]
    pub fn n_clusters(&self) -> Option<usize> {
        self.n_clusters
    }

    /// Returns the density estimator.
    #[must_use]
    pub fn estimator(&self) -> &GaussianKde {
        &self.estimator
    }

    /// Estimates densities and builds the filtration for `source`.
    ///
    /// # Errors
    /// Returns [`TomatoError::EmptySource`] for an empty source and any
    /// density or filtration error.
    #[instrument(
        name = "tomato.fit",
        err,
        skip(self, source),
        fields(data_source = %source.name(), points = source.len(), n_neighbors = self.n_neighbors),
    )]
    pub fn fit<'a, D: DataSource + ?Sized>(&self, source: &'a D) -> Result<TomatoClustering<'a, D>> {
        TomatoClustering::new(source, &self.estimator, self.n_neighbors)
    }

    /// Clusters `source` end to end.
    ///
    /// # Errors
    /// Returns any error from [`Self::fit`] or
    /// [`TomatoClustering::fit_predict`].
    #[instrument(
        name = "tomato.run",
        err,
        skip(self, source),
        fields(
            data_source = %source.name(),
            points = source.len(),
            tau = self.tau,
            n_neighbors = self.n_neighbors,
            n_clusters = ?self.n_clusters,
        ),
    )]
    pub fn run<D: DataSource + ?Sized>(&self, source: &D) -> Result<ClusteringResult> {
        self.fit(source)?
            .fit_predict(self.n_clusters, self.tau, self.n_neighbors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TomatoErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case(TomatoBuilder::new().with_tau(-0.5), TomatoErrorCode::InvalidTau)]
    #[case(TomatoBuilder::new().with_tau(f64::NAN), TomatoErrorCode::InvalidTau)]
    #[case(TomatoBuilder::new().with_n_neighbors(0), TomatoErrorCode::InvalidNeighborCount)]
    #[case(TomatoBuilder::new().with_n_clusters(0), TomatoErrorCode::InvalidClusterTarget)]
    #[case(
        TomatoBuilder::new().with_bandwidth(Bandwidth::Factor(0.0)),
        TomatoErrorCode::DensityFailure,
    )]
    fn rejects_invalid_configuration(
        #[case] builder: TomatoBuilder,
        #[case] expected: TomatoErrorCode,
    ) {
        let err = builder.build().expect_err("configuration must be rejected");
        assert_eq!(err.code(), expected);
    }

    #[rstest]
    #[case(0.0)]
    #[case(f64::INFINITY)]
    fn accepts_boundary_tau(#[case] tau: f64) {
        let tomato = TomatoBuilder::new()
            .with_tau(tau)
            .build()
            .expect("tau is valid");
        assert_eq!(tomato.tau(), tau);
    }

    #[test]
    fn runner_carries_configuration() {
        let tomato = TomatoBuilder::new()
            .with_bandwidth(Bandwidth::Factor(0.3))
            .build()
            .expect("configuration is valid");

        assert_eq!(tomato.estimator().bandwidth(), Bandwidth::Factor(0.3));
        assert_eq!(tomato.n_neighbors(), DEFAULT_N_NEIGHBORS);
        assert_eq!(tomato.n_clusters(), None);
    }
}
