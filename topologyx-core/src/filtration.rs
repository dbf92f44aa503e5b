//! Density-keyed vertex and edge filtration over the k-nearest-neighbour
//! graph.
//!
//! Every point enters as a vertex at `-density`, so the densest points appear
//! first. Each point is joined to its `k` nearest neighbours by an edge whose
//! value is the mean of the two endpoint values. An edge seen from both ends is
//! stored once under its ordered endpoint pair.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::{debug, instrument};

use crate::{
    Result,
    error::TomatoError,
    neighbors::NeighborIndex,
    persistence::PersistenceDiagram,
};

/// Undirected edge of a [`ModeFiltration`]; `source < target`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FiltrationEdge {
    /// Lower endpoint index.
    pub source: usize,
    /// Higher endpoint index.
    pub target: usize,
    /// Filtration value, the mean of the endpoint vertex values.
    pub value: f64,
}

/// Vertex and edge filtration built from a density map.
///
/// # Examples
/// ```
/// use topologyx_core::{BruteForceIndex, ModeFiltration, PointCloud};
///
/// let cloud = PointCloud::from_rows("line", vec![vec![0.0], vec![1.0], vec![3.0]])?;
/// let filtration = ModeFiltration::build(vec![1.0, 3.0, 2.0], &BruteForceIndex::new(&cloud), 1)?;
/// assert_eq!(filtration.vertex_order(), [1, 2, 0]);
/// assert_eq!(filtration.vertex_value(1), Some(-3.0));
/// assert_eq!(filtration.edges().len(), 2);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ModeFiltration {
    densities: Vec<f64>,
    vertex_order: Vec<usize>,
    edges: Vec<FiltrationEdge>,
    n_neighbors: usize,
}

impl ModeFiltration {
    /// Builds the filtration from one density per indexed point.
    ///
    /// Neighbourhoods wider than the index are clamped by the index itself.
    ///
    /// # Errors
    /// - [`TomatoError::DensityLengthMismatch`] when `densities` does not cover
    ///   every indexed point.
    /// - [`TomatoError::NonFiniteDensity`] when a density is NaN or infinite.
    /// - [`TomatoError::DataSource`] when a neighbour query fails.
    #[instrument(
        name = "filtration.build",
        err,
        skip(densities, index),
        fields(data_source = %index.name(), points = densities.len()),
    )]
    pub fn build<N: NeighborIndex + ?Sized>(
        densities: Vec<f64>,
        index: &N,
        n_neighbors: usize,
    ) -> Result<Self> {
        validate_densities(index.len(), &densities)?;

        let mut vertex_order: Vec<usize> = (0..densities.len()).collect();
        vertex_order.sort_by(|&a, &b| by_density_descending(&densities, a, b));

        let mut unique: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        for point in 0..densities.len() {
            let neighbours = index
                .query(point, n_neighbors)
                .map_err(|error| TomatoError::wrap_data_source(index.name(), error))?;
            for neighbour in neighbours {
                let Some(&other) = densities.get(neighbour) else {
                    return Err(TomatoError::UnknownVertex { vertex: neighbour });
                };
                let key = (point.min(neighbour), point.max(neighbour));
                let value = 0.5 * (-densities[point] - other);
                unique
                    .entry(key)
                    .and_modify(|existing| *existing = existing.min(value))
                    .or_insert(value);
            }
        }

        let mut edges: Vec<FiltrationEdge> = unique
            .into_iter()
            .map(|((source, target), value)| FiltrationEdge {
                source,
                target,
                value,
            })
            .collect();
        edges.sort_by(|a, b| {
            a.value
                .total_cmp(&b.value)
                .then(a.source.cmp(&b.source))
                .then(a.target.cmp(&b.target))
        });
        debug!(edges = edges.len(), "filtration built");

        Ok(Self {
            densities,
            vertex_order,
            edges,
            n_neighbors,
        })
    }

    /// Point indices sorted by filtration value, ties by index.
    #[must_use]
    pub fn vertex_order(&self) -> &[usize] {
        &self.vertex_order
    }

    /// Density map the filtration was built from.
    #[must_use]
    pub fn densities(&self) -> &[f64] {
        &self.densities
    }

    /// Filtration value of `point`, or `None` for an unknown point.
    #[must_use]
    pub fn vertex_value(&self, point: usize) -> Option<f64> {
        self.densities.get(point).map(|density| -density)
    }

    /// Edges sorted by value, then by endpoints.
    #[must_use]
    pub fn edges(&self) -> &[FiltrationEdge] {
        &self.edges
    }

    /// Neighbourhood width requested when building.
    #[must_use]
    pub const fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    /// Number of points in the filtration.
    #[must_use]
    pub fn len(&self) -> usize {
        self.densities.len()
    }

    /// Whether the filtration holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.densities.is_empty()
    }

    /// Dimension-0 persistence of this filtration.
    #[must_use]
    pub fn persistence(&self) -> PersistenceDiagram {
        PersistenceDiagram::from_filtration(self)
    }
}

/// Orders points by density, highest first, then by index.
///
/// Densities are validated finite before this is used.
pub(crate) fn by_density_descending(densities: &[f64], a: usize, b: usize) -> Ordering {
    densities[b]
        .partial_cmp(&densities[a])
        .unwrap_or(Ordering::Equal)
        .then(a.cmp(&b))
}

/// Checks that `densities` holds one finite value for each of `expected`
/// points.
pub(crate) fn validate_densities(expected: usize, densities: &[f64]) -> Result<()> {
    if densities.len() != expected {
        return Err(TomatoError::DensityLengthMismatch {
            expected,
            got: densities.len(),
        });
    }
    match densities.iter().position(|density| !density.is_finite()) {
        Some(index) => Err(TomatoError::NonFiniteDensity {
            index,
            value: densities[index],
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FixedNeighbors;
    use rstest::{fixture, rstest};

    /// Path graph `0 - 1 - 2`.
    #[fixture]
    fn path() -> FixedNeighbors {
        FixedNeighbors::new(vec![vec![1], vec![0, 2], vec![1]])
    }

    #[rstest]
    fn orders_vertices_by_density(path: FixedNeighbors) {
        let filtration =
            ModeFiltration::build(vec![3.0, 1.0, 2.0], &path, 2).expect("filtration builds");

        assert_eq!(filtration.vertex_order(), [0, 2, 1]);
        assert_eq!(filtration.vertex_value(2), Some(-2.0));
        assert_eq!(filtration.vertex_value(7), None);
        assert_eq!(filtration.n_neighbors(), 2);
    }

    #[rstest]
    fn equal_densities_keep_index_order(path: FixedNeighbors) {
        let filtration =
            ModeFiltration::build(vec![1.0, 1.0, 1.0], &path, 2).expect("filtration builds");

        assert_eq!(filtration.vertex_order(), [0, 1, 2]);
    }

    #[rstest]
    fn stores_each_undirected_edge_once(path: FixedNeighbors) {
        let filtration =
            ModeFiltration::build(vec![3.0, 1.0, 2.0], &path, 2).expect("filtration builds");

        assert_eq!(
            filtration.edges(),
            [
                FiltrationEdge { source: 0, target: 1, value: -2.0 },
                FiltrationEdge { source: 1, target: 2, value: -1.5 },
            ]
        );
    }

    #[rstest]
    #[case(vec![1.0, 2.0], TomatoError::DensityLengthMismatch { expected: 3, got: 2 })]
    #[case(
        vec![1.0, f64::INFINITY, 2.0],
        TomatoError::NonFiniteDensity { index: 1, value: f64::INFINITY },
    )]
    fn rejects_invalid_density_maps(
        path: FixedNeighbors,
        #[case] densities: Vec<f64>,
        #[case] expected: TomatoError,
    ) {
        let err = ModeFiltration::build(densities, &path, 2).expect_err("map must be rejected");
        assert_eq!(err, expected);
    }
}
