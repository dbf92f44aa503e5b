//! Ordered k-nearest-neighbour queries over a [`DataSource`].
//!
//! Requests wider than the dataset are clamped: a query for `k` neighbours
//! returns at most `len - 1` points and never fails because `k` is too large.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::{datasource::DataSource, error::DataSourceError};

/// Source of ordered neighbour lists.
///
/// Implementations must exclude the query point itself, return nearest
/// neighbours first, and give identical answers for identical inputs.
pub trait NeighborIndex {
    /// Number of points covered by the index.
    fn len(&self) -> usize;

    /// Human-readable name of the indexed collection.
    fn name(&self) -> &str;

    /// Whether the index covers no points.
    #[must_use]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns up to `k` other points nearest to `point`, nearest first.
    ///
    /// # Errors
    /// Returns [`DataSourceError::OutOfBounds`] when `point` is not indexed.
    fn query(&self, point: usize, k: usize) -> Result<Vec<usize>, DataSourceError>;
}

/// Exact neighbour search by scanning every point.
///
/// Distances are ranked with [`f64::total_cmp`]; equal distances fall back to
/// the lower point index so results are reproducible.
///
/// # Examples
/// ```
/// use topologyx_core::{BruteForceIndex, NeighborIndex, PointCloud};
///
/// let cloud = PointCloud::from_rows("line", vec![vec![0.0], vec![1.0], vec![3.0]])?;
/// let index = BruteForceIndex::new(&cloud);
/// assert_eq!(index.query(0, 5)?, [1, 2]);
/// # Ok::<(), topologyx_core::DataSourceError>(())
/// ```
#[derive(Debug)]
pub struct BruteForceIndex<'a, D: ?Sized> {
    source: &'a D,
}

impl<'a, D: DataSource + ?Sized> BruteForceIndex<'a, D> {
    /// Indexes `source`.
    #[must_use]
    pub const fn new(source: &'a D) -> Self {
        Self { source }
    }
}

impl<D: DataSource + ?Sized> NeighborIndex for BruteForceIndex<'_, D> {
    fn len(&self) -> usize {
        self.source.len()
    }

    fn name(&self) -> &str {
        self.source.name()
    }

    fn query(&self, point: usize, k: usize) -> Result<Vec<usize>, DataSourceError> {
        let count = self.source.len();
        if point >= count {
            return Err(DataSourceError::OutOfBounds { index: point });
        }
        let k = k.min(count - 1);
        if k == 0 {
            return Ok(Vec::new());
        }

        let others: Vec<usize> = (0..count).filter(|&other| other != point).collect();
        let distances = self.source.batch_distances(point, &others)?;
        let mut ranked: Vec<(f64, usize)> = distances.into_iter().zip(others).collect();
        let by_distance = |a: &(f64, usize), b: &(f64, usize)| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1));
        if k < ranked.len() {
            ranked.select_nth_unstable_by(k - 1, by_distance);
            ranked.truncate(k);
        }
        ranked.sort_unstable_by(by_distance);

        Ok(ranked.into_iter().map(|(_, index)| index).collect())
    }
}

/// Every point's full neighbour ranking, computed once.
///
/// Queries slice the stored ranking, so repeated queries at growing widths
/// cost no further distance evaluations. Memory grows with the square of the
/// point count.
///
/// # Examples
/// ```
/// use topologyx_core::{BruteForceIndex, NeighborIndex, PointCloud, RankedNeighbors};
///
/// let cloud = PointCloud::from_rows("line", vec![vec![0.0], vec![1.0], vec![3.0]])?;
/// let ranked = RankedNeighbors::build(&BruteForceIndex::new(&cloud))?;
/// assert_eq!(ranked.query(2, 1)?, [1]);
/// assert_eq!(ranked.neighbours(2), Some(&[1, 0][..]));
/// # Ok::<(), topologyx_core::DataSourceError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RankedNeighbors {
    name: Arc<str>,
    ranked: Vec<Vec<usize>>,
}

impl RankedNeighbors {
    /// Ranks every other point for each point of `index`.
    ///
    /// # Errors
    /// Returns any error raised by `index` while answering a query.
    #[instrument(
        name = "neighbors.rank",
        err,
        skip(index),
        fields(data_source = %index.name(), points = index.len()),
    )]
    pub fn build<N: NeighborIndex + ?Sized>(index: &N) -> Result<Self, DataSourceError> {
        let width = index.len().saturating_sub(1);
        let ranked = (0..index.len())
            .map(|point| index.query(point, width))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(width, "neighbour rankings cached");
        Ok(Self {
            name: Arc::from(index.name()),
            ranked,
        })
    }

    /// Full ranking for `point`, nearest first.
    #[must_use]
    pub fn neighbours(&self, point: usize) -> Option<&[usize]> {
        self.ranked.get(point).map(Vec::as_slice)
    }
}

impl NeighborIndex for RankedNeighbors {
    fn len(&self) -> usize {
        self.ranked.len()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn query(&self, point: usize, k: usize) -> Result<Vec<usize>, DataSourceError> {
        let ranking = self
            .neighbours(point)
            .ok_or(DataSourceError::OutOfBounds { index: point })?;
        Ok(ranking[..k.min(ranking.len())].to_vec())
    }
}

impl<N: NeighborIndex + ?Sized> NeighborIndex for &N {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn query(&self, point: usize, k: usize) -> Result<Vec<usize>, DataSourceError> {
        (**self).query(point, k)
    }
}
