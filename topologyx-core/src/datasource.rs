//! Point collections consumed by the density estimator and neighbour index.

use crate::{distance::euclidean_distance, error::DataSourceError};

/// Abstraction over a fixed, ordered collection of d-dimensional points.
///
/// Points are identified by their 0-based index, which stays stable for the
/// lifetime of a run.
///
/// # Examples
/// ```
/// use topologyx_core::{DataSource, PointCloud};
///
/// let cloud = PointCloud::from_rows("demo", vec![vec![0.0, 0.0], vec![3.0, 4.0]])?;
/// assert_eq!(cloud.len(), 2);
/// assert_eq!(cloud.dimensions(), 2);
/// assert_eq!(cloud.distance(0, 1)?, 5.0);
/// assert_eq!(cloud.batch_distances(0, &[1])?, [5.0]);
/// # Ok::<(), topologyx_core::DataSourceError>(())
/// ```
pub trait DataSource {
    /// Returns number of points in the source.
    fn len(&self) -> usize;

    /// Returns whether the source contains no points.
    #[must_use]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a human-readable name.
    fn name(&self) -> &str;

    /// Returns the dimensionality shared by every point.
    fn dimensions(&self) -> usize;

    /// Returns the coordinates of the point at `index`.
    ///
    /// # Errors
    /// Returns [`DataSourceError::OutOfBounds`] for an invalid index.
    fn point(&self, index: usize) -> Result<&[f64], DataSourceError>;

    /// Computes the Euclidean distance between two points.
    ///
    /// # Errors
    /// Returns [`DataSourceError::OutOfBounds`] for invalid indices.
    fn distance(&self, i: usize, j: usize) -> Result<f64, DataSourceError> {
        let left = self.point(i)?;
        let right = self.point(j)?;
        euclidean_distance(left, right).map_err(|_| DataSourceError::DimensionMismatch {
            expected: left.len(),
            found: right.len(),
            row: j,
        })
    }

    /// Computes the distances from `query` to every entry in `candidates`.
    ///
    /// # Errors
    /// Returns any [`DataSourceError`] surfaced by [`DataSource::distance`].
    fn batch_distances(
        &self,
        query: usize,
        candidates: &[usize],
    ) -> Result<Vec<f64>, DataSourceError> {
        candidates
            .iter()
            .map(|&candidate| self.distance(query, candidate))
            .collect()
    }
}

/// Dense, row-major in-memory point collection.
#[derive(Clone, Debug, PartialEq)]
pub struct PointCloud {
    name: String,
    dimensions: usize,
    data: Vec<f64>,
}

impl PointCloud {
    /// Builds a cloud from one vector per point after validating the rows.
    ///
    /// # Errors
    /// - [`DataSourceError::EmptyData`] when `rows` is empty.
    /// - [`DataSourceError::ZeroDimension`] when the rows have no coordinates.
    /// - [`DataSourceError::DimensionMismatch`] when row lengths differ.
    /// - [`DataSourceError::NonFinite`] when a coordinate is NaN or infinite.
    ///
    /// # Examples
    /// ```
    /// use topologyx_core::{DataSourceError, PointCloud};
    ///
    /// let ragged = PointCloud::from_rows("demo", vec![vec![0.0], vec![1.0, 2.0]]);
    /// assert!(matches!(ragged, Err(DataSourceError::DimensionMismatch { row: 1, .. })));
    /// ```
    pub fn from_rows(name: impl Into<String>, rows: Vec<Vec<f64>>) -> Result<Self, DataSourceError> {
        let dimensions = rows.first().map(Vec::len).ok_or(DataSourceError::EmptyData)?;
        if dimensions == 0 {
            return Err(DataSourceError::ZeroDimension);
        }

        let mut data = Vec::with_capacity(rows.len().saturating_mul(dimensions));
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != dimensions {
                return Err(DataSourceError::DimensionMismatch {
                    expected: dimensions,
                    found: values.len(),
                    row,
                });
            }
            if let Some((axis, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
                return Err(DataSourceError::NonFinite { row, axis, value });
            }
            data.extend(values);
        }

        Ok(Self {
            name: name.into(),
            dimensions,
            data,
        })
    }

    /// Iterates over the points in index order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[f64]> + '_ {
        self.data.chunks_exact(self.dimensions)
    }
}

impl DataSource for PointCloud {
    fn len(&self) -> usize {
        self.data.len() / self.dimensions
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn point(&self, index: usize) -> Result<&[f64], DataSourceError> {
        let start = index
            .checked_mul(self.dimensions)
            .ok_or(DataSourceError::OutOfBounds { index })?;
        self.data
            .get(start..start.saturating_add(self.dimensions))
            .ok_or(DataSourceError::OutOfBounds { index })
    }
}
