//! Kernel density estimation.
//!
//! The clustering engine only needs one density scalar per point, so the
//! estimator sits behind [`DensityEstimator`]. [`GaussianKde`] is the bundled
//! implementation: a multivariate Gaussian kernel whose bandwidth matrix is
//! the sample covariance scaled by a rule-of-thumb factor, evaluated at every
//! input point.

use std::f64::consts::PI;

use nalgebra::{Cholesky, DMatrix};
use tracing::{debug, instrument};

use crate::{
    datasource::DataSource,
    error::DensityError,
    neighbors::{BruteForceIndex, NeighborIndex},
};

/// Maps every point of a [`DataSource`] to a density value.
///
/// The output has the same length and order as the source. Higher values mark
/// points closer to a local mode.
pub trait DensityEstimator {
    /// Estimates the density at each point of `source`.
    ///
    /// # Errors
    /// Returns [`DensityError`] when the source cannot support an estimate.
    fn estimate<D: DataSource + ?Sized>(&self, source: &D) -> Result<Vec<f64>, DensityError>;
}

/// Rule selecting the factor applied to the sample covariance.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Bandwidth {
    /// Scott's rule, `n^(-1 / (d + 4))`.
    #[default]
    Scott,
    /// Silverman's rule, `(n (d + 2) / 4)^(-1 / (d + 4))`.
    Silverman,
    /// A fixed factor.
    Factor(f64),
}

impl Bandwidth {
    /// Resolves the covariance scaling factor for `points` samples in
    /// `dimensions` dimensions.
    ///
    /// # Errors
    /// Returns [`DensityError::InvalidBandwidth`] for a fixed factor that is
    /// not finite and positive.
    #[expect(
        clippy::cast_precision_loss,
        reason = "sample counts are converted to f64 for the bandwidth exponent"
    )]
    pub fn factor(self, points: usize, dimensions: usize) -> Result<f64, DensityError> {
        let n = points as f64;
        let exponent = -1.0 / (dimensions as f64 + 4.0);
        match self {
            Self::Scott => Ok(n.powf(exponent)),
            Self::Silverman => Ok((n * (dimensions as f64 + 2.0) / 4.0).powf(exponent)),
            Self::Factor(factor) if factor.is_finite() && factor > 0.0 => Ok(factor),
            Self::Factor(factor) => Err(DensityError::InvalidBandwidth { factor }),
        }
    }
}

/// Gaussian kernel density estimate with a full covariance bandwidth.
///
/// # Examples
/// ```
/// use topologyx_core::{DensityEstimator, GaussianKde, PointCloud};
///
/// let cloud = PointCloud::from_rows(
///     "square",
///     vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0], vec![0.5, 0.4]],
/// )?;
/// let densities = GaussianKde::default().estimate(&cloud)?;
/// assert_eq!(densities.len(), 5);
/// assert!(densities.iter().all(|density| *density > 0.0));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GaussianKde {
    bandwidth: Bandwidth,
}

impl GaussianKde {
    /// Creates an estimator using `bandwidth`.
    #[must_use]
    pub const fn new(bandwidth: Bandwidth) -> Self {
        Self { bandwidth }
    }

    /// Returns the configured bandwidth rule.
    #[must_use]
    pub const fn bandwidth(&self) -> Bandwidth {
        self.bandwidth
    }
}

impl DensityEstimator for GaussianKde {
    #[instrument(
        name = "density.estimate",
        err,
        skip(self, source),
        fields(
            data_source = %source.name(),
            points = source.len(),
            dimensions = source.dimensions(),
            bandwidth = ?self.bandwidth,
        ),
    )]
    fn estimate<D: DataSource + ?Sized>(&self, source: &D) -> Result<Vec<f64>, DensityError> {
        let points = source.len();
        let dimensions = source.dimensions();
        if points <= dimensions {
            return Err(DensityError::TooFewPoints { points, dimensions });
        }

        let rows = (0..points)
            .map(|index| source.point(index))
            .collect::<Result<Vec<_>, _>>()?;
        let data = DMatrix::from_fn(points, dimensions, |row, column| rows[row][column]);
        let factor = self.bandwidth.factor(points, dimensions)?;

        let lower = kernel_factor(bandwidth_matrix(&data, factor))?;
        let log_norm = log_normaliser(&lower, points);
        debug!(factor, log_norm, "bandwidth resolved");

        // Columns of `whitened` are the points in the kernel's metric.
        let whitened = lower
            .solve_lower_triangular(&data.transpose())
            .ok_or(DensityError::SingularCovariance)?;
        let scale = log_norm.exp();
        Ok(whitened
            .column_iter()
            .map(|target| {
                let mass: f64 = whitened
                    .column_iter()
                    .map(|sample| (-0.5 * (&target - &sample).norm_squared()).exp())
                    .sum();
                mass * scale
            })
            .collect())
    }
}

/// Distance to the empirical measure.
///
/// Each point scores the root mean squared distance to its `mass` nearest
/// points, itself included; `mass` is clamped to the point count. As a
/// [`DensityEstimator`] the distance is negated, so crowded points rank
/// highest.
///
/// # Examples
/// ```
/// use topologyx_core::{DistanceToMeasure, PointCloud};
///
/// let cloud = PointCloud::from_rows("line", vec![vec![0.0], vec![1.0], vec![3.0]])?;
/// let distances = DistanceToMeasure::new(2).distances(&cloud)?;
/// assert!((distances[2] - 2.0_f64.sqrt()).abs() < 1e-12);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DistanceToMeasure {
    mass: usize,
}

impl DistanceToMeasure {
    /// Averages over the `mass` nearest points.
    #[must_use]
    pub const fn new(mass: usize) -> Self {
        Self { mass }
    }

    /// Number of points averaged over.
    #[must_use]
    pub const fn mass(&self) -> usize {
        self.mass
    }

    /// Distance to measure of every point of `source`.
    ///
    /// # Errors
    /// Returns [`DensityError::NoNeighbours`] when `mass` is zero and
    /// [`DensityError::DataSource`] when reading the points fails.
    #[instrument(
        name = "density.distance_to_measure",
        err,
        skip(self, source),
        fields(data_source = %source.name(), points = source.len(), mass = self.mass),
    )]
    #[expect(
        clippy::cast_precision_loss,
        reason = "neighbour counts are converted to f64 for averaging"
    )]
    pub fn distances<D: DataSource + ?Sized>(&self, source: &D) -> Result<Vec<f64>, DensityError> {
        if self.mass == 0 {
            return Err(DensityError::NoNeighbours);
        }
        let index = BruteForceIndex::new(source);
        (0..source.len())
            .map(|point| {
                let nearest = index.query(point, self.mass - 1)?;
                let squared: f64 = source
                    .batch_distances(point, &nearest)?
                    .iter()
                    .map(|distance| distance * distance)
                    .sum();
                Ok((squared / (nearest.len() + 1) as f64).sqrt())
            })
            .collect()
    }
}

impl DensityEstimator for DistanceToMeasure {
    fn estimate<D: DataSource + ?Sized>(&self, source: &D) -> Result<Vec<f64>, DensityError> {
        Ok(self
            .distances(source)?
            .into_iter()
            .map(|distance| -distance)
            .collect())
    }
}

/// Unbiased sample covariance of the rows of `data`, scaled by `factor²`.
#[expect(
    clippy::cast_precision_loss,
    reason = "sample counts are converted to f64 for averaging"
)]
fn bandwidth_matrix(data: &DMatrix<f64>, factor: f64) -> DMatrix<f64> {
    let mean = data.row_mean();
    let centred = DMatrix::from_fn(data.nrows(), data.ncols(), |row, column| {
        data[(row, column)] - mean[column]
    });
    let samples = data.nrows() as f64;
    (centred.transpose() * &centred) * (factor * factor / (samples - 1.0))
}

/// Relative pivot size below which the bandwidth matrix is treated as singular.
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Lower Cholesky factor of the bandwidth matrix.
fn kernel_factor(matrix: DMatrix<f64>) -> Result<DMatrix<f64>, DensityError> {
    let scales = matrix.diagonal();
    let lower = Cholesky::new(matrix)
        .ok_or(DensityError::SingularCovariance)?
        .unpack();
    let degenerate = lower
        .diagonal()
        .iter()
        .zip(scales.iter())
        .any(|(&pivot, &scale)| !pivot.is_finite() || pivot * pivot <= scale.abs() * PIVOT_TOLERANCE);
    if degenerate {
        return Err(DensityError::SingularCovariance);
    }
    Ok(lower)
}

/// `ln` of the Gaussian normalising constant averaged over `points` kernels.
#[expect(
    clippy::cast_precision_loss,
    reason = "sample counts are converted to f64 for the normalising constant"
)]
fn log_normaliser(lower: &DMatrix<f64>, points: usize) -> f64 {
    let log_sqrt_det: f64 = lower.diagonal().iter().map(|pivot| pivot.ln()).sum();
    -(points as f64).ln() - 0.5 * lower.nrows() as f64 * (2.0 * PI).ln() - log_sqrt_det
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PointCloud;
    use rstest::rstest;

    fn two_squares() -> PointCloud {
        PointCloud::from_rows(
            "two-squares",
            vec![
                vec![0.0, 0.0],
                vec![1.0, 0.0],
                vec![0.0, 1.0],
                vec![1.0, 1.0],
                vec![5.0, 5.0],
                vec![6.0, 5.0],
                vec![5.0, 6.0],
                vec![6.0, 6.0],
            ],
        )
        .expect("rows are valid")
    }

    #[test]
    fn densities_are_positive_and_symmetric() {
        let cloud = two_squares();

        let densities = GaussianKde::default()
            .estimate(&cloud)
            .expect("estimate succeeds");

        assert_eq!(densities.len(), 8);
        assert!(densities.iter().all(|density| *density > 0.0));
        // The point set is symmetric under (x, y) -> (6 - x, 6 - y).
        for (left, right) in [(0, 7), (1, 6), (2, 5), (3, 4)] {
            assert!((densities[left] - densities[right]).abs() < 1e-12);
        }
    }

    #[test]
    fn one_dimensional_estimate_matches_closed_form() {
        let cloud = PointCloud::from_rows("pair", vec![vec![0.0], vec![2.0]])
            .expect("rows are valid");

        let densities = GaussianKde::new(Bandwidth::Factor(1.0))
            .estimate(&cloud)
            .expect("estimate succeeds");

        // Sample variance is 2, so each kernel is N(x_i, 2).
        let kernel = |x: f64| (-x * x / 4.0).exp() / (4.0 * PI).sqrt();
        let expected = 0.5 * (kernel(0.0) + kernel(2.0));
        assert!((densities[0] - expected).abs() < 1e-12);
        assert!((densities[1] - expected).abs() < 1e-12);
    }

    #[test]
    fn denser_regions_score_higher() {
        let cloud = PointCloud::from_rows(
            "cluster-and-outlier",
            vec![vec![0.0], vec![0.1], vec![-0.1], vec![0.05], vec![8.0]],
        )
        .expect("rows are valid");

        let densities = GaussianKde::default()
            .estimate(&cloud)
            .expect("estimate succeeds");

        assert!(densities[0] > densities[4]);
    }

    #[rstest]
    #[case(Bandwidth::Scott, 8, 2, 8_f64.powf(-1.0 / 6.0))]
    #[case(Bandwidth::Silverman, 8, 2, 8_f64.powf(-1.0 / 6.0))]
    #[case(Bandwidth::Factor(0.5), 100, 3, 0.5)]
    fn resolves_bandwidth_factors(
        #[case] bandwidth: Bandwidth,
        #[case] points: usize,
        #[case] dimensions: usize,
        #[case] expected: f64,
    ) {
        let factor = bandwidth.factor(points, dimensions).expect("factor is valid");
        assert!((factor - expected).abs() < 1e-12);
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    #[case(f64::NAN)]
    fn rejects_invalid_fixed_factors(#[case] factor: f64) {
        let err = Bandwidth::Factor(factor)
            .factor(10, 2)
            .expect_err("factor must be rejected");
        assert!(matches!(err, DensityError::InvalidBandwidth { .. }));
    }

    #[test]
    fn rejects_too_few_points() {
        let cloud = PointCloud::from_rows("tiny", vec![vec![0.0, 1.0], vec![1.0, 0.0]])
            .expect("rows are valid");

        let err = GaussianKde::default()
            .estimate(&cloud)
            .expect_err("two points cannot span two dimensions");

        assert_eq!(err, DensityError::TooFewPoints { points: 2, dimensions: 2 });
    }

    #[test]
    fn rejects_collinear_points() {
        let cloud = PointCloud::from_rows(
            "diagonal",
            vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![2.0, 2.0], vec![3.0, 3.0]],
        )
        .expect("rows are valid");

        let err = GaussianKde::default()
            .estimate(&cloud)
            .expect_err("collinear points have a singular covariance");

        assert_eq!(err, DensityError::SingularCovariance);
    }

    #[test]
    fn stretching_an_axis_rescales_every_density() {
        let rows = vec![
            vec![0.0, 0.3],
            vec![1.2, 0.0],
            vec![0.4, 1.1],
            vec![2.0, 1.7],
            vec![0.9, 0.8],
            vec![3.1, 0.2],
        ];
        let stretched = rows.iter().map(|row| vec![row[0] * 10.0, row[1]]).collect();
        let kde = GaussianKde::default();

        let base = kde
            .estimate(&PointCloud::from_rows("base", rows).expect("rows are valid"))
            .expect("estimate succeeds");
        let scaled = kde
            .estimate(&PointCloud::from_rows("stretched", stretched).expect("rows are valid"))
            .expect("estimate succeeds");

        for (original, rescaled) in base.iter().zip(&scaled) {
            assert!((original / 10.0 - rescaled).abs() < 1e-12 * original);
        }
    }

    #[test]
    fn distance_to_measure_averages_over_the_nearest_points() {
        let cloud = PointCloud::from_rows("line", vec![vec![0.0], vec![1.0], vec![3.0]])
            .expect("rows are valid");

        let distances = DistanceToMeasure::new(2)
            .distances(&cloud)
            .expect("distances succeed");

        let half = 0.5_f64.sqrt();
        for (found, expected) in distances.iter().zip([half, half, 2.0_f64.sqrt()]) {
            assert!((found - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn distance_to_measure_clamps_its_mass() {
        let cloud = PointCloud::from_rows("pair", vec![vec![0.0], vec![2.0]])
            .expect("rows are valid");

        let distances = DistanceToMeasure::new(10)
            .distances(&cloud)
            .expect("distances succeed");

        assert_eq!(distances, [2.0_f64.sqrt(), 2.0_f64.sqrt()]);
    }

    #[test]
    fn crowded_points_rank_highest_by_distance_to_measure() {
        let densities = DistanceToMeasure::new(3)
            .estimate(&two_squares_with_outlier())
            .expect("estimate succeeds");

        assert!(densities[..8].iter().all(|density| *density > densities[8]));
    }

    #[test]
    fn distance_to_measure_needs_a_neighbour() {
        let err = DistanceToMeasure::new(0)
            .estimate(&two_squares())
            .expect_err("mass must be positive");
        assert_eq!(err, DensityError::NoNeighbours);
    }

    fn two_squares_with_outlier() -> PointCloud {
        let mut rows: Vec<Vec<f64>> = two_squares().rows().map(<[f64]>::to_vec).collect();
        rows.push(vec![20.0, -20.0]);
        PointCloud::from_rows("outlier", rows).expect("rows are valid")
    }
}
