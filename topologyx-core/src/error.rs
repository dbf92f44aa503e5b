//! Error types for the topologyx core library.
//!
//! Every public error enum carries a stable machine-readable code so callers
//! (and the CLI) can report failures without matching on display strings.

use std::{fmt, sync::Arc};

use thiserror::Error;

use crate::result::ClusterLayoutError;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// An error produced by [`crate::DataSource`] operations.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DataSourceError {
    /// Requested index was outside the source's bounds.
    #[error("index {index} is out of bounds")]
    OutOfBounds {
        /// The requested row that exceeded the source bounds.
        index: usize,
    },
    /// Rows had different dimensions.
    #[error("dimension mismatch: expected={expected}, found={found} at row {row}")]
    DimensionMismatch {
        /// Dimension of the first row.
        expected: usize,
        /// Dimension of the offending row.
        found: usize,
        /// Index of the offending row.
        row: usize,
    },
    /// Data source contained no rows.
    #[error("data source contains no rows")]
    EmptyData,
    /// Data source rows must have positive dimension.
    #[error("data source vectors must have positive dimension")]
    ZeroDimension,
    /// A coordinate was NaN or infinite.
    #[error("row {row} has a non-finite coordinate at axis {axis}: {value}")]
    NonFinite {
        /// Row holding the value.
        row: usize,
        /// Axis of the value within the row.
        axis: usize,
        /// The offending value.
        value: f64,
    },
}

define_error_codes! {
    /// Stable codes describing [`DataSourceError`] variants.
    enum DataSourceErrorCode for DataSourceError {
        /// Requested index was outside the source's bounds.
        OutOfBounds => OutOfBounds { .. } => "DATA_SOURCE_OUT_OF_BOUNDS",
        /// Rows had different dimensions.
        DimensionMismatch => DimensionMismatch { .. } => "DATA_SOURCE_DIMENSION_MISMATCH",
        /// Data source contained no rows.
        EmptyData => EmptyData => "DATA_SOURCE_EMPTY",
        /// Data source rows must have positive dimension.
        ZeroDimension => ZeroDimension => "DATA_SOURCE_ZERO_DIMENSION",
        /// A coordinate was NaN or infinite.
        NonFinite => NonFinite { .. } => "DATA_SOURCE_NON_FINITE",
    }
}

/// Failures raised while estimating point densities.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DensityError {
    /// A bandwidth matrix needs more points than dimensions.
    #[error("density estimation needs more than {dimensions} points (got {points})")]
    TooFewPoints {
        /// Points available.
        points: usize,
        /// Dimensionality of the points.
        dimensions: usize,
    },
    /// The sample covariance was not positive definite.
    #[error("sample covariance is singular; points may lie in a lower-dimensional subspace")]
    SingularCovariance,
    /// A distance-to-measure needs at least one neighbour.
    #[error("distance to measure needs at least one neighbour")]
    NoNeighbours,
    /// The bandwidth factor was not a positive finite number.
    #[error("bandwidth factor must be finite and positive (got {factor})")]
    InvalidBandwidth {
        /// The rejected factor.
        factor: f64,
    },
    /// Reading the points failed.
    #[error("failed to read points: {error}")]
    DataSource {
        /// Underlying data source error.
        #[from]
        error: DataSourceError,
    },
}

define_error_codes! {
    /// Stable codes describing [`DensityError`] variants.
    enum DensityErrorCode for DensityError {
        /// A bandwidth matrix needs more points than dimensions.
        TooFewPoints => TooFewPoints { .. } => "DENSITY_TOO_FEW_POINTS",
        /// The sample covariance was not positive definite.
        SingularCovariance => SingularCovariance => "DENSITY_SINGULAR_COVARIANCE",
        /// A distance-to-measure needs at least one neighbour.
        NoNeighbours => NoNeighbours => "DENSITY_NO_NEIGHBOURS",
        /// The bandwidth factor was invalid.
        InvalidBandwidth => InvalidBandwidth { .. } => "DENSITY_INVALID_BANDWIDTH",
        /// Reading the points failed.
        DataSource => DataSource { .. } => "DENSITY_DATA_SOURCE",
    }
}

/// Error type produced when configuring or running ToMaTo clustering.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum TomatoError {
    /// The stability threshold was negative or NaN.
    #[error("tau must be a non-negative number (got {got})")]
    InvalidTau {
        /// The rejected threshold.
        got: f64,
    },
    /// The neighbourhood width was zero.
    #[error("n_neighbors must be at least 1 (got {got})")]
    InvalidNeighborCount {
        /// The rejected width.
        got: usize,
    },
    /// The cluster target was zero.
    #[error("n_clusters must be at least 1 (got {got})")]
    InvalidClusterTarget {
        /// The rejected target.
        got: usize,
    },
    /// The supplied [`crate::DataSource`] contained no items.
    #[error("data source `{data_source}` contains no items")]
    EmptySource {
        /// Identifier for the empty data source.
        data_source: Arc<str>,
    },
    /// A density map did not cover every point.
    #[error("density map has {got} values but the data source has {expected} points")]
    DensityLengthMismatch {
        /// Number of points in the data source.
        expected: usize,
        /// Number of density values supplied.
        got: usize,
    },
    /// A density value was NaN or infinite.
    #[error("density of point {index} is not finite: {value}")]
    NonFiniteDensity {
        /// Point with the invalid density.
        index: usize,
        /// The offending value.
        value: f64,
    },
    /// A vertex referenced a point without a density value.
    #[error("vertex {vertex} has no density value")]
    UnknownVertex {
        /// The vertex lacking a density.
        vertex: usize,
    },
    /// Density estimation failed.
    #[error("density estimation over `{data_source}` failed: {error}")]
    Density {
        /// Identifier for the data source being estimated.
        data_source: Arc<str>,
        #[source]
        /// Underlying estimator error.
        error: DensityError,
    },
    /// The final forest did not partition the points.
    #[error("cluster layout is invalid: {error}")]
    Layout {
        /// Underlying layout error.
        #[from]
        error: ClusterLayoutError,
    },
    /// A [`crate::DataSource`] operation failed while running the algorithm.
    #[error("data source `{data_source}` failed: {error}")]
    DataSource {
        /// Identifier for the data source that produced the error.
        data_source: Arc<str>,
        #[source]
        /// Underlying data source error bubbled up by the algorithm.
        error: DataSourceError,
    },
}

define_error_codes! {
    /// Stable codes describing [`TomatoError`] variants.
    enum TomatoErrorCode for TomatoError {
        /// The stability threshold was negative or NaN.
        InvalidTau => InvalidTau { .. } => "TOMATO_INVALID_TAU",
        /// The neighbourhood width was zero.
        InvalidNeighborCount => InvalidNeighborCount { .. } => "TOMATO_INVALID_NEIGHBOR_COUNT",
        /// The cluster target was zero.
        InvalidClusterTarget => InvalidClusterTarget { .. } => "TOMATO_INVALID_CLUSTER_TARGET",
        /// The supplied data source contained no items.
        EmptySource => EmptySource { .. } => "TOMATO_EMPTY_SOURCE",
        /// A density map did not cover every point.
        DensityLengthMismatch => DensityLengthMismatch { .. } => "TOMATO_DENSITY_LENGTH_MISMATCH",
        /// A density value was NaN or infinite.
        NonFiniteDensity => NonFiniteDensity { .. } => "TOMATO_NON_FINITE_DENSITY",
        /// A vertex referenced a point without a density value.
        UnknownVertex => UnknownVertex { .. } => "TOMATO_UNKNOWN_VERTEX",
        /// Density estimation failed.
        DensityFailure => Density { .. } => "TOMATO_DENSITY_FAILURE",
        /// The final forest did not partition the points.
        InvalidLayout => Layout { .. } => "TOMATO_INVALID_LAYOUT",
        /// A data source operation failed while running the algorithm.
        DataSourceFailure => DataSource { .. } => "TOMATO_DATA_SOURCE_FAILURE",
    }
}

impl TomatoError {
    /// Retrieve the inner [`DataSourceErrorCode`] when the error originated in a [`crate::DataSource`].
    #[must_use]
    pub const fn data_source_code(&self) -> Option<DataSourceErrorCode> {
        match self {
            Self::DataSource { error, .. }
            | Self::Density {
                error: DensityError::DataSource { error },
                ..
            } => Some(error.code()),
            _ => None,
        }
    }

    pub(crate) fn wrap_data_source(data_source: &str, error: DataSourceError) -> Self {
        Self::DataSource {
            data_source: Arc::from(data_source),
            error,
        }
    }
}

/// Failures raised while generating synthetic point sets.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GeneratorError {
    /// At least one sample is required.
    #[error("sample count must be at least 1")]
    NoSamples,
    /// A noise deviation was negative or not finite.
    #[error("noise deviation must be finite and non-negative (got {deviation})")]
    InvalidDeviation {
        /// The rejected deviation.
        deviation: f64,
    },
    /// The generated rows were rejected by the point cloud.
    #[error("generated points are invalid: {error}")]
    DataSource {
        /// Underlying data source error.
        #[from]
        error: DataSourceError,
    },
}

define_error_codes! {
    /// Stable codes describing [`GeneratorError`] variants.
    enum GeneratorErrorCode for GeneratorError {
        /// At least one sample is required.
        NoSamples => NoSamples => "GENERATOR_NO_SAMPLES",
        /// A noise deviation was negative or not finite.
        InvalidDeviation => InvalidDeviation { .. } => "GENERATOR_INVALID_DEVIATION",
        /// The generated rows were rejected.
        DataSource => DataSource { .. } => "GENERATOR_DATA_SOURCE",
    }
}

/// Failures raised while reading scalar signals.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SignalError {
    /// The signal held no samples.
    #[error("signal contains no samples")]
    Empty,
    /// A sample was NaN or infinite.
    #[error("sample {index} is not finite (got {value})")]
    NonFiniteSample {
        /// Position of the sample.
        index: usize,
        /// The rejected value.
        value: f64,
    },
    /// Embedding dimension and delay must both be positive.
    #[error("embedding needs a positive dimension and delay (got {dimension} and {delay})")]
    InvalidEmbedding {
        /// Requested embedding dimension.
        dimension: usize,
        /// Requested lag between coordinates.
        delay: usize,
    },
    /// No embedding window fits inside the signal.
    #[error("{samples} samples cannot hold a window of {dimension} values {delay} apart")]
    TooShort {
        /// Samples available.
        samples: usize,
        /// Requested embedding dimension.
        dimension: usize,
        /// Requested lag between coordinates.
        delay: usize,
    },
    /// The embedded rows were rejected by the point cloud.
    #[error("embedded points are invalid: {error}")]
    DataSource {
        /// Underlying data source error.
        #[from]
        error: DataSourceError,
    },
}

define_error_codes! {
    /// Stable codes describing [`SignalError`] variants.
    enum SignalErrorCode for SignalError {
        /// The signal held no samples.
        Empty => Empty => "SIGNAL_EMPTY",
        /// A sample was NaN or infinite.
        NonFiniteSample => NonFiniteSample { .. } => "SIGNAL_NON_FINITE_SAMPLE",
        /// Embedding dimension or delay was zero.
        InvalidEmbedding => InvalidEmbedding { .. } => "SIGNAL_INVALID_EMBEDDING",
        /// No embedding window fits inside the signal.
        TooShort => TooShort { .. } => "SIGNAL_TOO_SHORT",
        /// The embedded rows were rejected.
        DataSource => DataSource { .. } => "SIGNAL_DATA_SOURCE",
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, TomatoError>;
