//! Distance primitives for coordinate vectors.
//!
//! Neighbour queries rank points by Euclidean distance. The routine validates
//! its inputs so a malformed vector surfaces as an error instead of a silent
//! NaN in the ranking.

use core::fmt;

use thiserror::Error;

/// Identifies whether an error was produced while inspecting the left or right
/// vector argument.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VectorKind {
    /// Value originating from the first argument.
    Left,
    /// Value originating from the second argument.
    Right,
}

impl fmt::Display for VectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
        }
    }
}

/// Errors emitted while computing distances.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DistanceError {
    /// Either input vector had zero length.
    #[error("vectors must have positive dimension")]
    ZeroLength,
    /// Input vectors had different lengths.
    #[error("dimension mismatch: left={left}, right={right}")]
    DimensionMismatch {
        /// Length of the left vector.
        left: usize,
        /// Length of the right vector.
        right: usize,
    },
    /// Encountered a non-finite value in one of the vectors.
    #[error("{which} vector contains a non-finite value at index {index}: {value}")]
    NonFinite {
        /// Vector holding the value.
        which: VectorKind,
        /// Position of the value.
        index: usize,
        /// The offending value.
        value: f64,
    },
}

/// Computes the Euclidean distance between two vectors.
///
/// # Examples
///
/// ```
/// use topologyx_core::{DistanceError, euclidean_distance};
///
/// fn main() -> Result<(), DistanceError> {
///     let distance = euclidean_distance(&[1.0, 2.0, 3.0], &[4.0, 6.0, 8.0])?;
///     assert!((distance - 7.071_068).abs() < 1e-6);
///     Ok(())
/// }
/// ```
///
/// # Errors
///
/// - [`DistanceError::ZeroLength`] when any input is empty.
/// - [`DistanceError::DimensionMismatch`] when input lengths differ.
/// - [`DistanceError::NonFinite`] when a value is NaN or infinite.
pub fn euclidean_distance(left: &[f64], right: &[f64]) -> Result<f64, DistanceError> {
    if left.is_empty() || right.is_empty() {
        return Err(DistanceError::ZeroLength);
    }
    if left.len() != right.len() {
        return Err(DistanceError::DimensionMismatch {
            left: left.len(),
            right: right.len(),
        });
    }

    let mut sum = 0.0_f64;
    for (index, (&l, &r)) in left.iter().zip(right).enumerate() {
        ensure_finite(l, VectorKind::Left, index)?;
        ensure_finite(r, VectorKind::Right, index)?;
        let diff = l - r;
        sum += diff * diff;
    }

    Ok(sum.sqrt())
}

fn ensure_finite(value: f64, which: VectorKind, index: usize) -> Result<(), DistanceError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(DistanceError::NonFinite {
            which,
            index,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&[0.0, 0.0], &[3.0, 4.0], 5.0)]
    #[case(&[1.0], &[1.0], 0.0)]
    #[case(&[-1.0, 2.0, 2.0], &[1.0, 0.0, 1.0], 3.0)]
    fn computes_euclidean_distance(#[case] left: &[f64], #[case] right: &[f64], #[case] expected: f64) {
        let distance = euclidean_distance(left, right).expect("inputs are valid");
        assert!((distance - expected).abs() < 1e-12);
    }

    #[rstest]
    #[case(&[], &[1.0], DistanceError::ZeroLength)]
    #[case(&[1.0], &[1.0, 2.0], DistanceError::DimensionMismatch { left: 1, right: 2 })]
    #[case(
        &[1.0, f64::INFINITY],
        &[1.0, 2.0],
        DistanceError::NonFinite { which: VectorKind::Left, index: 1, value: f64::INFINITY },
    )]
    fn rejects_invalid_vectors(
        #[case] left: &[f64],
        #[case] right: &[f64],
        #[case] expected: DistanceError,
    ) {
        let err = euclidean_distance(left, right).expect_err("inputs are invalid");
        assert_eq!(err, expected);
    }
}
