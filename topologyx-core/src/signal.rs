//! Persistence of one-dimensional signals.
//!
//! A signal is read as a path graph: sample `i` is a vertex and consecutive
//! samples share an edge that appears once both endpoints have. Filtering by
//! the samples themselves tracks sub-level sets, where components are born at
//! local minima; filtering by the negated samples tracks upper-level sets,
//! where components are born at local maxima.
//!
//! [`time_delay_embedding`] turns a signal into a [`PointCloud`] so it can be
//! clustered like any other point set.

use tracing::{debug, instrument};

use crate::{
    datasource::PointCloud,
    error::SignalError,
    filtration::FiltrationEdge,
    persistence::PersistenceDiagram,
};

/// Level-set persistence of a scalar signal.
///
/// # Examples
/// ```
/// use topologyx_core::Levels;
///
/// let levels = Levels::new(vec![0.0, 3.0, 1.0, 2.0, 0.0])?;
/// let (upper, sub) = levels.persistence();
/// // The lower peak at index 3 merges into the higher one at the valley.
/// assert_eq!(upper.intervals().len(), 1);
/// assert_eq!(upper.intervals()[0].birth, -2.0);
/// assert_eq!(upper.intervals()[0].death, -1.0);
/// assert_eq!(sub.intervals().len(), 2);
/// # Ok::<(), topologyx_core::SignalError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Levels {
    samples: Vec<f64>,
}

impl Levels {
    /// Wraps `samples` for level-set persistence.
    ///
    /// # Errors
    /// Returns [`SignalError::Empty`] for an empty signal and
    /// [`SignalError::NonFiniteSample`] when a sample is NaN or infinite.
    pub fn new(samples: Vec<f64>) -> Result<Self, SignalError> {
        validate_samples(&samples)?;
        Ok(Self { samples })
    }

    /// Samples of the signal.
    #[must_use]
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Finite intervals of the upper-level filtration.
    ///
    /// Values are reported on the negated scale, so each interval runs from
    /// `-peak` to `-saddle` and `birth <= death` holds.
    #[must_use]
    pub fn upper_levels(&self) -> PersistenceDiagram {
        let negated: Vec<f64> = self.samples.iter().map(|sample| -sample).collect();
        path_persistence(&negated)
    }

    /// Finite intervals of the sub-level filtration, from minimum to the
    /// barrier that joins it to an older basin.
    #[must_use]
    pub fn sub_levels(&self) -> PersistenceDiagram {
        path_persistence(&self.samples)
    }

    /// Upper-level and sub-level diagrams, in that order.
    #[instrument(name = "signal.levels", skip(self), fields(samples = self.samples.len()))]
    pub fn persistence(&self) -> (PersistenceDiagram, PersistenceDiagram) {
        let upper = self.upper_levels();
        let sub = self.sub_levels();
        debug!(
            upper = upper.intervals().len(),
            sub = sub.intervals().len(),
            "signal persistence computed",
        );
        (upper, sub)
    }
}

/// Finite dimension-0 persistence of the path graph over `values`.
fn path_persistence(values: &[f64]) -> PersistenceDiagram {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]).then(a.cmp(&b)));

    let mut edges: Vec<FiltrationEdge> = values
        .windows(2)
        .enumerate()
        .map(|(source, pair)| FiltrationEdge {
            source,
            target: source + 1,
            value: pair[0].max(pair[1]),
        })
        .collect();
    edges.sort_by(|a, b| a.value.total_cmp(&b.value).then(a.source.cmp(&b.source)));

    PersistenceDiagram::from_graph(values, &order, &edges).into_finite()
}

/// Embeds `signal` as points of `dimension` lagged samples.
///
/// Row `j` is `[s[j], s[j + delay], ..., s[j + (dimension - 1) * delay]]`;
/// there is one row for every start whose window fits in the signal.
///
/// # Errors
/// - [`SignalError::InvalidEmbedding`] when `dimension` or `delay` is zero.
/// - [`SignalError::TooShort`] when no window fits.
/// - [`SignalError::Empty`] or [`SignalError::NonFiniteSample`] for an
///   unusable signal.
///
/// # Examples
/// ```
/// use topologyx_core::{DataSource, time_delay_embedding};
///
/// let cloud = time_delay_embedding("ramp", &[0.0, 1.0, 2.0, 3.0, 4.0], 2, 2)?;
/// assert_eq!(cloud.len(), 3);
/// assert_eq!(cloud.point(1)?, [1.0, 3.0]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[instrument(
    name = "signal.embed",
    err,
    skip(name, signal),
    fields(samples = signal.len()),
)]
pub fn time_delay_embedding(
    name: impl Into<String>,
    signal: &[f64],
    dimension: usize,
    delay: usize,
) -> Result<PointCloud, SignalError> {
    if dimension == 0 || delay == 0 {
        return Err(SignalError::InvalidEmbedding { dimension, delay });
    }
    validate_samples(signal)?;
    let window = (dimension - 1)
        .checked_mul(delay)
        .and_then(|span| span.checked_add(1))
        .filter(|&window| window <= signal.len())
        .ok_or(SignalError::TooShort {
            samples: signal.len(),
            dimension,
            delay,
        })?;

    let rows: Vec<Vec<f64>> = (0..=signal.len() - window)
        .map(|start| {
            (0..dimension)
                .map(|lag| signal[start + lag * delay])
                .collect()
        })
        .collect();
    debug!(points = rows.len(), "signal embedded");
    Ok(PointCloud::from_rows(name, rows)?)
}

fn validate_samples(samples: &[f64]) -> Result<(), SignalError> {
    if samples.is_empty() {
        return Err(SignalError::Empty);
    }
    match samples.iter().position(|sample| !sample.is_finite()) {
        Some(index) => Err(SignalError::NonFiniteSample {
            index,
            value: samples[index],
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DataSource, SignalErrorCode};
    use rstest::rstest;

    fn intervals(diagram: &PersistenceDiagram) -> Vec<(f64, f64)> {
        diagram
            .intervals()
            .iter()
            .map(|interval| (interval.birth, interval.death))
            .collect()
    }

    #[test]
    fn two_peaks_give_one_upper_interval() {
        let levels = Levels::new(vec![0.0, 3.0, 1.0, 2.0, 0.0]).expect("signal is valid");

        assert_eq!(intervals(&levels.upper_levels()), [(-2.0, -1.0)]);
    }

    #[test]
    fn valleys_close_at_their_barrier() {
        let levels = Levels::new(vec![2.0, 0.0, 3.0, 1.0, 4.0, -1.0]).expect("signal is valid");

        // The basin at 1.0 spills over 3.0; the basin at 0.0 then spills into
        // the global minimum over 4.0.
        assert_eq!(intervals(&levels.sub_levels()), [(1.0, 3.0), (0.0, 4.0)]);
    }

    #[rstest]
    #[case(vec![1.0, 2.0, 3.0, 4.0])]
    #[case(vec![5.0])]
    #[case(vec![2.0, 2.0, 2.0])]
    fn monotone_signals_have_no_finite_intervals(#[case] samples: Vec<f64>) {
        let levels = Levels::new(samples).expect("signal is valid");

        let (upper, sub) = levels.persistence();

        assert!(upper.intervals().is_empty());
        assert!(sub.intervals().is_empty());
    }

    #[test]
    fn every_interval_is_finite_and_ordered() {
        let samples: Vec<f64> = (0..64_i32)
            .map(|step| (f64::from(step) * 0.7).sin() * f64::from(step.rem_euclid(5)))
            .collect();
        let levels = Levels::new(samples).expect("signal is valid");

        let (upper, sub) = levels.persistence();

        for interval in upper.intervals().iter().chain(sub.intervals()) {
            assert!(!interval.is_essential());
            assert!(interval.birth < interval.death, "{interval:?}");
        }
        assert!(!upper.intervals().is_empty());
        assert!(!sub.intervals().is_empty());
    }

    #[rstest]
    #[case(vec![], SignalError::Empty)]
    #[case(vec![1.0, f64::NAN], SignalError::NonFiniteSample { index: 1, value: f64::NAN })]
    fn unusable_signals_are_rejected(#[case] samples: Vec<f64>, #[case] expected: SignalError) {
        let err = Levels::new(samples).expect_err("signal must be rejected");
        assert_eq!(err.code(), expected.code());
    }

    #[test]
    fn embedding_lays_out_lagged_windows() {
        let signal: Vec<f64> = (0..7_i32).map(f64::from).collect();

        let cloud = time_delay_embedding("ramp", &signal, 3, 2).expect("window fits");

        assert_eq!(cloud.name(), "ramp");
        assert_eq!(cloud.dimensions(), 3);
        let rows: Vec<&[f64]> = cloud.rows().collect();
        assert_eq!(
            rows,
            vec![vec![0.0, 2.0, 4.0], vec![1.0, 3.0, 5.0], vec![2.0, 4.0, 6.0]]
        );
    }

    #[test]
    fn window_matching_the_signal_gives_one_point() {
        let cloud = time_delay_embedding("exact", &[1.0, 2.0, 3.0], 3, 1).expect("window fits");
        assert_eq!(cloud.len(), 1);
    }

    #[rstest]
    #[case(0, 1, SignalErrorCode::InvalidEmbedding)]
    #[case(2, 0, SignalErrorCode::InvalidEmbedding)]
    #[case(3, 2, SignalErrorCode::TooShort)]
    #[case(usize::MAX, usize::MAX, SignalErrorCode::TooShort)]
    fn unusable_embeddings_are_rejected(
        #[case] dimension: usize,
        #[case] delay: usize,
        #[case] expected: SignalErrorCode,
    ) {
        let err = time_delay_embedding("short", &[0.0, 1.0, 2.0, 3.0], dimension, delay)
            .expect_err("embedding must be rejected");
        assert_eq!(err.code(), expected);
    }
}
