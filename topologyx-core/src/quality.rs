//! Agreement scores between a predicted labelling and ground truth.
//!
//! Both scores are invariant to label renaming, so ToMaTo labels can be
//! compared directly with generator labels.

use std::collections::BTreeMap;

use thiserror::Error;

/// Adjusted Rand Index and Normalized Mutual Information of one comparison.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClusteringQualityScore {
    /// Adjusted Rand Index in `[-1.0, 1.0]`; `1.0` is perfect agreement.
    pub ari: f64,
    /// Normalized Mutual Information in `[0.0, 1.0]`.
    pub nmi: f64,
}

/// Errors raised while scoring labellings.
#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
pub enum ClusteringQualityError {
    /// The two labellings cover different numbers of points.
    #[error("label length mismatch: ground_truth={ground_truth_len}, predicted={predicted_len}")]
    LabelLengthMismatch {
        /// Number of ground-truth labels.
        ground_truth_len: usize,
        /// Number of predicted labels.
        predicted_len: usize,
    },
}

/// Joint and marginal label counts.
struct Contingency {
    items: f64,
    truth: BTreeMap<usize, usize>,
    predicted: BTreeMap<usize, usize>,
    joint: BTreeMap<(usize, usize), usize>,
}

impl Contingency {
    #[expect(
        clippy::cast_precision_loss,
        reason = "item counts feed floating-point scores"
    )]
    fn tabulate(ground_truth: &[usize], predicted: &[usize]) -> Result<Self, ClusteringQualityError> {
        if ground_truth.len() != predicted.len() {
            return Err(ClusteringQualityError::LabelLengthMismatch {
                ground_truth_len: ground_truth.len(),
                predicted_len: predicted.len(),
            });
        }
        let mut table = Self {
            items: ground_truth.len() as f64,
            truth: BTreeMap::new(),
            predicted: BTreeMap::new(),
            joint: BTreeMap::new(),
        };
        for (&left, &right) in ground_truth.iter().zip(predicted) {
            *table.truth.entry(left).or_default() += 1;
            *table.predicted.entry(right).or_default() += 1;
            *table.joint.entry((left, right)).or_default() += 1;
        }
        Ok(table)
    }

    fn adjusted_rand_index(&self) -> f64 {
        let total = pairs(self.items);
        if total == 0.0 {
            return 1.0;
        }
        let agreed = sum_pairs(self.joint.values());
        let truth = sum_pairs(self.truth.values());
        let predicted = sum_pairs(self.predicted.values());

        let expected = truth * predicted / total;
        let ceiling = 0.5 * (truth + predicted);
        if ceiling == expected {
            1.0
        } else {
            (agreed - expected) / (ceiling - expected)
        }
    }

    #[expect(
        clippy::cast_precision_loss,
        reason = "label counts feed floating-point entropies"
    )]
    fn normalized_mutual_information(&self) -> f64 {
        if self.items == 0.0 {
            return 1.0;
        }
        let entropy = |counts: &BTreeMap<usize, usize>| -> f64 {
            counts
                .values()
                .map(|&count| {
                    let p = count as f64 / self.items;
                    -p * p.ln()
                })
                .sum()
        };
        let truth_entropy = entropy(&self.truth);
        let predicted_entropy = entropy(&self.predicted);
        match (truth_entropy == 0.0, predicted_entropy == 0.0) {
            (true, true) => return 1.0,
            (true, false) | (false, true) => return 0.0,
            (false, false) => {}
        }

        let mutual: f64 = self
            .joint
            .iter()
            .map(|(&(left, right), &count)| {
                let joint = count as f64;
                let left = self.truth.get(&left).copied().unwrap_or(count) as f64;
                let right = self.predicted.get(&right).copied().unwrap_or(count) as f64;
                joint / self.items * (joint * self.items / (left * right)).ln()
            })
            .sum();
        mutual / (truth_entropy * predicted_entropy).sqrt()
    }
}

fn pairs(count: f64) -> f64 {
    count * (count - 1.0) / 2.0
}

#[expect(
    clippy::cast_precision_loss,
    reason = "pair counts are accumulated as floating point"
)]
fn sum_pairs<'a>(counts: impl Iterator<Item = &'a usize>) -> f64 {
    counts.map(|&count| pairs(count as f64)).sum()
}

/// Adjusted Rand Index of `predicted` against `ground_truth`.
///
/// # Errors
/// Returns [`ClusteringQualityError::LabelLengthMismatch`] when the
/// labellings differ in length.
///
/// # Examples
/// ```
/// use topologyx_core::adjusted_rand_index;
///
/// let score = adjusted_rand_index(&[0, 0, 1, 1], &[5, 5, 2, 2])?;
/// assert_eq!(score, 1.0);
/// # Ok::<(), topologyx_core::ClusteringQualityError>(())
/// ```
pub fn adjusted_rand_index(
    ground_truth: &[usize],
    predicted: &[usize],
) -> Result<f64, ClusteringQualityError> {
    Ok(Contingency::tabulate(ground_truth, predicted)?.adjusted_rand_index())
}

/// Normalized Mutual Information (geometric normalisation) of `predicted`
/// against `ground_truth`.
///
/// # Errors
/// Returns [`ClusteringQualityError::LabelLengthMismatch`] when the
/// labellings differ in length.
pub fn normalized_mutual_information(
    ground_truth: &[usize],
    predicted: &[usize],
) -> Result<f64, ClusteringQualityError> {
    Ok(Contingency::tabulate(ground_truth, predicted)?.normalized_mutual_information())
}

/// Computes both scores from one contingency table.
///
/// # Errors
/// Returns [`ClusteringQualityError::LabelLengthMismatch`] when the
/// labellings differ in length.
pub fn clustering_quality_score(
    ground_truth: &[usize],
    predicted: &[usize],
) -> Result<ClusteringQualityScore, ClusteringQualityError> {
    let table = Contingency::tabulate(ground_truth, predicted)?;
    Ok(ClusteringQualityScore {
        ari: table.adjusted_rand_index(),
        nmi: table.normalized_mutual_information(),
    })
}
