//! Seeded synthetic 2D point sets for exercising the clustering engine.
//!
//! Every structure draws from a [`SmallRng`] seeded by the caller, so a given
//! `(structure, n_samples, seed)` triple always yields the same points.

use std::f64::consts::PI;
use std::fmt;

use rand::{Rng, SeedableRng, rngs::SmallRng};
use rand_distr::{Distribution, Normal};
use tracing::debug;

use crate::{datasource::PointCloud, error::GeneratorError};

/// Linear map applied to blob samples for [`ClusterStructure::Anisotropy`].
const ANISOTROPY: [[f64; 2]; 2] = [[0.608_345_49, -0.636_673_41], [-0.408_877_18, 0.852_532_29]];
/// Per-blob standard deviations for [`ClusterStructure::Variances`].
const VARIANCES: [f64; 3] = [1.0, 2.5, 0.5];
const BLOB_COUNT: usize = 3;
const BLOB_BOX: f64 = 10.0;
const NOISE: f64 = 0.05;
const INNER_CIRCLE: f64 = 0.5;

/// Shape of a generated point set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClusterStructure {
    /// Gaussian blobs sheared by a fixed linear map.
    Anisotropy,
    /// Three isotropic Gaussian blobs with unit deviation.
    Blobs,
    /// Two concentric noisy circles.
    Circles,
    /// Two interleaved noisy half circles.
    Moons,
    /// Uniform noise in the unit square, without labels.
    Random,
    /// Three Gaussian blobs with different deviations.
    Variances,
}

impl ClusterStructure {
    /// Every structure, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Anisotropy,
        Self::Blobs,
        Self::Circles,
        Self::Moons,
        Self::Random,
        Self::Variances,
    ];

    /// Lower-case name of the structure.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Anisotropy => "anisotropy",
            Self::Blobs => "blobs",
            Self::Circles => "circles",
            Self::Moons => "moons",
            Self::Random => "random",
            Self::Variances => "variances",
        }
    }
}

impl fmt::Display for ClusterStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generated points plus ground-truth labels when the structure has them.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelledPoints {
    /// The generated points, named after the structure.
    pub points: PointCloud,
    /// Component of each point, absent for [`ClusterStructure::Random`].
    pub labels: Option<Vec<usize>>,
}

/// Parameters of one synthetic point set.
///
/// # Examples
/// ```
/// use topologyx_core::{ClusterGenerator, ClusterStructure, DataSource};
///
/// let generated = ClusterGenerator::new(ClusterStructure::Moons, 40, 7).generate()?;
/// assert_eq!(generated.points.len(), 40);
/// assert_eq!(generated.points.dimensions(), 2);
/// assert_eq!(generated.labels.map(|labels| labels.len()), Some(40));
/// # Ok::<(), topologyx_core::GeneratorError>(())
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClusterGenerator {
    structure: ClusterStructure,
    n_samples: usize,
    seed: u64,
}

impl Default for ClusterGenerator {
    fn default() -> Self {
        Self::new(ClusterStructure::Blobs, 1500, 42)
    }
}

impl ClusterGenerator {
    /// Describes a point set of `n_samples` points.
    #[must_use]
    pub const fn new(structure: ClusterStructure, n_samples: usize, seed: u64) -> Self {
        Self {
            structure,
            n_samples,
            seed,
        }
    }

    /// Structure to generate.
    #[must_use]
    pub const fn structure(&self) -> ClusterStructure {
        self.structure
    }

    /// Number of points to generate.
    #[must_use]
    pub const fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Seed of the random stream.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Draws the point set.
    ///
    /// # Errors
    /// Returns [`GeneratorError::NoSamples`] when `n_samples` is zero and
    /// [`GeneratorError::InvalidDeviation`] when a noise deviation is unusable.
    pub fn generate(&self) -> Result<LabelledPoints, GeneratorError> {
        if self.n_samples == 0 {
            return Err(GeneratorError::NoSamples);
        }
        let mut rng = SmallRng::seed_from_u64(self.seed);
        let (rows, labels) = match self.structure {
            ClusterStructure::Blobs => {
                labelled(blobs(self.n_samples, &[1.0; BLOB_COUNT], &mut rng)?)
            }
            ClusterStructure::Variances => labelled(blobs(self.n_samples, &VARIANCES, &mut rng)?),
            ClusterStructure::Anisotropy => {
                let (rows, labels) = blobs(self.n_samples, &[1.0; BLOB_COUNT], &mut rng)?;
                (rows.iter().map(|row| shear(row)).collect(), Some(labels))
            }
            ClusterStructure::Circles => labelled(circles(self.n_samples, &mut rng)?),
            ClusterStructure::Moons => labelled(moons(self.n_samples, &mut rng)?),
            ClusterStructure::Random => {
                let rows = (0..self.n_samples)
                    .map(|_| vec![rng.r#gen::<f64>(), rng.r#gen::<f64>()])
                    .collect();
                (rows, None)
            }
        };
        debug!(
            structure = %self.structure,
            samples = self.n_samples,
            seed = self.seed,
            "generated synthetic points",
        );
        Ok(LabelledPoints {
            points: PointCloud::from_rows(self.structure.as_str(), rows)?,
            labels,
        })
    }
}

type Rows = (Vec<Vec<f64>>, Vec<usize>);

fn labelled((rows, labels): Rows) -> (Vec<Vec<f64>>, Option<Vec<usize>>) {
    (rows, Some(labels))
}

/// Centred Gaussian noise with standard deviation `deviation`.
fn noise(deviation: f64) -> Result<Normal<f64>, GeneratorError> {
    Normal::new(0.0, deviation).map_err(|_| GeneratorError::InvalidDeviation { deviation })
}

/// Splits `total` as evenly as possible; earlier groups take the remainder.
fn split(total: usize, groups: usize) -> impl Iterator<Item = usize> {
    let base = total.checked_div(groups).unwrap_or(0);
    let remainder = total.checked_rem(groups).unwrap_or(0);
    (0..groups).map(move |group| base + usize::from(group < remainder))
}

fn blobs(n_samples: usize, deviations: &[f64], rng: &mut SmallRng) -> Result<Rows, GeneratorError> {
    let centres: Vec<[f64; 2]> = deviations
        .iter()
        .map(|_| {
            [
                rng.gen_range(-BLOB_BOX..BLOB_BOX),
                rng.gen_range(-BLOB_BOX..BLOB_BOX),
            ]
        })
        .collect();

    let mut rows = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for (label, count) in split(n_samples, deviations.len()).enumerate() {
        let [cx, cy] = centres[label];
        let spread = noise(deviations[label])?;
        for _ in 0..count {
            rows.push(vec![cx + spread.sample(rng), cy + spread.sample(rng)]);
            labels.push(label);
        }
    }
    Ok((rows, labels))
}

/// Row vector times [`ANISOTROPY`].
fn shear(row: &[f64]) -> Vec<f64> {
    let [[a, b], [c, d]] = ANISOTROPY;
    vec![row[0] * a + row[1] * c, row[0] * b + row[1] * d]
}

/// Sizes of the first and second halves; the second takes an odd point.
fn halves(n_samples: usize) -> (usize, usize) {
    let first = n_samples.div_euclid(2);
    (first, n_samples - first)
}

#[expect(
    clippy::cast_precision_loss,
    reason = "sample positions are converted to angles"
)]
fn circles(n_samples: usize, rng: &mut SmallRng) -> Result<Rows, GeneratorError> {
    let (outer, inner) = halves(n_samples);
    let jitter = noise(NOISE)?;
    let mut ring = |count: usize, radius: f64, label: usize| {
        (0..count)
            .map(|step| {
                let angle = 2.0 * PI * step as f64 / count as f64;
                (
                    vec![
                        radius * angle.cos() + jitter.sample(rng),
                        radius * angle.sin() + jitter.sample(rng),
                    ],
                    label,
                )
            })
            .collect::<Vec<_>>()
    };
    let mut samples = ring(outer, 1.0, 0);
    samples.extend(ring(inner, INNER_CIRCLE, 1));
    Ok(samples.into_iter().unzip())
}

#[expect(
    clippy::cast_precision_loss,
    reason = "sample positions are converted to angles"
)]
fn moons(n_samples: usize, rng: &mut SmallRng) -> Result<Rows, GeneratorError> {
    let (outer, inner) = halves(n_samples);
    let jitter = noise(NOISE)?;
    let angle = |step: usize, count: usize| {
        if count > 1 {
            PI * step as f64 / (count - 1) as f64
        } else {
            0.0
        }
    };

    let mut rows = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for step in 0..outer {
        let theta = angle(step, outer);
        rows.push(vec![
            theta.cos() + jitter.sample(rng),
            theta.sin() + jitter.sample(rng),
        ]);
        labels.push(0);
    }
    for step in 0..inner {
        let theta = angle(step, inner);
        rows.push(vec![
            1.0 - theta.cos() + jitter.sample(rng),
            0.5 - theta.sin() + jitter.sample(rng),
        ]);
        labels.push(1);
    }
    Ok((rows, labels))
}
