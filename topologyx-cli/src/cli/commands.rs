//! Command implementations and argument parsing for the `topologyx` CLI.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use thiserror::Error;
use tracing::{Span, field, info, instrument};

use topologyx_core::{
    Bandwidth, ClusterGenerator, ClusterStructure, ClusteringQualityError,
    ClusteringQualityScore, ClusteringResult, DEFAULT_N_NEIGHBORS, DEFAULT_TAU, DataSource,
    DataSourceError, DataSourceErrorCode, GeneratorError, PointCloud, Tomato, TomatoBuilder,
    TomatoError, clustering_quality_score,
};

use super::points::parse_points;

const DEFAULT_SAMPLES: usize = 1500;
const DEFAULT_SEED: u64 = 42;

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(name = "topologyx", about = "Cluster point sets with ToMaTo.")]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run ToMaTo clustering over a data source.
    Cluster(ClusterCommand),
}

/// Options accepted by the `cluster` command.
#[derive(Debug, Args, Clone)]
pub struct ClusterCommand {
    /// Upper bound on the number of clusters; widens the neighbourhood until met.
    #[arg(long = "n-clusters")]
    pub n_clusters: Option<usize>,

    /// Prominence below which neighbouring clusters merge.
    #[arg(long, default_value_t = DEFAULT_TAU, allow_negative_numbers = true)]
    pub tau: f64,

    /// Initial neighbourhood width.
    #[arg(long = "n-neighbors", default_value_t = DEFAULT_N_NEIGHBORS)]
    pub n_neighbors: usize,

    /// Bandwidth rule for the density estimate.
    #[arg(long, value_enum, default_value_t = BandwidthRule::Scott)]
    pub bandwidth: BandwidthRule,

    /// Summary format written to stdout.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Data source configuration.
    #[command(subcommand)]
    pub source: ClusterSource,
}

/// Data sources the `cluster` command can read.
#[derive(Debug, Subcommand, Clone)]
pub enum ClusterSource {
    /// Generate a labelled two-dimensional benchmark structure.
    Synthetic(SyntheticArgs),
    /// Read points from a delimited text file, one point per line.
    Points(PointsArgs),
}

/// Synthetic structure arguments.
#[derive(Debug, Args, Clone)]
pub struct SyntheticArgs {
    /// Structure to generate.
    #[arg(long, value_enum, default_value_t = StructureArg::Blobs)]
    pub structure: StructureArg,

    /// Number of points to generate.
    #[arg(long, default_value_t = DEFAULT_SAMPLES)]
    pub samples: usize,

    /// Random seed.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,
}

/// Points file arguments.
#[derive(Debug, Args, Clone)]
pub struct PointsArgs {
    /// Path to the points file.
    pub path: PathBuf,

    /// ASCII character separating coordinates on a line.
    #[arg(long, default_value_t = ',')]
    pub delimiter: char,

    /// Override name for the data source (defaults to the file stem).
    #[arg(long)]
    pub name: Option<String>,
}

/// Generated structures selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StructureArg {
    /// Sheared Gaussian blobs.
    Anisotropy,
    /// Isotropic Gaussian blobs.
    Blobs,
    /// Concentric circles.
    Circles,
    /// Interleaved half circles.
    Moons,
    /// Unlabelled uniform noise.
    Random,
    /// Blobs with different spreads.
    Variances,
}

impl From<StructureArg> for ClusterStructure {
    fn from(value: StructureArg) -> Self {
        match value {
            StructureArg::Anisotropy => Self::Anisotropy,
            StructureArg::Blobs => Self::Blobs,
            StructureArg::Circles => Self::Circles,
            StructureArg::Moons => Self::Moons,
            StructureArg::Random => Self::Random,
            StructureArg::Variances => Self::Variances,
        }
    }
}

/// Bandwidth rules selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BandwidthRule {
    /// Scott's rule of thumb.
    Scott,
    /// Silverman's rule of thumb.
    Silverman,
}

impl From<BandwidthRule> for Bandwidth {
    fn from(value: BandwidthRule) -> Self {
        match value {
            BandwidthRule::Scott => Self::Scott,
            BandwidthRule::Silverman => Self::Silverman,
        }
    }
}

/// Summary formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Line-oriented text.
    Text,
    /// A single pretty-printed JSON document.
    Json,
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading an input file failed.
    #[error("failed to read `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// A points file contained a malformed line.
    #[error("{path}:{line}: {message}")]
    Parse {
        /// Path of the points file.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// What was wrong with the line.
        message: String,
    },
    /// The coordinate delimiter was not a single ASCII character.
    #[error("delimiter `{delimiter}` must be an ASCII character")]
    Delimiter {
        /// The rejected delimiter.
        delimiter: char,
    },
    /// Parsed rows did not form a valid point cloud.
    #[error(transparent)]
    DataSource(#[from] DataSourceError),
    /// Synthetic generation failed.
    #[error(transparent)]
    Generator(#[from] GeneratorError),
    /// Clustering failed.
    #[error(transparent)]
    Core(#[from] TomatoError),
    /// Scoring against ground truth failed.
    #[error(transparent)]
    Quality(#[from] ClusteringQualityError),
}

impl CliError {
    /// Stable machine-readable code for the failure.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "CLI_IO",
            Self::Parse { .. } => "CLI_PARSE",
            Self::Delimiter { .. } => "CLI_DELIMITER",
            Self::DataSource(error) => error.code().as_str(),
            Self::Generator(error) => error.code().as_str(),
            Self::Core(error) => error.code().as_str(),
            Self::Quality(_) => "CLI_QUALITY",
        }
    }

    /// Code of the data source failure underneath, if any.
    #[must_use]
    pub const fn data_source_code(&self) -> Option<DataSourceErrorCode> {
        match self {
            Self::DataSource(error) => Some(error.code()),
            Self::Core(error) => error.data_source_code(),
            _ => None,
        }
    }
}

/// Outcome of one `cluster` invocation.
#[derive(Debug, Clone)]
pub struct ExecutionSummary {
    /// Name reported by the data source.
    pub data_source: String,
    /// Requested rendering.
    pub format: OutputFormat,
    /// Final clustering.
    pub result: ClusteringResult,
    /// Agreement with generator labels, when the source had any.
    pub quality: Option<ClusteringQualityScore>,
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when loading, generating or clustering fails.
///
/// # Examples
/// ```
/// use clap::Parser;
/// use topologyx_cli::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from([
///     "topologyx", "cluster", "--n-clusters", "3", "synthetic", "--samples", "90",
/// ]);
/// let summary = run_cli(cli)?;
/// assert!(summary.result.cluster_count() <= 3);
/// assert!(summary.quality.is_some());
/// # Ok::<(), topologyx_cli::cli::CliError>(())
/// ```
#[instrument(name = "cli.run", err, skip(cli), fields(command = field::Empty))]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    match cli.command {
        Command::Cluster(command) => {
            Span::current().record("command", field::display("cluster"));
            run_cluster(command)
        }
    }
}

#[instrument(
    name = "cli.cluster",
    err,
    skip(command),
    fields(
        tau = command.tau,
        n_neighbors = command.n_neighbors,
        n_clusters = ?command.n_clusters,
        source = field::Empty,
    ),
)]
pub(super) fn run_cluster(command: ClusterCommand) -> Result<ExecutionSummary, CliError> {
    let ClusterCommand {
        n_clusters,
        tau,
        n_neighbors,
        bandwidth,
        format,
        source,
    } = command;

    let mut builder = TomatoBuilder::new()
        .with_tau(tau)
        .with_n_neighbors(n_neighbors)
        .with_bandwidth(bandwidth.into());
    if let Some(target) = n_clusters {
        builder = builder.with_n_clusters(target);
    }
    let tomato = builder.build()?;

    let span = Span::current();
    let (data_source, result, quality) = match source {
        ClusterSource::Synthetic(args) => {
            span.record("source", field::display("synthetic"));
            run_synthetic(&tomato, &args)?
        }
        ClusterSource::Points(args) => {
            span.record("source", field::display("points"));
            run_points(&tomato, args)?
        }
    };

    info!(
        data_source = data_source.as_str(),
        clusters = result.cluster_count(),
        "command completed"
    );
    Ok(ExecutionSummary {
        data_source,
        format,
        result,
        quality,
    })
}

type Clustered = (String, ClusteringResult, Option<ClusteringQualityScore>);

#[instrument(
    name = "cli.synthetic",
    err,
    skip(tomato, args),
    fields(structure = %ClusterStructure::from(args.structure), samples = args.samples, seed = args.seed),
)]
pub(super) fn run_synthetic(tomato: &Tomato, args: &SyntheticArgs) -> Result<Clustered, CliError> {
    let generated =
        ClusterGenerator::new(args.structure.into(), args.samples, args.seed).generate()?;
    let result = tomato.run(&generated.points)?;
    let quality = generated
        .labels
        .map(|truth| clustering_quality_score(&truth, &result.labels()))
        .transpose()?;
    Ok((generated.points.name().to_owned(), result, quality))
}

#[instrument(
    name = "cli.points",
    err,
    skip(tomato, args),
    fields(path = %args.path.display(), override_name = field::Empty),
)]
pub(super) fn run_points(tomato: &Tomato, args: PointsArgs) -> Result<Clustered, CliError> {
    let PointsArgs {
        path,
        delimiter,
        name,
    } = args;
    Span::current().record(
        "override_name",
        field::display(name.as_deref().unwrap_or("<derived>")),
    );
    let cloud = load_points(&path, delimiter, derive_data_source_name(&path, name.as_deref()))?;
    let result = tomato.run(&cloud)?;
    Ok((cloud.name().to_owned(), result, None))
}

#[instrument(name = "cli.load_points", err, skip(path, name), fields(path = %path.display()))]
pub(super) fn load_points(path: &Path, delimiter: char, name: String) -> Result<PointCloud, CliError> {
    let file = File::open(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let rows = parse_points(file, delimiter, path)?;
    Ok(PointCloud::from_rows(name, rows)?)
}

pub(super) fn derive_data_source_name(path: &Path, override_name: Option<&str>) -> String {
    if let Some(name) = override_name {
        return name.to_owned();
    }

    path.file_stem()
        .and_then(|value| value.to_str())
        .map_or_else(|| "points".to_owned(), ToOwned::to_owned)
}

#[derive(Serialize)]
struct SummaryDocument<'a> {
    data_source: &'a str,
    clusters: usize,
    n_neighbors: usize,
    escalations: usize,
    members: Vec<ClusterEntry>,
    labels: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quality: Option<QualityEntry>,
}

#[derive(Serialize)]
struct ClusterEntry {
    centroid: usize,
    size: usize,
}

#[derive(Serialize)]
struct QualityEntry {
    ari: f64,
    nmi: f64,
}

/// Renders `summary` to `writer` in the summary's requested format.
///
/// The text format lists the data source, cluster count, final neighbourhood
/// width, one `cluster<TAB>centroid<TAB>size` line per cluster and, when
/// available, the ARI and NMI scores.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use topologyx_cli::cli::{ExecutionSummary, OutputFormat, render_summary};
/// # use topologyx_core::ClusteringResult;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let summary = ExecutionSummary {
///     data_source: "demo".into(),
///     format: OutputFormat::Text,
///     result: ClusteringResult::from_clusters(vec![vec![0], vec![1, 2]], vec![0, 2])?,
///     quality: None,
/// };
/// let mut buffer = Vec::new();
/// render_summary(&summary, &mut buffer)?;
/// let text = String::from_utf8(buffer)?;
/// assert!(text.contains("clusters: 2"));
/// assert!(text.contains("1\t2\t2"));
/// # Ok(())
/// # }
/// ```
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    let result = &summary.result;
    match summary.format {
        OutputFormat::Text => {
            writeln!(writer, "data source: {}", summary.data_source)?;
            writeln!(writer, "clusters: {}", result.cluster_count())?;
            writeln!(
                writer,
                "neighbours: {} (escalations: {})",
                result.n_neighbors(),
                result.escalations()
            )?;
            for (index, (centroid, members)) in
                result.centroids().iter().zip(result.clusters()).enumerate()
            {
                writeln!(writer, "{index}\t{centroid}\t{}", members.len())?;
            }
            if let Some(quality) = summary.quality {
                writeln!(writer, "ari: {:.4}", quality.ari)?;
                writeln!(writer, "nmi: {:.4}", quality.nmi)?;
            }
        }
        OutputFormat::Json => {
            let document = SummaryDocument {
                data_source: &summary.data_source,
                clusters: result.cluster_count(),
                n_neighbors: result.n_neighbors(),
                escalations: result.escalations(),
                members: result
                    .centroids()
                    .iter()
                    .zip(result.clusters())
                    .map(|(&centroid, members)| ClusterEntry {
                        centroid,
                        size: members.len(),
                    })
                    .collect(),
                labels: result.labels(),
                quality: summary.quality.map(|score| QualityEntry {
                    ari: score.ari,
                    nmi: score.nmi,
                }),
            };
            serde_json::to_writer_pretty(&mut writer, &document)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}
