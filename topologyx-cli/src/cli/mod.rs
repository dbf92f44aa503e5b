//! Command-line interface for ToMaTo clustering.
//!
//! The `cluster` command runs over either a generated structure or a
//! delimited points file and renders a text or JSON summary.

mod commands;
mod points;

pub use commands::{
    BandwidthRule, Cli, CliError, ClusterCommand, ClusterSource, Command, ExecutionSummary,
    OutputFormat, PointsArgs, StructureArg, SyntheticArgs, render_summary, run_cli,
};
