//! `topologyx` entry point.
//!
//! Initialises logging, parses arguments with clap, runs the requested
//! command and writes its summary to stdout. Failures are logged with their
//! stable error code and turn into a non-zero exit status.

use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use topologyx_cli::{
    cli::{Cli, CliError, render_summary, run_cli},
    logging::{self, LoggingError},
};
use tracing::{error, field};

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    let summary = run_cli(cli).context("failed to execute command")?;
    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    render_summary(&summary, &mut writer).context("failed to render summary")?;
    writer.flush().context("failed to flush output")?;
    Ok(())
}

fn main() -> ExitCode {
    if let Err(err) = logging::init_logging() {
        report_logging_init_error(&err);
        return ExitCode::FAILURE;
    }

    if let Err(err) = try_main() {
        let cli_error = err.downcast_ref::<CliError>();
        let code = cli_error.map(|cli_error| field::display(cli_error.code()));
        let data_source_code = cli_error
            .and_then(CliError::data_source_code)
            .map(|code| field::display(code.as_str()));

        error!(
            error = %format!("{err:#}"),
            code,
            data_source_code,
            "command execution failed"
        );
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

#[expect(
    clippy::print_stderr,
    reason = "Emit one-off diagnostic before tracing is initialized"
)]
fn report_logging_init_error(err: &LoggingError) {
    eprintln!("failed to initialize logging: {err}");
}
