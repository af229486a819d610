//! CLI entry point for the boxplain explanation engine.
//!
//! Parses command-line arguments with clap, runs `run`/`bench`, renders the
//! resulting rows as CSV, and maps errors to appropriate exit codes. Logging
//! is initialized eagerly so subsequent operations can emit structured
//! diagnostics via `tracing`.

use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use boxplain_cli::{
    cli::{Cli, CliError, render_rows, run_cli},
    logging::{self, LoggingError},
};
use tracing::error;

/// Parse CLI arguments, execute the command, render rows, and flush stdout.
fn try_main() -> Result<()> {
    let cli = Cli::parse();
    let rows = run_cli(cli).context("failed to execute command")?;
    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    render_rows(&rows, &mut writer).context("failed to render output")?;
    writer.flush().context("failed to flush output")?;
    Ok(())
}

fn main() -> ExitCode {
    if let Err(err) = logging::init_logging() {
        report_logging_init_error(&err);
        return ExitCode::FAILURE;
    }

    if let Err(err) = try_main() {
        let code = err.chain().find_map(|cause| {
            let cause: &(dyn std::error::Error + 'static) = cause;
            cause.downcast_ref::<CliError>().and_then(CliError::code)
        });

        error!(error = %err, code = ?code, "command execution failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Emit a fallback diagnostic to stderr when tracing initialization fails.
#[expect(
    clippy::print_stderr,
    reason = "Emit one-off diagnostic before tracing is initialized"
)]
fn report_logging_init_error(err: &LoggingError) {
    eprintln!("failed to initialize logging: {err}");
}
