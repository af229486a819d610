//! Command-line interface orchestration for the boxplain explanation engine.
//!
//! The CLI offers `run` (explain or enumerate explanations for one point)
//! and `bench` (enumerate to completion, or a cap, emitting CSV rows).

mod commands;

pub use commands::{
    BenchArgs, Cli, CliError, Command, OutputRow, RunArgs, SearchArgs, render_rows, run_bench,
    run_cli, run_run,
};

#[cfg(test)]
mod tests;
