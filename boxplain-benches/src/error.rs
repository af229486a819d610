//! Benchmark setup error type.
//!
//! Aggregates the core's configuration/oracle failures with profiling
//! failures so benchmark setup functions can propagate with `?` instead of
//! `.expect()`.

use crate::profiling::ProfilingError;
use boxplain_core::{ConfigError, OracleError};

/// Errors that may occur during benchmark setup.
#[derive(Debug, thiserror::Error)]
pub enum BenchSetupError {
    /// Feature-space or seed-generator configuration was invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// The entailment oracle failed.
    #[error("oracle error: {0}")]
    Oracle(#[from] OracleError),
    /// Memory profiling failed.
    #[error("memory profiling failed: {0}")]
    Profiling(#[from] ProfilingError),
}
