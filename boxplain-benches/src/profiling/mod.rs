//! Memory profiling support for explanation-program benchmarks.
//!
//! Provides a Linux resident-set sampler used to attach peak memory figures
//! to benchmark runs, mirroring the resident-set/virtual-memory columns the
//! CLI's `bench` subcommand reports per yield.

mod memory_sampler;

pub use memory_sampler::{PeakRssMeasurement, measure_peak_resident_set_size};
use thiserror::Error;

/// Errors raised while sampling benchmark memory metrics.
#[derive(Debug, Error)]
pub enum ProfilingError {
    /// Any input/output failure while reading process information.
    #[error("profiling I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The `/proc/self/status` parser could not locate a required key.
    #[error("missing field `{field}` in /proc/self/status")]
    MissingProcField {
        /// The required field name.
        field: &'static str,
    },
    /// A numeric field in `/proc/self/status` could not be parsed.
    #[error("invalid numeric value `{value}` for /proc field `{field}`")]
    InvalidProcField {
        /// The required field name.
        field: &'static str,
        /// The unparseable value.
        value: String,
    },
    /// A process status field had an unexpected unit.
    #[error("unsupported unit `{unit}` for /proc field `{field}`")]
    UnsupportedProcUnit {
        /// The required field name.
        field: &'static str,
        /// The unit found in `/proc`.
        unit: String,
    },
    /// Sampling is unavailable on the current operating system.
    #[error("peak resident-set sampling is not supported on `{os}`")]
    UnsupportedPlatform {
        /// Name of the unsupported operating system.
        os: &'static str,
    },
    /// Arithmetic overflow occurred while deriving or validating metrics.
    #[error("arithmetic overflow while computing `{context}`")]
    Overflow {
        /// Name of the overflowed calculation.
        context: &'static str,
    },
    /// The peak-memory sampler thread failed to join successfully.
    #[error("failed to join peak-memory sampler thread")]
    SamplerThreadPanicked,
    /// The peak-memory sampler encountered poisoned shared state.
    #[error("peak-memory sampler lock was poisoned")]
    SamplerLockPoisoned,
    /// Sampling interval must be greater than zero.
    #[error("sampling interval must be greater than zero")]
    ZeroSamplingInterval,
}
