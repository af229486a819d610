//! Error types for the boxplain core library.
//!
//! Defines error enums exposed by the public API and a convenient result alias.

use std::fmt;

use thiserror::Error;

/// Stable codes describing [`ConfigError`] variants.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum ConfigErrorCode {
    /// `seed_gen` named a policy that is not one of the supported variants.
    UnknownSeedGenerator,
    /// A feature present in the ensemble has no entry in the limits map.
    MissingFeatureLimits,
    /// A supplied limit pair had `lower >= upper`.
    InvalidLimitOrder,
}

impl ConfigErrorCode {
    /// Return the stable machine-readable representation of this error code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnknownSeedGenerator => "CONFIG_UNKNOWN_SEED_GENERATOR",
            Self::MissingFeatureLimits => "CONFIG_MISSING_FEATURE_LIMITS",
            Self::InvalidLimitOrder => "CONFIG_INVALID_LIMIT_ORDER",
        }
    }
}

impl fmt::Display for ConfigErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error raised while constructing the program's configuration.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ConfigError {
    /// `seed_gen` named a policy that is not one of the supported variants.
    #[error("unknown seed generator policy `{name}`")]
    UnknownSeedGenerator { name: String },
    /// A feature present in the ensemble has no entry in the limits map.
    #[error("feature {feature} has no entry in the supplied limits")]
    MissingFeatureLimits { feature: usize },
    /// A supplied limit pair had `lower >= upper`.
    #[error("feature {feature} limits are inverted: lower={lower}, upper={upper}")]
    InvalidLimitOrder {
        feature: usize,
        lower: f64,
        upper: f64,
    },
}

impl ConfigError {
    /// Retrieve the stable [`ConfigErrorCode`] for this error.
    pub const fn code(&self) -> ConfigErrorCode {
        match self {
            Self::UnknownSeedGenerator { .. } => ConfigErrorCode::UnknownSeedGenerator,
            Self::MissingFeatureLimits { .. } => ConfigErrorCode::MissingFeatureLimits,
            Self::InvalidLimitOrder { .. } => ConfigErrorCode::InvalidLimitOrder,
        }
    }
}

/// Stable codes describing [`OracleError`] variants.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum OracleErrorCode {
    /// `predict` found no satisfying assignment; the path cover is not total.
    EncodingViolation,
    /// The ensemble's objective is outside the supported set.
    UnsupportedObjective,
    /// The underlying SMT backend reported an internal failure.
    SolverFailure,
}

impl OracleErrorCode {
    /// Return the stable machine-readable representation of this error code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EncodingViolation => "ORACLE_ENCODING_VIOLATION",
            Self::UnsupportedObjective => "ORACLE_UNSUPPORTED_OBJECTIVE",
            Self::SolverFailure => "ORACLE_SOLVER_FAILURE",
        }
    }
}

impl fmt::Display for OracleErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error raised by the entailment oracle.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum OracleError {
    /// `predict` found no satisfying assignment for a fixed input point.
    #[error("predict found no satisfying assignment at point {point:?}; path cover is not total")]
    EncodingViolation { point: Vec<ordered_float::OrderedFloat<f64>> },
    /// The ensemble's objective is outside the supported set.
    #[error("objective `{objective}` is not supported")]
    UnsupportedObjective { objective: String },
    /// The underlying SMT backend reported an internal failure.
    #[error("SMT solver failure: {message}")]
    SolverFailure { message: String },
}

impl OracleError {
    /// Retrieve the stable [`OracleErrorCode`] for this error.
    pub const fn code(&self) -> OracleErrorCode {
        match self {
            Self::EncodingViolation { .. } => OracleErrorCode::EncodingViolation,
            Self::UnsupportedObjective { .. } => OracleErrorCode::UnsupportedObjective,
            Self::SolverFailure { .. } => OracleErrorCode::SolverFailure,
        }
    }
}

/// Stable codes describing [`CoreError`] variants.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum CoreErrorCode {
    /// Configuration was invalid at construction time.
    Config,
    /// The entailment oracle failed.
    Oracle,
}

impl CoreErrorCode {
    /// Return the stable machine-readable representation of this error code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Config => "CORE_CONFIG",
            Self::Oracle => "CORE_ORACLE",
        }
    }
}

impl fmt::Display for CoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error produced by the explanation program.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum CoreError {
    /// Configuration was invalid at construction time.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The entailment oracle failed.
    #[error(transparent)]
    Oracle(#[from] OracleError),
}

impl CoreError {
    /// Retrieve the stable [`CoreErrorCode`] for this error.
    pub const fn code(&self) -> CoreErrorCode {
        match self {
            Self::Config(_) => CoreErrorCode::Config,
            Self::Oracle(_) => CoreErrorCode::Oracle,
        }
    }

    /// Retrieve the inner [`ConfigErrorCode`] when the error originated in configuration.
    pub const fn config_code(&self) -> Option<ConfigErrorCode> {
        match self {
            Self::Config(error) => Some(error.code()),
            Self::Oracle(_) => None,
        }
    }

    /// Retrieve the inner [`OracleErrorCode`] when the error originated in the oracle.
    pub const fn oracle_code(&self) -> Option<OracleErrorCode> {
        match self {
            Self::Oracle(error) => Some(error.code()),
            Self::Config(_) => None,
        }
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, CoreError>;
