//! Ensemble file provider: parses the JSON emitted by a gradient-boosting
//! library's model dump into the core's [`boxplain_core::Ensemble`].

mod errors;
mod ingest;

pub use crate::errors::{EnsembleProviderError, EnsembleProviderErrorCode};
pub use crate::ingest::{branch_for, parse_ensemble};
