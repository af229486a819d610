//! Limits file provider: parses a headerless CSV of per-feature
//! `lower_limit`/`upper_limit` pairs into the core's [`boxplain_core::Limits`].

use std::fmt;
use std::io::Read;

use thiserror::Error;

use boxplain_core::Limits;

/// Stable codes describing [`LimitsProviderError`] variants.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum LimitsProviderErrorCode {
    /// A row did not have exactly three columns.
    WrongColumnCount,
    /// A column could not be parsed as the expected type.
    UnparsableField,
    /// The underlying CSV reader reported an error.
    Csv,
}

impl LimitsProviderErrorCode {
    /// Return the stable machine-readable representation of this error code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WrongColumnCount => "LIMITS_WRONG_COLUMN_COUNT",
            Self::UnparsableField => "LIMITS_UNPARSABLE_FIELD",
            Self::Csv => "LIMITS_CSV_ERROR",
        }
    }
}

impl fmt::Display for LimitsProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error raised while parsing a limits CSV file.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum LimitsProviderError {
    /// A row did not have exactly three columns.
    #[error("row {row} has {actual} columns, expected 3 (feature_index,lower_limit,upper_limit)")]
    WrongColumnCount { row: usize, actual: usize },
    /// A column could not be parsed as the expected type.
    #[error("row {row} column {column} is not a valid number: `{value}`")]
    UnparsableField {
        row: usize,
        column: &'static str,
        value: String,
    },
    /// The underlying CSV reader reported an error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl LimitsProviderError {
    /// Retrieve the stable [`LimitsProviderErrorCode`] for this error.
    #[must_use]
    pub const fn code(&self) -> LimitsProviderErrorCode {
        match self {
            Self::WrongColumnCount { .. } => LimitsProviderErrorCode::WrongColumnCount,
            Self::UnparsableField { .. } => LimitsProviderErrorCode::UnparsableField,
            Self::Csv(_) => LimitsProviderErrorCode::Csv,
        }
    }
}

/// Parse a headerless limits CSV (`feature_index,lower_limit,upper_limit`)
/// from any reader into a [`Limits`] map.
///
/// # Errors
/// Returns [`LimitsProviderError::WrongColumnCount`] if a row has other than
/// three fields, [`LimitsProviderError::UnparsableField`] if a field is not
/// the expected numeric type, or [`LimitsProviderError::Csv`] for a
/// malformed CSV stream.
pub fn parse_limits<R: Read>(reader: R) -> Result<Limits, LimitsProviderError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(reader);

    let mut limits = Limits::new();
    for (row_idx, record) in csv_reader.records().enumerate() {
        let record = record?;
        if record.len() != 3 {
            return Err(LimitsProviderError::WrongColumnCount {
                row: row_idx,
                actual: record.len(),
            });
        }
        let feature: usize = record[0].parse().map_err(|_| LimitsProviderError::UnparsableField {
            row: row_idx,
            column: "feature_index",
            value: record[0].to_owned(),
        })?;
        let lower: f64 = record[1].parse().map_err(|_| LimitsProviderError::UnparsableField {
            row: row_idx,
            column: "lower_limit",
            value: record[1].to_owned(),
        })?;
        let upper: f64 = record[2].parse().map_err(|_| LimitsProviderError::UnparsableField {
            row: row_idx,
            column: "upper_limit",
            value: record[2].to_owned(),
        })?;
        limits.insert(feature, (lower, upper));
    }
    Ok(limits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_rows() {
        let csv = "0,0.0,1.0\n1,-5.0,5.0\n";
        let limits = parse_limits(csv.as_bytes()).unwrap();
        assert_eq!(limits.get(&0), Some(&(0.0, 1.0)));
        assert_eq!(limits.get(&1), Some(&(-5.0, 5.0)));
    }

    #[test]
    fn rejects_wrong_column_count() {
        let csv = "0,0.0\n";
        let err = parse_limits(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LimitsProviderError::WrongColumnCount { .. }));
    }

    #[test]
    fn rejects_unparsable_field() {
        let csv = "0,not_a_number,1.0\n";
        let err = parse_limits(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LimitsProviderError::UnparsableField { .. }));
    }
}
