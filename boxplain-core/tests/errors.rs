//! Integration tests covering the public error types exposed by `boxplain-core`.

use boxplain_core::{
    ConfigError, ConfigErrorCode, CoreError, CoreErrorCode, OracleError, OracleErrorCode,
};
use rstest::rstest;

#[rstest]
#[case(
    ConfigError::UnknownSeedGenerator { name: "bogus".to_owned() },
    ConfigErrorCode::UnknownSeedGenerator,
)]
#[case(
    ConfigError::MissingFeatureLimits { feature: 3 },
    ConfigErrorCode::MissingFeatureLimits,
)]
#[case(
    ConfigError::InvalidLimitOrder { feature: 1, lower: 2.0, upper: 1.0 },
    ConfigErrorCode::InvalidLimitOrder,
)]
fn returns_expected_config_code(#[case] error: ConfigError, #[case] expected: ConfigErrorCode) {
    assert_eq!(error.code(), expected);
    assert_eq!(error.code().as_str(), expected.as_str());
}

#[rstest]
#[case(
    OracleError::EncodingViolation { point: vec![] },
    OracleErrorCode::EncodingViolation,
)]
#[case(
    OracleError::UnsupportedObjective { objective: "rank".to_owned() },
    OracleErrorCode::UnsupportedObjective,
)]
#[case(
    OracleError::SolverFailure { message: "timeout".to_owned() },
    OracleErrorCode::SolverFailure,
)]
fn returns_expected_oracle_code(#[case] error: OracleError, #[case] expected: OracleErrorCode) {
    assert_eq!(error.code(), expected);
    assert_eq!(error.code().as_str(), expected.as_str());
}

#[rstest]
fn core_error_wraps_config_errors_with_the_config_code() {
    let error: CoreError = ConfigError::MissingFeatureLimits { feature: 0 }.into();
    assert_eq!(error.code(), CoreErrorCode::Config);
    assert_eq!(
        error.config_code(),
        Some(ConfigErrorCode::MissingFeatureLimits)
    );
    assert_eq!(error.oracle_code(), None);
}

#[rstest]
fn core_error_wraps_oracle_errors_with_the_oracle_code() {
    let error: CoreError = OracleError::SolverFailure {
        message: "unsat core empty".to_owned(),
    }
    .into();
    assert_eq!(error.code(), CoreErrorCode::Oracle);
    assert_eq!(error.oracle_code(), Some(OracleErrorCode::SolverFailure));
    assert_eq!(error.config_code(), None);
}

#[rstest]
fn error_codes_round_trip_through_display() {
    assert_eq!(
        ConfigErrorCode::InvalidLimitOrder.to_string(),
        "CONFIG_INVALID_LIMIT_ORDER"
    );
    assert_eq!(
        OracleErrorCode::EncodingViolation.to_string(),
        "ORACLE_ENCODING_VIOLATION"
    );
    assert_eq!(CoreErrorCode::Oracle.to_string(), "CORE_ORACLE");
}
