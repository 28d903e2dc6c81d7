//! Integration tests for environment-driven retry configuration

use recur::config::{CadenceConfig, RetryConfig};
use recur::error::ConfigError;
use std::time::Duration;

const VARS: [&str; 8] = [
    "RECUR_MAX_RETRIES",
    "RECUR_TIMEOUT_MS",
    "RECUR_MAX_DELAY_MS",
    "RECUR_MAX_ELAPSED_MS",
    "RECUR_JITTER",
    "RECUR_CADENCE",
    "RECUR_BASE_MS",
    "RECUR_FACTOR",
];

/// Run `f` with exactly the given recur variables set.
fn with_recur_env<R>(set: &[(&str, &str)], f: impl FnOnce() -> R) -> R {
    let vars: Vec<(&str, Option<&str>)> = VARS
        .iter()
        .map(|var| {
            let value = set.iter().find(|(name, _)| name == var).map(|(_, value)| *value);
            (*var, value)
        })
        .collect();
    temp_env::with_vars(vars, f)
}

#[test]
fn test_empty_env_gives_defaults() {
    let config = with_recur_env(&[], RetryConfig::from_env).unwrap();
    assert_eq!(config, RetryConfig::default());
}

#[test]
fn test_env_overrides() {
    let config = with_recur_env(
        &[
            ("RECUR_MAX_RETRIES", "7"),
            ("RECUR_TIMEOUT_MS", "2500"),
            ("RECUR_MAX_DELAY_MS", "800"),
            ("RECUR_JITTER", "0.2"),
        ],
        RetryConfig::from_env,
    )
    .unwrap();

    assert_eq!(config.max_retries, Some(7));
    assert_eq!(config.timeout(), Some(Duration::from_millis(2500)));
    assert_eq!(config.max_delay_ms, Some(800));
    assert_eq!(config.jitter, 0.2);
}

#[test]
fn test_env_cadence_with_timing() {
    let config = with_recur_env(
        &[("RECUR_CADENCE", "fixed"), ("RECUR_BASE_MS", "250")],
        RetryConfig::from_env,
    )
    .unwrap();
    assert_eq!(config.cadence, CadenceConfig::Fixed { interval_ms: 250 });

    let config = with_recur_env(
        &[("RECUR_BASE_MS", "50"), ("RECUR_FACTOR", "1.5")],
        RetryConfig::from_env,
    )
    .unwrap();
    assert_eq!(
        config.cadence,
        CadenceConfig::Exponential {
            base_ms: 50,
            factor: 1.5
        }
    );
}

#[test]
fn test_unparsable_value_names_variable() {
    let err = with_recur_env(&[("RECUR_MAX_RETRIES", "lots")], RetryConfig::from_env).unwrap_err();
    match err {
        ConfigError::Env { var, value } => {
            assert_eq!(var, "RECUR_MAX_RETRIES");
            assert_eq!(value, "lots");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unknown_cadence_rejected() {
    let err = with_recur_env(&[("RECUR_CADENCE", "fibonacci")], RetryConfig::from_env).unwrap_err();
    assert!(matches!(err, ConfigError::Env { var: "RECUR_CADENCE", .. }));
}

#[test]
fn test_out_of_range_jitter_fails_validation() {
    let err = with_recur_env(&[("RECUR_JITTER", "2.0")], RetryConfig::from_env).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[tokio::test]
async fn test_env_config_drives_executor() {
    let retry = with_recur_env(
        &[("RECUR_CADENCE", "immediate"), ("RECUR_MAX_RETRIES", "2")],
        RetryConfig::from_env,
    )
    .unwrap()
    .executor()
    .unwrap();

    let result = retry
        .run(|| async { Err::<(), _>(recur::failure::Failure::status(503)) })
        .await;
    assert_eq!(result.unwrap_err().attempts(), Some(3));
}
