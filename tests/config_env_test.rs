//! Configuration read from the real process environment

use lexai::config::{ConfigError, DatabaseConfig, LexaiConfig};
use serial_test::serial;
use std::env;
use std::path::PathBuf;

/// Sets variables for one test and restores the previous values on drop
struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    fn set(vars: &[(&str, Option<&str>)]) -> Self {
        let saved = vars
            .iter()
            .map(|(key, _)| (key.to_string(), env::var(key).ok()))
            .collect();
        for (key, value) in vars {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}

#[test]
#[serial]
fn test_database_config_from_env() {
    let _guard = EnvGuard::set(&[
        ("DB_NAME", Some("decisions")),
        ("DB_USER", Some("lexai")),
        ("DB_PASSWORD", Some("secret")),
        ("DB_HOST", Some("db.internal")),
        ("DB_PORT", Some("6543")),
    ]);

    let db = DatabaseConfig::from_env().unwrap();
    assert_eq!(db.name, "decisions");
    assert_eq!(db.port, 6543);
    assert_eq!(db.to_string(), "postgres://lexai@db.internal:6543/decisions");
}

#[test]
#[serial]
fn test_empty_database_variable_counts_as_missing() {
    let _guard = EnvGuard::set(&[
        ("DB_NAME", Some("decisions")),
        ("DB_USER", Some("lexai")),
        ("DB_PASSWORD", Some("")),
        ("DB_HOST", Some("localhost")),
        ("DB_PORT", None),
    ]);

    let err = DatabaseConfig::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::MissingVar(ref v) if v == "DB_PASSWORD"));
}

#[test]
#[serial]
fn test_bad_port_is_a_parse_error() {
    let _guard = EnvGuard::set(&[
        ("DB_NAME", Some("decisions")),
        ("DB_USER", Some("lexai")),
        ("DB_PASSWORD", Some("secret")),
        ("DB_HOST", Some("localhost")),
        ("DB_PORT", Some("99999")),
    ]);

    assert!(matches!(
        DatabaseConfig::from_env(),
        Err(ConfigError::ParseError { ref field, .. }) if field == "DB_PORT"
    ));
}

#[test]
#[serial]
fn test_lexai_config_from_env() {
    let _guard = EnvGuard::set(&[
        ("LEXAI_DATA_DIR", Some("/var/lib/lexai")),
        ("LEXAI_REQUEST_DELAY_MS", Some("250")),
        ("LEXAI_OVERLAP_SENTENCES", Some("1")),
        ("LEXAI_MODEL_CACHE_DIR", Some("/models")),
        ("LEXAI_BIND", Some("127.0.0.1:8080")),
        ("LEXAI_LOG_LEVEL", Some("warn")),
    ]);

    let config = LexaiConfig::from_env().unwrap();
    assert_eq!(config.paths.raw_jsonl(), PathBuf::from("/var/lib/lexai/sc_elibrary_decisions_text_combined.jsonl"));
    assert_eq!(config.scraper.request_delay.as_millis(), 250);
    assert_eq!(config.chunking.overlap_sentences, 1);
    assert_eq!(config.model_cache_dir, Some(PathBuf::from("/models")));
    assert_eq!(config.bind, "127.0.0.1:8080");
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_zero_timeout_fails_validation() {
    let _guard = EnvGuard::set(&[("LEXAI_REQUEST_TIMEOUT", Some("0")), ("LEXAI_BIND", None)]);

    let config = LexaiConfig::from_env().unwrap();
    assert!(matches!(config.validate(), Err(ConfigError::ValidationFailed(_))));
}
