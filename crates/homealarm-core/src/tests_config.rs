use std::io::Write;
use std::path::PathBuf;

use crate::config::{ConfigError, SecurityConfig, DEFAULT_CONFIDENCE_THRESHOLD};

fn toml_file(body: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    f.write_all(body.as_bytes()).unwrap();
    f
}

#[test]
fn defaults_without_file() {
    let cfg = SecurityConfig::load_with_prefix(None, "HOMEALARM_TEST_DEFAULTS").unwrap();
    assert_eq!(cfg, SecurityConfig::default());
    assert_eq!(cfg.confidence_threshold, DEFAULT_CONFIDENCE_THRESHOLD);
}

#[test]
fn file_values_override_defaults() {
    let f = toml_file("confidence_threshold = 80.0\ndatabase_path = \"/var/lib/homealarm/state.db\"\n");
    let cfg = SecurityConfig::load_with_prefix(Some(f.path()), "HOMEALARM_TEST_FILE").unwrap();
    assert_eq!(cfg.confidence_threshold, 80.0);
    assert_eq!(cfg.database_path, PathBuf::from("/var/lib/homealarm/state.db"));
}

#[test]
fn env_overrides_file() {
    let f = toml_file("confidence_threshold = 80.0\n");
    std::env::set_var("HOMEALARM_TEST_ENV_CONFIDENCE_THRESHOLD", "65");
    let cfg = SecurityConfig::load_with_prefix(Some(f.path()), "HOMEALARM_TEST_ENV").unwrap();
    std::env::remove_var("HOMEALARM_TEST_ENV_CONFIDENCE_THRESHOLD");
    assert_eq!(cfg.confidence_threshold, 65.0);
}

#[test]
fn out_of_range_threshold_is_invalid() {
    let f = toml_file("confidence_threshold = 120.0\n");
    let err = SecurityConfig::load_with_prefix(Some(f.path()), "HOMEALARM_TEST_RANGE").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn missing_file_is_a_load_error() {
    let path = PathBuf::from("/nonexistent/homealarm.toml");
    let err = SecurityConfig::load_with_prefix(Some(&path), "HOMEALARM_TEST_MISSING").unwrap_err();
    assert!(matches!(err, ConfigError::Load(_)));
}

#[test]
fn rendered_default_loads_back() {
    let rendered = SecurityConfig::default().to_toml_string().unwrap();
    assert!(rendered.contains("confidence_threshold = 50.0"));
    let f = toml_file(&rendered);
    let cfg = SecurityConfig::load_with_prefix(Some(f.path()), "HOMEALARM_TEST_RENDER").unwrap();
    assert_eq!(cfg, SecurityConfig::default());
}
