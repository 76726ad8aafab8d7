// Config loading and validation tests

use container_pulse::config::AppConfig;
use container_pulse::error::ConfigError;
use std::time::Duration;

const VALID_CONFIG: &str = r#"
[engine]
poll_interval_secs = 2
history_capacity = 60
retire_grace_ticks = 3
max_concurrent_samples = 16
failure_retire_threshold = 3

[docker]
socket = "/var/run/docker.sock"
timeout_secs = 30

[monitoring]
summary_log_interval_secs = 60
"#;

fn invalid_field(err: ConfigError) -> &'static str {
    match err {
        ConfigError::Invalid { field, .. } => field,
        other => panic!("expected Invalid, got {other:?}"),
    }
}

#[test]
fn test_config_loads_from_str() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("load_from_str");
    assert_eq!(config.engine.poll_interval(), Duration::from_secs(2));
    assert_eq!(config.engine.history_capacity, 60);
    assert_eq!(config.engine.retire_grace_ticks, 3);
    assert_eq!(config.engine.max_concurrent_samples, 16);
    assert_eq!(config.docker.socket.as_deref(), Some("/var/run/docker.sock"));
    assert_eq!(config.docker.timeout_secs, 30);
    assert_eq!(config.monitoring.summary_log_interval_secs, 60);
}

#[test]
fn test_config_empty_uses_defaults() {
    let config = AppConfig::load_from_str("").expect("empty config");
    assert_eq!(config.engine.poll_interval_secs, 2.0);
    assert_eq!(config.engine.history_capacity, 60);
    assert_eq!(config.engine.retire_grace_ticks, 3);
    assert_eq!(config.engine.max_concurrent_samples, 16);
    assert_eq!(config.engine.failure_retire_threshold, 3);
    assert!(config.engine.sample_timeout_ms.is_none());
    assert!(config.docker.socket.is_none());
}

#[test]
fn test_config_partial_engine_section_keeps_other_defaults() {
    let config = AppConfig::load_from_str("[engine]\nhistory_capacity = 5\n").unwrap();
    assert_eq!(config.engine.history_capacity, 5);
    assert_eq!(config.engine.poll_interval_secs, 2.0);
}

#[test]
fn test_default_sample_timeout_is_interval_minus_margin() {
    let config = AppConfig::load_from_str(VALID_CONFIG).unwrap();
    assert_eq!(config.engine.sample_timeout(), Duration::from_millis(1750));

    let fast = AppConfig::load_from_str("[engine]\npoll_interval_secs = 0.2\n").unwrap();
    assert_eq!(fast.engine.sample_timeout(), Duration::from_millis(100));
}

#[test]
fn test_explicit_sample_timeout() {
    let config = AppConfig::load_from_str("[engine]\nsample_timeout_ms = 500\n").unwrap();
    assert_eq!(config.engine.sample_timeout(), Duration::from_millis(500));
}

#[test]
fn test_config_validation_rejects_zero_poll_interval() {
    let bad = VALID_CONFIG.replace("poll_interval_secs = 2", "poll_interval_secs = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert_eq!(invalid_field(err), "engine.poll_interval_secs");
}

#[test]
fn test_config_validation_rejects_negative_poll_interval() {
    let bad = VALID_CONFIG.replace("poll_interval_secs = 2", "poll_interval_secs = -1.5");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("poll_interval_secs"));
}

#[test]
fn test_config_validation_rejects_history_capacity_zero() {
    let bad = VALID_CONFIG.replace("history_capacity = 60", "history_capacity = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert_eq!(invalid_field(err), "engine.history_capacity");
}

#[test]
fn test_config_validation_rejects_retire_grace_ticks_zero() {
    let bad = VALID_CONFIG.replace("retire_grace_ticks = 3", "retire_grace_ticks = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert_eq!(invalid_field(err), "engine.retire_grace_ticks");
}

#[test]
fn test_config_validation_rejects_max_concurrent_samples_zero() {
    let bad = VALID_CONFIG.replace("max_concurrent_samples = 16", "max_concurrent_samples = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert_eq!(invalid_field(err), "engine.max_concurrent_samples");
}

#[test]
fn test_config_validation_rejects_failure_threshold_zero() {
    let bad = VALID_CONFIG.replace("failure_retire_threshold = 3", "failure_retire_threshold = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert_eq!(invalid_field(err), "engine.failure_retire_threshold");
}

#[test]
fn test_config_validation_rejects_sample_timeout_above_interval() {
    let err = AppConfig::load_from_str("[engine]\nsample_timeout_ms = 5000\n").unwrap_err();
    assert_eq!(invalid_field(err), "engine.sample_timeout_ms");
}

#[test]
fn test_config_validation_rejects_empty_socket() {
    let bad = VALID_CONFIG.replace("socket = \"/var/run/docker.sock\"", "socket = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert_eq!(invalid_field(err), "docker.socket");
}

#[test]
fn test_config_validation_rejects_summary_interval_zero() {
    let bad = VALID_CONFIG.replace(
        "summary_log_interval_secs = 60",
        "summary_log_interval_secs = 0",
    );
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("summary_log_interval_secs"));
}

#[test]
fn test_config_validation_rejects_invalid_toml() {
    let err = AppConfig::load_from_str("not valid toml [[[").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_config_rejects_wrong_type() {
    let err = AppConfig::load_from_str("[engine]\nhistory_capacity = \"many\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_config_load_from_file_via_env() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, VALID_CONFIG).unwrap();
    unsafe { std::env::set_var("CONFIG_FILE", path.to_str().unwrap()) };
    let result = AppConfig::load();
    unsafe { std::env::remove_var("CONFIG_FILE") };
    let config = result.expect("load from CONFIG_FILE");
    assert_eq!(config.engine.history_capacity, 60);
    assert_eq!(config.docker.timeout_secs, 30);
}

#[test]
fn test_config_load_missing_file_is_read_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let err = AppConfig::load_from_path(&dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn test_inspect_timeout_defaults_to_half_the_sample_timeout() {
    let config = AppConfig::load_from_str(VALID_CONFIG).unwrap();
    assert_eq!(config.inspect_timeout(), Duration::from_millis(875));

    let explicit = AppConfig::load_from_str("[docker]\ninspect_timeout_ms = 300\n").unwrap();
    assert_eq!(explicit.inspect_timeout(), Duration::from_millis(300));
}

#[test]
fn test_config_validation_rejects_inspect_timeout_at_or_above_sample_timeout() {
    let err = AppConfig::load_from_str("[docker]\ninspect_timeout_ms = 1750\n").unwrap_err();
    assert_eq!(invalid_field(err), "docker.inspect_timeout_ms");
    let err = AppConfig::load_from_str("[docker]\ninspect_timeout_ms = 0\n").unwrap_err();
    assert_eq!(invalid_field(err), "docker.inspect_timeout_ms");
}
