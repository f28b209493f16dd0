use super::*;
use crate::schema::*;

fn find_error<'a>(result: &'a ValidationResult, path: &str) -> Option<&'a ValidationError> {
    result.errors.iter().find(|e| e.path == path)
}

#[test]
fn test_default_config_is_valid() {
    let result = ConfigValidator::validate(&Config::default());
    assert!(result.is_valid(), "unexpected errors: {:?}", result.errors);
}

#[test]
fn test_zero_port_is_error() {
    let mut config = Config::default();
    config.endpoint.port = 0;
    let result = ConfigValidator::validate(&config);
    assert!(find_error(&result, "endpoint.port").is_some());
}

#[test]
fn test_empty_host_is_error() {
    let mut config = Config::default();
    config.http.host = String::new();
    let result = ConfigValidator::validate(&config);
    assert!(find_error(&result, "http.host").is_some());
}

#[test]
fn test_duplicate_ports_are_errors() {
    let mut config = Config::default();
    config.http.port = config.endpoint.port;
    let result = ConfigValidator::validate(&config);
    let err = find_error(&result, "http.port").unwrap();
    assert!(err.message.contains("endpoint"));
}

#[test]
fn test_disabled_frontend_port_is_ignored() {
    let mut config = Config::default();
    config.mcp.enabled = false;
    config.mcp.port = config.endpoint.port;
    let result = ConfigValidator::validate(&config);
    assert!(find_error(&result, "mcp.port").is_none());
}

#[test]
fn test_both_frontends_disabled_warns() {
    let mut config = Config::default();
    config.mcp.enabled = false;
    config.http.enabled = false;
    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "mcp.enabled"));
}

#[test]
fn test_endpoint_path_must_be_absolute() {
    let mut config = Config::default();
    config.endpoint.path = "ws".to_string();
    let result = ConfigValidator::validate(&config);
    assert!(find_error(&result, "endpoint.path").is_some());
}

#[test]
fn test_zero_timeouts_are_errors() {
    let mut config = Config::default();
    config.bridge.call_timeout_secs = 0;
    config.bridge.slow_call_timeout_secs = 0;
    config.bridge.sweep_interval_ms = 0;
    let result = ConfigValidator::validate(&config);
    assert!(find_error(&result, "bridge.call_timeout_secs").is_some());
    assert!(find_error(&result, "bridge.slow_call_timeout_secs").is_some());
    assert!(find_error(&result, "bridge.sweep_interval_ms").is_some());
}

#[test]
fn test_oversized_timeouts_are_errors() {
    let mut config = Config::default();
    config.bridge.call_timeout_secs = i64::MAX as u64;
    config.bridge.slow_call_timeout_secs = MAX_CALL_TIMEOUT_SECS + 1;
    let result = ConfigValidator::validate(&config);
    assert!(find_error(&result, "bridge.call_timeout_secs").is_some());
    assert!(find_error(&result, "bridge.slow_call_timeout_secs").is_some());

    config.bridge.call_timeout_secs = MAX_CALL_TIMEOUT_SECS;
    config.bridge.slow_call_timeout_secs = MAX_CALL_TIMEOUT_SECS;
    assert!(ConfigValidator::validate(&config).errors.is_empty());
}

#[test]
fn test_slow_timeout_lower_than_normal_warns() {
    let mut config = Config::default();
    config.bridge.call_timeout_secs = 60;
    config.bridge.slow_call_timeout_secs = 10;
    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(
        result
            .warnings
            .iter()
            .any(|w| w.path == "bridge.slow_call_timeout_secs")
    );
}

#[test]
fn test_missing_history_file_warns() {
    let mut config = Config::default();
    config.history.contents_path = "/nonexistent/contents.json".into();
    let result = ConfigValidator::validate(&config);
    assert!(
        result
            .warnings
            .iter()
            .any(|w| w.path == "history.contents_path")
    );
}

#[test]
fn test_validation_error_display() {
    let err = ValidationError::new("endpoint.port", "Port cannot be 0");
    assert_eq!(err.to_string(), "endpoint.port: Port cannot be 0");
}

#[test]
fn test_zero_port_attempts_rejected() {
    let mut config = Config::default();
    config.mcp.port_attempts = 0;
    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "mcp.port_attempts"));
}
