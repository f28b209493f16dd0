//! Configuration validation.

use crate::schema::Config;

/// Longest call timeout accepted (one day).
pub const MAX_CALL_TIMEOUT_SECS: u64 = 86_400;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_listeners(config, &mut result);
        Self::validate_bridge(config, &mut result);
        Self::validate_history(config, &mut result);

        if config.shutdown.grace_period_secs == 0 {
            result.add_error(ValidationError::new(
                "shutdown.grace_period_secs",
                "grace_period_secs must be greater than 0",
            ));
        }

        result
    }

    fn validate_listeners(config: &Config, result: &mut ValidationResult) {
        let mut listeners = vec![(
            "endpoint",
            config.endpoint.host.as_str(),
            config.endpoint.port,
        )];
        if config.mcp.enabled {
            listeners.push(("mcp", config.mcp.host.as_str(), config.mcp.port));
        }
        if config.http.enabled {
            listeners.push(("http", config.http.host.as_str(), config.http.port));
        }

        for (section, host, port) in &listeners {
            if *port == 0 {
                result.add_error(ValidationError::new(
                    format!("{}.port", section),
                    "Port cannot be 0",
                ));
            }
            if host.is_empty() {
                result.add_error(ValidationError::new(
                    format!("{}.host", section),
                    "Host cannot be empty",
                ));
            }
        }

        for (i, (section, _, port)) in listeners.iter().enumerate() {
            for (other, _, other_port) in listeners.iter().skip(i + 1) {
                if port == other_port && *port != 0 {
                    result.add_error(ValidationError::new(
                        format!("{}.port", other),
                        format!("Port {} is already used by [{}]", port, section),
                    ));
                }
            }
        }

        if config.mcp.enabled && config.mcp.port_attempts == 0 {
            result.add_error(ValidationError::new(
                "mcp.port_attempts",
                "At least one port attempt is required",
            ));
        }

        if !config.endpoint.path.starts_with('/') {
            result.add_error(ValidationError::new(
                "endpoint.path",
                "path must start with '/'",
            ));
        }

        if !config.mcp.enabled && !config.http.enabled {
            result.add_warning(ValidationWarning::new(
                "mcp.enabled",
                "Both front-ends are disabled, nothing will call the bridge",
            ));
        }
    }

    fn validate_bridge(config: &Config, result: &mut ValidationResult) {
        let bridge = &config.bridge;

        if bridge.call_timeout_secs == 0 {
            result.add_error(ValidationError::new(
                "bridge.call_timeout_secs",
                "call_timeout_secs must be greater than 0",
            ));
        } else if bridge.call_timeout_secs > MAX_CALL_TIMEOUT_SECS {
            result.add_error(ValidationError::new(
                "bridge.call_timeout_secs",
                format!("call_timeout_secs must be at most {}", MAX_CALL_TIMEOUT_SECS),
            ));
        }

        if bridge.slow_call_timeout_secs == 0 {
            result.add_error(ValidationError::new(
                "bridge.slow_call_timeout_secs",
                "slow_call_timeout_secs must be greater than 0",
            ));
        } else if bridge.slow_call_timeout_secs > MAX_CALL_TIMEOUT_SECS {
            result.add_error(ValidationError::new(
                "bridge.slow_call_timeout_secs",
                format!("slow_call_timeout_secs must be at most {}", MAX_CALL_TIMEOUT_SECS),
            ));
        } else if bridge.slow_call_timeout_secs < bridge.call_timeout_secs {
            result.add_warning(ValidationWarning::new(
                "bridge.slow_call_timeout_secs",
                "slow_call_timeout_secs is lower than call_timeout_secs",
            ));
        }

        if bridge.sweep_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "bridge.sweep_interval_ms",
                "sweep_interval_ms must be greater than 0",
            ));
        }
    }

    fn validate_history(config: &Config, result: &mut ValidationResult) {
        if !config.history.contents_path.exists() {
            result.add_warning(ValidationWarning::new(
                "history.contents_path",
                format!(
                    "History file does not exist: {}",
                    config.history.contents_path.display()
                ),
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
