//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub endpoint: EndpointConfig,

    #[serde(default)]
    pub mcp: McpConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub bridge: BridgeConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub shutdown: ShutdownConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// WebSocket endpoint the browser extension connects to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_endpoint_port")]
    pub port: u16,

    /// Route the upgrade is served on.
    #[serde(default = "default_endpoint_path")]
    pub path: String,
}

impl EndpointConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_endpoint_port(),
            path: default_endpoint_path(),
        }
    }
}

fn default_endpoint_port() -> u16 {
    8765
}

fn default_endpoint_path() -> String {
    "/".to_string()
}

/// Agent tool-call (MCP over SSE) front-end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_mcp_port")]
    pub port: u16,

    /// Server name reported in the `initialize` handshake.
    #[serde(default = "default_mcp_name")]
    pub name: String,

    /// Consecutive ports tried, starting at `port`, when it is taken.
    #[serde(default = "default_port_attempts")]
    pub port_attempts: u16,
}

impl McpConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            host: default_host(),
            port: default_mcp_port(),
            name: default_mcp_name(),
            port_attempts: default_port_attempts(),
        }
    }
}

fn default_mcp_port() -> u16 {
    8000
}

fn default_mcp_name() -> String {
    "dex-browser".to_string()
}

fn default_port_attempts() -> u16 {
    10
}

/// Plain HTTP API front-end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_http_port")]
    pub port: u16,

    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl HttpConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            host: default_host(),
            port: default_http_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

fn default_http_port() -> u16 {
    8001
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

/// Command bridge timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Deadline for an ordinary browser command.
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,

    /// Deadline for screenshots and DOM grabs.
    #[serde(default = "default_slow_call_timeout")]
    pub slow_call_timeout_secs: u64,

    /// Period of the overdue-call sweep.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_ms: u64,
}

impl BridgeConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn slow_call_timeout(&self) -> Duration {
        Duration::from_secs(self.slow_call_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            call_timeout_secs: default_call_timeout(),
            slow_call_timeout_secs: default_slow_call_timeout(),
            sweep_interval_ms: default_sweep_interval(),
        }
    }
}

fn default_call_timeout() -> u64 {
    30
}

fn default_slow_call_timeout() -> u64 {
    60
}

fn default_sweep_interval() -> u64 {
    1000
}

/// Browsing history data files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_contents_path")]
    pub contents_path: PathBuf,

    #[serde(default = "default_analytics_path")]
    pub analytics_path: PathBuf,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            contents_path: default_contents_path(),
            analytics_path: default_analytics_path(),
        }
    }
}

fn default_contents_path() -> PathBuf {
    PathBuf::from("data/contents.json")
}

fn default_analytics_path() -> PathBuf {
    PathBuf::from("data/browsing_analytics.json")
}

/// Shutdown behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// Upper bound on waiting for any single service to stop.
    #[serde(default = "default_grace_period")]
    pub grace_period_secs: u64,
}

impl ShutdownConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: default_grace_period(),
        }
    }
}

fn default_grace_period() -> u64 {
    5
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for rolling log files (defaults to ~/.dexbridge/logs).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
