//! CLI definitions for dexbridge.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use dexbridge_config::Config;

/// Used when `--config` is not given. A missing file here means defaults.
pub(crate) const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// dexbridge CLI.
#[derive(Parser)]
#[command(name = "dexbridge")]
#[command(about = "Command bridge between AI agents and a browser extension")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "DEXBRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the bridge and its front-ends in the foreground (default)
    Run(RunArgs),

    /// Check the configuration and exit
    Validate,
}

#[derive(Args, Debug, Default, Clone)]
pub(crate) struct RunArgs {
    /// Port the browser extension connects to
    #[arg(long)]
    pub endpoint_port: Option<u16>,

    /// MCP server port
    #[arg(long)]
    pub mcp_port: Option<u16>,

    /// HTTP API port
    #[arg(long)]
    pub http_port: Option<u16>,
}

impl RunArgs {
    /// Apply command-line overrides on top of the file configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(port) = self.endpoint_port {
            config.endpoint.port = port;
        }
        if let Some(port) = self.mcp_port {
            config.mcp.port = port;
        }
        if let Some(port) = self.http_port {
            config.http.port = port;
        }
    }
}
