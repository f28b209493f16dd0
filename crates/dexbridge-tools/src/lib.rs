//! Tool catalogue for dexbridge.
//!
//! Browser tools translate typed parameters into a single bridge call and
//! render the extension's reply as text. History tools run locally against
//! the exported browsing history and never touch the bridge.

pub mod analytics;
pub mod browser;
pub mod command;
mod error;
pub mod history;
pub mod interests;
mod registry;
pub mod tool;

pub use browser::CallTimeouts;
pub use error::ToolError;
pub use registry::ToolRegistry;
pub use tool::{Tool, ToolContext, ToolDefinition, ToolResult};

use std::path::PathBuf;
use std::sync::Arc;

use dexbridge_bridge::CommandBridge;

/// Paths and timeouts the default catalogue is built from.
#[derive(Debug, Clone)]
pub struct CatalogueOptions {
    pub timeouts: CallTimeouts,
    pub contents_path: PathBuf,
    pub analytics_path: PathBuf,
}

/// Build the registry with every browser and history tool.
pub fn default_registry(
    bridge: Arc<CommandBridge>,
    options: CatalogueOptions,
) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();

    for kind in command::CommandKind::ALL {
        registry.register(Arc::new(browser::BrowserTool::new(
            *kind,
            bridge.clone(),
            options.timeouts,
        )))?;
    }

    let store: Arc<dyn history::HistoryStore> =
        Arc::new(history::JsonHistoryStore::new(options.contents_path));
    let generator: Arc<dyn analytics::AnalyticsGenerator> =
        Arc::new(analytics::HistoryAnalytics::new(store.clone()));

    registry.register(Arc::new(history::QueryHistoryTool::new(store.clone())))?;
    registry.register(Arc::new(analytics::AnalyticsTool::new(
        generator,
        options.analytics_path,
    )))?;
    registry.register(Arc::new(interests::TopInterestsTool::new(store)))?;

    Ok(registry)
}
