//! Server wiring: logging, the bridge, its endpoint and the front-ends.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use dexbridge_api::{ApiServer, ApiState};
use dexbridge_bridge::{CommandBridge, ConnectionEndpoint};
use dexbridge_config::{Config, ConfigLoader, LoggingConfig};
use dexbridge_daemon::{LifecycleCoordinator, ShutdownReport, SignalHandler};
use dexbridge_mcp::{McpHandler, McpServer, ServerInfo, bind_with_fallback};
use dexbridge_tools::{CallTimeouts, CatalogueOptions, default_registry};

/// Log files kept before the oldest is removed.
const MAX_LOG_FILES: usize = 14;

/// `~/.dexbridge`, or the working directory when there is no home.
pub(crate) fn dexbridge_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".dexbridge")
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(ConfigLoader::expand_path(&path.to_string_lossy()))
}

/// Initialize tracing with console and file output.
///
/// Log files rotate daily under `logging.dir`, or `~/.dexbridge/logs`.
pub(crate) fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = logging
        .dir
        .as_deref()
        .map(expand)
        .unwrap_or_else(|| dexbridge_dir().join("logs"));
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("dexbridge")
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Keeps the writer thread flushing for the life of the process.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

fn catalogue_options(config: &Config) -> CatalogueOptions {
    CatalogueOptions {
        timeouts: CallTimeouts {
            default: config.bridge.call_timeout(),
            slow: config.bridge.slow_call_timeout(),
        },
        contents_path: expand(&config.history.contents_path),
        analytics_path: expand(&config.history.analytics_path),
    }
}

/// Run until a shutdown signal, then shut down in order.
///
/// Every listener is bound before anything is served, so a taken port fails
/// startup instead of leaving a half-running process.
pub(crate) async fn run_server(config: Config) -> Result<ShutdownReport, Box<dyn std::error::Error>> {
    info!("Starting dexbridge v{}", env!("CARGO_PKG_VERSION"));

    let bridge = Arc::new(CommandBridge::new(config.bridge.call_timeout()));
    let options = catalogue_options(&config);
    let registry = Arc::new(default_registry(bridge.clone(), options.clone())?);
    info!(tools = registry.len(), "Tool catalogue ready");

    let endpoint_addr = config.endpoint.address();
    let endpoint_listener = TcpListener::bind(&endpoint_addr)
        .await
        .map_err(|e| format!("Failed to bind extension endpoint {}: {}", endpoint_addr, e))?;

    let mcp_listener = if config.mcp.enabled {
        let listener =
            bind_with_fallback(&config.mcp.host, config.mcp.port, config.mcp.port_attempts)
                .await
                .map_err(|e| format!("Failed to bind MCP server {}: {}", config.mcp.address(), e))?;
        Some(listener)
    } else {
        info!("MCP server disabled");
        None
    };

    let http_listener = if config.http.enabled {
        let addr = config.http.address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| format!("Failed to bind HTTP API {}: {}", addr, e))?;
        Some(listener)
    } else {
        info!("HTTP API disabled");
        None
    };

    let signals = SignalHandler::new();
    signals.setup_os_signals()?;

    let mut coordinator = LifecycleCoordinator::new(bridge.clone(), config.shutdown.grace_period());

    let endpoint = ConnectionEndpoint::new(
        bridge.clone(),
        config.endpoint.path.clone(),
        config.bridge.sweep_interval(),
    );
    coordinator.start_endpoint(move |token| endpoint.serve(endpoint_listener, token));

    if let Some(listener) = mcp_listener {
        let info = ServerInfo {
            name: config.mcp.name.clone(),
            ..ServerInfo::default()
        };
        let server = McpServer::new(Arc::new(McpHandler::new(registry.clone(), info)));
        coordinator.start_frontend("mcp", move |token| server.serve(listener, token))?;
    }

    if let Some(listener) = http_listener {
        let state = Arc::new(ApiState::new(
            bridge.clone(),
            registry,
            options.analytics_path,
        ));
        let server = ApiServer::new(state, config.http.cors_origins.clone());
        coordinator.start_frontend("http", move |token| server.serve(listener, token))?;
    }

    info!(services = ?coordinator.service_names(), "dexbridge running");
    let reason = coordinator.wait_for_stop(&signals).await;
    info!(?reason, "Stopping");

    tokio::select! {
        report = coordinator.shutdown() => Ok(report),
        () = signals.wait_for_terminate() => {
            warn!("Forced exit requested during shutdown");
            Err("Shutdown interrupted by a second signal".into())
        }
    }
}
