//! Application state.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dexbridge_bridge::CommandBridge;
use dexbridge_tools::ToolRegistry;

/// State shared across handlers.
pub struct ApiState {
    pub bridge: Arc<CommandBridge>,
    pub registry: Arc<ToolRegistry>,
    analytics_path: PathBuf,
    start_time: Instant,
    request_count: AtomicU64,
}

impl ApiState {
    pub fn new(
        bridge: Arc<CommandBridge>,
        registry: Arc<ToolRegistry>,
        analytics_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            bridge,
            registry,
            analytics_path: analytics_path.into(),
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
        }
    }

    /// Where the analytics generator writes its summary.
    pub fn analytics_path(&self) -> &Path {
        &self.analytics_path
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    pub fn increment_requests(&self) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ApiState {
        ApiState::new(
            Arc::new(CommandBridge::new(Duration::from_secs(1))),
            Arc::new(ToolRegistry::new()),
            "/tmp/analytics.json",
        )
    }

    #[test]
    fn test_request_count() {
        let state = state();
        assert_eq!(state.request_count(), 0);
        state.increment_requests();
        state.increment_requests();
        assert_eq!(state.request_count(), 2);
    }

    #[test]
    fn test_analytics_path() {
        assert_eq!(state().analytics_path(), Path::new("/tmp/analytics.json"));
    }
}
