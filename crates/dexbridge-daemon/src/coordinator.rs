//! Ordered startup and shutdown of the bridge and its front-ends.

use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use dexbridge_bridge::{BridgeError, CommandBridge};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::DaemonError;
use crate::report::ShutdownReport;
use crate::service::ServiceHandle;
use crate::signal::{DaemonSignal, SignalHandler};

pub const ENDPOINT_SERVICE: &str = "endpoint";

/// Why the coordinator stopped waiting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    Signal(DaemonSignal),
    /// A service ended on its own.
    ServiceExited(String),
}

/// Owns every served component and the order they stop in.
///
/// Startup: the connection endpoint first, then front-ends. Shutdown stops
/// new calls, drains outstanding calls, closes the endpoint, and finally
/// stops the front-ends. Every step runs even when an earlier one fails.
pub struct LifecycleCoordinator {
    bridge: Arc<CommandBridge>,
    root: CancellationToken,
    grace: Duration,
    endpoint: Option<ServiceHandle>,
    frontends: Vec<ServiceHandle>,
}

impl LifecycleCoordinator {
    pub fn new(bridge: Arc<CommandBridge>, grace: Duration) -> Self {
        Self {
            bridge,
            root: CancellationToken::new(),
            grace,
            endpoint: None,
            frontends: Vec::new(),
        }
    }

    /// Parent of every service token.
    pub fn token(&self) -> &CancellationToken {
        &self.root
    }

    pub fn bridge(&self) -> &Arc<CommandBridge> {
        &self.bridge
    }

    pub fn service_names(&self) -> Vec<&str> {
        self.services().map(ServiceHandle::name).collect()
    }

    fn services(&self) -> impl Iterator<Item = &ServiceHandle> {
        self.endpoint.iter().chain(self.frontends.iter())
    }

    pub fn start_endpoint<F, Fut>(&mut self, run: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = io::Result<()>> + Send + 'static,
    {
        info!("Starting connection endpoint");
        self.endpoint = Some(ServiceHandle::spawn(ENDPOINT_SERVICE, &self.root, run));
    }

    /// Start a front-end. The endpoint must already be running.
    pub fn start_frontend<F, Fut>(&mut self, name: &str, run: F) -> Result<(), DaemonError>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = io::Result<()>> + Send + 'static,
    {
        if self.endpoint.is_none() {
            return Err(DaemonError::EndpointNotStarted(name.to_string()));
        }
        info!(frontend = name, "Starting front-end");
        self.frontends
            .push(ServiceHandle::spawn(name, &self.root, run));
        Ok(())
    }

    /// Wait for a shutdown signal or for any service to end by itself.
    pub async fn wait_for_stop(&self, signals: &SignalHandler) -> StopReason {
        let mut exits: FuturesUnordered<_> = self
            .services()
            .map(|s| async move {
                s.exited().await;
                s.name().to_string()
            })
            .collect();

        tokio::select! {
            signal = signals.wait_for_shutdown() => StopReason::Signal(signal),
            Some(name) = exits.next() => {
                warn!(service = %name, "Service exited unexpectedly");
                StopReason::ServiceExited(name)
            }
        }
    }

    /// Run the shutdown sequence and report every step.
    pub async fn shutdown(mut self) -> ShutdownReport {
        info!("Shutting down");
        let mut report = ShutdownReport::new();

        self.bridge.begin_shutdown();
        report.record_ok("stop accepting calls", "bridge draining");

        let drained = self.bridge.drain(BridgeError::ShuttingDown);
        report.set_drained_calls(drained);
        report.record_ok("drain outstanding calls", format!("{} calls failed", drained));

        let orphaned = self.bridge.close_connection();
        debug!(orphaned, "Closed extension connection");
        match self.endpoint.take() {
            Some(endpoint) => {
                let result = endpoint.stop(self.grace).await;
                report.record("close connection endpoint", result);
            }
            None => report.record_ok("close connection endpoint", "not started"),
        }

        for frontend in self.frontends.drain(..) {
            let step = format!("stop {}", frontend.name());
            let result = frontend.stop(self.grace).await;
            report.record(step, result);
        }

        self.root.cancel();

        if report.is_clean() {
            info!(drained = report.drained_calls(), "Shutdown complete");
        } else {
            for (step, error) in report.failures() {
                warn!(step, %error, "Shutdown step failed");
            }
        }
        report
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
