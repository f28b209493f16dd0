//! Signal handling.
//!
//! The first SIGTERM/SIGINT requests a graceful shutdown. Any further signal
//! while that shutdown runs is escalated to [`DaemonSignal::Terminate`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::error::DaemonError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonSignal {
    /// Graceful shutdown (first SIGTERM or SIGINT).
    Shutdown,
    /// Stop waiting for a graceful shutdown and exit now.
    Terminate,
}

impl std::fmt::Display for DaemonSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DaemonSignal::Shutdown => write!(f, "SHUTDOWN"),
            DaemonSignal::Terminate => write!(f, "TERMINATE"),
        }
    }
}

#[derive(Clone)]
pub struct SignalHandler {
    sender: broadcast::Sender<DaemonSignal>,
    shutdown_requested: Arc<AtomicBool>,
    terminate_requested: Arc<AtomicBool>,
}

impl SignalHandler {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(16);
        Self {
            sender,
            shutdown_requested: Arc::new(AtomicBool::new(false)),
            terminate_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DaemonSignal> {
        self.sender.subscribe()
    }

    pub fn send(&self, signal: DaemonSignal) {
        debug!("Sending signal: {}", signal);
        match signal {
            DaemonSignal::Shutdown => self.shutdown_requested.store(true, Ordering::SeqCst),
            DaemonSignal::Terminate => {
                self.shutdown_requested.store(true, Ordering::SeqCst);
                self.terminate_requested.store(true, Ordering::SeqCst);
            }
        }
        let _ = self.sender.send(signal);
    }

    pub fn request_shutdown(&self) {
        self.send(DaemonSignal::Shutdown);
    }

    /// Handle an OS signal: the first one shuts down, later ones terminate.
    pub fn escalate(&self) {
        if self.is_shutdown_requested() {
            warn!("Second signal received, forcing exit");
            self.send(DaemonSignal::Terminate);
        } else {
            self.request_shutdown();
        }
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }

    pub fn is_terminate_requested(&self) -> bool {
        self.terminate_requested.load(Ordering::SeqCst)
    }

    /// Resolve once shutdown has been requested, including before this call.
    pub async fn wait_for_shutdown(&self) -> DaemonSignal {
        self.wait_for(|_| true, Self::is_shutdown_requested).await
    }

    /// Resolve once a forced exit has been requested.
    pub async fn wait_for_terminate(&self) {
        self.wait_for(|s| s == DaemonSignal::Terminate, Self::is_terminate_requested)
            .await;
    }

    async fn wait_for(
        &self,
        accept: impl Fn(DaemonSignal) -> bool,
        already: impl Fn(&Self) -> bool,
    ) -> DaemonSignal {
        // Subscribe before checking the flag so a signal in between is seen.
        let mut rx = self.subscribe();
        if already(self) {
            return if self.is_terminate_requested() {
                DaemonSignal::Terminate
            } else {
                DaemonSignal::Shutdown
            };
        }
        loop {
            match rx.recv().await {
                Ok(signal) if accept(signal) => return signal,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => std::future::pending().await,
            }
        }
    }

    /// Listen for SIGTERM and SIGINT.
    #[cfg(unix)]
    pub fn setup_os_signals(&self) -> Result<(), DaemonError> {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm =
            signal(SignalKind::terminate()).map_err(|e| DaemonError::SignalSetup(e.to_string()))?;
        let mut sigint =
            signal(SignalKind::interrupt()).map_err(|e| DaemonError::SignalSetup(e.to_string()))?;

        let handler = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(()) = sigterm.recv() => info!("Received SIGTERM"),
                    Some(()) = sigint.recv() => info!("Received SIGINT"),
                    else => break,
                }
                handler.escalate();
            }
        });

        info!("OS signal handlers installed (SIGTERM, SIGINT)");
        Ok(())
    }

    /// Listen for Ctrl+C (non-Unix fallback).
    #[cfg(not(unix))]
    pub fn setup_os_signals(&self) -> Result<(), DaemonError> {
        let handler = self.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                info!("Received Ctrl+C");
                handler.escalate();
            }
        });

        info!("OS signal handlers installed (Ctrl+C only)");
        Ok(())
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}
