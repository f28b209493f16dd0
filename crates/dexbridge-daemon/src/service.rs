//! Handles for spawned, cancellable services.

use std::future::Future;
use std::io;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::error::DaemonError;

/// A served component running on its own task.
///
/// The task receives a child of the parent token and is expected to return
/// once that token is cancelled.
pub struct ServiceHandle {
    name: String,
    token: CancellationToken,
    exited: CancellationToken,
    task: JoinHandle<Result<(), DaemonError>>,
}

impl ServiceHandle {
    pub fn spawn<F, Fut>(name: impl Into<String>, parent: &CancellationToken, run: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = io::Result<()>> + Send + 'static,
    {
        let name = name.into();
        let token = parent.child_token();
        let exited = CancellationToken::new();

        let fut = run(token.clone());
        let task = {
            let name = name.clone();
            let exited = exited.clone();
            tokio::spawn(async move {
                let _exited = exited.drop_guard();
                let result = fut.await;
                match &result {
                    Ok(()) => debug!(service = %name, "Service exited"),
                    Err(e) => error!(service = %name, error = %e, "Service failed"),
                }
                result.map_err(|e| DaemonError::ServiceFailed {
                    service: name,
                    reason: e.to_string(),
                })
            })
        };

        Self {
            name,
            token,
            exited,
            task,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Resolves when the service task ends, for whatever reason.
    pub async fn exited(&self) {
        self.exited.cancelled().await;
    }

    /// Cancel the service and wait up to `grace` for it to finish. A service
    /// still running after the grace period is aborted.
    pub async fn stop(mut self, grace: Duration) -> Result<(), DaemonError> {
        self.token.cancel();
        match tokio::time::timeout(grace, &mut self.task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(DaemonError::ServiceAborted {
                service: self.name,
                reason: join_err.to_string(),
            }),
            Err(_) => {
                warn!(service = %self.name, ?grace, "Service did not stop in time, aborting");
                self.task.abort();
                Err(DaemonError::StopTimeout {
                    service: self.name,
                    grace,
                })
            }
        }
    }
}
