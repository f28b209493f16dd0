//! # dexbridge daemon
//!
//! Process lifecycle for the bridge:
//!
//! - Signal handling (SIGTERM/SIGINT request a graceful shutdown, a second
//!   signal forces exit)
//! - Service handles for every served component
//! - Ordered startup and an ordered, exhaustive shutdown whose outcome is
//!   collected in a [`ShutdownReport`]

pub mod coordinator;
pub mod error;
pub mod report;
pub mod service;
pub mod signal;

pub use coordinator::{LifecycleCoordinator, StopReason};
pub use error::DaemonError;
pub use report::{ShutdownReport, StepOutcome};
pub use service::ServiceHandle;
pub use signal::{DaemonSignal, SignalHandler};
