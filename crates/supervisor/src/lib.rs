//! Process Supervisor
//!
//! Owns the lifecycle of the two managed processes: the edit server and the
//! web UI that depends on it. Spawn, poll-until-ready, liveness monitoring
//! and coordinated shutdown with graceful-terminate escalation.

mod child;
mod config;
mod supervisor;

pub use child::{ChildRecord, ChildRole, ChildState};
pub use config::SupervisorConfig;
pub use supervisor::Supervisor;

use std::time::Duration;

use thiserror::Error;

/// Errors from process orchestration
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// A child process could not be launched
    #[error("failed to spawn {role} process: {source}")]
    Spawn {
        role: ChildRole,
        source: std::io::Error,
    },

    /// The service never reported ready within the allotted window
    #[error("server not ready after {0:?}")]
    StartupTimeout(Duration),

    /// The service process died while we were waiting for readiness
    #[error("service process exited during startup")]
    ServiceExited,

    /// The client may only be started against a ready service
    #[error("cannot start client: service is not ready")]
    ServiceNotReady,

    /// A supervised child exited unexpectedly while running
    #[error("{role} process exited unexpectedly")]
    Crash { role: ChildRole },
}
