//! Supervisor configuration

use std::path::PathBuf;
use std::time::Duration;

use protocol::DEFAULT_SERVER_PORT;

/// How often `/health` is polled during startup
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// How long the service gets to become ready
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(600);

/// How often child liveness is checked while running
pub const DEFAULT_MONITOR_INTERVAL: Duration = Duration::from_secs(1);

/// How long a child gets to exit after SIGTERM before SIGKILL
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Configuration for the process supervisor
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Base URL of the service's health endpoint
    pub server_url: String,

    /// Program to launch as the service process
    pub service_program: PathBuf,
    /// Arguments for the service process
    pub service_args: Vec<String>,

    /// Program to launch as the client process
    pub client_program: PathBuf,
    /// Arguments for the client process
    pub client_args: Vec<String>,

    /// Health poll interval during startup
    pub poll_interval: Duration,
    /// Readiness deadline for the service
    pub startup_timeout: Duration,
    /// Liveness check interval while running
    pub monitor_interval: Duration,
    /// Grace window between SIGTERM and SIGKILL
    pub grace_period: Duration,
}

impl SupervisorConfig {
    /// Configuration with default intervals for the given programs
    pub fn new(service_program: PathBuf, client_program: PathBuf) -> Self {
        Self {
            server_url: format!("http://localhost:{DEFAULT_SERVER_PORT}"),
            service_program,
            service_args: Vec::new(),
            client_program,
            client_args: Vec::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
            monitor_interval: DEFAULT_MONITOR_INTERVAL,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}
