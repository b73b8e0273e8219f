//! Supervisor implementation

use std::time::{Duration, Instant};

use edit_client::EditClient;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::process::Command;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::child::{ChildRecord, ChildRole, ChildState};
use crate::{SupervisorConfig, SupervisorError};

/// Supervises the edit server and the web UI that depends on it
///
/// One record per child; records live and die with the supervisor. Shutdown
/// terminates the client before the service: the client depends on the
/// service, not vice versa, so this avoids orphaned in-flight requests
/// against a dying server.
pub struct Supervisor {
    config: SupervisorConfig,
    health: EditClient,
    service: ChildRecord,
    client: ChildRecord,
    shutting_down: bool,
}

impl Supervisor {
    /// Create a supervisor; nothing is spawned yet
    pub fn new(config: SupervisorConfig) -> Self {
        let health = EditClient::new(config.server_url.clone());
        Self {
            config,
            health,
            service: ChildRecord::new(ChildRole::Service),
            client: ChildRecord::new(ChildRole::Client),
            shutting_down: false,
        }
    }

    /// State of the service record
    pub fn service_state(&self) -> ChildState {
        self.service.state()
    }

    /// State of the client record
    pub fn client_state(&self) -> ChildState {
        self.client.state()
    }

    /// Launch the service process
    pub fn spawn_service(&mut self) -> Result<(), SupervisorError> {
        self.service.state = ChildState::Starting;
        let child = Command::new(&self.config.service_program)
            .args(&self.config.service_args)
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SupervisorError::Spawn {
                role: ChildRole::Service,
                source,
            })?;

        info!("service started (pid {:?})", child.id());
        self.service.attach(child, ChildState::Starting);
        Ok(())
    }

    /// Poll `/health` until the service reports ready
    ///
    /// Fails fast if the service process dies while starting; fails with
    /// `StartupTimeout` when the deadline passes, leaving the record in
    /// `Starting`. The client must not be spawned after either outcome.
    pub async fn await_ready(&mut self) -> Result<(), SupervisorError> {
        let deadline = Instant::now() + self.config.startup_timeout;
        info!("waiting for server to load model...");

        loop {
            if self.service.has_exited() {
                self.service.state = ChildState::Crashed;
                return Err(SupervisorError::ServiceExited);
            }

            if let Some(health) = self.health.health().await {
                if health.ready {
                    self.service.state = ChildState::Ready;
                    info!("server is ready");
                    return Ok(());
                }
            }

            if Instant::now() >= deadline {
                warn!(
                    "server not ready after {:?}",
                    self.config.startup_timeout
                );
                return Err(SupervisorError::StartupTimeout(self.config.startup_timeout));
            }

            sleep(self.config.poll_interval).await;
        }
    }

    /// Launch the client process; requires a ready service
    pub fn spawn_client(&mut self) -> Result<(), SupervisorError> {
        if self.service.state() != ChildState::Ready {
            return Err(SupervisorError::ServiceNotReady);
        }

        self.client.state = ChildState::Starting;
        let child = Command::new(&self.config.client_program)
            .args(&self.config.client_args)
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SupervisorError::Spawn {
                role: ChildRole::Client,
                source,
            })?;

        info!("client started (pid {:?})", child.id());
        self.client.attach(child, ChildState::Running);
        self.service.state = ChildState::Running;
        Ok(())
    }

    /// Liveness loop over both children
    ///
    /// Returns when one of them exits unexpectedly, after marking it
    /// `Crashed` and tearing down its sibling.
    pub async fn monitor(&mut self) -> Result<(), SupervisorError> {
        loop {
            sleep(self.config.monitor_interval).await;
            if let Some(role) = self.reap_crashed() {
                warn!("{role} process exited unexpectedly");
                self.shutdown().await;
                return Err(SupervisorError::Crash { role });
            }
        }
    }

    /// Monitor both children, racing against an interrupt signal
    ///
    /// `Ok` after an operator interrupt, `Err` after a child crash. Either
    /// way both children are down when this returns.
    pub async fn run(&mut self) -> Result<(), SupervisorError> {
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupt received, stopping all services");
                    self.shutdown().await;
                    return Ok(());
                }
                _ = sleep(self.config.monitor_interval) => {}
            }

            if let Some(role) = self.reap_crashed() {
                warn!("{role} process exited unexpectedly");
                self.shutdown().await;
                return Err(SupervisorError::Crash { role });
            }
        }
    }

    fn reap_crashed(&mut self) -> Option<ChildRole> {
        if self.service.state() == ChildState::Running && self.service.has_exited() {
            self.service.state = ChildState::Crashed;
            return Some(ChildRole::Service);
        }
        if self.client.state() == ChildState::Running && self.client.has_exited() {
            self.client.state = ChildState::Crashed;
            return Some(ChildRole::Client);
        }
        None
    }

    /// Tear down both children: client first, then service
    ///
    /// Idempotent: a second call during shutdown is a no-op. Records end in
    /// `Stopped`, or stay `Crashed` if the process had already exited on its
    /// own.
    pub async fn shutdown(&mut self) {
        if self.shutting_down {
            return;
        }
        self.shutting_down = true;

        info!("stopping all services");
        Self::terminate(&mut self.client, self.config.grace_period).await;
        Self::terminate(&mut self.service, self.config.grace_period).await;
        info!("all services stopped");
    }

    /// SIGTERM, wait out the grace period, then SIGKILL
    async fn terminate(record: &mut ChildRecord, grace: Duration) {
        if !matches!(
            record.state(),
            ChildState::Starting | ChildState::Ready | ChildState::Running
        ) {
            return;
        }

        if record.has_exited() {
            record.state = ChildState::Stopped;
            return;
        }

        let role = record.role();
        record.state = ChildState::Stopping;

        if let Some(pid) = record.pid() {
            debug!("sending SIGTERM to {role} (pid {pid})");
            // ESRCH just means it beat us to exiting
            let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
        }

        if let Some(child) = record.child.as_mut() {
            match timeout(grace, child.wait()).await {
                Ok(_) => debug!("{role} exited gracefully"),
                Err(_) => {
                    warn!("{role} did not exit within {grace:?}, killing");
                    let _ = child.kill().await;
                }
            }
        }

        record.state = ChildState::Stopped;
    }
}
