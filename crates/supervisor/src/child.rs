//! Managed child process records

use tokio::process::Child;

/// Which managed process a record tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildRole {
    Service,
    Client,
}

impl ChildRole {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ChildRole::Service => "service",
            ChildRole::Client => "client",
        }
    }
}

impl std::fmt::Display for ChildRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a managed child
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChildState {
    #[default]
    NotStarted,
    Starting,
    Ready,
    Running,
    Stopping,
    Stopped,
    Crashed,
}

/// One supervised child process
///
/// Owned exclusively by the supervisor; the handle dies with it
/// (`kill_on_drop` is set at spawn, so an aborted supervisor does not leave
/// orphans).
pub struct ChildRecord {
    pub(crate) role: ChildRole,
    pub(crate) state: ChildState,
    pub(crate) child: Option<Child>,
}

impl ChildRecord {
    pub(crate) fn new(role: ChildRole) -> Self {
        Self {
            role,
            state: ChildState::NotStarted,
            child: None,
        }
    }

    /// The role this record tracks
    pub fn role(&self) -> ChildRole {
        self.role
    }

    /// Current lifecycle state
    pub fn state(&self) -> ChildState {
        self.state
    }

    /// OS pid, while the process is attached and running
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(|c| c.id())
    }

    pub(crate) fn attach(&mut self, child: Child, state: ChildState) {
        self.child = Some(child);
        self.state = state;
    }

    /// Whether the process has exited (non-blocking)
    pub fn has_exited(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(Some(_))),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_not_started() {
        let record = ChildRecord::new(ChildRole::Client);
        assert_eq!(record.state(), ChildState::NotStarted);
        assert_eq!(record.pid(), None);
    }

    #[tokio::test]
    async fn test_has_exited_tracks_the_process() {
        let mut record = ChildRecord::new(ChildRole::Service);
        assert!(!record.has_exited());

        let child = tokio::process::Command::new("true")
            .kill_on_drop(true)
            .spawn()
            .unwrap();
        record.attach(child, ChildState::Starting);

        // Give the process a moment to finish
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert!(record.has_exited());
    }
}
