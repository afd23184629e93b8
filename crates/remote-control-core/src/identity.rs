//! Process identity: is this process the daemon, or a caller?

use crate::error::Result;
use crate::platform::{is_process_alive, PidFile};
use tracing::{debug, warn};

/// The daemon's recorded PID next to the PID of the process asking.
///
/// Equality of the two is the only routing decision in the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessIdentity {
    /// PID recorded for the running daemon, `None` when nothing is recorded.
    pub daemon_pid: Option<u32>,
    /// PID of the process that resolved this identity.
    pub caller_pid: u32,
}

impl ProcessIdentity {
    pub fn new(daemon_pid: Option<u32>, caller_pid: u32) -> Self {
        Self {
            daemon_pid,
            caller_pid,
        }
    }

    /// Identity of a process that is itself the daemon.
    pub fn current_daemon() -> Self {
        let pid = std::process::id();
        Self::new(Some(pid), pid)
    }

    /// Read the daemon PID from `pid_file` and pair it with the current PID.
    ///
    /// A missing PID file resolves to "not the daemon". A recorded PID whose
    /// process is gone is kept (calls will come back unreachable) and logged.
    pub fn resolve(pid_file: &PidFile) -> Result<Self> {
        let daemon_pid = pid_file.read()?;
        let identity = Self::new(daemon_pid, std::process::id());

        match daemon_pid {
            None => debug!(
                "No daemon PID recorded in {}",
                pid_file.path().display()
            ),
            Some(pid) if !identity.is_local() && !is_process_alive(pid) => warn!(
                "PID file {} records PID {} which is not running",
                pid_file.path().display(),
                pid
            ),
            Some(_) => {}
        }

        Ok(identity)
    }

    /// True when the caller is the daemon process.
    pub fn is_local(&self) -> bool {
        self.daemon_pid == Some(self.caller_pid)
    }

    /// `"daemon"` or `"cli"`, for log lines.
    pub fn side(&self) -> &'static str {
        if self.is_local() {
            "daemon"
        } else {
            "cli"
        }
    }
}
