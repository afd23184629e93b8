//! Process liveness checks.

#[cfg(not(unix))]
use tracing::warn;

/// Check if a process with the given PID is alive.
///
/// # Platform Behavior
/// - **Linux/macOS**: `kill(pid, 0)`; `EPERM` still means the process exists
/// - **Other**: not implemented, assumed alive
pub fn is_process_alive(pid: u32) -> bool {
    #[cfg(unix)]
    {
        use nix::errno::Errno;
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        let Ok(raw) = i32::try_from(pid) else {
            return false;
        };
        if raw <= 0 {
            return false;
        }

        match kill(Pid::from_raw(raw), None) {
            Ok(()) => true,
            Err(Errno::EPERM) => true,
            Err(_) => false,
        }
    }

    #[cfg(not(unix))]
    {
        warn!("Process alive check not implemented for this platform (pid {})", pid);
        true
    }
}
