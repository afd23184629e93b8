//! PID file handling.
//!
//! The daemon records its PID here when it starts serving; every other
//! process reads it back to decide whether it is the daemon.

use crate::error::{RemoteControlError, Result};
use crate::platform::process::is_process_alive;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A PID file at a fixed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record the current process as the daemon.
    pub fn write_current(&self) -> Result<u32> {
        let pid = std::process::id();
        self.write(pid)?;
        Ok(pid)
    }

    /// Write `pid`, creating parent directories as needed.
    pub fn write(&self, pid: u32) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|e| RemoteControlError::io_with_path(e, parent))?;
            }
        }
        fs::write(&self.path, format!("{}\n", pid))
            .map_err(|e| RemoteControlError::io_with_path(e, &self.path))?;
        info!(pid, path = %self.path.display(), "PID file written");
        Ok(())
    }

    /// Read the recorded PID.
    ///
    /// Returns `Ok(None)` if there is no PID file. A file that exists but does
    /// not hold a PID is an error.
    pub fn read(&self) -> Result<Option<u32>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(RemoteControlError::io_with_path(e, &self.path)),
        };

        contents
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|e| RemoteControlError::PidFile {
                path: self.path.clone(),
                message: format!("invalid PID {:?}: {}", contents.trim(), e),
            })
    }

    /// Remove the file. Missing files are not an error.
    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Removed PID file {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RemoteControlError::io_with_path(e, &self.path)),
        }
    }

    /// True when the file holds the PID of a live process.
    pub fn is_running(&self) -> bool {
        matches!(self.read(), Ok(Some(pid)) if is_process_alive(pid))
    }
}
