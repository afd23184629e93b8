//! Platform layer: PID files and process liveness.
//!
//! All `#[cfg]` blocks for OS-specific behavior live here.

pub mod pid_file;
pub mod process;

pub use pid_file::PidFile;
pub use process::is_process_alive;
