//! Error types for remote-control.
//!
//! Errors raised by method handlers, by the PID-file layer and by the wire
//! codec all live here. Daemon-side errors are converted to JSON-RPC error
//! objects with [`RemoteControlError::to_rpc_error_code`] before they leave the
//! process.

use crate::rpc::protocol::error_codes;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for remote-control.
#[derive(Debug, Error)]
pub enum RemoteControlError {
    // Dispatch errors
    #[error("Method not found: {method}")]
    MethodNotFound { method: String },

    #[error("Invalid params: {message}")]
    InvalidParams { message: String },

    #[error("Method '{method}' failed: {message}")]
    Handler { method: String, message: String },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("PID file {path:?}: {message}")]
    PidFile { path: PathBuf, message: String },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for remote-control operations.
pub type Result<T> = std::result::Result<T, RemoteControlError>;

impl From<std::io::Error> for RemoteControlError {
    fn from(err: std::io::Error) -> Self {
        RemoteControlError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for RemoteControlError {
    fn from(err: serde_json::Error) -> Self {
        RemoteControlError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl RemoteControlError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        RemoteControlError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Shorthand for a handler failure carrying a plain message.
    pub fn handler(method: impl Into<String>, message: impl Into<String>) -> Self {
        RemoteControlError::Handler {
            method: method.into(),
            message: message.into(),
        }
    }

    /// Convert to a JSON-RPC error code.
    ///
    /// - -32700: Parse error (malformed JSON)
    /// - -32601: Method not found
    /// - -32602: Invalid params
    /// - -32603: Internal error (everything a handler raises otherwise)
    pub fn to_rpc_error_code(&self) -> i32 {
        match self {
            RemoteControlError::MethodNotFound { .. } => error_codes::METHOD_NOT_FOUND,
            RemoteControlError::InvalidParams { .. } => error_codes::INVALID_PARAMS,
            RemoteControlError::Json { .. } => error_codes::PARSE_ERROR,
            _ => error_codes::INTERNAL_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RemoteControlError::MethodNotFound {
            method: "reload".into(),
        };
        assert_eq!(err.to_string(), "Method not found: reload");

        let err = RemoteControlError::handler("reload", "config missing");
        assert_eq!(err.to_string(), "Method 'reload' failed: config missing");
    }

    #[test]
    fn test_rpc_error_codes() {
        assert_eq!(
            RemoteControlError::MethodNotFound {
                method: "nope".into()
            }
            .to_rpc_error_code(),
            -32601
        );
        assert_eq!(
            RemoteControlError::InvalidParams {
                message: "param1 is required".into()
            }
            .to_rpc_error_code(),
            -32602
        );
        assert_eq!(
            RemoteControlError::Other("boom".into()).to_rpc_error_code(),
            -32603
        );
    }

    #[test]
    fn test_json_error_maps_to_parse_error() {
        let err: RemoteControlError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert_eq!(err.to_rpc_error_code(), -32700);
    }
}
