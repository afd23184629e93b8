//! Centralized configuration for remote-control.
//!
//! Constants for the wire endpoint and client timeouts, plus the small value
//! types the controller, client and server share.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// RPC endpoint and transport defaults.
pub struct RpcConfig;

impl RpcConfig {
    pub const DEFAULT_HOST: &'static str = "localhost";
    pub const DEFAULT_PORT: u16 = 64042;
    pub const RPC_PATH: &'static str = "/jsonrpc";
    pub const HEALTH_PATH: &'static str = "/health";
    pub const JSONRPC_VERSION: &'static str = "2.0";
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
    /// In-flight requests the server processes at once.
    pub const MAX_CONCURRENT_CALLS: usize = 1;
}

/// Shared path defaults.
pub struct PathsConfig;

impl PathsConfig {
    pub const PID_FILE_NAME: &'static str = "remote-control.pid";

    /// Default PID file location inside the system temp directory.
    pub fn default_pid_file() -> PathBuf {
        std::env::temp_dir().join(Self::PID_FILE_NAME)
    }
}

/// Where the daemon listens and where callers connect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub host: String,
    pub port: u16,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            host: RpcConfig::DEFAULT_HOST.to_string(),
            port: RpcConfig::DEFAULT_PORT,
        }
    }
}

impl EndpointConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// URL of the JSON-RPC endpoint, e.g. `http://localhost:64042/jsonrpc`.
    pub fn rpc_url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, RpcConfig::RPC_PATH)
    }
}

/// Timeouts applied by the RPC client. Both count as "unreachable" when hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: RpcConfig::CONNECT_TIMEOUT,
            request_timeout: RpcConfig::REQUEST_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Use the same bound for connecting and for the whole request.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            connect_timeout: timeout,
            request_timeout: timeout,
        }
    }

    /// Bound the whole request by `timeout`, keeping the default connect timeout.
    pub fn with_request_timeout(timeout: Duration) -> Self {
        Self {
            request_timeout: timeout,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_timeout_keeps_connect_default() {
        let config = ClientConfig::with_request_timeout(Duration::from_secs(30));
        assert_eq!(config.connect_timeout, RpcConfig::CONNECT_TIMEOUT);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_endpoint_defaults() {
        let endpoint = EndpointConfig::default();
        assert_eq!(endpoint.host, "localhost");
        assert_eq!(endpoint.port, 64042);
        assert_eq!(endpoint.rpc_url(), "http://localhost:64042/jsonrpc");
    }

    #[test]
    fn test_endpoint_partial_deserialize_fills_defaults() {
        let endpoint: EndpointConfig = serde_json::from_str(r#"{"port": 9000}"#).unwrap();
        assert_eq!(endpoint.host, "localhost");
        assert_eq!(endpoint.port, 9000);
    }

    #[test]
    fn test_default_pid_file_in_temp_dir() {
        let path = PathsConfig::default_pid_file();
        assert!(path.starts_with(std::env::temp_dir()));
        assert!(path.ends_with("remote-control.pid"));
    }
}
