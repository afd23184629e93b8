//! HTTP JSON-RPC client for talking to a running daemon.
//!
//! Connection failures never surface as errors: they come back as
//! [`RemoteReply::Unreachable`] so interactive callers keep a simple contract.

use super::protocol::{error_codes, ResponsePayload, RpcErrorObject, RpcRequest, RpcResponse};
use crate::config::{ClientConfig, EndpointConfig};
use crate::error::{RemoteControlError, Result};
use crate::registry::Params;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// What came back from one remote call.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteReply {
    /// The daemon ran the method and returned this value.
    Result(Value),
    /// The daemon reported an error, or its reply could not be decoded.
    Error(RpcErrorObject),
    /// The daemon could not be reached (refused, timed out, reset).
    Unreachable(String),
}

/// JSON-RPC client bound to one daemon endpoint.
#[derive(Debug)]
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Build a client for `endpoint` with the given timeouts.
    pub fn new(endpoint: &EndpointConfig, config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RemoteControlError::Config {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            url: endpoint.rpc_url(),
            next_id: AtomicU64::new(0),
        })
    }

    /// The endpoint URL requests are posted to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Call `method` with keyword `params` on the daemon.
    pub async fn call(&self, method: &str, params: Params) -> RemoteReply {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(method, params, id);

        debug!("RPC request {} -> {} (id {})", method, self.url, id);

        let response = match self.http.post(&self.url).json(&request).send().await {
            Ok(response) => response,
            Err(e) => return RemoteReply::Unreachable(e.to_string()),
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => return RemoteReply::Unreachable(e.to_string()),
        };

        let response: RpcResponse = match serde_json::from_slice(&body) {
            Ok(response) => response,
            Err(e) => {
                return RemoteReply::Error(RpcErrorObject::new(
                    error_codes::PARSE_ERROR,
                    format!("Failed to parse RPC response (HTTP {}): {}", status, e),
                ))
            }
        };

        match response.payload {
            ResponsePayload::Result(value) => RemoteReply::Result(value),
            ResponsePayload::Error(err) => RemoteReply::Error(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{handler_fn, MethodRegistry};
    use crate::rpc::server::RpcServer;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn test_registry() -> Arc<MethodRegistry> {
        let mut registry = MethodRegistry::new();
        registry.register("ping", handler_fn(|_| Ok(json!("pong"))));
        registry.register(
            "add",
            handler_fn(|params| {
                let a = params.get("a").and_then(Value::as_i64).unwrap_or(0);
                let b = params.get("b").and_then(Value::as_i64).unwrap_or(0);
                Ok(json!(a + b))
            }),
        );
        registry.register("nothing", handler_fn(|_| Ok(Value::Null)));
        Arc::new(registry)
    }

    async fn start_test_server() -> (crate::rpc::server::RpcServerHandle, EndpointConfig) {
        let handle = RpcServer::start(test_registry(), &EndpointConfig::new("127.0.0.1", 0))
            .await
            .unwrap();
        let endpoint = EndpointConfig::new("127.0.0.1", handle.addr().port());
        (handle, endpoint)
    }

    #[tokio::test]
    async fn test_client_call_success() {
        let (mut handle, endpoint) = start_test_server().await;
        let client = RpcClient::new(&endpoint, &ClientConfig::default()).unwrap();

        let reply = client.call("ping", Params::new()).await;
        assert_eq!(reply, RemoteReply::Result(json!("pong")));

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_client_call_with_params() {
        let (mut handle, endpoint) = start_test_server().await;
        let client = RpcClient::new(&endpoint, &ClientConfig::default()).unwrap();

        let mut params = Params::new();
        params.insert("a".into(), json!(3));
        params.insert("b".into(), json!(4));
        let reply = client.call("add", params).await;
        assert_eq!(reply, RemoteReply::Result(json!(7)));

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_client_null_result_is_not_unreachable() {
        let (mut handle, endpoint) = start_test_server().await;
        let client = RpcClient::new(&endpoint, &ClientConfig::default()).unwrap();

        let reply = client.call("nothing", Params::new()).await;
        assert_eq!(reply, RemoteReply::Result(Value::Null));

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_client_unknown_method_returns_error_payload() {
        let (mut handle, endpoint) = start_test_server().await;
        let client = RpcClient::new(&endpoint, &ClientConfig::default()).unwrap();

        match client.call("nonexistent", Params::new()).await {
            RemoteReply::Error(err) => assert_eq!(err.code, error_codes::METHOD_NOT_FOUND),
            other => panic!("Expected error reply, got: {:?}", other),
        }

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_client_dead_server_is_unreachable() {
        // Bind then drop to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let endpoint = EndpointConfig::new("127.0.0.1", port);
        let client =
            RpcClient::new(&endpoint, &ClientConfig::with_timeout(Duration::from_secs(2))).unwrap();

        let reply = client.call("ping", Params::new()).await;
        assert!(matches!(reply, RemoteReply::Unreachable(_)));
    }

    #[tokio::test]
    async fn test_client_timeout_is_unreachable() {
        // Accepts connections but never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let silent = tokio::spawn(async move {
            let mut held = Vec::new();
            loop {
                if let Ok((stream, _)) = listener.accept().await {
                    held.push(stream);
                }
            }
        });

        let endpoint = EndpointConfig::new("127.0.0.1", port);
        let client =
            RpcClient::new(&endpoint, &ClientConfig::with_timeout(Duration::from_millis(300)))
                .unwrap();

        let reply = client.call("ping", Params::new()).await;
        assert!(matches!(reply, RemoteReply::Unreachable(_)));

        silent.abort();
    }

    #[test]
    fn test_client_url() {
        let client = RpcClient::new(&EndpointConfig::default(), &ClientConfig::default()).unwrap();
        assert_eq!(client.url(), "http://localhost:64042/jsonrpc");
    }
}
