//! HTTP JSON-RPC server run by the daemon.
//!
//! Serves `POST /jsonrpc` and `GET /health`. Requests are dispatched against
//! the daemon's [`MethodRegistry`].
//!
//! # Concurrency
//!
//! The RPC route processes one call at a time. A slow method holds up every
//! other caller until it returns; this is meant for a low-frequency control
//! plane, not for throughput.
//!
//! The call slot is owned by the handler task, not by the HTTP request. A
//! caller that gives up (client timeout, dropped connection) does not free the
//! slot while its handler is still running.

use super::protocol::{error_codes, RpcRequest, RpcResponse};
use crate::config::{EndpointConfig, RpcConfig};
use crate::error::{RemoteControlError, Result};
use crate::registry::{MethodRegistry, Params};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, OwnedSemaphorePermit, Semaphore};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Handle to a running RPC server. Dropping shuts down the server.
pub struct RpcServerHandle {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task_handle: Option<tokio::task::JoinHandle<()>>,
}

impl RpcServerHandle {
    /// Get the address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections and wait for in-flight requests to finish.
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.task_handle.take() {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    error!("RPC server task failed: {}", e);
                }
            }
        }
    }

    /// Wait until the server stops on its own (or is shut down elsewhere).
    pub async fn wait(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for RpcServerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

/// Shared state of the RPC routes.
#[derive(Clone)]
struct ServerState {
    registry: Arc<MethodRegistry>,
    call_slots: Arc<Semaphore>,
}

/// JSON-RPC server over HTTP.
pub struct RpcServer;

impl RpcServer {
    /// Build the axum router for `registry`.
    pub fn router(registry: Arc<MethodRegistry>) -> Router {
        Router::new()
            .route(RpcConfig::HEALTH_PATH, get(handle_health))
            .route(RpcConfig::RPC_PATH, post(handle_rpc))
            .layer(TraceLayer::new_for_http())
            .with_state(ServerState {
                registry,
                call_slots: Arc::new(Semaphore::new(RpcConfig::MAX_CONCURRENT_CALLS)),
            })
    }

    /// Bind `endpoint` and serve in a background task.
    ///
    /// Port 0 picks a free port; [`RpcServerHandle::addr`] reports it.
    pub async fn start(
        registry: Arc<MethodRegistry>,
        endpoint: &EndpointConfig,
    ) -> Result<RpcServerHandle> {
        let listener = TcpListener::bind((endpoint.host.as_str(), endpoint.port))
            .await
            .map_err(|e| RemoteControlError::Io {
                message: format!("Failed to bind {}:{}: {}", endpoint.host, endpoint.port, e),
                path: None,
                source: Some(e),
            })?;
        let addr = listener.local_addr()?;

        info!(
            "RPC server listening on {} ({} methods)",
            addr,
            registry.len()
        );

        let app = Self::router(registry);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task_handle = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
            match result {
                Ok(()) => info!("RPC server shut down"),
                Err(e) => error!("RPC server error: {}", e),
            }
        });

        Ok(RpcServerHandle {
            addr,
            shutdown_tx: Some(shutdown_tx),
            task_handle: Some(task_handle),
        })
    }

    /// Turn one raw request body into a response.
    ///
    /// Never fails: malformed input and handler failures become JSON-RPC
    /// error objects.
    pub async fn process_request(body: &[u8], registry: &MethodRegistry) -> RpcResponse {
        Self::dispatch(body, registry, None).await
    }

    /// Like [`process_request`](Self::process_request), with `slot` held by
    /// the handler task until the handler returns.
    async fn dispatch(
        body: &[u8],
        registry: &MethodRegistry,
        slot: Option<OwnedSemaphorePermit>,
    ) -> RpcResponse {
        let value: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(e) => {
                return RpcResponse::error(
                    None,
                    error_codes::PARSE_ERROR,
                    format!("Parse error: {}", e),
                );
            }
        };

        if value.is_array() {
            return RpcResponse::error(
                None,
                error_codes::INVALID_REQUEST,
                "Invalid Request: batch calls are not supported",
            );
        }

        let request: RpcRequest = match serde_json::from_value(value) {
            Ok(req) => req,
            Err(e) => {
                return RpcResponse::error(
                    None,
                    error_codes::INVALID_REQUEST,
                    format!("Invalid Request: {}", e),
                );
            }
        };

        if request.jsonrpc != RpcConfig::JSONRPC_VERSION {
            return RpcResponse::error(
                request.id,
                error_codes::INVALID_REQUEST,
                "Invalid Request: expected jsonrpc 2.0",
            );
        }

        let params = match request.params {
            None | Some(Value::Null) => Params::new(),
            Some(Value::Object(params)) => params,
            Some(_) => {
                return RpcResponse::error(
                    request.id,
                    error_codes::INVALID_PARAMS,
                    "Invalid params: expected an object of named parameters",
                );
            }
        };

        let handler = match registry.lookup(&request.method) {
            Ok(handler) => handler,
            Err(_) => {
                warn!("RPC call to unknown method '{}'", request.method);
                return RpcResponse::error(
                    request.id,
                    error_codes::METHOD_NOT_FOUND,
                    "Method not found",
                );
            }
        };

        debug!("RPC call: {}({:?})", request.method, params);

        // Run on its own task so a panicking handler only fails this call.
        let outcome = tokio::spawn(async move {
            let _slot = slot;
            handler.call(params).await
        })
        .await;

        match outcome {
            Ok(Ok(result)) => RpcResponse::success(request.id, result),
            Ok(Err(e)) => {
                error!("RPC error for {}: {}", request.method, e);
                RpcResponse::error(request.id, e.to_rpc_error_code(), e.to_string())
            }
            Err(join_error) => {
                error!("RPC method {} panicked: {}", request.method, join_error);
                RpcResponse::error(
                    request.id,
                    error_codes::INTERNAL_ERROR,
                    format!("Internal error: method '{}' panicked", request.method),
                )
            }
        }
    }
}

/// Health check endpoint.
async fn handle_health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// JSON-RPC endpoint.
async fn handle_rpc(State(state): State<ServerState>, body: Bytes) -> impl IntoResponse {
    let response = match state.call_slots.clone().acquire_owned().await {
        Ok(slot) => RpcServer::dispatch(&body, &state.registry, Some(slot)).await,
        Err(e) => {
            error!("RPC call slots closed: {}", e);
            RpcResponse::error(None, error_codes::INTERNAL_ERROR, "Internal error: server is closing")
        }
    };
    (StatusCode::OK, Json(response))
}
