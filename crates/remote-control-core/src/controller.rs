//! The daemon object: endpoint, PID file and exposed methods.

use crate::config::{ClientConfig, EndpointConfig, PathsConfig};
use crate::error::{RemoteControlError, Result};
use crate::identity::ProcessIdentity;
use crate::invoker::DaemonHandle;
use crate::platform::PidFile;
use crate::registry::{MethodRegistry, RpcMethod};
use crate::rpc::server::{RpcServer, RpcServerHandle};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Builder for a [`RemoteController`].
///
/// # Example
///
/// ```rust,ignore
/// use remote_control_core::{handler_fn, RemoteController};
/// use serde_json::json;
///
/// let controller = RemoteController::builder("/tmp/handler.pid")
///     .port(64042)
///     .method("ping", handler_fn(|_| Ok(json!("pong"))))
///     .build()?;
/// ```
pub struct RemoteControllerBuilder {
    pid_file: PathBuf,
    endpoint: EndpointConfig,
    client_config: ClientConfig,
    registry: MethodRegistry,
}

impl RemoteControllerBuilder {
    /// Create a new builder recording the daemon PID in `pid_file`.
    pub fn new(pid_file: impl Into<PathBuf>) -> Self {
        Self {
            pid_file: pid_file.into(),
            endpoint: EndpointConfig::default(),
            client_config: ClientConfig::default(),
            registry: MethodRegistry::new(),
        }
    }

    /// Host to bind and connect to. Default: `localhost`
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.endpoint.host = host.into();
        self
    }

    /// Port to bind and connect to. Default: `64042`
    pub fn port(mut self, port: u16) -> Self {
        self.endpoint.port = port;
        self
    }

    pub fn endpoint(mut self, endpoint: EndpointConfig) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Timeouts for calls made from other processes.
    pub fn client_config(mut self, config: ClientConfig) -> Self {
        self.client_config = config;
        self
    }

    /// Expose `handler` under `name`. A later method with the same name
    /// replaces this one.
    pub fn method<M: RpcMethod>(mut self, name: impl Into<String>, handler: M) -> Self {
        self.registry.register(name, handler);
        self
    }

    /// Expose every `(name, handler)` pair, in order.
    pub fn methods<I>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = (String, Arc<dyn RpcMethod>)>,
    {
        for (name, handler) in methods {
            self.registry.register_arc(name, handler);
        }
        self
    }

    /// Names registered so far, sorted.
    pub fn method_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Freeze the registry and build the controller.
    pub fn build(self) -> Result<RemoteController> {
        if self.endpoint.host.trim().is_empty() {
            return Err(RemoteControlError::Config {
                message: "host must not be empty".to_string(),
            });
        }
        if self.pid_file.as_os_str().is_empty() {
            return Err(RemoteControlError::Config {
                message: "PID file path must not be empty".to_string(),
            });
        }

        Ok(RemoteController {
            endpoint: self.endpoint,
            client_config: self.client_config,
            pid_file: PidFile::new(self.pid_file),
            registry: Arc::new(self.registry),
        })
    }
}

/// A daemon controllable over JSON-RPC.
///
/// The same controller is built in the daemon process and in every caller.
/// The daemon calls [`serve`](Self::serve); callers take a
/// [`handle`](Self::handle) and call methods on it.
#[derive(Debug)]
pub struct RemoteController {
    endpoint: EndpointConfig,
    client_config: ClientConfig,
    pid_file: PidFile,
    registry: Arc<MethodRegistry>,
}

impl RemoteController {
    pub fn builder(pid_file: impl Into<PathBuf>) -> RemoteControllerBuilder {
        RemoteControllerBuilder::new(pid_file)
    }

    /// Builder using the default PID file location.
    pub fn default_builder() -> RemoteControllerBuilder {
        RemoteControllerBuilder::new(PathsConfig::default_pid_file())
    }

    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }

    pub fn pid_file(&self) -> &PidFile {
        &self.pid_file
    }

    pub fn registry(&self) -> &Arc<MethodRegistry> {
        &self.registry
    }

    /// Names of the exposed methods, sorted.
    pub fn method_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// True when the PID file names a live process.
    pub fn is_running(&self) -> bool {
        self.pid_file.is_running()
    }

    /// Record this process as the daemon and start the RPC server.
    pub async fn serve(&self) -> Result<RunningDaemon> {
        if let Ok(Some(pid)) = self.pid_file.read() {
            if pid != std::process::id() && crate::platform::is_process_alive(pid) {
                warn!(
                    "PID file {} names live process {}; taking it over",
                    self.pid_file.path().display(),
                    pid
                );
            }
        }

        let server = RpcServer::start(self.registry.clone(), &self.endpoint).await?;
        let pid = self.pid_file.write_current()?;

        info!(
            "Daemon PID {} serving {} on {}",
            pid,
            self.registry.names().join(", "),
            server.addr()
        );

        Ok(RunningDaemon {
            server,
            pid_file: self.pid_file.clone(),
            pid,
        })
    }

    /// Handle for this process, routed by the PID file.
    ///
    /// Routing is fixed when the handle is built. A handle taken in the daemon
    /// process before [`serve`](Self::serve) recorded its PID stays remote
    /// until [`DaemonHandle::refresh`] is called; take handles after `serve`.
    pub fn handle(&self) -> Result<DaemonHandle> {
        let identity = ProcessIdentity::resolve(&self.pid_file)?;
        self.handle_with_identity(identity)
    }

    /// Handle routed by an explicit identity.
    pub fn handle_with_identity(&self, identity: ProcessIdentity) -> Result<DaemonHandle> {
        DaemonHandle::new(
            identity,
            self.registry.clone(),
            self.endpoint.clone(),
            self.client_config,
            self.pid_file.clone(),
        )
    }
}

/// A serving daemon. Shut down explicitly to remove the PID file.
pub struct RunningDaemon {
    server: RpcServerHandle,
    pid_file: PidFile,
    pid: u32,
}

impl RunningDaemon {
    pub fn addr(&self) -> SocketAddr {
        self.server.addr()
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Stop serving and remove the PID file if it still names this process.
    pub async fn shutdown(mut self) -> Result<()> {
        self.server.shutdown().await;
        match self.pid_file.read() {
            Ok(Some(pid)) if pid == self.pid => self.pid_file.remove(),
            Ok(_) => Ok(()),
            Err(e) => {
                warn!("Not removing unreadable PID file: {}", e);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::handler_fn;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_builder_defaults() {
        let controller = RemoteController::builder("/tmp/x.pid").build().unwrap();
        assert_eq!(controller.endpoint(), &EndpointConfig::default());
        assert!(controller.method_names().is_empty());
    }

    #[test]
    fn test_builder_rejects_empty_host() {
        let result = RemoteController::builder("/tmp/x.pid").host("  ").build();
        assert!(matches!(result, Err(RemoteControlError::Config { .. })));
    }

    #[test]
    fn test_builder_methods_last_wins() {
        let handlers: Vec<(String, Arc<dyn RpcMethod>)> = vec![
            ("b".to_string(), Arc::new(handler_fn(|_| Ok(json!(1)))) as Arc<dyn RpcMethod>),
            ("a".to_string(), Arc::new(handler_fn(|_| Ok(json!(2)))) as Arc<dyn RpcMethod>),
        ];
        let controller = RemoteController::builder("/tmp/x.pid")
            .methods(handlers)
            .method("a", handler_fn(|_| Ok(json!(3))))
            .build()
            .unwrap();

        assert_eq!(controller.method_names(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_serve_writes_and_removes_pid_file() {
        let temp_dir = TempDir::new().unwrap();
        let controller = RemoteController::builder(temp_dir.path().join("d.pid"))
            .host("127.0.0.1")
            .port(0)
            .method("ping", handler_fn(|_| Ok(json!("pong"))))
            .build()
            .unwrap();

        assert!(!controller.is_running());

        let daemon = controller.serve().await.unwrap();
        assert_eq!(daemon.pid(), std::process::id());
        assert!(controller.is_running());
        assert!(controller.handle().unwrap().is_local());

        daemon.shutdown().await.unwrap();
        assert!(!controller.pid_file().path().exists());
        assert!(!controller.handle().unwrap().is_local());
    }
}
