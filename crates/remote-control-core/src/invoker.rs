//! Origin-aware invocation.
//!
//! A [`DaemonHandle`] runs a method in-process when the caller is the daemon
//! and over JSON-RPC otherwise. The choice is made once, from the
//! [`ProcessIdentity`], when the handle is built; callers see the same API
//! either way.

use crate::config::{ClientConfig, EndpointConfig};
use crate::error::Result;
use crate::identity::ProcessIdentity;
use crate::platform::PidFile;
use crate::registry::{MethodRegistry, Params};
use crate::rpc::client::{RemoteReply, RpcClient};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

/// Result of a routed call.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    /// The method returned this value (locally or through the daemon).
    Returned(Value),
    /// The daemon reported an error. Human-readable, meant for CLI output.
    Failed(String),
    /// The daemon could not be reached. No result exists.
    Unreachable,
}

impl CallOutcome {
    /// Collapse to a single optional value: `Failed` becomes its message
    /// string, `Unreachable` becomes `None`.
    pub fn into_value(self) -> Option<Value> {
        match self {
            CallOutcome::Returned(value) => Some(value),
            CallOutcome::Failed(message) => Some(Value::String(message)),
            CallOutcome::Unreachable => None,
        }
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, CallOutcome::Unreachable)
    }

    fn from_remote_error(message: &str) -> Self {
        CallOutcome::Failed(format!("Error: {}. (see logs for details)", message))
    }
}

impl fmt::Display for CallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallOutcome::Returned(Value::String(text)) => f.write_str(text),
            CallOutcome::Returned(value) => write!(f, "{}", value),
            CallOutcome::Failed(message) => f.write_str(message),
            CallOutcome::Unreachable => f.write_str("No result: daemon is not reachable"),
        }
    }
}

/// How calls leave this process, if at all.
pub enum Invoker {
    /// This process is the daemon: call the registry directly.
    Local(Arc<MethodRegistry>),
    /// Another process is the daemon: go through JSON-RPC.
    Remote(RpcClient),
}

impl fmt::Debug for Invoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Invoker::Local(registry) => f.debug_tuple("Local").field(registry).finish(),
            Invoker::Remote(client) => f.debug_tuple("Remote").field(&client.url()).finish(),
        }
    }
}

impl Invoker {
    /// Pick the invoker for `identity`.
    pub fn for_identity(
        identity: &ProcessIdentity,
        registry: Arc<MethodRegistry>,
        endpoint: &EndpointConfig,
        client_config: &ClientConfig,
    ) -> Result<Self> {
        if identity.is_local() {
            Ok(Invoker::Local(registry))
        } else {
            Ok(Invoker::Remote(RpcClient::new(endpoint, client_config)?))
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Invoker::Local(_))
    }

    /// Run `method` with `params`.
    ///
    /// Locally, handler errors are returned unchanged as `Err`. Remotely, the
    /// call never fails: daemon errors become [`CallOutcome::Failed`] and
    /// transport failures [`CallOutcome::Unreachable`], both logged.
    pub async fn invoke(&self, method: &str, params: Params) -> Result<CallOutcome> {
        match self {
            Invoker::Local(registry) => {
                let value = registry.invoke(method, params).await?;
                Ok(CallOutcome::Returned(value))
            }
            Invoker::Remote(client) => {
                let logged_params = params.clone();
                match client.call(method, params).await {
                    RemoteReply::Result(value) => Ok(CallOutcome::Returned(value)),
                    RemoteReply::Error(err) => {
                        error!(
                            "There is an error during rpc call '{}'. Response:\n{}",
                            method,
                            serde_json::to_string_pretty(&err).unwrap_or_else(|_| err.message.clone())
                        );
                        Ok(CallOutcome::from_remote_error(&err.message))
                    }
                    RemoteReply::Unreachable(reason) => {
                        error!(
                            "Command server not running ({}), method: {}, params: {:?}",
                            reason, method, logged_params
                        );
                        Ok(CallOutcome::Unreachable)
                    }
                }
            }
        }
    }
}

/// A caller's handle to a daemon's methods.
#[derive(Debug)]
pub struct DaemonHandle {
    identity: ProcessIdentity,
    invoker: Invoker,
    registry: Arc<MethodRegistry>,
    endpoint: EndpointConfig,
    client_config: ClientConfig,
    pid_file: PidFile,
}

impl DaemonHandle {
    pub(crate) fn new(
        identity: ProcessIdentity,
        registry: Arc<MethodRegistry>,
        endpoint: EndpointConfig,
        client_config: ClientConfig,
        pid_file: PidFile,
    ) -> Result<Self> {
        let invoker = Invoker::for_identity(&identity, registry.clone(), &endpoint, &client_config)?;
        Ok(Self {
            identity,
            invoker,
            registry,
            endpoint,
            client_config,
            pid_file,
        })
    }

    /// Call `method` with keyword `params`, wherever the daemon lives.
    pub async fn call(&self, method: &str, params: Params) -> Result<CallOutcome> {
        debug!(
            "Initiate RPC method '{}' in '{}'",
            method,
            self.identity.side()
        );
        self.invoker.invoke(method, params).await
    }

    /// Re-read the PID file and rebuild the invoker, e.g. after the daemon
    /// was restarted under a new PID.
    pub fn refresh(&mut self) -> Result<()> {
        let identity = ProcessIdentity::resolve(&self.pid_file)?;
        if identity != self.identity {
            debug!(
                "Daemon identity changed: {:?} -> {:?}",
                self.identity.daemon_pid, identity.daemon_pid
            );
            self.invoker = Invoker::for_identity(
                &identity,
                self.registry.clone(),
                &self.endpoint,
                &self.client_config,
            )?;
            self.identity = identity;
        }
        Ok(())
    }

    pub fn identity(&self) -> &ProcessIdentity {
        &self.identity
    }

    /// True when calls run in this process.
    pub fn is_local(&self) -> bool {
        self.invoker.is_local()
    }

    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }
}
