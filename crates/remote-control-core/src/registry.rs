//! Method registry: the name → handler table a daemon serves.
//!
//! Filled once while the controller is built, then frozen behind an `Arc`
//! and shared read-only with the RPC server and local invokers.

use crate::error::{RemoteControlError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Keyword arguments of a call.
pub type Params = serde_json::Map<String, Value>;

/// A method exposed over RPC.
///
/// The same handler runs for in-process calls and for calls arriving at the
/// server, so it only sees plain JSON params.
#[async_trait::async_trait]
pub trait RpcMethod: Send + Sync + 'static {
    async fn call(&self, params: Params) -> Result<Value>;
}

/// Adapter that exposes a synchronous closure as an [`RpcMethod`].
pub struct FnMethod<F>(F);

/// Wrap a synchronous closure as a handler.
///
/// ```rust,ignore
/// builder.method("ping", handler_fn(|_params| Ok(json!("pong"))));
/// ```
pub fn handler_fn<F>(f: F) -> FnMethod<F>
where
    F: Fn(Params) -> Result<Value> + Send + Sync + 'static,
{
    FnMethod(f)
}

#[async_trait::async_trait]
impl<F> RpcMethod for FnMethod<F>
where
    F: Fn(Params) -> Result<Value> + Send + Sync + 'static,
{
    async fn call(&self, params: Params) -> Result<Value> {
        (self.0)(params)
    }
}

/// Name → handler table.
#[derive(Default)]
pub struct MethodRegistry {
    methods: HashMap<String, Arc<dyn RpcMethod>>,
}

impl fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("methods", &self.names())
            .finish()
    }
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `handler` under `name`.
    ///
    /// Re-registering a name replaces the earlier handler (last write wins);
    /// the replaced handler is returned.
    pub fn register<M: RpcMethod>(
        &mut self,
        name: impl Into<String>,
        handler: M,
    ) -> Option<Arc<dyn RpcMethod>> {
        self.register_arc(name, Arc::new(handler))
    }

    /// [`register`](Self::register) for an already shared handler.
    pub fn register_arc(
        &mut self,
        name: impl Into<String>,
        handler: Arc<dyn RpcMethod>,
    ) -> Option<Arc<dyn RpcMethod>> {
        let name = name.into();
        let replaced = self.methods.insert(name.clone(), handler);
        if replaced.is_some() {
            tracing::debug!("Method '{}' re-registered, previous handler replaced", name);
        }
        replaced
    }

    /// Find the handler for `name`.
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn RpcMethod>> {
        self.methods
            .get(name)
            .cloned()
            .ok_or_else(|| RemoteControlError::MethodNotFound {
                method: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Look up `name` and run it with `params`.
    pub async fn invoke(&self, name: &str, params: Params) -> Result<Value> {
        let handler = self.lookup(name)?;
        handler.call(params).await
    }
}
