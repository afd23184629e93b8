//! Remote control for daemons through origin-aware JSON-RPC.
//!
//! A method is registered once on a [`RemoteController`]. Called from inside
//! the daemon process it runs directly; called from any other process it is
//! posted as JSON-RPC to the daemon, which runs it and sends the result back.
//! Which path applies is decided by comparing the caller's PID with the PID
//! the daemon recorded in its PID file.
//!
//! # Example
//!
//! ```rust,ignore
//! use remote_control_core::{handler_fn, Params, RemoteController};
//! use serde_json::json;
//!
//! let controller = RemoteController::builder("/tmp/handler.pid")
//!     .method("reload", handler_fn(|params| {
//!         let param1 = params.get("param1").and_then(|v| v.as_str()).unwrap_or("");
//!         Ok(json!(format!("reload: {}", param1)))
//!     }))
//!     .build()?;
//!
//! // In the daemon process:
//! let daemon = controller.serve().await?;
//!
//! // In any other process:
//! let mut params = Params::new();
//! params.insert("param1".into(), json!("p1value"));
//! let outcome = controller.handle()?.call("reload", params).await?;
//! println!("{}", outcome); // reload: p1value
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod identity;
pub mod invoker;
pub mod platform;
pub mod registry;
pub mod rpc;

// Re-export commonly used types
pub use config::{ClientConfig, EndpointConfig, PathsConfig, RpcConfig};
pub use controller::{RemoteController, RemoteControllerBuilder, RunningDaemon};
pub use error::{RemoteControlError, Result};
pub use identity::ProcessIdentity;
pub use invoker::{CallOutcome, DaemonHandle, Invoker};
pub use platform::PidFile;
pub use registry::{handler_fn, FnMethod, MethodRegistry, Params, RpcMethod};
pub use rpc::{RemoteReply, RpcClient, RpcServer, RpcServerHandle};
