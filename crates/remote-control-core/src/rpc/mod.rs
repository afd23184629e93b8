//! JSON-RPC over HTTP between callers and the daemon.
//!
//! # Architecture
//!
//! - **Server**: runs in the daemon, dispatches calls against its registry
//! - **Client**: posts calls from any other process
//! - **Protocol**: request/response types shared by both

pub mod client;
pub mod protocol;
pub mod server;

pub use client::{RemoteReply, RpcClient};
pub use protocol::{error_codes, ResponsePayload, RpcErrorObject, RpcRequest, RpcResponse};
pub use server::{RpcServer, RpcServerHandle};
