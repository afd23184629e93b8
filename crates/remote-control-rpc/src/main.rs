//! remote-control - demo daemon controllable over JSON-RPC.
//!
//! `remote-control serve` runs the daemon in the foreground. Every other
//! subcommand builds the same controller and calls into it; from any process
//! but the daemon that becomes an HTTP JSON-RPC request.

mod handler;

use anyhow::Result;
use clap::{Parser, Subcommand};
use remote_control_core::{
    CallOutcome, ClientConfig, Params, PathsConfig, RemoteController, RpcConfig,
};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "remote-control")]
#[command(about = "Daemon controllable through origin-aware JSON-RPC")]
struct Args {
    /// Host the daemon binds to and callers connect to
    #[arg(long, default_value = RpcConfig::DEFAULT_HOST)]
    host: String,

    /// Port the daemon binds to and callers connect to
    #[arg(short, long, default_value_t = RpcConfig::DEFAULT_PORT)]
    port: u16,

    /// PID file recording the daemon process
    #[arg(long)]
    pid_file: Option<PathBuf>,

    /// Response timeout for calls, in seconds (connecting is bounded separately)
    #[arg(long, default_value_t = RpcConfig::REQUEST_TIMEOUT.as_secs())]
    timeout_secs: u64,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the daemon in the foreground until Ctrl-C
    Serve,
    /// Call a method with key=value parameters
    Call {
        method: String,
        /// Parameter as key=value; the value is parsed as JSON when possible
        #[arg(short = 'P', long = "param", value_parser = handler::parse_param)]
        params: Vec<(String, Value)>,
    },
    /// Shorthand for `call reload --param param1=<PARAM1>`
    Reload { param1: String },
    /// List the methods the daemon exposes
    Methods,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let pid_file = args
        .pid_file
        .clone()
        .unwrap_or_else(PathsConfig::default_pid_file);

    let controller = handler::register_methods(RemoteController::builder(pid_file))
        .host(args.host.clone())
        .port(args.port)
        .client_config(ClientConfig::with_request_timeout(Duration::from_secs(
            args.timeout_secs,
        )))
        .build()?;

    match args.command {
        Command::Serve => serve(&controller).await,
        Command::Call { method, params } => {
            call(&controller, &method, params.into_iter().collect()).await
        }
        Command::Reload { param1 } => {
            let mut params = Params::new();
            params.insert("param1".to_string(), Value::String(param1));
            call(&controller, "reload", params).await
        }
        Command::Methods => {
            for name in controller.method_names() {
                println!("{}", name);
            }
            Ok(())
        }
    }
}

async fn serve(controller: &RemoteController) -> Result<()> {
    info!("Starting remote-control daemon");

    let daemon = controller.serve().await?;

    // Print the bound address for scripts (intentional stdout)
    println!("RPC_ADDR={}", daemon.addr());

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");

    daemon.shutdown().await?;
    Ok(())
}

async fn call(controller: &RemoteController, method: &str, params: Params) -> Result<()> {
    let handle = controller.handle()?;
    let outcome = handle.call(method, params).await?;

    println!("{}", outcome);

    if let CallOutcome::Unreachable = outcome {
        std::process::exit(1);
    }
    Ok(())
}
