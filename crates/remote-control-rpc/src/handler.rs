//! Methods exposed by the demo daemon.

use remote_control_core::{
    handler_fn, Params, RemoteControlError, RemoteControllerBuilder, Result,
};
use serde_json::{json, Value};

/// Extract an optional string parameter.
pub(crate) fn get_str_param<'a>(params: &'a Params, name: &str) -> Option<&'a str> {
    params.get(name).and_then(|v| v.as_str())
}

/// Extract a required string parameter or return an error.
pub(crate) fn require_str_param(params: &Params, name: &str) -> Result<String> {
    get_str_param(params, name)
        .map(String::from)
        .ok_or_else(|| RemoteControlError::InvalidParams {
            message: format!("Missing required parameter: {}", name),
        })
}

/// `reload(param1)` → `"reload: <param1>"`.
pub(crate) fn reload(params: Params) -> Result<Value> {
    let param1 = require_str_param(&params, "param1")?;
    Ok(json!(format!("reload: {}", param1)))
}

/// `ping()` → `"pong"`.
pub(crate) fn ping(_params: Params) -> Result<Value> {
    Ok(json!("pong"))
}

/// Register the demo methods on `builder`.
///
/// `status` reports the PID of whichever process ran it, so calling it from a
/// CLI shows the daemon's PID. Its method list is taken from `builder` once
/// `status` itself is registered.
pub fn register_methods(builder: RemoteControllerBuilder) -> RemoteControllerBuilder {
    let builder = builder
        .method("reload", handler_fn(reload))
        .method("ping", handler_fn(ping));

    let mut methods = builder.method_names();
    if !methods.iter().any(|name| name == "status") {
        methods.push("status".to_string());
        methods.sort();
    }

    builder.method(
        "status",
        handler_fn(move |_params| {
            Ok(json!({
                "pid": std::process::id(),
                "methods": methods.clone(),
            }))
        }),
    )
}

/// Parse a `key=value` CLI argument. The value is read as JSON when it
/// parses, otherwise as a plain string.
pub(crate) fn parse_param(arg: &str) -> std::result::Result<(String, Value), String> {
    let (key, raw) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", arg))?;
    if key.is_empty() {
        return Err(format!("empty parameter name in '{}'", arg));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use remote_control_core::{CallOutcome, ProcessIdentity, RemoteController};

    #[test]
    fn test_reload_formats_param() {
        let mut params = Params::new();
        params.insert("param1".into(), json!("p1value"));
        assert_eq!(reload(params).unwrap(), json!("reload: p1value"));
    }

    #[test]
    fn test_reload_requires_param1() {
        let err = reload(Params::new()).unwrap_err();
        assert_eq!(err.to_rpc_error_code(), -32602);
    }

    #[test]
    fn test_parse_param() {
        assert_eq!(
            parse_param("param1=p1value").unwrap(),
            ("param1".to_string(), json!("p1value"))
        );
        assert_eq!(parse_param("n=5").unwrap(), ("n".to_string(), json!(5)));
        assert_eq!(
            parse_param("list=[1,2]").unwrap(),
            ("list".to_string(), json!([1, 2]))
        );
        assert_eq!(
            parse_param("eq=a=b").unwrap(),
            ("eq".to_string(), json!("a=b"))
        );
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=x").is_err());
    }

    #[tokio::test]
    async fn test_registered_methods_run_locally() {
        let controller = register_methods(RemoteController::builder("/tmp/unused.pid"))
            .build()
            .unwrap();
        assert_eq!(controller.method_names(), vec!["ping", "reload", "status"]);

        let handle = controller
            .handle_with_identity(ProcessIdentity::current_daemon())
            .unwrap();
        let outcome = handle.call("ping", Params::new()).await.unwrap();
        assert_eq!(outcome, CallOutcome::Returned(json!("pong")));

        let outcome = handle.call("status", Params::new()).await.unwrap();
        let status = outcome.into_value().unwrap();
        assert_eq!(status["pid"], json!(std::process::id()));
        assert_eq!(status["methods"], json!(controller.method_names()));
    }

    #[tokio::test]
    async fn test_status_lists_methods_registered_before_it() {
        let builder = RemoteController::builder("/tmp/unused.pid")
            .method("flush", handler_fn(|_| Ok(Value::Null)));
        let controller = register_methods(builder).build().unwrap();

        let handle = controller
            .handle_with_identity(ProcessIdentity::current_daemon())
            .unwrap();
        let status = handle
            .call("status", Params::new())
            .await
            .unwrap()
            .into_value()
            .unwrap();
        assert_eq!(
            status["methods"],
            json!(["flush", "ping", "reload", "status"])
        );
    }
}
