//! JSON-RPC 2.0 wire types.
//!
//! ```text
//! request:  {"method": "reload", "params": {"param1": "x"}, "jsonrpc": "2.0", "id": 0}
//! success:  {"jsonrpc": "2.0", "result": "reload: x", "id": 0}
//! failure:  {"jsonrpc": "2.0", "error": {"code": -32601, "message": "Method not found"}, "id": 0}
//! ```

use crate::config::RpcConfig;
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Standard JSON-RPC error codes.
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// JSON-RPC 2.0 request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Missing on the wire deserializes to an empty string, which the server
    /// rejects as an invalid request.
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
}

impl RpcRequest {
    /// Create a new JSON-RPC 2.0 request with keyword params.
    pub fn new(method: impl Into<String>, params: serde_json::Map<String, Value>, id: u64) -> Self {
        Self {
            method: method.into(),
            params: Some(Value::Object(params)),
            jsonrpc: RpcConfig::JSONRPC_VERSION.to_string(),
            id: Some(Value::Number(id.into())),
        }
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcErrorObject {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

/// Either the result of a call or its error. Never both, never neither.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePayload {
    Result(Value),
    Error(RpcErrorObject),
}

/// JSON-RPC 2.0 response.
///
/// Deserializing a body that carries both `result` and `error`, or neither,
/// fails.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub payload: ResponsePayload,
    pub id: Option<Value>,
}

impl RpcResponse {
    /// Create a success response.
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: RpcConfig::JSONRPC_VERSION.to_string(),
            payload: ResponsePayload::Result(result),
            id,
        }
    }

    /// Create an error response.
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: RpcConfig::JSONRPC_VERSION.to_string(),
            payload: ResponsePayload::Error(RpcErrorObject::new(code, message)),
            id,
        }
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.payload {
            ResponsePayload::Result(value) => Some(value),
            ResponsePayload::Error(_) => None,
        }
    }

    pub fn error_object(&self) -> Option<&RpcErrorObject> {
        match &self.payload {
            ResponsePayload::Result(_) => None,
            ResponsePayload::Error(err) => Some(err),
        }
    }
}

impl Serialize for RpcResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("jsonrpc", &self.jsonrpc)?;
        match &self.payload {
            ResponsePayload::Result(value) => map.serialize_entry("result", value)?,
            ResponsePayload::Error(err) => map.serialize_entry("error", err)?,
        }
        map.serialize_entry("id", &self.id)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for RpcResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut object = serde_json::Map::<String, Value>::deserialize(deserializer)?;

        let jsonrpc = match object.remove("jsonrpc") {
            Some(Value::String(version)) => version,
            Some(other) => {
                return Err(D::Error::custom(format!(
                    "jsonrpc must be a string, got {}",
                    other
                )))
            }
            // Some servers omit the version on responses
            None => RpcConfig::JSONRPC_VERSION.to_string(),
        };
        let id = object.remove("id").filter(|id| !id.is_null());

        // A present `"result": null` is a real null result, so test keys, not values.
        let payload = match (object.remove("result"), object.remove("error")) {
            (Some(result), None) => ResponsePayload::Result(result),
            (None, Some(error)) => {
                ResponsePayload::Error(serde_json::from_value(error).map_err(D::Error::custom)?)
            }
            (Some(_), Some(_)) => {
                return Err(D::Error::custom(
                    "response carries both result and error",
                ))
            }
            (None, None) => {
                return Err(D::Error::custom(
                    "response carries neither result nor error",
                ))
            }
        };

        Ok(Self {
            jsonrpc,
            payload,
            id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_shape() {
        let mut params = serde_json::Map::new();
        params.insert("param1".into(), json!("p1value"));
        let req = RpcRequest::new("reload", params, 0);

        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({
                "method": "reload",
                "params": {"param1": "p1value"},
                "jsonrpc": "2.0",
                "id": 0
            })
        );
    }

    #[test]
    fn test_request_without_version_deserializes_empty() {
        let req: RpcRequest = serde_json::from_str(r#"{"method": "ping", "id": 3}"#).unwrap();
        assert_eq!(req.jsonrpc, "");
        assert_eq!(req.params, None);
        assert_eq!(req.id, Some(json!(3)));
    }

    #[test]
    fn test_response_success_serialization() {
        let resp = RpcResponse::success(Some(json!(0)), json!("reload: p1value"));
        let value = serde_json::to_value(&resp).unwrap();

        assert_eq!(
            value,
            json!({"jsonrpc": "2.0", "result": "reload: p1value", "id": 0})
        );
    }

    #[test]
    fn test_response_error_serialization() {
        let resp = RpcResponse::error(Some(json!(1)), -32603, "Internal error");
        let json = serde_json::to_string(&resp).unwrap();

        assert!(!json.contains("\"result\""));
        assert!(json.contains("\"error\""));
        assert!(json.contains("-32603"));
    }

    #[test]
    fn test_null_result_is_a_result() {
        let resp: RpcResponse =
            serde_json::from_str(r#"{"jsonrpc": "2.0", "result": null, "id": 0}"#).unwrap();
        assert_eq!(resp.result(), Some(&Value::Null));
        assert!(resp.error_object().is_none());
    }

    #[test]
    fn test_response_without_version_accepted() {
        let resp: RpcResponse = serde_json::from_str(r#"{"result": "ok", "id": 0}"#).unwrap();
        assert_eq!(resp.jsonrpc, "2.0");
        assert_eq!(resp.result(), Some(&json!("ok")));
    }

    #[test]
    fn test_error_response_parses() {
        let resp: RpcResponse = serde_json::from_str(
            r#"{"error": {"code": -32601, "message": "Method not found"}, "id": 0}"#,
        )
        .unwrap();
        let err = resp.error_object().unwrap();
        assert_eq!(err.code, error_codes::METHOD_NOT_FOUND);
        assert_eq!(err.message, "Method not found");
    }

    #[test]
    fn test_both_or_neither_rejected() {
        let both = serde_json::from_str::<RpcResponse>(
            r#"{"result": 1, "error": {"code": -32603, "message": "x"}, "id": 0}"#,
        );
        assert!(both.is_err());

        let neither = serde_json::from_str::<RpcResponse>(r#"{"jsonrpc": "2.0", "id": 0}"#);
        assert!(neither.is_err());
    }
}
