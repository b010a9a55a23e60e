//! JSON-RPC 2.0 envelopes as spoken over the WebSocket.
//!
//! Inbound requests are parsed leniently: a missing `id` defaults to `0`, a
//! missing `method` is treated as the empty method name, and a missing
//! `params` as an empty object.  Only text that is not JSON at all is
//! rejected.  Every error the bridge reports uses code [`SERVER_ERROR`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

pub const JSONRPC_VERSION: &str = "2.0";

/// The single error code used for every protocol-level failure.
pub const SERVER_ERROR: i64 = -32000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("Invalid JSON")]
    InvalidJson,
}

/// An inbound request envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: String,
    pub id: Value,
    pub params: Value,
}

impl Request {
    pub fn parse(text: &str) -> Result<Self, EnvelopeError> {
        let value: Value = serde_json::from_str(text).map_err(|_| EnvelopeError::InvalidJson)?;
        let Value::Object(mut object) = value else {
            return Err(EnvelopeError::InvalidJson);
        };
        let method = match object.remove("method") {
            Some(Value::String(method)) => method,
            _ => String::new(),
        };
        let id = match object.remove("id") {
            Some(Value::Null) | None => json!(0),
            Some(id) => id,
        };
        let params = match object.remove("params") {
            Some(params @ Value::Object(_)) => params,
            _ => Value::Object(Map::new()),
        };
        Ok(Request { method, id, params })
    }

    /// `params.<key>` as a string, if present.
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }

    /// `params.args`, or an empty object when absent.
    pub fn args(&self) -> Value {
        match self.params.get("args") {
            Some(args @ Value::Object(_)) => args.clone(),
            _ => Value::Object(Map::new()),
        }
    }
}

/// `{code, message}` carried by an error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

/// An outbound response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl Response {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(RpcError {
                code: SERVER_ERROR,
                message: message.into(),
            }),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Compact JSON text for the wire.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"jsonrpc":"2.0","id":0,"error":{{"code":{SERVER_ERROR},"message":"Internal error"}}}}"#
            )
        })
    }
}
