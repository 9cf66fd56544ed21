use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{JsonRpcVersion, RequestId};

/// Parameters for a JSON-RPC request
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RequestParams {
    /// Positional parameters
    Array(Vec<Value>),
    /// Named parameters
    Object(Map<String, Value>),
}

impl RequestParams {
    /// Get a named parameter (object params only)
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            RequestParams::Object(map) => map.get(key),
            RequestParams::Array(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RequestParams::Object(map) => map.is_empty(),
            RequestParams::Array(vec) => vec.is_empty(),
        }
    }

    /// The params as a plain JSON value, ready for typed decoding
    pub fn to_value(&self) -> Value {
        match self {
            RequestParams::Object(map) => Value::Object(map.clone()),
            RequestParams::Array(arr) => Value::Array(arr.clone()),
        }
    }
}

impl TryFrom<Value> for RequestParams {
    type Error = Value;

    /// Only objects and arrays are valid params; anything else is handed back.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(RequestParams::Object(map)),
            Value::Array(arr) => Ok(RequestParams::Array(arr)),
            other => Err(other),
        }
    }
}

/// A JSON-RPC request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub id: RequestId,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<RequestParams>,
}

impl JsonRpcRequest {
    pub fn new(
        id: impl Into<RequestId>,
        method: impl Into<String>,
        params: Option<RequestParams>,
    ) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            id: id.into(),
            method: method.into(),
            params,
        }
    }

    /// Create a request without params
    pub fn without_params(id: impl Into<RequestId>, method: impl Into<String>) -> Self {
        Self::new(id, method, None)
    }

    /// Create a request from a JSON params value.
    ///
    /// `null` means "no params"; scalars are not valid JSON-RPC params and are rejected.
    pub fn with_params(
        id: impl Into<RequestId>,
        method: impl Into<String>,
        params: Value,
    ) -> Result<Self, Value> {
        let params = match params {
            Value::Null => None,
            other => Some(RequestParams::try_from(other)?),
        };
        Ok(Self::new(id, method, params))
    }

    /// Raw params for decoding; absent params decode from `null`
    pub fn params_value(&self) -> Value {
        self.params
            .as_ref()
            .map(RequestParams::to_value)
            .unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_round_trip_without_params() {
        let request = JsonRpcRequest::without_params(RequestId::Number(1), "ping");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}));

        let parsed: JsonRpcRequest = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.method, "ping");
        assert!(parsed.params.is_none());
        assert_eq!(parsed.params_value(), Value::Null);
    }

    #[test]
    fn test_with_params_object() {
        let request = JsonRpcRequest::with_params(
            "req-1",
            "sampling/createMessage",
            json!({"messages": [], "maxTokens": 10}),
        )
        .unwrap();

        let params = request.params.as_ref().unwrap();
        assert_eq!(params.get("maxTokens"), Some(&json!(10)));
        assert_eq!(
            request.params_value(),
            json!({"messages": [], "maxTokens": 10})
        );
    }

    #[test]
    fn test_with_params_rejects_scalars() {
        let rejected = JsonRpcRequest::with_params(RequestId::Number(1), "tools/list", json!(42))
            .unwrap_err();
        assert_eq!(rejected, json!(42));
    }
}
