//! JSON-RPC 2.0 envelopes shared by the client and the mock endpoint.
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub id: Value,
}

impl JsonRpcRequest {
    pub fn new(method: &str, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.to_string(),
            params,
            id: Value::from(1),
        }
    }
}

/// Either `result` or `error` is set. Endpoints of this kind answer HTTP 200 in both cases.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// The `error.message` of a response body, if it carries one.
pub fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<JsonRpcResponse>(body)
        .ok()
        .and_then(|response| response.error)
        .map(|error| error.message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_envelope() {
        let request = JsonRpcRequest::new("eth_sendRawTransaction", json!(["0x01"]));
        let encoded = serde_json::to_value(&request).unwrap();
        assert_eq!(
            encoded,
            json!({
                "jsonrpc": "2.0",
                "method": "eth_sendRawTransaction",
                "params": ["0x01"],
                "id": 1
            })
        );
    }

    #[test]
    fn extracts_error_message() {
        let body = r#"{"error":{"message":"nonce too low, expected 7"}}"#;
        assert_eq!(error_message(body).as_deref(), Some("nonce too low, expected 7"));
        assert_eq!(error_message(r#"{"jsonrpc":"2.0","id":1,"result":"0xab"}"#), None);
        assert_eq!(error_message("<html>bad gateway</html>"), None);
    }

    #[test]
    fn error_response_skips_result() {
        let response = JsonRpcResponse::error(json!(1), -32000, "insufficient fund");
        let encoded = serde_json::to_value(&response).unwrap();
        assert!(encoded.get("result").is_none());
        assert_eq!(encoded["error"]["code"], json!(-32000));
    }
}
