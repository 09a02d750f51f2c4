pub mod drain;

use bytes::Bytes;
use http_body_util::Full;
use serde_json::Value;

/// Path every procedure call is posted to.
pub const CALL_PATH: &str = "/call";

/// Stores a payload under a server generated id.
pub const LOAD_WITHOUT_ID: &str = "loadWithoutId";
/// Stores a payload under a caller supplied id, `[id, save_in_cache, payload]`.
pub const LOAD_WITH_ID: &str = "loadWithId";
/// Fetches a stored payload, `[id]`.
pub const GET: &str = "get";

pub const CODE_OK: u32 = 0;
pub const CODE_NOT_FOUND: u32 = 1;
pub const CODE_BAD_REQUEST: u32 = 2;

#[inline]
pub fn empty_body() -> Full<Bytes> {
    Full::new(Bytes::new())
}

#[inline]
pub fn byte_body<B: Into<Bytes>>(bytes: B) -> Full<Bytes> {
    Full::new(bytes.into())
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CallRequest {
    pub procedure: String,
    pub args: Vec<Value>,
}

impl CallRequest {
    #[must_use]
    pub fn new(procedure: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            procedure: procedure.into(),
            args,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CallResponse {
    pub code: u32,
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CallResponse {
    #[must_use]
    pub fn ok(data: Vec<Value>) -> Self {
        Self {
            code: CODE_OK,
            data,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(code: u32, error: impl Into<String>) -> Self {
        Self {
            code,
            data: Vec::new(),
            error: Some(error.into()),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.code == CODE_OK
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_wire_shape() {
        let req = CallRequest::new(LOAD_WITH_ID, vec![json!("17"), json!(true), json!("{}")]);
        let raw = serde_json::to_value(&req).unwrap();
        assert_eq!(
            raw,
            json!({"procedure": "loadWithId", "args": ["17", true, "{}"]})
        );
    }

    #[test]
    fn response_defaults_missing_fields() {
        let resp: CallResponse = serde_json::from_str(r#"{"code":0}"#).unwrap();
        assert!(resp.is_ok());
        assert!(resp.data.is_empty());
        assert!(resp.error.is_none());
    }

    #[test]
    fn failed_response_keeps_message() {
        let resp = CallResponse::failed(CODE_NOT_FOUND, "no object 42");
        let raw = serde_json::to_string(&resp).unwrap();
        assert!(raw.contains("\"error\":\"no object 42\""));
        assert!(!resp.is_ok());
    }
}
