//! Request payloads and per-call options.
//!
//! # Design
//! Bodies are schema-less: any JSON object is accepted and passed through
//! untouched. The service validates domain shape; the client only checks
//! that a value serializes to a JSON object.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ApiError;

/// An ordered, string-keyed JSON object.
pub type Payload = Map<String, Value>;

/// Serialize any value into a `Payload`.
///
/// Fails with `ApiError::Serialization` if serialization fails or the value
/// is not a JSON object (arrays, strings and numbers are rejected).
pub fn to_payload<T: Serialize + ?Sized>(value: &T) -> Result<Payload, ApiError> {
    match serde_json::to_value(value).map_err(|e| ApiError::Serialization(e.to_string()))? {
        Value::Object(map) => Ok(map),
        other => Err(ApiError::Serialization(format!(
            "expected a JSON object, got {}",
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Per-call additions to a request.
///
/// `extra` keys are merged into the top level of the body (for example
/// `finaltime`, `slidingtime`, `groupname`). `request_metadata` is sent under
/// the `"request_metadata"` key. `group_id` and `captcha_code` override the
/// client configuration for this call only.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub extra: Payload,
    pub request_metadata: Option<Payload>,
    pub group_id: Option<String>,
    pub captcha_code: Option<String>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn with_request_metadata(mut self, metadata: Payload) -> Self {
        self.request_metadata = Some(metadata);
        self
    }

    pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    pub fn with_captcha_code(mut self, code: impl Into<String>) -> Self {
        self.captcha_code = Some(code.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Profile {
        email: String,
        name: String,
    }

    #[test]
    fn to_payload_accepts_structs() {
        let payload = to_payload(&Profile {
            email: "a@example.com".to_string(),
            name: "A".to_string(),
        })
        .unwrap();
        assert_eq!(payload["email"], "a@example.com");
        assert_eq!(payload["name"], "A");
    }

    #[test]
    fn to_payload_keeps_key_order() {
        let payload = to_payload(&json!({"zeta": 1, "alpha": 2, "mid": 3})).unwrap();
        let keys: Vec<&str> = payload.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn to_payload_rejects_non_objects() {
        let err = to_payload(&json!(["a", "b"])).unwrap_err();
        assert!(matches!(err, ApiError::Serialization(ref m) if m.contains("array")));
        let err = to_payload("plain").unwrap_err();
        assert!(matches!(err, ApiError::Serialization(_)));
    }

    #[test]
    fn call_options_builders() {
        let opts = CallOptions::new()
            .with_extra("finaltime", "1y")
            .with_group_id("7")
            .with_captcha_code("abc");
        assert_eq!(opts.extra["finaltime"], "1y");
        assert_eq!(opts.group_id.as_deref(), Some("7"));
        assert_eq!(opts.captcha_code.as_deref(), Some("abc"));
        assert!(opts.request_metadata.is_none());
    }
}
