//! Shared types used across the dispatcher.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Named arguments passed to a tool (both host-injected and caller-supplied).
pub type ToolArgs = Map<String, Value>;

/// Key that marks a tool result as carrying its own envelope.
pub const STATUS_KEY: &str = "status";

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

/// Normalized outcome of one tool invocation.
///
/// Serializes to one of the two wire shapes:
///
/// ```text
/// { "status": "success", "data": <any> }
/// { "status": "error", "error": "<string>" }
/// ```
///
/// or, for [`InvocationResponse::SelfEnveloped`], to the tool's own document
/// exactly as it was returned.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationResponse {
    /// The tool returned a bare value.
    Success { data: Value },
    /// The tool failed, or could not be called.
    Error { error: String },
    /// The tool returned a document with a `status` key; passed through as-is.
    SelfEnveloped(Map<String, Value>),
}

/// Status values produced by the dispatcher itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl InvocationResponse {
    /// Wrap a bare value.
    pub fn success(data: Value) -> Self {
        Self::Success { data }
    }

    /// Build an error envelope from any message.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    /// The `status` field as it will appear on the wire.
    ///
    /// `None` only for self-enveloped documents whose `status` is not a string.
    pub fn status(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => Some("success"),
            Self::Error { .. } => Some("error"),
            Self::SelfEnveloped(doc) => doc.get(STATUS_KEY).and_then(Value::as_str),
        }
    }

    /// True when the status is `success`.
    pub fn is_success(&self) -> bool {
        self.status() == Some("success")
    }

    /// True when the status is `error`.
    pub fn is_error(&self) -> bool {
        self.status() == Some("error")
    }

    /// Returns the `data` payload, if any.
    pub fn data(&self) -> Option<&Value> {
        match self {
            Self::Success { data } => Some(data),
            Self::SelfEnveloped(doc) => doc.get("data"),
            Self::Error { .. } => None,
        }
    }

    /// Returns the error message, if any.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { error } => Some(error),
            Self::SelfEnveloped(doc) => doc.get("error").and_then(Value::as_str),
            Self::Success { .. } => None,
        }
    }

    /// Convert into the JSON document returned to the host.
    pub fn into_value(self) -> Value {
        match self {
            Self::Success { data } => {
                let mut doc = Map::new();
                doc.insert(STATUS_KEY.into(), Value::String(Status::Success.to_string()));
                doc.insert("data".into(), data);
                Value::Object(doc)
            }
            Self::Error { error } => {
                let mut doc = Map::new();
                doc.insert(STATUS_KEY.into(), Value::String(Status::Error.to_string()));
                doc.insert("error".into(), Value::String(error));
                Value::Object(doc)
            }
            Self::SelfEnveloped(doc) => Value::Object(doc),
        }
    }
}

impl From<InvocationResponse> for Value {
    fn from(response: InvocationResponse) -> Self {
        response.into_value()
    }
}

impl Serialize for InvocationResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Success { data } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry(STATUS_KEY, "success")?;
                map.serialize_entry("data", data)?;
                map.end()
            }
            Self::Error { error } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry(STATUS_KEY, "error")?;
                map.serialize_entry("error", error)?;
                map.end()
            }
            Self::SelfEnveloped(doc) => doc.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_serializes_to_wire_shape() {
        let response = InvocationResponse::success(json!(42));
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"status":"success","data":42}"#
        );
        assert_eq!(response.into_value(), json!({"status": "success", "data": 42}));
    }

    #[test]
    fn error_serializes_to_wire_shape() {
        let response = InvocationResponse::error("boom");
        assert!(response.is_error());
        assert_eq!(response.error_message(), Some("boom"));
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"status":"error","error":"boom"}"#
        );
    }

    #[test]
    fn self_enveloped_keeps_key_order() {
        let doc = json!({"status": "pending", "ticket": 7, "data": null});
        let Value::Object(map) = doc else { unreachable!() };
        let response = InvocationResponse::SelfEnveloped(map);

        assert_eq!(response.status(), Some("pending"));
        assert!(!response.is_success());
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"status":"pending","ticket":7,"data":null}"#
        );
    }
}
