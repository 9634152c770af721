//! Request and Response message types.
//!
//! Defines the message format for command requests and responses
//! between local end (Rust) and remote end (relay extension).

// ============================================================================
// Imports
// ============================================================================

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::RequestId;

use super::Command;

// ============================================================================
// Request
// ============================================================================

/// A command request from local end to remote end.
///
/// # Format
///
/// ```json
/// {
///   "id": "uuid",
///   "method": "module.methodName",
///   "params": { ... }
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    /// Unique identifier for request/response correlation.
    pub id: RequestId,

    /// Command with method and params.
    #[serde(flatten)]
    pub command: Command,
}

impl Request {
    /// Creates a new request with auto-generated ID.
    #[inline]
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self {
            id: RequestId::generate(),
            command,
        }
    }
}

// ============================================================================
// Response
// ============================================================================

/// A response from remote end to local end.
///
/// # Format
///
/// Success:
/// ```json
/// { "id": "uuid", "type": "success", "result": { ... } }
/// ```
///
/// Error:
/// ```json
/// { "id": "uuid", "type": "error", "error": "no such tab", "message": "..." }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    /// Matches the command `id`.
    pub id: RequestId,

    /// Response type.
    #[serde(rename = "type")]
    pub response_type: ResponseType,

    /// Result data (if success).
    #[serde(default)]
    pub result: Option<Value>,

    /// Error code (if error).
    #[serde(default)]
    pub error: Option<String>,

    /// Error message (if error).
    #[serde(default)]
    pub message: Option<String>,
}

impl Response {
    /// Returns `true` if this is a success response.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.response_type == ResponseType::Success
    }

    /// Returns `true` if this is an error response.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.response_type == ResponseType::Error
    }

    /// Returns the error code of an error response.
    #[inline]
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Deserializes a field of the result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the field is missing and
    /// [`Error::Json`] if it has the wrong shape.
    pub fn take_field<T: DeserializeOwned>(&mut self, key: &str) -> Result<T> {
        let value = self
            .result
            .as_mut()
            .and_then(|v| v.get_mut(key))
            .map(Value::take)
            .ok_or_else(|| Error::protocol(format!("Response missing `{key}` field")))?;

        Ok(serde_json::from_value(value)?)
    }

    /// Gets a string value from the result.
    ///
    /// Returns empty string if key not found or not a string.
    #[inline]
    #[must_use]
    pub fn get_string(&self, key: &str) -> String {
        self.result
            .as_ref()
            .and_then(|v| v.get(key))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }
}

// ============================================================================
// ResponseType
// ============================================================================

/// Response type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Successful response.
    Success,
    /// Error response.
    Error,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::WindowId;
    use crate::protocol::WindowsCommand;

    #[test]
    fn test_request_serialization() {
        let command = Command::Windows(WindowsCommand::Update {
            window_id: WindowId::new(4),
            focused: true,
        });

        let request = Request::new(command);
        let value = serde_json::to_value(&request).expect("serialize");

        assert_eq!(value["method"], "windows.update");
        assert_eq!(value["params"]["windowId"], 4);
        assert!(value["id"].is_string());
    }

    #[test]
    fn test_success_response() {
        let json_str = r#"{
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "type": "success",
            "result": {"dataUrl": "data:image/png;base64,AAAA"}
        }"#;

        let response: Response = serde_json::from_str(json_str).expect("parse");
        assert!(response.is_success());
        assert_eq!(response.get_string("dataUrl"), "data:image/png;base64,AAAA");
    }

    #[test]
    fn test_error_response() {
        let json_str = r#"{
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "type": "error",
            "error": "no such tab",
            "message": "No tab with id: 12"
        }"#;

        let response: Response = serde_json::from_str(json_str).expect("parse");
        assert!(response.is_error());
        assert!(!response.is_success());
        assert_eq!(response.error_code(), Some("no such tab"));
        assert_eq!(response.message.as_deref(), Some("No tab with id: 12"));
    }

    #[test]
    fn test_take_field() {
        let json_str = r#"{
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "type": "success",
            "result": {"value": [1, 2, 3]}
        }"#;

        let mut response: Response = serde_json::from_str(json_str).expect("parse");
        let values: Vec<u32> = response.take_field("value").expect("field");
        assert_eq!(values, vec![1, 2, 3]);

        let missing = response.take_field::<String>("missing");
        assert!(matches!(missing, Err(Error::Protocol { .. })));
    }
}
