//! The normalized result record.
//!
//! Every operation in this workspace, across both access paths and the
//! console starter, returns the same shape: an optional status code, an
//! error flag, and an optional structured payload. Failures carry a
//! diagnostic under a `message` key instead of crossing the boundary as
//! `Err` values.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ClientError;

/// Normalized outcome of a single operation.
///
/// Invariant: `error` is true whenever the transport call failed, the status
/// code fell outside the operation's expected-success set, or the expected
/// payload could not be parsed. `data` carries either the parsed success
/// payload or a diagnostic under a `message` key on error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// HTTP status code of the response, or `None` when no response arrived.
    pub status_code: Option<u16>,
    /// Whether the operation failed.
    pub error: bool,
    /// Parsed payload on success, or `{"message": ...}` on failure.
    pub data: Option<Value>,
}

impl ApiResponse {
    /// Successful outcome with a payload.
    pub fn ok(status_code: u16, data: Value) -> Self {
        Self {
            status_code: Some(status_code),
            error: false,
            data: Some(data),
        }
    }

    /// Successful outcome with no payload (e.g. a 204 delete).
    pub fn ok_empty(status_code: u16) -> Self {
        Self {
            status_code: Some(status_code),
            error: false,
            data: None,
        }
    }

    /// Failed outcome for a response that did arrive.
    pub fn fail(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code: Some(status_code),
            error: true,
            data: Some(json!({ "message": message.into() })),
        }
    }

    /// Failed outcome when no response was received at all.
    pub fn transport_failure(message: impl Into<String>) -> Self {
        Self {
            status_code: None,
            error: true,
            data: Some(json!({ "message": message.into() })),
        }
    }

    /// The diagnostic message, if this outcome carries one.
    pub fn message(&self) -> Option<&str> {
        self.data.as_ref()?.get("message")?.as_str()
    }

    /// Convenience accessor for a string field of the payload.
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.as_ref()?.get(key)?.as_str()
    }

    /// Convenience accessor for an integer field of the payload.
    pub fn data_u64(&self, key: &str) -> Option<u64> {
        self.data.as_ref()?.get(key)?.as_u64()
    }
}

impl From<&ClientError> for ApiResponse {
    /// Converts an internal error into the normalized record.
    ///
    /// Only [`ClientError::Status`] knows the actual status code; every
    /// other class produced no usable response, so `status_code` is `None`.
    fn from(err: &ClientError) -> Self {
        match err {
            ClientError::Status { status, message } => Self::fail(*status, message.clone()),
            other => Self::transport_failure(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_carries_payload() {
        let response = ApiResponse::ok(200, json!({"id": 7}));
        assert!(!response.error);
        assert_eq!(response.status_code, Some(200));
        assert_eq!(response.data_u64("id"), Some(7));
        assert_eq!(response.message(), None);
    }

    #[test]
    fn test_fail_carries_message() {
        let response = ApiResponse::fail(404, "Get app page failed");
        assert!(response.error);
        assert_eq!(response.status_code, Some(404));
        assert_eq!(response.message(), Some("Get app page failed"));
    }

    #[test]
    fn test_transport_failure_has_no_status() {
        let response = ApiResponse::transport_failure("connection refused");
        assert!(response.error);
        assert_eq!(response.status_code, None);
        assert_eq!(response.message(), Some("connection refused"));
    }

    #[test]
    fn test_from_status_error_keeps_code() {
        let err = ClientError::Status {
            status: 500,
            message: "Reload failed".to_string(),
        };
        let response = ApiResponse::from(&err);
        assert_eq!(response.status_code, Some(500));
        assert_eq!(response.message(), Some("Reload failed"));
    }

    #[test]
    fn test_from_token_extraction_error() {
        let response = ApiResponse::from(&ClientError::TokenExtraction);
        assert!(response.error);
        assert_eq!(response.status_code, None);
        assert_eq!(response.message(), Some("CSRF token extraction failed"));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let response = ApiResponse::ok(201, json!([{"id": 1}]));
        let encoded = serde_json::to_string(&response).unwrap();
        let decoded: ApiResponse = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, response);
    }
}
