//! The `{code, message, data}` response envelope every authority HTTP
//! response uses.

use serde::{Deserialize, Serialize};

/// A uniform response envelope.
///
/// `code == 200` means success; other values mirror the HTTP status the
/// authority returned (`400` validation, `401` admin auth, `403` policy
/// reject, `404` missing, `500` internal).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Builds a success envelope (`code: 200`) carrying `data`.
    pub fn ok(data: T) -> Self {
        Self {
            code: 200,
            message: "ok".to_string(),
            data: Some(data),
        }
    }

    /// Builds an error envelope with no payload.
    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}
