//! Response envelope shared by every API endpoint.

use serde::{Deserialize, Serialize};

/// Uniform server envelope: `{ "success": bool, "data"?: T, "message"?: string }`
///
/// `success: false` is an ordinary value, not an error. Callers branch on it
/// and it never triggers cache invalidation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// A successful envelope carrying `data`.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    /// A failed envelope with a message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Consumes the envelope, keeping only the payload.
    pub fn into_data(self) -> Option<T> {
        self.data
    }
}
