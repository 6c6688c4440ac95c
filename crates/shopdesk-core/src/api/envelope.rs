//! Response envelope shared by every backend endpoint
//!
//! `{success, message?, data, pagination?: {totalPages, totalItems}}`

use crate::error::{ApiError, DEFAULT_FAILURE_MESSAGE};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Envelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub total_pages: Option<u64>,
    #[serde(default)]
    pub total_items: Option<u64>,
}

impl Envelope {
    /// The `success` flag is authoritative, regardless of HTTP status.
    pub fn into_success(self, status: u16, endpoint: &str) -> Result<Self, ApiError> {
        if self.success {
            return Ok(self);
        }
        let message = self
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());
        Err(ApiError::Api {
            status,
            endpoint: endpoint.to_string(),
            message,
        })
    }

    pub fn message_or(&self, fallback: &str) -> String {
        self.message
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }
}
