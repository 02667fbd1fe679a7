use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned by the audit server on a non-2xx response. The server
/// reports the reason under `result`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ApiError {
    #[serde(default, alias = "result")]
    pub message: String,
}

impl ApiError {
    /// Best-effort extraction from an arbitrary response body; bodies that do
    /// not look like an error object yield `None`.
    pub fn from_body(body: &serde_json::Value) -> Option<Self> {
        if body.get("message").is_none() && body.get("result").is_none() {
            return None;
        }
        serde_json::from_value(body.clone()).ok()
    }
}
