// src/types/response.rs
use serde::{Deserialize, Serialize};

/// Fallback when a failure body carries no usable message
pub const GENERIC_FAILURE_MESSAGE: &str = "Request failed";

// ===== Service Response Types =====

#[derive(Debug, Serialize, Deserialize)]
pub struct TailorResponse {
    pub tailored_resume: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractJdResponse {
    pub jd_text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
}

/// Failure body. `detail` is a string for handled errors and a list for schema rejections.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    pub detail: Option<serde_json::Value>,
    pub error: Option<serde_json::Value>,
}

impl ErrorBody {
    /// `detail`, then `error`, then the generic message
    pub fn message(&self) -> String {
        [&self.detail, &self.error]
            .into_iter()
            .flatten()
            .find_map(render_field)
            .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string())
    }

    /// Extract the message from a raw failure body, JSON or not
    pub fn message_from_body(body: &str) -> String {
        serde_json::from_str::<ErrorBody>(body)
            .map(|parsed| parsed.message())
            .unwrap_or_else(|_| GENERIC_FAILURE_MESSAGE.to_string())
    }
}

fn render_field(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.trim().is_empty() => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
