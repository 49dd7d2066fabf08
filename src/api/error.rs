//! Errors surfaced by the request gateway

use reqwest::{Method, StatusCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// 401 that the gateway could not (or may not) recover from.
    #[error("401 Unauthorized for {url}. Session may have expired -- run 'erp-cli login'.")]
    Unauthorized { url: String, body: String },

    #[error("HTTP {} for {url}: {body}", .status.as_u16())]
    Status {
        status: StatusCode,
        url: String,
        body: String,
    },

    #[error("{method} {url} failed")]
    Transport {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to parse response from {url}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to encode request body")]
    Encode(#[from] serde_json::Error),

    #[error("Invalid request path {path:?}")]
    InvalidUrl {
        path: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Session store error: {0:#}")]
    Store(anyhow::Error),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Render a validation body (`{"field": ["msg", ...]}`) as `field: msg msg` lines.
///
/// Returns `None` when the body is not shaped like field errors.
pub fn render_field_errors(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let fields = value.as_object()?;
    if fields.is_empty() {
        return None;
    }

    let lines = fields
        .iter()
        .map(|(field, msgs)| {
            let text = match msgs {
                serde_json::Value::Array(items) => items
                    .iter()
                    .map(|m| m.as_str().map_or_else(|| m.to_string(), String::from))
                    .collect::<Vec<_>>()
                    .join(" "),
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!("{}: {}", field, text)
        })
        .collect::<Vec<_>>();

    Some(lines.join("\n"))
}
