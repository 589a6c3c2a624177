//! Structured API error types, displayable in both CLI and TUI contexts.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {detail}")]
    Http { status: u16, detail: String },

    #[error("not authorized: {detail}")]
    Unauthorized { detail: String },

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("no session token; run `backview login` first")]
    MissingToken,
}

impl ApiError {
    /// Human-readable message for status lines and `{ok:false, error}` output.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Short category tag used by the TUI error history.
    pub fn category(&self) -> &'static str {
        match self {
            ApiError::Network(_) => "network",
            ApiError::Http { .. } => "http",
            ApiError::Unauthorized { .. } | ApiError::MissingToken => "auth",
            ApiError::Decode(_) => "data",
        }
    }

    /// Map a non-2xx status and body into the taxonomy.
    ///
    /// The message prefers the DRF `detail` field, then the raw body, then
    /// the canonical reason phrase.
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = extract_detail(body).unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                reqwest::StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                truncate(trimmed, 200)
            }
        });
        match status {
            401 | 403 => ApiError::Unauthorized { detail },
            _ => ApiError::Http { status, detail },
        }
    }
}

fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{head}…")
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            ApiError::from_status(status.as_u16(), "")
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

/// Result type of every API call: `Ok(data)` or `Err(error)`, never a panic.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_field_wins() {
        let e = ApiError::from_status(404, r#"{"detail": "Not found."}"#);
        assert_eq!(
            e,
            ApiError::Http {
                status: 404,
                detail: "Not found.".into()
            }
        );
        assert_eq!(e.message(), "HTTP 404: Not found.");
    }

    #[test]
    fn auth_statuses_are_distinguished() {
        let e = ApiError::from_status(401, r#"{"detail": "Invalid token."}"#);
        assert_eq!(e.category(), "auth");
        assert!(e.message().contains("Invalid token."));
    }

    #[test]
    fn falls_back_to_body_then_reason() {
        let e = ApiError::from_status(500, "  boom  ");
        assert_eq!(e.message(), "HTTP 500: boom");
        let e = ApiError::from_status(502, "");
        assert_eq!(e.message(), "HTTP 502: Bad Gateway");
    }
}
