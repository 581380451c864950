//! Transport and server error taxonomy for backend calls.

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ApiError {
    #[error("Cannot reach server at {0}")]
    Connection(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Session expired, please log in again")]
    Unauthorized,

    /// 4xx/5xx carrying the backend's `message` field when present.
    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Unexpected response: {0}")]
    ResponseParsing(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

impl ApiError {
    /// Maps a `reqwest` send failure the way every call site needs it.
    pub fn from_transport(err: reqwest::Error, base_url: &str, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(timeout_secs)
        } else if err.is_connect() {
            ApiError::Connection(base_url.to_string())
        } else {
            ApiError::HttpClient(err.to_string())
        }
    }

    /// Builds the error for a non-success status from the raw body.
    pub fn from_status(status: u16, body: &str) -> Self {
        if status == 401 {
            return ApiError::Unauthorized;
        }
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message.or(b.error))
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| default_message(status).to_string());
        ApiError::Server { status, message }
    }

    /// Server-side rejection of the request itself (validation, conflicts).
    pub fn is_client_error(&self) -> bool {
        matches!(self, ApiError::Server { status, .. } if (400..500).contains(status))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Connection(_) | ApiError::Timeout(_) | ApiError::HttpClient(_))
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

fn default_message(status: u16) -> &'static str {
    match status {
        400 => "Invalid request",
        403 => "You do not have permission to do that",
        404 => "Not found",
        409 => "Conflict with current data",
        413 => "File too large",
        500..=599 => "Server error, please try again later",
        _ => "Request failed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_is_surfaced() {
        let err = ApiError::from_status(400, r#"{"success":false,"message":"Daily limit below today's count"}"#);
        assert_eq!(err.to_string(), "Daily limit below today's count");
        assert!(err.is_client_error());
    }

    #[test]
    fn error_field_is_fallback() {
        let err = ApiError::from_status(404, r#"{"error":"Patient not found"}"#);
        assert_eq!(
            err,
            ApiError::Server {
                status: 404,
                message: "Patient not found".into()
            }
        );
    }

    #[test]
    fn non_json_body_uses_default() {
        let err = ApiError::from_status(502, "<html>Bad Gateway</html>");
        assert_eq!(err.to_string(), "Server error, please try again later");
        assert!(!err.is_client_error());
    }

    #[test]
    fn unauthorized_status() {
        assert_eq!(ApiError::from_status(401, ""), ApiError::Unauthorized);
    }

    #[test]
    fn transport_classification() {
        assert!(ApiError::Timeout(30).is_transport());
        assert!(!ApiError::Unauthorized.is_transport());
    }
}
