use std::fmt;

use serde_json::Value;

/// Categories of backend failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Backend unreachable.
    Connect,
    /// Request did not complete in time.
    Timeout,
    /// Request could not be built or sent.
    Request,
    /// Response body was not what we expected.
    Parse,
    /// Non-success HTTP status.
    HttpStatus,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::Connect => write!(f, "connect"),
            ApiErrorKind::Timeout => write!(f, "timeout"),
            ApiErrorKind::Request => write!(f, "request"),
            ApiErrorKind::Parse => write!(f, "parse"),
            ApiErrorKind::HttpStatus => write!(f, "http_status"),
        }
    }
}

/// Structured error from the chat backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional raw body or underlying error text
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Creates an HTTP status error, lifting FastAPI's `detail` into the
    /// message when the body carries one.
    pub fn http_status(status: u16, body: &str) -> Self {
        let details = (!body.is_empty()).then(|| body.to_string());
        let message = match extract_detail(body) {
            Some(detail) => format!("HTTP {status}: {detail}"),
            None => format!("HTTP {status}"),
        };
        Self {
            kind: ApiErrorKind::HttpStatus,
            message,
            details,
        }
    }

    pub fn parse(message: impl Into<String>, body: &str) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: message.into(),
            details: (!body.is_empty()).then(|| body.to_string()),
        }
    }

    /// HTTP status code, if this error came from one.
    pub fn status(&self) -> Option<u16> {
        if self.kind != ApiErrorKind::HttpStatus {
            return None;
        }
        self.message
            .strip_prefix("HTTP ")
            .and_then(|rest| rest.get(..3))
            .and_then(|code| code.parse().ok())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::new(ApiErrorKind::Timeout, format!("Request timed out: {e}"))
        } else if e.is_connect() {
            ApiError::new(ApiErrorKind::Connect, format!("Connection failed: {e}"))
        } else if e.is_decode() {
            ApiError::new(ApiErrorKind::Parse, format!("Failed to decode response: {e}"))
        } else if e.is_request() || e.is_builder() {
            ApiError::new(ApiErrorKind::Request, format!("Request error: {e}"))
        } else {
            ApiError::new(ApiErrorKind::Request, format!("Network error: {e}"))
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// FastAPI reports failures as `{"detail": "..."}`, or as a list of
/// validation errors each carrying a `msg`.
fn extract_detail(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    match json.get("detail")? {
        Value::String(detail) => Some(detail.clone()),
        Value::Array(items) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!msgs.is_empty()).then(|| msgs.join("; "))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_extracts_detail() {
        let err = ApiError::http_status(500, r#"{"detail":"Chat processing failed"}"#);
        assert_eq!(err.kind, ApiErrorKind::HttpStatus);
        assert_eq!(err.message, "HTTP 500: Chat processing failed");
        assert_eq!(err.status(), Some(500));
        assert!(err.details.is_some());
    }

    #[test]
    fn test_http_status_joins_validation_errors() {
        let body = r#"{"detail":[{"loc":["query","user_id"],"msg":"field required"}]}"#;
        let err = ApiError::http_status(422, body);
        assert_eq!(err.message, "HTTP 422: field required");
    }

    #[test]
    fn test_http_status_plain_body() {
        let err = ApiError::http_status(502, "Bad Gateway");
        assert_eq!(err.message, "HTTP 502");
        assert_eq!(err.details.as_deref(), Some("Bad Gateway"));

        let empty = ApiError::http_status(404, "");
        assert!(empty.details.is_none());
    }

    #[test]
    fn test_status_only_for_http_errors() {
        let err = ApiError::new(ApiErrorKind::Timeout, "HTTP 500 lookalike");
        assert_eq!(err.status(), None);
    }
}
