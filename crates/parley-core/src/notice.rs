//! User-visible transient notifications and the store error taxonomy.

use std::fmt;

use crate::api::ApiError;

/// Failure of a store operation. Every variant is recovered locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Reading sessions or messages failed.
    Fetch(ApiError),
    /// Session creation was rejected.
    Create(ApiError),
    /// The message round trip failed.
    Send(ApiError),
    /// Deletion failed in the background.
    Delete(ApiError),
    /// Feedback submission failed.
    Feedback(ApiError),
}

impl StoreError {
    pub fn api_error(&self) -> &ApiError {
        match self {
            StoreError::Fetch(e)
            | StoreError::Create(e)
            | StoreError::Send(e)
            | StoreError::Delete(e)
            | StoreError::Feedback(e) => e,
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            StoreError::Fetch(_) => "fetch",
            StoreError::Create(_) => "create",
            StoreError::Send(_) => "send",
            StoreError::Delete(_) => "delete",
            StoreError::Feedback(_) => "feedback",
        };
        write!(f, "{op} failed")
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.api_error())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A toast-style message for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
    pub error: Option<StoreError>,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        let text = text.into();
        tracing::info!(notice = %text);
        Self {
            level: NoticeLevel::Success,
            text,
            error: None,
        }
    }

    pub fn error(text: impl Into<String>, error: StoreError) -> Self {
        let text = text.into();
        tracing::warn!(notice = %text, error = %error);
        Self {
            level: NoticeLevel::Error,
            text,
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(error) => write!(f, "{} ({})", self.text, error.api_error()),
            None => write!(f, "{}", self.text),
        }
    }
}
