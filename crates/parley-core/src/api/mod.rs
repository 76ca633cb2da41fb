//! Chat backend gateway.
//!
//! [`ChatApi`] is the seam between the stores and the remote backend. The
//! runtime only talks to the backend through this trait; [`HttpChatApi`] is
//! the production implementation.

mod error;
mod http;

use std::future::Future;

use chrono::{DateTime, NaiveDateTime, Utc};
pub use error::{ApiError, ApiErrorKind};
pub use http::HttpChatApi;
use parley_types::{Feedback, Message, Rating, Role, Session, Source, UserIdentity};
use serde::Deserialize;

/// Remote chat API.
///
/// Every call receives the user identity explicitly; implementations must not
/// read it from ambient state.
pub trait ChatApi {
    fn health(&self) -> impl Future<Output = Result<Health, ApiError>>;

    /// Creates a session and returns its id.
    fn create_session(&self, user: &UserIdentity) -> impl Future<Output = Result<String, ApiError>>;

    fn list_sessions(
        &self,
        user: &UserIdentity,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<SessionRecord>, ApiError>>;

    fn list_messages(
        &self,
        user: &UserIdentity,
        session_id: &str,
    ) -> impl Future<Output = Result<Vec<MessageRecord>, ApiError>>;

    fn send_message(
        &self,
        user: &UserIdentity,
        session_id: &str,
        text: &str,
    ) -> impl Future<Output = Result<SendReply, ApiError>>;

    fn delete_session(
        &self,
        user: &UserIdentity,
        session_id: &str,
    ) -> impl Future<Output = Result<(), ApiError>>;

    fn submit_feedback(
        &self,
        user: &UserIdentity,
        session_id: &str,
        message_id: &str,
        rating: Rating,
    ) -> impl Future<Output = Result<FeedbackAck, ApiError>>;
}

/// Backend health probe (`GET /`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default)]
    pub cosmos_enabled: bool,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Session row as returned by `GET /sessions`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub last_message_at: Option<String>,
    #[serde(default)]
    pub message_count: Option<u64>,
}

impl From<SessionRecord> for Session {
    fn from(record: SessionRecord) -> Self {
        Session {
            id: record.id,
            last_message_preview: record.last_message.unwrap_or_default(),
            last_message_at: record.last_message_at.as_deref().and_then(parse_timestamp),
            message_count: record.message_count.unwrap_or(0),
        }
    }
}

/// Stored message as returned by `GET /session/messages`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub sources: Option<Vec<Source>>,
    #[serde(default)]
    pub thumbs_up: Option<bool>,
    #[serde(default)]
    pub thumbs_down: Option<bool>,
}

impl From<MessageRecord> for Message {
    fn from(record: MessageRecord) -> Self {
        Message {
            id: record.id,
            role: record.role,
            content: record.content,
            sources: record.sources.unwrap_or_default(),
            feedback: Feedback::from_flags(
                record.thumbs_up.unwrap_or(false),
                record.thumbs_down.unwrap_or(false),
            ),
        }
    }
}

/// Assistant answer returned by `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SendReply {
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub sources: Option<Vec<Source>>,
    #[serde(default)]
    pub feedback: Option<Feedback>,
}

impl SendReply {
    pub fn into_message(self) -> Message {
        Message::assistant(
            self.message_id,
            self.response,
            self.sources.unwrap_or_default(),
            self.feedback.unwrap_or_default(),
        )
    }
}

/// Thumbs flags echoed back by the backend after a feedback update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct FeedbackFlags {
    #[serde(default)]
    pub thumbs_up: bool,
    #[serde(default)]
    pub thumbs_down: bool,
}

/// Confirmation of `POST /update-feedback`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct FeedbackAck {
    #[serde(default)]
    pub updated_message: Option<FeedbackFlags>,
}

impl FeedbackAck {
    /// The feedback state the backend actually stored.
    pub fn resolved(&self) -> Feedback {
        self.updated_message
            .map_or(Feedback::None, |flags| {
                Feedback::from_flags(flags.thumbs_up, flags.thumbs_down)
            })
    }
}

/// Parses backend timestamps (RFC 3339, or naive ISO 8601 treated as UTC).
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
