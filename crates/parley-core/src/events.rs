//! Events fed into the reducer.
//!
//! User intents come from the presentation layer; completions come from the
//! runtime when a backend request settles.

use parley_types::{Feedback, Message, Rating, Session};

use crate::api::ApiError;
use crate::tasks::TaskId;

#[derive(Debug)]
pub enum AppEvent {
    // User intents
    /// First event of a run; carries the persisted hint.
    Startup { last_session: Option<String> },
    /// Refresh the session list.
    Reload,
    NewChat,
    SelectSession(String),
    Send(String),
    DeleteSession(String),
    GiveFeedback { message_id: String, rating: Rating },

    // Completions
    SessionsLoaded {
        task: TaskId,
        result: Result<Vec<Session>, ApiError>,
    },
    SessionCreated {
        task: TaskId,
        then_send: Option<String>,
        result: Result<String, ApiError>,
    },
    MessagesLoaded {
        task: TaskId,
        session_id: String,
        result: Result<Vec<Message>, ApiError>,
    },
    ReplyReceived {
        task: TaskId,
        session_id: String,
        result: Result<Message, ApiError>,
    },
    SessionDeleted {
        session_id: String,
        result: Result<(), ApiError>,
    },
    FeedbackSaved {
        session_id: String,
        message_id: String,
        result: Result<Feedback, ApiError>,
    },
}
