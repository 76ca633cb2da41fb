//! Effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! They represent backend requests and hint persistence only; the reducer
//! never performs I/O itself.
//!
//! Cancellation is decided by the reducer (`Effect::CancelTask`) and carried
//! out by the runtime, which calls `token.cancel()`.

use parley_types::Rating;
use tokio_util::sync::CancellationToken;

use crate::tasks::TaskId;

#[derive(Debug)]
pub enum Effect {
    /// Fetch the session list.
    LoadSessions { task: TaskId },

    /// Create a session. `then_send` carries the message that triggered an
    /// implicit create, to be sent once the session exists.
    CreateSession {
        task: TaskId,
        then_send: Option<String>,
    },

    /// Fetch the message history of a session. A load started by restoration
    /// carries the restoration token and is abandoned when it is cancelled.
    LoadMessages {
        task: TaskId,
        session_id: String,
        cancel: Option<CancellationToken>,
    },

    /// Send a user message and wait for the assistant reply.
    SendMessage {
        task: TaskId,
        session_id: String,
        text: String,
    },

    /// Delete a session in the background.
    DeleteSession { session_id: String },

    SubmitFeedback {
        session_id: String,
        message_id: String,
        rating: Rating,
    },

    /// Persist the last-session hint.
    SaveHint { session_id: String },

    /// Forget the last-session hint.
    ClearHint,

    /// Cancel a running task.
    CancelTask { token: CancellationToken },
}
