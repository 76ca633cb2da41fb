//! Message list of the active session.
//!
//! The list is always tagged with the session it belongs to. Switching
//! sessions clears it in the same step, and completions that carry another
//! session (or a superseded task) are never applied, so messages from one
//! session can't leak into another.

use parley_types::{Feedback, Message};
use tokio_util::sync::CancellationToken;

use crate::api::ApiError;
use crate::effects::Effect;
use crate::sessions::LoadOutcome;
use crate::tasks::{TaskId, TaskState};

/// How a send completion was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The assistant reply was appended.
    Appended,
    /// The reply arrived after the conversation moved on; it stays on the
    /// backend and shows up when the session is reopened.
    Dropped,
    /// The round trip failed. The user message is kept.
    Failed(ApiError),
}

#[derive(Debug, Default)]
pub struct ConversationStore {
    session_id: Option<String>,
    messages: Vec<Message>,
    load_task: TaskState,
    send_task: TaskState,
}

impl ConversationStore {
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id.as_deref() == Some(id))
    }

    pub fn belongs_to(&self, session_id: &str) -> bool {
        self.session_id.as_deref() == Some(session_id)
    }

    pub fn is_loading(&self) -> bool {
        self.load_task.is_running()
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.send_task.is_running()
    }

    /// Switches to `session_id`, clearing the list, and starts loading its
    /// history.
    pub fn reset_for(
        &mut self,
        session_id: &str,
        task: TaskId,
        cancel: Option<CancellationToken>,
    ) -> Effect {
        self.switch(Some(session_id));
        self.load_task.start(task);
        Effect::LoadMessages {
            task,
            session_id: session_id.to_string(),
            cancel,
        }
    }

    /// Switches to a session that was just created; there is no history to
    /// load.
    pub fn start_fresh(&mut self, session_id: &str) {
        self.switch(Some(session_id));
    }

    /// Detaches from any session.
    pub fn clear(&mut self) {
        self.switch(None);
    }

    fn switch(&mut self, session_id: Option<&str>) {
        self.session_id = session_id.map(str::to_string);
        self.messages.clear();
        self.load_task.clear();
        self.send_task.clear();
    }

    /// Applies a history load. Success replaces the list wholesale; failure
    /// leaves it empty.
    pub fn finish_load(
        &mut self,
        task: TaskId,
        session_id: &str,
        result: Result<Vec<Message>, ApiError>,
    ) -> LoadOutcome {
        if !self.belongs_to(session_id) || !self.load_task.finish_if_active(task) {
            tracing::debug!(?task, session_id, "ignoring stale message load");
            return LoadOutcome::Stale;
        }

        match result {
            Ok(messages) => {
                self.messages = messages;
                LoadOutcome::Applied
            }
            Err(e) => {
                self.messages.clear();
                LoadOutcome::Failed(e)
            }
        }
    }

    /// Appends the user's message before any network call.
    pub fn append_user_message(&mut self, text: &str) {
        self.messages.push(Message::user(text));
    }

    /// Optimistically appends `text` and returns the request that completes
    /// the send. Returns `None` when no session is attached or its history is
    /// still loading, since the load would replace the appended message.
    pub fn begin_send(&mut self, task: TaskId, text: &str) -> Option<Effect> {
        if self.is_loading() {
            return None;
        }
        let session_id = self.session_id.clone()?;
        self.append_user_message(text);
        self.send_task.start(task);
        Some(Effect::SendMessage {
            task,
            session_id,
            text: text.to_string(),
        })
    }

    pub fn finish_send(
        &mut self,
        task: TaskId,
        session_id: &str,
        result: Result<Message, ApiError>,
    ) -> SendOutcome {
        let current = self.belongs_to(session_id) && self.send_task.finish_if_active(task);
        match result {
            Ok(reply) if current => {
                self.messages.push(reply);
                SendOutcome::Appended
            }
            Ok(_) => {
                tracing::debug!(?task, session_id, "dropping reply for inactive conversation");
                SendOutcome::Dropped
            }
            Err(e) => SendOutcome::Failed(e),
        }
    }

    /// Patches a message with the feedback state the backend confirmed.
    pub fn apply_feedback(&mut self, message_id: &str, feedback: Feedback) -> bool {
        match self
            .messages
            .iter_mut()
            .find(|m| m.id.as_deref() == Some(message_id))
        {
            Some(message) => {
                message.feedback = feedback;
                true
            }
            None => false,
        }
    }
}
