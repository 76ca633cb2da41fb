//! Application state.
//!
//! `AppState` is owned by the runtime and mutated only by the reducer.
//! The presentation layer reads it as a snapshot.

use parley_types::UserIdentity;

use crate::conversation::ConversationStore;
use crate::notice::Notice;
use crate::restore::Restoration;
use crate::sessions::SessionStore;
use crate::tasks::{TaskId, TaskSeq, TaskState};

/// What the conversation pane should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    /// Restoration has not finished; show a neutral loading indicator.
    Restoring,
    /// No active session.
    Empty,
    Conversation,
}

#[derive(Debug)]
pub struct AppState {
    /// Identity injected into every backend call.
    pub user: UserIdentity,
    pub session_limit: u32,
    pub sessions: SessionStore,
    pub conversation: ConversationStore,
    pub restoration: Restoration,
    pub create_task: TaskState,
    pub notices: Vec<Notice>,
    seq: TaskSeq,
}

impl AppState {
    pub fn new(user: UserIdentity, session_limit: u32) -> Self {
        Self {
            user,
            session_limit,
            sessions: SessionStore::default(),
            conversation: ConversationStore::default(),
            restoration: Restoration::default(),
            create_task: TaskState::default(),
            notices: Vec::new(),
            seq: TaskSeq::default(),
        }
    }

    pub fn next_task(&mut self) -> TaskId {
        self.seq.next_id()
    }

    pub fn pane(&self) -> Pane {
        if !self.restoration.is_complete() {
            Pane::Restoring
        } else if self.conversation.session_id().is_none() {
            Pane::Empty
        } else {
            Pane::Conversation
        }
    }

    pub fn is_creating_session(&self) -> bool {
        self.create_task.is_running()
    }

    pub fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}
