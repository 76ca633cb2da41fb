//! Session list and active-session pointer.
//!
//! The store only mutates in-memory state and returns effects; it never
//! talks to the backend directly.

use parley_types::Session;

use crate::api::ApiError;
use crate::effects::Effect;
use crate::tasks::{TaskId, TaskState};

/// Loading status of the session list.
///
/// `Idle -> Loading -> {Ready, Error}`; both terminal states go back to
/// `Loading` on the next load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

/// How a load completion was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A newer load superseded this one; nothing changed.
    Stale,
    Applied,
    Failed(ApiError),
}

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Vec<Session>,
    active_id: Option<String>,
    status: LoadStatus,
    list_task: TaskState,
}

impl SessionStore {
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn active(&self) -> Option<&Session> {
        let id = self.active_id.as_deref()?;
        self.get(id)
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn status(&self) -> LoadStatus {
        self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }

    /// Starts a list load. Only the most recently started load is applied.
    pub fn begin_load(&mut self, task: TaskId) -> Effect {
        self.status = LoadStatus::Loading;
        self.list_task.start(task);
        Effect::LoadSessions { task }
    }

    /// Applies a list load. On success the list is replaced exactly; on
    /// failure the previous list is kept.
    pub fn finish_load(
        &mut self,
        task: TaskId,
        result: Result<Vec<Session>, ApiError>,
    ) -> LoadOutcome {
        if !self.list_task.finish_if_active(task) {
            tracing::debug!(?task, "ignoring stale session list");
            return LoadOutcome::Stale;
        }

        match result {
            Ok(sessions) => {
                tracing::debug!(count = sessions.len(), "session list loaded");
                self.sessions = sessions;
                self.status = LoadStatus::Ready;
                LoadOutcome::Applied
            }
            Err(e) => {
                self.status = LoadStatus::Error;
                LoadOutcome::Failed(e)
            }
        }
    }

    /// Makes `id` the active session and persists it as the hint.
    /// An empty id is ignored.
    pub fn activate(&mut self, id: &str) -> Vec<Effect> {
        if id.is_empty() {
            return vec![];
        }
        self.active_id = Some(id.to_string());
        vec![Effect::SaveHint {
            session_id: id.to_string(),
        }]
    }

    /// Removes `id` locally before the backend confirms.
    ///
    /// Clearing the active pointer (and the hint) happens immediately when the
    /// removed session was active. If the background delete fails the caller
    /// reloads the list, which is the only rollback.
    pub fn remove_optimistic(&mut self, id: &str) -> Vec<Effect> {
        self.sessions.retain(|s| s.id != id);

        let mut effects = Vec::new();
        if self.active_id.as_deref() == Some(id) {
            self.active_id = None;
            effects.push(Effect::ClearHint);
        }
        effects.push(Effect::DeleteSession {
            session_id: id.to_string(),
        });
        effects
    }
}
