//! Startup restoration of the previously active session.

use parley_types::Session;
use tokio_util::sync::CancellationToken;

use crate::tasks::TaskId;

/// Picks the session to reopen: the hinted one if it is still listed,
/// otherwise the first listed session. List order is the backend's.
pub fn choose_session<'a>(sessions: &'a [Session], hint: Option<&str>) -> Option<&'a str> {
    choose_excluding(sessions, hint, &[])
}

fn choose_excluding<'a>(
    sessions: &'a [Session],
    hint: Option<&str>,
    deleted: &[String],
) -> Option<&'a str> {
    let mut candidates = sessions.iter().filter(|s| !deleted.contains(&s.id));
    hint.and_then(|hint| candidates.clone().find(|s| s.id == hint))
        .or_else(|| candidates.next())
        .map(|s| s.id.as_str())
}

/// The session restoration decided to open.
#[derive(Debug, Clone)]
pub struct RestoreTarget {
    pub session_id: String,
    pub task: TaskId,
    pub cancel: CancellationToken,
}

/// Runs once per process: `Pending -> Waiting -> Loading -> Complete`.
///
/// `Waiting` lasts until the first session list settles, `Loading` until the
/// chosen session's history settles. A user action that changes the active
/// session cancels it at any point.
#[derive(Debug, Default)]
pub enum Restoration {
    #[default]
    Pending,
    Waiting {
        hint: Option<String>,
        /// Sessions deleted before the first list arrived; that list may
        /// still contain them.
        deleted: Vec<String>,
        cancel: CancellationToken,
    },
    Loading {
        session_id: String,
        task: TaskId,
        cancel: CancellationToken,
    },
    Complete,
}

impl Restoration {
    /// Begins waiting for the first session list. Returns false if
    /// restoration already ran.
    pub fn start(&mut self, hint: Option<String>) -> bool {
        if !matches!(self, Restoration::Pending) {
            return false;
        }
        *self = Restoration::Waiting {
            hint,
            deleted: Vec::new(),
            cancel: CancellationToken::new(),
        };
        true
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Restoration::Complete)
    }

    /// The session currently being restored, if any.
    pub fn target(&self) -> Option<&str> {
        match self {
            Restoration::Loading { session_id, .. } => Some(session_id),
            _ => None,
        }
    }

    /// Keeps restoration away from a session the user just deleted.
    ///
    /// While waiting for the first list the id is excluded from the choice.
    /// If the session is already being restored, restoration is abandoned
    /// and the token to cancel is returned.
    pub fn forget(&mut self, session_id: &str) -> Option<CancellationToken> {
        if let Restoration::Waiting { deleted, .. } = self {
            deleted.push(session_id.to_string());
            return None;
        }
        if self.target() == Some(session_id) {
            return self.cancel();
        }
        None
    }

    /// Decides what to open once the first session list settled. An empty
    /// list completes restoration with nothing selected.
    pub fn resolve(&mut self, sessions: &[Session], task: TaskId) -> Option<RestoreTarget> {
        let Restoration::Waiting {
            hint,
            deleted,
            cancel,
        } = self
        else {
            return None;
        };

        let Some(session_id) =
            choose_excluding(sessions, hint.as_deref(), deleted).map(str::to_string)
        else {
            tracing::debug!("no sessions to restore");
            *self = Restoration::Complete;
            return None;
        };

        tracing::debug!(session_id, "restoring session");
        let cancel = cancel.clone();
        *self = Restoration::Loading {
            session_id: session_id.clone(),
            task,
            cancel: cancel.clone(),
        };
        Some(RestoreTarget {
            session_id,
            task,
            cancel,
        })
    }

    /// Completes restoration when the restored history load settles.
    pub fn finish(&mut self, task: TaskId) -> bool {
        match self {
            Restoration::Loading { task: active, .. } if *active == task => {
                *self = Restoration::Complete;
                true
            }
            _ => false,
        }
    }

    /// Abandons restoration in favor of an explicit user choice. Returns the
    /// token to cancel when something was still in flight.
    pub fn cancel(&mut self) -> Option<CancellationToken> {
        match std::mem::replace(self, Restoration::Complete) {
            Restoration::Waiting { cancel, .. } | Restoration::Loading { cancel, .. } => {
                tracing::debug!("restoration cancelled by user action");
                Some(cancel)
            }
            Restoration::Pending | Restoration::Complete => None,
        }
    }
}
