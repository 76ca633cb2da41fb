//! Reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(app, event)`
//! and executes the returned effects.

use parley_types::{Feedback, Rating};

use crate::api::ApiError;
use crate::conversation::SendOutcome;
use crate::effects::Effect;
use crate::events::AppEvent;
use crate::notice::{Notice, StoreError};
use crate::sessions::LoadOutcome;
use crate::state::AppState;
use crate::tasks::TaskId;

/// The main reducer function.
///
/// Takes the current state and an event, mutates state, and returns effects
/// for the runtime to execute.
pub fn update(app: &mut AppState, event: AppEvent) -> Vec<Effect> {
    match event {
        AppEvent::Startup { last_session } => {
            if !app.restoration.start(last_session) {
                return vec![];
            }
            vec![begin_session_load(app)]
        }
        AppEvent::Reload => vec![begin_session_load(app)],
        AppEvent::NewChat => handle_new_chat(app),
        AppEvent::SelectSession(id) => handle_select(app, &id),
        AppEvent::Send(text) => handle_send(app, &text),
        AppEvent::DeleteSession(id) => handle_delete(app, &id),
        AppEvent::GiveFeedback { message_id, rating } => {
            handle_give_feedback(app, message_id, rating)
        }

        AppEvent::SessionsLoaded { task, result } => {
            match app.sessions.finish_load(task, result) {
                LoadOutcome::Stale => return vec![],
                LoadOutcome::Applied => {}
                LoadOutcome::Failed(e) => {
                    app.notify(Notice::error(
                        "Failed to load sessions",
                        StoreError::Fetch(e),
                    ));
                }
            }
            restore_if_waiting(app)
        }
        AppEvent::SessionCreated {
            task,
            then_send,
            result,
        } => handle_session_created(app, task, then_send, result),
        AppEvent::MessagesLoaded {
            task,
            session_id,
            result,
        } => {
            app.restoration.finish(task);
            if let LoadOutcome::Failed(e) = app.conversation.finish_load(task, &session_id, result)
            {
                app.notify(Notice::error(
                    "Failed to load conversation history",
                    StoreError::Fetch(e),
                ));
            }
            vec![]
        }
        AppEvent::ReplyReceived {
            task,
            session_id,
            result,
        } => match app.conversation.finish_send(task, &session_id, result) {
            // The backend updated preview, timestamp and count; pull them.
            SendOutcome::Appended | SendOutcome::Dropped => vec![begin_session_load(app)],
            SendOutcome::Failed(e) => {
                app.notify(Notice::error("Error sending message", StoreError::Send(e)));
                vec![]
            }
        },
        AppEvent::SessionDeleted { session_id, result } => match result {
            Ok(()) => {
                tracing::debug!(session_id, "session deleted");
                // A list load started before the delete may have put the
                // session back.
                vec![begin_session_load(app)]
            }
            Err(e) => {
                app.notify(Notice::error(
                    "Failed to delete session",
                    StoreError::Delete(e),
                ));
                // Reload is the rollback for the optimistic removal.
                vec![begin_session_load(app)]
            }
        },
        AppEvent::FeedbackSaved {
            session_id,
            message_id,
            result,
        } => match result {
            Ok(confirmed) => {
                if app.conversation.belongs_to(&session_id) {
                    app.conversation.apply_feedback(&message_id, confirmed);
                }
                app.notify(Notice::success(format!(
                    "Feedback {} saved",
                    feedback_label(confirmed)
                )));
                vec![]
            }
            Err(e) => {
                app.notify(Notice::error(
                    "Failed to save feedback",
                    StoreError::Feedback(e),
                ));
                vec![]
            }
        },
    }
}

fn begin_session_load(app: &mut AppState) -> Effect {
    let task = app.next_task();
    app.sessions.begin_load(task)
}

fn restore_if_waiting(app: &mut AppState) -> Vec<Effect> {
    let task = app.next_task();
    let Some(target) = app.restoration.resolve(app.sessions.sessions(), task) else {
        return vec![];
    };
    let mut effects = app.sessions.activate(&target.session_id);
    effects.push(
        app.conversation
            .reset_for(&target.session_id, target.task, Some(target.cancel)),
    );
    effects
}

/// Abandons a pending restoration because the user picked something else.
fn cancel_restoration(app: &mut AppState) -> Option<Effect> {
    app.restoration
        .cancel()
        .map(|token| Effect::CancelTask { token })
}

/// Opens `session_id` on explicit user request.
fn open_session(app: &mut AppState, session_id: &str) -> Vec<Effect> {
    let mut effects: Vec<Effect> = cancel_restoration(app).into_iter().collect();
    // A pending create would otherwise steal focus when it lands.
    app.create_task.clear();
    effects.extend(app.sessions.activate(session_id));
    let task = app.next_task();
    effects.push(app.conversation.reset_for(session_id, task, None));
    effects
}

fn handle_select(app: &mut AppState, session_id: &str) -> Vec<Effect> {
    if session_id.is_empty() {
        return vec![];
    }
    open_session(app, session_id)
}

fn handle_new_chat(app: &mut AppState) -> Vec<Effect> {
    if app.create_task.is_running() {
        tracing::debug!("new chat ignored: create already in flight");
        return vec![];
    }
    begin_create(app, None)
}

fn begin_create(app: &mut AppState, then_send: Option<String>) -> Vec<Effect> {
    let task = app.next_task();
    app.create_task.start(task);
    vec![Effect::CreateSession { task, then_send }]
}

fn handle_send(app: &mut AppState, text: &str) -> Vec<Effect> {
    let text = text.trim();
    if text.is_empty() {
        return vec![];
    }
    if app.conversation.is_awaiting_reply() {
        tracing::debug!("send ignored: reply pending");
        return vec![];
    }
    if app.conversation.is_loading() {
        tracing::debug!("send ignored: history still loading");
        return vec![];
    }

    if app.sessions.active_id().is_none() {
        if app.create_task.is_running() {
            tracing::debug!("send ignored: session create in flight");
            return vec![];
        }
        return begin_create(app, Some(text.to_string()));
    }

    begin_send(app, text)
}

fn begin_send(app: &mut AppState, text: &str) -> Vec<Effect> {
    let task = app.next_task();
    app.conversation.begin_send(task, text).into_iter().collect()
}

fn handle_session_created(
    app: &mut AppState,
    task: TaskId,
    then_send: Option<String>,
    result: Result<String, ApiError>,
) -> Vec<Effect> {
    if !app.create_task.finish_if_active(task) {
        tracing::debug!(?task, "ignoring superseded session create");
        return vec![];
    }

    match result {
        Ok(session_id) => {
            let mut effects: Vec<Effect> = cancel_restoration(app).into_iter().collect();
            effects.extend(app.sessions.activate(&session_id));
            app.conversation.start_fresh(&session_id);
            effects.push(begin_session_load(app));
            if let Some(text) = then_send {
                effects.extend(begin_send(app, &text));
            }
            effects
        }
        Err(e) => {
            let text = if then_send.is_some() {
                "Failed to create session"
            } else {
                "Failed to create new session"
            };
            app.notify(Notice::error(text, StoreError::Create(e)));
            vec![]
        }
    }
}

fn handle_delete(app: &mut AppState, session_id: &str) -> Vec<Effect> {
    if session_id.is_empty() {
        return vec![];
    }

    let mut effects: Vec<Effect> = app
        .restoration
        .forget(session_id)
        .map(|token| Effect::CancelTask { token })
        .into_iter()
        .collect();
    if app.conversation.belongs_to(session_id) {
        app.conversation.clear();
    }
    effects.extend(app.sessions.remove_optimistic(session_id));
    app.notify(Notice::success("Session deleted"));
    effects
}

fn handle_give_feedback(app: &mut AppState, message_id: String, rating: Rating) -> Vec<Effect> {
    let Some(session_id) = app.conversation.session_id().map(str::to_string) else {
        return vec![];
    };
    let accepts = app
        .conversation
        .message(&message_id)
        .is_some_and(parley_types::Message::accepts_feedback);
    if !accepts {
        tracing::debug!(message_id, "feedback ignored: unknown or unsaved message");
        return vec![];
    }

    vec![Effect::SubmitFeedback {
        session_id,
        message_id,
        rating,
    }]
}

fn feedback_label(feedback: Feedback) -> &'static str {
    match feedback {
        Feedback::Positive => "positive",
        Feedback::Negative => "negative",
        Feedback::None => "removed",
    }
}
