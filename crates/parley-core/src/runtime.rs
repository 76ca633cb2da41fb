//! Effect runtime.
//!
//! Owns the state, feeds events through the reducer and executes the
//! resulting effects. Backend requests run as local futures on the caller's
//! task; their completions are fed back as events. Everything happens on one
//! thread, so state needs no locking.

use std::rc::Rc;

use futures_util::future::LocalBoxFuture;
use futures_util::stream::FuturesUnordered;
use futures_util::{FutureExt, StreamExt};
use parley_types::{Message, Session, UserIdentity};

use crate::api::ChatApi;
use crate::effects::Effect;
use crate::events::AppEvent;
use crate::hint::HintStore;
use crate::notice::Notice;
use crate::state::AppState;
use crate::update::update;

/// A request in flight. Resolves to `None` when it was cancelled.
type Pending = LocalBoxFuture<'static, Option<AppEvent>>;

pub struct ChatRuntime<A, H> {
    api: Rc<A>,
    hints: H,
    state: AppState,
    pending: FuturesUnordered<Pending>,
}

impl<A, H> ChatRuntime<A, H>
where
    A: ChatApi + 'static,
    H: HintStore,
{
    pub fn new(api: A, hints: H, user: UserIdentity, session_limit: u32) -> Self {
        Self {
            api: Rc::new(api),
            hints,
            state: AppState::new(user, session_limit),
            pending: FuturesUnordered::new(),
        }
    }

    /// Reads the persisted hint and kicks off the first session load.
    pub fn start(&mut self) {
        let last_session = self.hints.load();
        tracing::debug!(?last_session, "starting");
        self.dispatch(AppEvent::Startup { last_session });
    }

    /// Applies an event and executes its effects.
    pub fn dispatch(&mut self, event: AppEvent) {
        for effect in update(&mut self.state, event) {
            self.execute(effect);
        }
    }

    /// Waits for one in-flight request and applies its completion.
    /// Returns false when nothing is in flight.
    pub async fn next_completion(&mut self) -> bool {
        match self.pending.next().await {
            Some(Some(event)) => {
                self.dispatch(event);
                true
            }
            Some(None) => true,
            None => false,
        }
    }

    /// Runs until every request, including follow-ups, has settled.
    pub async fn settle(&mut self) {
        while self.next_completion().await {}
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.state.notices)
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn hints(&self) -> &H {
        &self.hints
    }

    fn execute(&mut self, effect: Effect) {
        let api = Rc::clone(&self.api);
        let user = self.state.user.clone();

        match effect {
            Effect::LoadSessions { task } => {
                let limit = self.state.session_limit;
                self.spawn(async move {
                    let result = api
                        .list_sessions(&user, limit)
                        .await
                        .map(|records| records.into_iter().map(Session::from).collect());
                    Some(AppEvent::SessionsLoaded { task, result })
                });
            }
            Effect::CreateSession { task, then_send } => {
                self.spawn(async move {
                    let result = api.create_session(&user).await;
                    Some(AppEvent::SessionCreated {
                        task,
                        then_send,
                        result,
                    })
                });
            }
            Effect::LoadMessages {
                task,
                session_id,
                cancel,
            } => {
                self.spawn(async move {
                    let fetch = api.list_messages(&user, &session_id);
                    let result = match cancel {
                        Some(token) => token.run_until_cancelled(fetch).await?,
                        None => fetch.await,
                    };
                    let result = result.map(|records| records.into_iter().map(Message::from).collect());
                    Some(AppEvent::MessagesLoaded {
                        task,
                        session_id,
                        result,
                    })
                });
            }
            Effect::SendMessage {
                task,
                session_id,
                text,
            } => {
                self.spawn(async move {
                    let result = api
                        .send_message(&user, &session_id, &text)
                        .await
                        .map(crate::api::SendReply::into_message);
                    Some(AppEvent::ReplyReceived {
                        task,
                        session_id,
                        result,
                    })
                });
            }
            Effect::DeleteSession { session_id } => {
                // The hint may name a session that is not open in this run.
                if self.hints.load().as_deref() == Some(session_id.as_str()) {
                    self.hints.clear();
                }
                self.spawn(async move {
                    let result = api.delete_session(&user, &session_id).await;
                    Some(AppEvent::SessionDeleted { session_id, result })
                });
            }
            Effect::SubmitFeedback {
                session_id,
                message_id,
                rating,
            } => {
                self.spawn(async move {
                    let result = api
                        .submit_feedback(&user, &session_id, &message_id, rating)
                        .await
                        .map(|ack| ack.resolved());
                    Some(AppEvent::FeedbackSaved {
                        session_id,
                        message_id,
                        result,
                    })
                });
            }
            Effect::SaveHint { session_id } => self.hints.save(&session_id),
            Effect::ClearHint => self.hints.clear(),
            Effect::CancelTask { token } => token.cancel(),
        }
    }

    fn spawn(&mut self, fut: impl Future<Output = Option<AppEvent>> + 'static) {
        self.pending.push(fut.boxed_local());
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};
    use std::time::Duration;

    use parley_types::{Feedback, Rating, Role};

    use super::*;
    use crate::api::{
        ApiError, ApiErrorKind, FeedbackAck, FeedbackFlags, Health, MessageRecord, SendReply,
        SessionRecord,
    };
    use crate::hint::MemoryHintStore;
    use crate::state::Pane;

    /// In-memory backend with failure switches and per-session latency.
    #[derive(Default)]
    struct FakeApi {
        sessions: RefCell<Vec<String>>,
        messages: RefCell<HashMap<String, Vec<MessageRecord>>>,
        feedback: RefCell<HashMap<String, FeedbackFlags>>,
        failing: RefCell<HashSet<&'static str>>,
        latency: RefCell<HashMap<String, Duration>>,
        calls: RefCell<Vec<String>>,
        next_id: RefCell<u32>,
    }

    impl FakeApi {
        fn with_sessions(ids: &[&str]) -> Self {
            let api = Self::default();
            for id in ids {
                api.sessions.borrow_mut().push((*id).to_string());
                api.messages.borrow_mut().insert(
                    (*id).to_string(),
                    vec![record(&format!("{id}-m1"), Role::Assistant, &format!("hello from {id}"))],
                );
            }
            api
        }

        fn fail(&self, op: &'static str) {
            self.failing.borrow_mut().insert(op);
        }

        fn heal(&self, op: &'static str) {
            self.failing.borrow_mut().remove(op);
        }

        fn delay(&self, session_id: &str, latency: Duration) {
            self.latency
                .borrow_mut()
                .insert(session_id.to_string(), latency);
        }

        fn check(&self, op: &'static str) -> Result<(), ApiError> {
            if self.failing.borrow().contains(op) {
                Err(ApiError::http_status(500, r#"{"detail":"injected failure"}"#))
            } else {
                Ok(())
            }
        }

        fn log(&self, call: String) {
            self.calls.borrow_mut().push(call);
        }

        fn calls_to(&self, prefix: &str) -> usize {
            self.calls
                .borrow()
                .iter()
                .filter(|c| c.starts_with(prefix))
                .count()
        }
    }

    fn record(id: &str, role: Role, content: &str) -> MessageRecord {
        MessageRecord {
            id: Some(id.to_string()),
            role,
            content: content.to_string(),
            sources: None,
            thumbs_up: None,
            thumbs_down: None,
        }
    }

    impl ChatApi for FakeApi {
        async fn health(&self) -> Result<Health, ApiError> {
            Ok(Health {
                status: "healthy".to_string(),
                cosmos_enabled: true,
                success: Some(true),
                timestamp: None,
            })
        }

        async fn create_session(&self, _user: &UserIdentity) -> Result<String, ApiError> {
            self.log("create".to_string());
            self.check("create")?;
            let n = {
                let mut next = self.next_id.borrow_mut();
                *next += 1;
                *next
            };
            let id = format!("new-{n}");
            self.sessions.borrow_mut().insert(0, id.clone());
            Ok(id)
        }

        async fn list_sessions(
            &self,
            _user: &UserIdentity,
            limit: u32,
        ) -> Result<Vec<SessionRecord>, ApiError> {
            self.log("list".to_string());
            self.check("list")?;
            Ok(self
                .sessions
                .borrow()
                .iter()
                .take(limit as usize)
                .map(|id| {
                    let messages = self.messages.borrow();
                    let history = messages.get(id);
                    SessionRecord {
                        id: id.clone(),
                        last_message: history
                            .and_then(|h| h.last())
                            .map(|m| m.content.clone()),
                        last_message_at: None,
                        message_count: history.map(|h| h.len() as u64),
                    }
                })
                .collect())
        }

        async fn list_messages(
            &self,
            _user: &UserIdentity,
            session_id: &str,
        ) -> Result<Vec<MessageRecord>, ApiError> {
            self.log(format!("messages:{session_id}"));
            let latency = self.latency.borrow().get(session_id).copied();
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
            self.check("messages")?;
            Ok(self
                .messages
                .borrow()
                .get(session_id)
                .cloned()
                .unwrap_or_default())
        }

        async fn send_message(
            &self,
            _user: &UserIdentity,
            session_id: &str,
            text: &str,
        ) -> Result<SendReply, ApiError> {
            self.log(format!("send:{session_id}"));
            let latency = self.latency.borrow().get(session_id).copied();
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
            self.check("send")?;
            let reply_id = format!("{session_id}-r{}", text.len());
            let mut messages = self.messages.borrow_mut();
            let history = messages.entry(session_id.to_string()).or_default();
            history.push(MessageRecord {
                id: None,
                ..record("", Role::User, text)
            });
            history.push(record(&reply_id, Role::Assistant, &format!("echo: {text}")));
            Ok(SendReply {
                message_id: Some(reply_id),
                response: format!("echo: {text}"),
                sources: None,
                feedback: None,
            })
        }

        async fn delete_session(
            &self,
            _user: &UserIdentity,
            session_id: &str,
        ) -> Result<(), ApiError> {
            self.log(format!("delete:{session_id}"));
            self.check("delete")?;
            self.sessions.borrow_mut().retain(|id| id != session_id);
            Ok(())
        }

        async fn submit_feedback(
            &self,
            _user: &UserIdentity,
            _session_id: &str,
            message_id: &str,
            rating: Rating,
        ) -> Result<FeedbackAck, ApiError> {
            self.log(format!("feedback:{message_id}"));
            self.check("feedback")?;
            // Same rating twice toggles it off, like the backend does.
            let mut store = self.feedback.borrow_mut();
            let current = store.entry(message_id.to_string()).or_default();
            let next = match rating {
                Rating::Positive if current.thumbs_up => FeedbackFlags::default(),
                Rating::Negative if current.thumbs_down => FeedbackFlags::default(),
                Rating::Positive => FeedbackFlags {
                    thumbs_up: true,
                    thumbs_down: false,
                },
                Rating::Negative => FeedbackFlags {
                    thumbs_up: false,
                    thumbs_down: true,
                },
            };
            *current = next;
            Ok(FeedbackAck {
                updated_message: Some(next),
            })
        }
    }

    fn runtime(api: FakeApi, hint: Option<&str>) -> ChatRuntime<FakeApi, MemoryHintStore> {
        let hints = hint.map_or_else(MemoryHintStore::default, MemoryHintStore::with_value);
        ChatRuntime::new(api, hints, UserIdentity::default(), 10)
    }

    fn session_ids<A: ChatApi + 'static, H: HintStore>(rt: &ChatRuntime<A, H>) -> Vec<String> {
        rt.state()
            .sessions
            .sessions()
            .iter()
            .map(|s| s.id.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_startup_restores_hinted_session() {
        let mut rt = runtime(FakeApi::with_sessions(&["S1", "S2"]), Some("S2"));
        rt.start();
        assert_eq!(rt.state().pane(), Pane::Restoring);
        rt.settle().await;

        assert_eq!(rt.state().sessions.active_id(), Some("S2"));
        assert_eq!(rt.state().pane(), Pane::Conversation);
        assert!(rt.state().conversation.message("S2-m1").is_some());
        assert_eq!(rt.hints().load().as_deref(), Some("S2"));
    }

    #[tokio::test]
    async fn test_startup_with_unknown_hint_opens_first() {
        let mut rt = runtime(FakeApi::with_sessions(&["S1", "S2"]), Some("S9"));
        rt.start();
        rt.settle().await;

        assert_eq!(rt.state().sessions.active_id(), Some("S1"));
        assert_eq!(rt.hints().load().as_deref(), Some("S1"));
    }

    #[tokio::test]
    async fn test_startup_without_sessions_loads_no_history() {
        let mut rt = runtime(FakeApi::default(), Some("S1"));
        rt.start();
        rt.settle().await;

        assert_eq!(rt.state().sessions.active_id(), None);
        assert_eq!(rt.state().pane(), Pane::Empty);
        assert_eq!(rt.api().calls_to("messages:"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_user_selection_wins_over_slow_restoration() {
        let api = FakeApi::with_sessions(&["S1", "S2"]);
        api.delay("S1", Duration::from_secs(5));
        let mut rt = runtime(api, Some("S1"));
        rt.start();

        // First list arrives; restoration starts loading S1 slowly.
        assert!(rt.next_completion().await);
        assert_eq!(rt.state().restoration.target(), Some("S1"));

        rt.dispatch(AppEvent::SelectSession("S2".to_string()));
        rt.settle().await;

        assert_eq!(rt.state().sessions.active_id(), Some("S2"));
        assert!(rt.state().conversation.message("S2-m1").is_some());
        assert!(rt.state().conversation.message("S1-m1").is_none());
        assert_eq!(rt.hints().load().as_deref(), Some("S2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_selection_wins() {
        let api = FakeApi::with_sessions(&["S1", "S2", "S3"]);
        api.delay("S2", Duration::from_secs(3));
        let mut rt = runtime(api, None);
        rt.start();
        rt.settle().await;

        rt.dispatch(AppEvent::SelectSession("S2".to_string()));
        rt.dispatch(AppEvent::SelectSession("S3".to_string()));
        rt.settle().await;

        assert_eq!(rt.state().conversation.session_id(), Some("S3"));
        assert!(rt.state().conversation.message("S3-m1").is_some());
        assert!(rt.state().conversation.message("S2-m1").is_none());
    }

    #[tokio::test]
    async fn test_send_round_trip_refreshes_preview() {
        let mut rt = runtime(FakeApi::with_sessions(&["S1"]), None);
        rt.start();
        rt.settle().await;

        rt.dispatch(AppEvent::Send("ping".to_string()));
        assert_eq!(rt.state().conversation.messages().len(), 2);
        rt.settle().await;

        let messages = rt.state().conversation.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[2].content, "echo: ping");
        let preview = &rt.state().sessions.sessions()[0].last_message_preview;
        assert_eq!(preview, "echo: ping");
    }

    #[tokio::test]
    async fn test_failed_send_keeps_user_message() {
        let api = FakeApi::with_sessions(&["S1"]);
        api.fail("send");
        let mut rt = runtime(api, None);
        rt.start();
        rt.settle().await;

        rt.dispatch(AppEvent::Send("ping".to_string()));
        rt.settle().await;

        let messages = rt.state().conversation.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "ping");
        let notices = rt.take_notices();
        assert_eq!(notices.last().unwrap().text, "Error sending message");
        assert!(rt.take_notices().is_empty());
    }

    #[tokio::test]
    async fn test_send_without_session_creates_one() {
        let mut rt = runtime(FakeApi::default(), None);
        rt.start();
        rt.settle().await;

        rt.dispatch(AppEvent::Send("first words".to_string()));
        rt.settle().await;

        assert_eq!(rt.state().sessions.active_id(), Some("new-1"));
        assert_eq!(session_ids(&rt), ["new-1"]);
        assert_eq!(rt.state().conversation.messages().len(), 2);
        assert_eq!(rt.hints().load().as_deref(), Some("new-1"));
    }

    #[tokio::test]
    async fn test_new_chat() {
        let mut rt = runtime(FakeApi::with_sessions(&["S1"]), None);
        rt.start();
        rt.settle().await;

        rt.dispatch(AppEvent::NewChat);
        rt.dispatch(AppEvent::NewChat);
        rt.settle().await;

        assert_eq!(rt.api().calls_to("create"), 1);
        assert_eq!(rt.state().sessions.active_id(), Some("new-1"));
        assert!(rt.state().conversation.messages().is_empty());
        assert_eq!(session_ids(&rt), ["new-1", "S1"]);
    }

    #[tokio::test]
    async fn test_delete_active_session() {
        let mut rt = runtime(FakeApi::with_sessions(&["S1", "S2"]), Some("S1"));
        rt.start();
        rt.settle().await;

        rt.dispatch(AppEvent::DeleteSession("S1".to_string()));
        assert_eq!(session_ids(&rt), ["S2"]);
        rt.settle().await;

        assert_eq!(rt.state().sessions.active_id(), None);
        assert_eq!(rt.state().pane(), Pane::Empty);
        assert_eq!(rt.hints().load(), None);
        assert_eq!(session_ids(&rt), ["S2"]);
    }

    #[tokio::test]
    async fn test_delete_hinted_session_without_opening_it() {
        let mut rt = runtime(FakeApi::with_sessions(&["S1", "S2"]), Some("S1"));
        rt.dispatch(AppEvent::Reload);
        rt.settle().await;
        assert_eq!(rt.state().sessions.active_id(), None);

        rt.dispatch(AppEvent::DeleteSession("S1".to_string()));
        rt.settle().await;

        assert_eq!(session_ids(&rt), ["S2"]);
        assert_eq!(rt.hints().load(), None);
    }

    #[tokio::test]
    async fn test_delete_other_session_keeps_hint() {
        let mut rt = runtime(FakeApi::with_sessions(&["S1", "S2"]), Some("S1"));
        rt.dispatch(AppEvent::Reload);
        rt.settle().await;

        rt.dispatch(AppEvent::DeleteSession("S2".to_string()));
        rt.settle().await;

        assert_eq!(rt.hints().load().as_deref(), Some("S1"));
    }

    #[tokio::test]
    async fn test_delete_during_list_refresh_settles_on_backend_truth() {
        let mut rt = runtime(FakeApi::with_sessions(&["S1", "S2"]), None);
        rt.start();
        rt.settle().await;

        rt.dispatch(AppEvent::Reload);
        rt.dispatch(AppEvent::DeleteSession("S2".to_string()));
        rt.settle().await;

        assert_eq!(session_ids(&rt), ["S1"]);
        assert_eq!(rt.state().sessions.active_id(), Some("S1"));
    }

    #[tokio::test]
    async fn test_delete_during_reply_refresh_settles_on_backend_truth() {
        let mut rt = runtime(FakeApi::with_sessions(&["S1", "S2"]), None);
        rt.start();
        rt.settle().await;

        rt.dispatch(AppEvent::Send("ping".to_string()));
        rt.dispatch(AppEvent::DeleteSession("S2".to_string()));
        rt.settle().await;

        assert_eq!(session_ids(&rt), ["S1"]);
        assert_eq!(rt.state().conversation.messages().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_delete_reloads_backend_truth() {
        let api = FakeApi::with_sessions(&["S1", "S2"]);
        api.fail("delete");
        let mut rt = runtime(api, Some("S1"));
        rt.start();
        rt.settle().await;

        rt.dispatch(AppEvent::DeleteSession("S1".to_string()));
        rt.settle().await;

        assert_eq!(session_ids(&rt), ["S1", "S2"]);
        assert_eq!(rt.state().sessions.active_id(), None);
        assert_eq!(rt.hints().load(), None);
        let texts: Vec<_> = rt.take_notices().into_iter().map(|n| n.text).collect();
        assert_eq!(texts, ["Session deleted", "Failed to delete session"]);
    }

    #[tokio::test]
    async fn test_failed_list_keeps_previous_list() {
        let mut rt = runtime(FakeApi::with_sessions(&["S1"]), None);
        rt.start();
        rt.settle().await;

        rt.api().fail("list");
        rt.dispatch(AppEvent::Reload);
        rt.settle().await;
        assert_eq!(session_ids(&rt), ["S1"]);

        rt.api().heal("list");
        rt.dispatch(AppEvent::Reload);
        rt.settle().await;
        assert_eq!(session_ids(&rt), ["S1"]);
    }

    #[tokio::test]
    async fn test_failed_history_load_leaves_empty_pane() {
        let api = FakeApi::with_sessions(&["S1"]);
        api.fail("messages");
        let mut rt = runtime(api, None);
        rt.start();
        rt.settle().await;

        assert!(rt.state().restoration.is_complete());
        assert!(rt.state().conversation.messages().is_empty());
        assert_eq!(
            rt.take_notices().last().unwrap().text,
            "Failed to load conversation history"
        );
    }

    #[tokio::test]
    async fn test_feedback_toggle_uses_confirmed_state() {
        let mut rt = runtime(FakeApi::with_sessions(&["S1"]), None);
        rt.start();
        rt.settle().await;

        let give = |rating| AppEvent::GiveFeedback {
            message_id: "S1-m1".to_string(),
            rating,
        };

        rt.dispatch(give(Rating::Positive));
        rt.settle().await;
        let feedback = rt.state().conversation.message("S1-m1").unwrap().feedback;
        assert_eq!(feedback, Feedback::Positive);

        rt.dispatch(give(Rating::Positive));
        rt.settle().await;
        let feedback = rt.state().conversation.message("S1-m1").unwrap().feedback;
        assert_eq!(feedback, Feedback::None);

        let texts: Vec<_> = rt.take_notices().into_iter().map(|n| n.text).collect();
        assert_eq!(texts, ["Feedback positive saved", "Feedback removed saved"]);
    }

    #[tokio::test]
    async fn test_failed_feedback_surfaces_error() {
        let api = FakeApi::with_sessions(&["S1"]);
        api.fail("feedback");
        let mut rt = runtime(api, None);
        rt.start();
        rt.settle().await;

        rt.dispatch(AppEvent::GiveFeedback {
            message_id: "S1-m1".to_string(),
            rating: Rating::Negative,
        });
        rt.settle().await;

        let feedback = rt.state().conversation.message("S1-m1").unwrap().feedback;
        assert_eq!(feedback, Feedback::None);
        let notice = rt.take_notices().pop().unwrap();
        assert_eq!(
            notice.error.map(|e| e.api_error().kind),
            Some(ApiErrorKind::HttpStatus)
        );
    }

    #[tokio::test]
    async fn test_settle_without_work_returns() {
        let mut rt = runtime(FakeApi::default(), None);
        assert!(!rt.has_pending());
        assert!(!rt.next_completion().await);
        rt.settle().await;
    }
}
