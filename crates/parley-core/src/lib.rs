//! Core of the parley chat client.
//!
//! Keeps the local session list and conversation consistent with the chat
//! backend across create/select/delete/send, and restores the last active
//! session on startup. The presentation layer drives a [`ChatRuntime`] with
//! [`AppEvent`]s and renders from [`AppState`].

pub mod api;
pub mod config;
pub mod conversation;
pub mod effects;
pub mod events;
pub mod hint;
pub mod logging;
pub mod markdown;
pub mod notice;
pub mod restore;
pub mod runtime;
pub mod sessions;
pub mod state;
pub mod tasks;
pub mod update;

pub use api::{ApiError, ApiErrorKind, ChatApi, HttpChatApi};
pub use config::Config;
pub use events::AppEvent;
pub use hint::{FileHintStore, HintStore, MemoryHintStore};
pub use notice::{Notice, NoticeLevel, StoreError};
pub use runtime::ChatRuntime;
pub use state::{AppState, Pane};
