use chrono::{DateTime, Utc};

/// One conversation thread as listed by the backend.
///
/// Preview, timestamp and count are owned by the backend and only change when
/// the list is reloaded; they are never computed locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub last_message_preview: String,
    pub last_message_at: Option<DateTime<Utc>>,
    pub message_count: u64,
}

impl Session {
    /// Characters of the last message shown in a session list row.
    pub const PREVIEW_CHARS: usize = 35;

    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            last_message_preview: String::new(),
            last_message_at: None,
            message_count: 0,
        }
    }

    /// Short label for a session list row.
    pub fn preview(&self) -> String {
        let text = self.last_message_preview.trim();
        if text.is_empty() {
            return "New conversation".to_string();
        }
        text.chars().take(Self::PREVIEW_CHARS).collect()
    }
}

/// Coarse "time ago" label used next to session timestamps.
pub fn relative_time(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - ts).num_seconds();
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if seconds < 60 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if days == 1 {
        "yesterday".to_string()
    } else {
        format!("{days}d ago")
    }
}
