use std::fmt;

use serde::{Deserialize, Serialize};

/// Office online viewer used to open `.docx` citations in the browser.
const OFFICE_VIEWER_URL: &str = "https://view.officeapps.live.com/op/embed.aspx";

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Feedback state of a message as last confirmed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    #[default]
    None,
    Positive,
    Negative,
}

impl Feedback {
    /// Resolves the backend's two independent thumbs flags.
    ///
    /// The flags are expected to be mutually exclusive. When both are set,
    /// thumbs-up wins.
    pub fn from_flags(thumbs_up: bool, thumbs_down: bool) -> Self {
        if thumbs_up {
            Feedback::Positive
        } else if thumbs_down {
            Feedback::Negative
        } else {
            Feedback::None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Feedback::None => "none",
            Feedback::Positive => "positive",
            Feedback::Negative => "negative",
        }
    }
}

/// A thumbs up/down request. Unlike [`Feedback`] it cannot express "none":
/// removal is something only the backend can report back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Positive,
    Negative,
}

impl From<Rating> for Feedback {
    fn from(rating: Rating) -> Self {
        match rating {
            Rating::Positive => Feedback::Positive,
            Rating::Negative => Feedback::Negative,
        }
    }
}

/// A citation attached to an assistant answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub url: String,
    #[serde(default)]
    pub title: String,
}

impl Source {
    pub fn is_docx(&self) -> bool {
        self.url.to_ascii_lowercase().ends_with(".docx")
    }

    /// URL to open the citation with.
    ///
    /// Word documents are routed through the Office online viewer; anything
    /// else is returned unchanged.
    pub fn viewer_url(&self) -> String {
        if !self.is_docx() {
            return self.url.clone();
        }
        url::Url::parse_with_params(OFFICE_VIEWER_URL, &[("src", self.url.as_str())])
            .map_or_else(|_| self.url.clone(), String::from)
    }
}

/// One turn in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Backend id. Absent for a user message that was only sent locally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub feedback: Feedback,
}

impl Message {
    /// A locally authored user message (no id until the backend knows it).
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: None,
            role: Role::User,
            content: content.into(),
            sources: Vec::new(),
            feedback: Feedback::None,
        }
    }

    pub fn assistant(
        id: Option<String>,
        content: impl Into<String>,
        sources: Vec<Source>,
        feedback: Feedback,
    ) -> Self {
        Self {
            id,
            role: Role::Assistant,
            content: content.into(),
            sources,
            feedback,
        }
    }

    /// The citation shown under the answer. Only the first one is surfaced.
    pub fn primary_source(&self) -> Option<&Source> {
        self.sources.first()
    }

    /// Feedback can only be given on assistant answers the backend has stored.
    pub fn accepts_feedback(&self) -> bool {
        self.role == Role::Assistant && self.id.is_some()
    }
}
