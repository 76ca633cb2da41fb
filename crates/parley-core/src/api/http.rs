use parley_types::{Rating, UserIdentity};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{
    ApiError, ChatApi, FeedbackAck, Health, MessageRecord, SendReply, SessionRecord,
};
use crate::config::Config;

const USER_AGENT: &str = concat!("parley/", env!("CARGO_PKG_VERSION"));

/// [`ChatApi`] over the backend's JSON HTTP interface.
#[derive(Debug, Clone)]
pub struct HttpChatApi {
    base_url: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct NewSessionResponse {
    session_id: String,
}

/// The backend may omit the list or send `null`; both mean empty.
#[derive(Deserialize)]
struct SessionsResponse {
    #[serde(default)]
    sessions: Option<Vec<SessionRecord>>,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    messages: Option<Vec<MessageRecord>>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    session_id: &'a str,
    user_id: &'a str,
    user_roles: &'a [String],
    user_email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FeedbackRequest<'a> {
    id: &'a str,
    feedback: Rating,
    session_id: &'a str,
    user_id: &'a str,
}

impl HttpChatApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Builds a client against the configured (or env-overridden) base URL.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(config.api_base_url()?))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.header("user-agent", USER_AGENT).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "backend returned error status");
            return Err(ApiError::http_status(status.as_u16(), &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| ApiError::parse(format!("Failed to parse response: {e}"), &body))
    }
}

impl ChatApi for HttpChatApi {
    async fn health(&self) -> Result<Health, ApiError> {
        self.send(self.http.get(self.url("/"))).await
    }

    async fn create_session(&self, user: &UserIdentity) -> Result<String, ApiError> {
        tracing::debug!(user = %user.id, "creating session");
        let response: NewSessionResponse = self
            .send(
                self.http
                    .get(self.url("/session/new"))
                    .query(&[("user_id", user.id.as_str())]),
            )
            .await?;
        Ok(response.session_id)
    }

    async fn list_sessions(
        &self,
        user: &UserIdentity,
        limit: u32,
    ) -> Result<Vec<SessionRecord>, ApiError> {
        tracing::debug!(user = %user.id, limit, "listing sessions");
        let response: SessionsResponse = self
            .send(
                self.http
                    .get(self.url("/sessions"))
                    .query(&[("user_id", user.id.clone()), ("limit", limit.to_string())]),
            )
            .await?;
        Ok(response.sessions.unwrap_or_default())
    }

    async fn list_messages(
        &self,
        user: &UserIdentity,
        session_id: &str,
    ) -> Result<Vec<MessageRecord>, ApiError> {
        tracing::debug!(user = %user.id, session_id, "loading messages");
        let response: MessagesResponse = self
            .send(
                self.http
                    .get(self.url("/session/messages"))
                    .query(&[("user_id", user.id.as_str()), ("session_id", session_id)]),
            )
            .await?;
        Ok(response.messages.unwrap_or_default())
    }

    async fn send_message(
        &self,
        user: &UserIdentity,
        session_id: &str,
        text: &str,
    ) -> Result<SendReply, ApiError> {
        tracing::debug!(user = %user.id, session_id, "sending message");
        let body = ChatRequest {
            message: text,
            session_id,
            user_id: &user.id,
            user_roles: &user.roles,
            user_email: &user.email,
        };
        self.send(self.http.post(self.url("/chat")).json(&body))
            .await
    }

    async fn delete_session(&self, user: &UserIdentity, session_id: &str) -> Result<(), ApiError> {
        tracing::debug!(user = %user.id, session_id, "deleting session");
        let _ack: serde_json::Value = self
            .send(
                self.http
                    .delete(self.url("/session"))
                    .query(&[("user_id", user.id.as_str()), ("session_id", session_id)]),
            )
            .await?;
        Ok(())
    }

    async fn submit_feedback(
        &self,
        user: &UserIdentity,
        session_id: &str,
        message_id: &str,
        rating: Rating,
    ) -> Result<FeedbackAck, ApiError> {
        tracing::debug!(user = %user.id, message_id, ?rating, "submitting feedback");
        let body = FeedbackRequest {
            id: message_id,
            feedback: rating,
            session_id,
            user_id: &user.id,
        };
        self.send(self.http.post(self.url("/update-feedback")).json(&body))
            .await
    }
}
