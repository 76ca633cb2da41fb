use anyhow::Result;
use parley_core::AppEvent;
use parley_types::Rating;

use super::{ClientOptions, settle};

pub async fn run(
    opts: &ClientOptions<'_>,
    message_id: &str,
    rating: Rating,
    session: Option<String>,
) -> Result<()> {
    let mut client = opts.client()?;
    match session {
        Some(id) => client.dispatch(AppEvent::SelectSession(id)),
        None => client.start(),
    }
    settle(&mut client).await?;

    let conversation = &client.state().conversation;
    let Some(session_id) = conversation.session_id() else {
        anyhow::bail!("No active session; pass --session");
    };
    match conversation.message(message_id) {
        None => anyhow::bail!("Message {message_id} not found in session {session_id}"),
        Some(message) if !message.accepts_feedback() => {
            anyhow::bail!("Message {message_id} is not an assistant answer")
        }
        Some(_) => {}
    }

    client.dispatch(AppEvent::GiveFeedback {
        message_id: message_id.to_string(),
        rating,
    });
    settle(&mut client).await
}
