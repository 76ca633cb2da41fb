use anyhow::Result;
use chrono::Utc;
use parley_core::{AppEvent, HintStore};
use parley_types::relative_time;

use super::{ClientOptions, print_message, settle};

pub async fn list(opts: &ClientOptions<'_>) -> Result<()> {
    let mut client = opts.client()?;
    let last_session = client.hints().load();
    client.dispatch(AppEvent::Reload);
    settle(&mut client).await?;

    let sessions = client.state().sessions.sessions();
    if sessions.is_empty() {
        println!("No sessions found.");
        return Ok(());
    }

    let now = Utc::now();
    for session in sessions {
        let marker = if last_session.as_deref() == Some(session.id.as_str()) {
            '*'
        } else {
            ' '
        };
        let when = session
            .last_message_at
            .map_or_else(|| "-".to_string(), |ts| relative_time(ts, now));
        println!(
            "{marker} {}  {}  ({when}, {} messages)",
            session.id,
            session.preview(),
            session.message_count
        );
    }

    Ok(())
}

pub async fn new(opts: &ClientOptions<'_>) -> Result<()> {
    let mut client = opts.client()?;
    client.dispatch(AppEvent::NewChat);
    settle(&mut client).await?;

    match client.state().sessions.active_id() {
        Some(id) => {
            println!("Created session {id}");
            Ok(())
        }
        None => anyhow::bail!("Failed to create new session"),
    }
}

pub async fn show(opts: &ClientOptions<'_>, id: Option<String>) -> Result<()> {
    let mut client = opts.client()?;
    match id {
        Some(id) => client.dispatch(AppEvent::SelectSession(id)),
        None => client.start(),
    }
    settle(&mut client).await?;

    let conversation = &client.state().conversation;
    let Some(session_id) = conversation.session_id() else {
        println!("No sessions found.");
        return Ok(());
    };

    println!("Session {session_id}");
    if conversation.messages().is_empty() {
        println!("No messages yet.");
    }
    for message in conversation.messages() {
        println!();
        print_message(message);
    }

    Ok(())
}

/// Deletes `id` on the backend, which decides whether it exists. The
/// session may be older than the listed window, so no local lookup is done.
pub async fn delete(opts: &ClientOptions<'_>, id: &str) -> Result<()> {
    let mut client = opts.client()?;
    client.dispatch(AppEvent::DeleteSession(id.to_string()));
    settle(&mut client).await
}
