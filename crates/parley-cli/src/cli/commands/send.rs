use anyhow::{Context, Result};
use parley_core::AppEvent;
use parley_types::Role;

use super::{ClientOptions, print_message, settle};

/// Sends `text` into the chosen session and prints the answer.
///
/// Without `--session` or `--new` the last active session is restored first;
/// if there is none, a session is created implicitly.
pub async fn run(
    opts: &ClientOptions<'_>,
    text: &str,
    session: Option<String>,
    new: bool,
) -> Result<()> {
    if text.trim().is_empty() {
        anyhow::bail!("Message is empty");
    }

    let mut client = opts.client()?;
    if new {
        client.dispatch(AppEvent::NewChat);
    } else if let Some(id) = session {
        client.dispatch(AppEvent::SelectSession(id));
    } else {
        client.start();
    }
    settle(&mut client).await?;

    client.dispatch(AppEvent::Send(text.to_string()));
    settle(&mut client).await?;

    let reply = client
        .state()
        .conversation
        .messages()
        .last()
        .filter(|message| message.role == Role::Assistant)
        .context("No answer received")?;

    print_message(reply);
    Ok(())
}
