//! CLI command handlers.

pub mod config;
pub mod feedback;
pub mod render;
pub mod send;
pub mod sessions;
pub mod status;

use anyhow::{Context, Result};
use parley_core::config::{Config, paths};
use parley_core::{ChatRuntime, FileHintStore, HintStore, HttpChatApi, MemoryHintStore};
use parley_types::{Feedback, Message, Role};

/// Runtime every backend-facing command drives.
pub type Client = ChatRuntime<HttpChatApi, Box<dyn HintStore>>;

/// Shared inputs for backend-facing commands.
pub struct ClientOptions<'a> {
    pub config: &'a Config,
    pub no_persist: bool,
}

impl ClientOptions<'_> {
    pub fn client(&self) -> Result<Client> {
        let api = HttpChatApi::from_config(self.config).context("configure backend")?;
        let hints: Box<dyn HintStore> = if self.no_persist {
            Box::new(MemoryHintStore::default())
        } else {
            Box::new(FileHintStore::new(paths::last_session_path()))
        };
        Ok(ChatRuntime::new(
            api,
            hints,
            self.config.user.clone(),
            self.config.session_limit,
        ))
    }
}

/// Waits for all in-flight requests and turns the first error notice into
/// the command's error. Success notices are printed only when nothing failed.
pub async fn settle(client: &mut Client) -> Result<()> {
    client.settle().await;

    let (errors, successes): (Vec<_>, Vec<_>) = client
        .take_notices()
        .into_iter()
        .partition(parley_core::Notice::is_error);

    let mut errors = errors.into_iter();
    let Some(failure) = errors.next() else {
        for notice in successes {
            println!("{}", notice.text);
        }
        return Ok(());
    };
    for notice in errors {
        eprintln!("Error: {notice}");
    }

    match failure.error {
        Some(cause) => Err(anyhow::Error::new(cause).context(failure.text)),
        None => anyhow::bail!(failure.text),
    }
}

pub fn print_message(message: &Message) {
    let label = match message.role {
        Role::User => "You".to_string(),
        Role::Assistant => {
            let mut label = "Assistant".to_string();
            if let Some(id) = &message.id {
                label.push_str(&format!(" [{id}]"));
            }
            match message.feedback {
                Feedback::Positive => label.push_str(" (+1)"),
                Feedback::Negative => label.push_str(" (-1)"),
                Feedback::None => {}
            }
            label
        }
    };

    println!("{label}:");
    println!("{}", message.content);
    if let Some(source) = message.primary_source() {
        let title = if source.title.is_empty() {
            "source"
        } else {
            source.title.as_str()
        };
        println!("  Source: {title} <{}>", source.viewer_url());
    }
}
