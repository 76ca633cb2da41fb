//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use parley_core::{config, logging};
use parley_types::{Rating, UserIdentity};

mod commands;

use commands::ClientOptions;

#[derive(Parser)]
#[command(name = "parley")]
#[command(version)]
#[command(about = "Terminal client for the parley chat backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Act as this user id (overrides the configured identity)
    #[arg(long, global = true, env = "PARLEY_USER", value_name = "ID")]
    user: Option<String>,

    /// Neither read nor write the last active session
    #[arg(long = "no-persist", global = true)]
    no_persist: bool,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Manage chat sessions
    Sessions {
        #[command(subcommand)]
        command: SessionCommands,
    },

    /// Send a message and print the answer
    Send {
        /// The message text
        #[arg(value_name = "TEXT")]
        text: String,

        /// Send into this session instead of the last active one
        #[arg(long, value_name = "SESSION_ID")]
        session: Option<String>,

        /// Start a new session first
        #[arg(long, conflicts_with = "session")]
        new: bool,
    },

    /// Rate an assistant answer
    Feedback {
        /// The ID of the answer to rate
        #[arg(value_name = "MESSAGE_ID")]
        message_id: String,

        /// Thumbs up
        #[arg(long, conflicts_with = "down", required_unless_present = "down")]
        up: bool,

        /// Thumbs down
        #[arg(long)]
        down: bool,

        /// Session the answer belongs to (default: last active)
        #[arg(long, value_name = "SESSION_ID")]
        session: Option<String>,
    },

    /// Render markdown from stdin to HTML
    Render,

    /// Check that the backend is reachable
    Status,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum SessionCommands {
    /// Lists recent sessions
    List,
    /// Starts a new, empty session
    New,
    /// Shows a session's conversation
    Show {
        /// The ID of the session to show (restores the last active one if not provided)
        #[arg(value_name = "SESSION_ID")]
        id: Option<String>,
    },
    /// Deletes a session
    Delete {
        /// The ID of the session to delete
        #[arg(value_name = "SESSION_ID")]
        id: String,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let Cli {
        command,
        user,
        no_persist,
    } = cli;

    // These work without a config file or a backend.
    match command {
        Commands::Config { command } => match command {
            ConfigCommands::Path => commands::config::path(),
            ConfigCommands::Init => commands::config::init(),
        },
        Commands::Render => commands::render::run(),
        command => dispatch_backend(command, user, no_persist).await,
    }
}

async fn dispatch_backend(command: Commands, user: Option<String>, no_persist: bool) -> Result<()> {
    let mut config = config::Config::load().context("load config")?;
    if let Some(id) = user.map(|id| id.trim().to_string()).filter(|id| !id.is_empty()) {
        config.user = UserIdentity::new(id);
    }

    let _log_guard = match logging::init() {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {e:#}");
            None
        }
    };

    tracing::debug!(user = %config.user.id, no_persist, "running backend command");

    let opts = ClientOptions {
        config: &config,
        no_persist,
    };

    match command {
        Commands::Sessions { command } => match command {
            SessionCommands::List => commands::sessions::list(&opts).await,
            SessionCommands::New => commands::sessions::new(&opts).await,
            SessionCommands::Show { id } => commands::sessions::show(&opts, id).await,
            SessionCommands::Delete { id } => commands::sessions::delete(&opts, &id).await,
        },

        Commands::Send { text, session, new } => {
            commands::send::run(&opts, &text, session, new).await
        }

        Commands::Feedback {
            message_id,
            up,
            down: _,
            session,
        } => {
            let rating = if up { Rating::Positive } else { Rating::Negative };
            commands::feedback::run(&opts, &message_id, rating, session).await
        }

        Commands::Status => commands::status::run(&config).await,

        Commands::Render | Commands::Config { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_feedback_requires_a_rating() {
        assert!(Cli::try_parse_from(["parley", "feedback", "m1"]).is_err());
        assert!(Cli::try_parse_from(["parley", "feedback", "m1", "--up", "--down"]).is_err());
        assert!(Cli::try_parse_from(["parley", "feedback", "m1", "--down"]).is_ok());
    }

    #[test]
    fn test_send_new_conflicts_with_session() {
        assert!(Cli::try_parse_from(["parley", "send", "hi", "--new", "--session", "s1"]).is_err());
    }
}
