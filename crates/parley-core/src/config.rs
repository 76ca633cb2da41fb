//! Configuration management for parley.
//!
//! Loads configuration from ${PARLEY_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use parley_types::UserIdentity;
use serde::{Deserialize, Serialize};

/// Environment variable that overrides `api_base_url`.
pub const API_URL_ENV: &str = "PARLEY_API_URL";

fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for parley configuration and data files.
    //!
    //! PARLEY_HOME resolution order:
    //! 1. PARLEY_HOME environment variable (if set)
    //! 2. ~/.config/parley (default)

    use std::path::PathBuf;

    /// Returns the parley home directory.
    pub fn parley_home() -> PathBuf {
        if let Ok(home) = std::env::var("PARLEY_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".parley"),
            |h| h.join(".config").join("parley"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        parley_home().join("config.toml")
    }

    /// Returns the path of the persisted "last active session" hint.
    pub fn last_session_path() -> PathBuf {
        parley_home().join("last_session")
    }

    /// Returns the directory log files are written to.
    pub fn logs_dir() -> PathBuf {
        parley_home().join("logs")
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the chat backend.
    pub api_base_url: String,
    /// Maximum number of sessions requested for the session list.
    pub session_limit: u32,
    /// Identity sent with every backend call.
    pub user: UserIdentity,
}

impl Config {
    pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
    const DEFAULT_SESSION_LIMIT: u32 = 10;

    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Writes the default config template to `path`.
    ///
    /// Refuses to overwrite an existing file.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Returns the backend base URL with precedence: env > config > default.
    pub fn api_base_url(&self) -> Result<String> {
        let env_value = std::env::var(API_URL_ENV).ok();
        resolve_base_url(env_value.as_deref(), &self.api_base_url)
    }

    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: Self::DEFAULT_API_BASE_URL.to_string(),
            session_limit: Self::DEFAULT_SESSION_LIMIT,
            user: UserIdentity::default(),
        }
    }
}

/// Picks the first non-blank candidate (env, then config), falling back to
/// the default, and validates it.
fn resolve_base_url(env_value: Option<&str>, config_value: &str) -> Result<String> {
    let chosen = [env_value.unwrap_or(""), config_value]
        .into_iter()
        .map(str::trim)
        .find(|candidate| !candidate.is_empty())
        .unwrap_or(Config::DEFAULT_API_BASE_URL);

    url::Url::parse(chosen).with_context(|| format!("Invalid backend base URL: {chosen}"))?;
    Ok(chosen.trim_end_matches('/').to_string())
}
