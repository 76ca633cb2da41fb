use anyhow::{Context, Result};
use parley_core::config::Config;
use parley_core::{ChatApi, HttpChatApi};

pub async fn run(config: &Config) -> Result<()> {
    let api = HttpChatApi::from_config(config).context("configure backend")?;
    let health = api
        .health()
        .await
        .with_context(|| format!("Backend at {} is unreachable", api.base_url()))?;

    let storage = if health.cosmos_enabled {
        "enabled"
    } else {
        "disabled"
    };
    println!("Backend: {}", api.base_url());
    println!("Status: {}", health.status);
    println!("Storage: {storage}");
    println!("User: {}", config.user.display());
    Ok(())
}
