use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use commit_relay::config::Config;
use commit_relay::discord::DiscordClient;
use commit_relay::github::GitHubClient;
use commit_relay::http_server;
use commit_relay::relay::{Relay, RelaySettings};
use commit_relay::store::BindingStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load()?;

    let store = BindingStore::open(&config.data_dir)?;
    let chat = Arc::new(DiscordClient::new(config.discord_token.clone()));
    let host = Arc::new(GitHubClient::new(config.github_token.clone()));

    let relay = Arc::new(Relay::new(
        RelaySettings::from(&config),
        store,
        chat,
        host,
    ));

    http_server::serve(relay, config.listen_port).await
}
