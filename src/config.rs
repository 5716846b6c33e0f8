use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

const DISCORD_TOKEN_VAR: &str = "DISCORD_TOKEN";
const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";
const WEBHOOK_SECRET_VAR: &str = "GITHUB_WEBHOOK_SECRET";
const WEBHOOK_URL_VAR: &str = "WEBHOOK_URL";
const ADMIN_ROLE_VAR: &str = "ADMIN_ROLE_ID";
const DEFAULT_REPOSITORY_VAR: &str = "DEFAULT_REPOSITORY";
const DEFAULT_BRANCH_VAR: &str = "DEFAULT_BRANCH";
const DATA_DIR_VAR: &str = "DATA_DIR";
const PORT_VAR: &str = "PORT";

const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_BRANCH: &str = "main";
const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub github_token: String,
    pub webhook_secret: String,
    /// Publicly reachable URL GitHub delivers to; also the match key when
    /// locating our hook for revocation.
    pub webhook_url: String,
    pub admin_role_id: Option<String>,
    pub default_repository: Option<String>,
    pub default_branch: String,
    pub data_dir: PathBuf,
    pub listen_port: u16,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let discord_token = env::var(DISCORD_TOKEN_VAR)
            .context("DISCORD_TOKEN not found. Set it to the bot token.")?;

        let github_token = env::var(GITHUB_TOKEN_VAR)
            .context("GITHUB_TOKEN not found. Set it to a token with repo and hook scopes.")?;

        let webhook_secret = env::var(WEBHOOK_SECRET_VAR).context(
            "GITHUB_WEBHOOK_SECRET not found. Set it to the shared webhook signing secret.",
        )?;

        let webhook_url = env::var(WEBHOOK_URL_VAR).context(
            "WEBHOOK_URL not found. Set it to the public endpoint GitHub should deliver to \
             (e.g. https://bot.example.com/webhooks).",
        )?;

        let admin_role_id = non_empty(env::var(ADMIN_ROLE_VAR).ok());
        let default_repository = non_empty(env::var(DEFAULT_REPOSITORY_VAR).ok());

        let default_branch = env::var(DEFAULT_BRANCH_VAR)
            .ok()
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BRANCH.to_string());

        let data_dir = env::var(DATA_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));

        let listen_port = match env::var(PORT_VAR) {
            Ok(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("PORT `{raw}` is not a valid port number"))?,
            Err(_) => DEFAULT_PORT,
        };

        Ok(Config {
            discord_token,
            github_token,
            webhook_secret,
            webhook_url,
            admin_role_id,
            default_repository,
            default_branch,
            data_dir,
            listen_port,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim().to_owned();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}
