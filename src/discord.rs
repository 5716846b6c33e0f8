//! Chat-platform capability interface and its Discord REST implementation.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::notify::Notification;

const API_BASE: &str = "https://discord.com/api/v10";
const USER_AGENT: &str = concat!("commit-relay/", env!("CARGO_PKG_VERSION"));

// Channel types that can receive messages from the bot.
const CHANNEL_GUILD_TEXT: u8 = 0;
const CHANNEL_GUILD_ANNOUNCEMENT: u8 = 5;

/// What a destination id resolved to. `Missing` and `NotPostable` both
/// trigger defensive cleanup of the binding that pointed at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Postable,
    Missing,
    NotPostable,
}

/// Capability interface over the chat platform. The core only ever needs to
/// resolve a destination and send one notification to it.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    async fn resolve_channel(&self, channel_id: &str) -> Result<Destination>;
    async fn send_notification(&self, channel_id: &str, note: &Notification) -> Result<()>;
}

// ─── Discord REST client ─────────────────────────────────────────────────────

pub struct DiscordClient {
    http: reqwest::Client,
    token: String,
    api_base: String,
}

#[derive(Deserialize)]
struct ChannelResponse {
    #[serde(rename = "type")]
    kind: u8,
}

impl DiscordClient {
    pub fn new(token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            token,
            api_base: API_BASE.to_string(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.api_base))
            .header("Authorization", format!("Bot {}", self.token))
            .header("User-Agent", USER_AGENT)
    }

    fn message_body(note: &Notification) -> serde_json::Value {
        let fields: Vec<serde_json::Value> = note
            .fields
            .iter()
            .map(|f| json!({ "name": f.name, "value": f.value, "inline": f.inline }))
            .collect();

        let options: Vec<serde_json::Value> = note
            .selector
            .options
            .iter()
            .map(|o| json!({ "label": o.label, "description": o.description, "value": o.value }))
            .collect();

        let mut embed = json!({
            "title": note.title,
            "description": note.description,
            "color": note.color,
            "url": note.url,
            "footer": { "text": note.footer },
            "fields": fields,
        });
        if let Some(ts) = &note.timestamp {
            embed["timestamp"] = json!(ts.to_rfc3339());
        }

        json!({
            "embeds": [embed],
            "components": [{
                "type": 1,
                "components": [{
                    "type": 3,
                    "custom_id": note.selector.custom_id,
                    "placeholder": note.selector.placeholder,
                    "options": options,
                }],
            }],
        })
    }
}

#[async_trait]
impl ChatPlatform for DiscordClient {
    async fn resolve_channel(&self, channel_id: &str) -> Result<Destination> {
        let response = self
            .request(reqwest::Method::GET, &format!("/channels/{channel_id}"))
            .send()
            .await
            .with_context(|| format!("resolving channel {channel_id}"))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::FORBIDDEN {
            return Ok(Destination::Missing);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("get channel returned status {status}: {body}");
        }

        let channel: ChannelResponse = response
            .json()
            .await
            .context("parsing channel response")?;
        if channel.kind == CHANNEL_GUILD_TEXT || channel.kind == CHANNEL_GUILD_ANNOUNCEMENT {
            Ok(Destination::Postable)
        } else {
            Ok(Destination::NotPostable)
        }
    }

    async fn send_notification(&self, channel_id: &str, note: &Notification) -> Result<()> {
        let body = Self::message_body(note);
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/channels/{channel_id}/messages"),
            )
            .json(&body)
            .send()
            .await
            .with_context(|| format!("sending notification to channel {channel_id}"))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("send message returned status {status}: {text}");
        }
        Ok(())
    }
}
