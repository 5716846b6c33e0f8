//! Push-event → notification rendering.
//!
//! Pure and deterministic: the same event always yields the same payload,
//! which is what the golden tests below pin down. Sending is the chat
//! client's job.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::types::{Commit, PushEvent};

/// At most this many commits are listed in the embed body.
pub const COMMIT_LIST_LIMIT: usize = 5;
/// At most this many commits are offered in the revert selector.
pub const SELECTOR_LIMIT: usize = 5;
/// Selector custom ids are `revert_select_<owner/name>` so a later selection
/// unambiguously names the repository.
pub const SELECTOR_PREFIX: &str = "revert_select_";

const COLOR_SINGLE: u32 = 0x00ff00;
const COLOR_SMALL: u32 = 0xffff00;
const COLOR_MEDIUM: u32 = 0xffa500;
const COLOR_LARGE: u32 = 0xff0000;

const LABEL_MAX_CHARS: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectorOption {
    pub label: String,
    pub description: String,
    /// Full commit id, handed back verbatim when the option is chosen.
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitSelector {
    pub custom_id: String,
    pub placeholder: String,
    pub options: Vec<SelectorOption>,
}

/// The rendered notification: one embed plus the commit selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub url: String,
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub footer: String,
    pub fields: Vec<EmbedField>,
    pub selector: CommitSelector,
}

/// Severity color by commit count: 1, 2–3, 4–10, >10.
pub fn commit_color(commit_count: usize) -> u32 {
    match commit_count {
        0 | 1 => COLOR_SINGLE,
        2..=3 => COLOR_SMALL,
        4..=10 => COLOR_MEDIUM,
        _ => COLOR_LARGE,
    }
}

fn summary_or_placeholder(commit: &Commit) -> String {
    let summary = commit.summary();
    if summary.is_empty() {
        "No message".to_string()
    } else {
        summary.to_string()
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}

pub fn render_push(event: &PushEvent) -> Notification {
    let commits = &event.commits;
    let count = commits.len();
    let plural = if count == 1 { "" } else { "s" };

    let fields = if count == 1 {
        let commit = &commits[0];
        vec![
            EmbedField {
                name: "Commit Message".into(),
                value: summary_or_placeholder(commit),
                inline: false,
            },
            EmbedField {
                name: "Commit Hash".into(),
                value: format!("`{}`", commit.short_id()),
                inline: true,
            },
            EmbedField {
                name: "Author".into(),
                value: commit.author.name.clone(),
                inline: true,
            },
        ]
    } else {
        let mut listing = commits
            .iter()
            .take(COMMIT_LIST_LIMIT)
            .map(|c| format!("• `{}` {}", c.short_id(), summary_or_placeholder(c)))
            .collect::<Vec<_>>()
            .join("\n");
        if count > COMMIT_LIST_LIMIT {
            listing.push_str("\n...");
        }
        vec![EmbedField {
            name: format!("Recent Commits ({count} total)"),
            value: listing,
            inline: false,
        }]
    };

    let options = commits
        .iter()
        .take(SELECTOR_LIMIT)
        .map(|c| SelectorOption {
            label: truncate_chars(&summary_or_placeholder(c), LABEL_MAX_CHARS),
            description: format!("by {} • {}", c.author.name, c.short_id()),
            value: c.id.clone(),
        })
        .collect();

    Notification {
        title: format!("New commits pushed to {}", event.repository.name),
        description: format!("**{count} commit{plural}** by **{}**", event.pusher.name),
        color: commit_color(count),
        url: event.repository.html_url.clone(),
        timestamp: event.head_commit.as_ref().and_then(|c| c.timestamp),
        footer: format!("Repository: {}", event.repository.full_name),
        fields,
        selector: CommitSelector {
            custom_id: format!("{SELECTOR_PREFIX}{}", event.repository.full_name),
            placeholder: "Select a commit to revert".into(),
            options,
        },
    }
}
