use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

// ─── GitHub push-event wire types ────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub html_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitAuthor {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Commit {
    pub id: String,
    pub message: String,
    pub author: CommitAuthor,
    #[serde(default)]
    pub timestamp: Option<DateTime<FixedOffset>>,
}

impl Commit {
    /// First line of the commit message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// First 7 characters of the commit hash.
    pub fn short_id(&self) -> &str {
        self.id.get(..7).unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pusher {
    pub name: String,
}

/// An inbound push delivery. A missing `head_commit` signals a branch
/// deletion and must be treated as a no-op.
#[derive(Debug, Clone, Deserialize)]
pub struct PushEvent {
    #[serde(rename = "ref", default)]
    pub reference: String,
    pub repository: Repository,
    #[serde(default)]
    pub commits: Vec<Commit>,
    pub head_commit: Option<Commit>,
    pub pusher: Pusher,
}

// ─── Core value types ────────────────────────────────────────────────────────

/// Persistent repository → channel mapping. At most one row per repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub repository: String,
    pub channel_id: String,
}

/// The chat user behind a mutating request, as seen by the authorization
/// gate. `tag` is a human-readable identity recorded in revert commits.
#[derive(Debug, Clone)]
pub struct Actor {
    pub tag: String,
    pub is_admin: bool,
    pub role_ids: Vec<String>,
}

/// Result of a revert attempt, reported back to the requesting user.
/// Never persisted; failures here are outcomes, not faults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertOutcome {
    pub success: bool,
    pub message: String,
}

impl RevertOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_summary_is_first_line() {
        let commit = Commit {
            id: "0123456789abcdef".into(),
            message: "fix: handle empty pushes\n\nlonger body here".into(),
            author: CommitAuthor { name: "dev".into() },
            timestamp: None,
        };
        assert_eq!(commit.summary(), "fix: handle empty pushes");
        assert_eq!(commit.short_id(), "0123456");
    }

    #[test]
    fn short_id_tolerates_short_hashes() {
        let commit = Commit {
            id: "abc".into(),
            message: "m".into(),
            author: CommitAuthor { name: "dev".into() },
            timestamp: None,
        };
        assert_eq!(commit.short_id(), "abc");
    }

    #[test]
    fn push_event_deserializes_branch_deletion() {
        let raw = r#"{
            "ref": "refs/heads/old",
            "repository": {"name": "widgets", "full_name": "acme/widgets", "html_url": "https://github.com/acme/widgets"},
            "commits": [],
            "head_commit": null,
            "pusher": {"name": "alice"}
        }"#;
        let event: PushEvent = serde_json::from_str(raw).unwrap();
        assert!(event.head_commit.is_none());
        assert!(event.commits.is_empty());
    }
}
