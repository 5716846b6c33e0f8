//! Recording mock collaborators shared by the integration tests.

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use commit_relay::discord::{ChatPlatform, Destination};
use commit_relay::github::{CodeHost, Hook, HostCommit, RepoRef};
use commit_relay::notify::Notification;
use commit_relay::relay::{Relay, RelaySettings};
use commit_relay::store::BindingStore;
use commit_relay::types::Actor;

pub const SECRET: &str = "s3cret";
pub const WEBHOOK_URL: &str = "https://bot.example.com/webhooks";

/// GitHub-style signature header for a raw body.
pub fn sign(body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

pub fn admin() -> Actor {
    Actor {
        tag: "alice#0001".into(),
        is_admin: true,
        role_ids: vec![],
    }
}

pub fn bystander() -> Actor {
    Actor {
        tag: "mallory#1337".into(),
        is_admin: false,
        role_ids: vec![],
    }
}

/// A push payload for `acme/widgets` with the given number of commits.
pub fn push_payload(commit_count: usize) -> Vec<u8> {
    let commits: Vec<serde_json::Value> = (0..commit_count)
        .map(|n| {
            serde_json::json!({
                "id": format!("{n:040x}"),
                "message": format!("commit number {n}"),
                "author": { "name": format!("author{n}") },
                "timestamp": "2024-05-01T12:00:00Z",
            })
        })
        .collect();
    let head = commits.last().cloned();
    serde_json::to_vec(&serde_json::json!({
        "ref": "refs/heads/main",
        "repository": {
            "name": "widgets",
            "full_name": "acme/widgets",
            "html_url": "https://github.com/acme/widgets",
        },
        "commits": commits,
        "head_commit": head,
        "pusher": { "name": "alice" },
    }))
    .unwrap()
}

// ─── Mock chat platform ──────────────────────────────────────────────────────

pub struct MockChat {
    pub resolution: Mutex<Destination>,
    pub fail_send: Mutex<bool>,
    pub sent: Mutex<Vec<(String, Notification)>>,
}

impl MockChat {
    pub fn new() -> Self {
        Self {
            resolution: Mutex::new(Destination::Postable),
            fail_send: Mutex::new(false),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn set_resolution(&self, destination: Destination) {
        *self.resolution.lock().unwrap() = destination;
    }

    pub fn sent(&self) -> Vec<(String, Notification)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatPlatform for MockChat {
    async fn resolve_channel(&self, _channel_id: &str) -> Result<Destination> {
        Ok(self.resolution.lock().unwrap().clone())
    }

    async fn send_notification(&self, channel_id: &str, note: &Notification) -> Result<()> {
        if *self.fail_send.lock().unwrap() {
            return Err(anyhow!("channel vanished"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((channel_id.to_string(), note.clone()));
        Ok(())
    }
}

// ─── Mock code host ──────────────────────────────────────────────────────────

pub struct MockHost {
    /// Hooks reported by list_hooks.
    pub hooks: Mutex<Vec<Hook>>,
    pub deleted_hooks: Mutex<Vec<u64>>,
    pub created_hooks: Mutex<Vec<String>>,
    pub commit_calls: Mutex<Vec<String>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            hooks: Mutex::new(Vec::new()),
            deleted_hooks: Mutex::new(Vec::new()),
            created_hooks: Mutex::new(Vec::new()),
            commit_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_registered_hook() -> Self {
        let host = Self::new();
        host.hooks.lock().unwrap().push(Hook {
            id: 42,
            url: WEBHOOK_URL.to_string(),
        });
        host
    }

    pub fn deleted_hooks(&self) -> Vec<u64> {
        self.deleted_hooks.lock().unwrap().clone()
    }
}

#[async_trait]
impl CodeHost for MockHost {
    async fn commit(&self, _repo: &RepoRef, git_ref: &str) -> Result<HostCommit> {
        self.commit_calls.lock().unwrap().push(git_ref.to_string());
        Err(anyhow!("commit not found: {git_ref}"))
    }

    async fn branch_tip(&self, _repo: &RepoRef, _branch: &str) -> Result<String> {
        Err(anyhow!("not implemented in this mock"))
    }

    async fn create_commit(
        &self,
        _repo: &RepoRef,
        _message: &str,
        _tree: &str,
        _parents: &[String],
    ) -> Result<String> {
        Err(anyhow!("not implemented in this mock"))
    }

    async fn update_ref(&self, _repo: &RepoRef, _git_ref: &str, _sha: &str) -> Result<()> {
        Err(anyhow!("not implemented in this mock"))
    }

    async fn create_hook(&self, _repo: &RepoRef, url: &str, _secret: &str) -> Result<()> {
        self.created_hooks.lock().unwrap().push(url.to_string());
        self.hooks.lock().unwrap().push(Hook {
            id: 43,
            url: url.to_string(),
        });
        Ok(())
    }

    async fn list_hooks(&self, _repo: &RepoRef) -> Result<Vec<Hook>> {
        Ok(self.hooks.lock().unwrap().clone())
    }

    async fn delete_hook(&self, _repo: &RepoRef, hook_id: u64) -> Result<()> {
        self.deleted_hooks.lock().unwrap().push(hook_id);
        self.hooks.lock().unwrap().retain(|h| h.id != hook_id);
        Ok(())
    }
}

// ─── Harness ────────────────────────────────────────────────────────────────

pub struct Harness {
    pub relay: Relay,
    pub chat: Arc<MockChat>,
    pub host: Arc<MockHost>,
    // Held so the store directory outlives the relay.
    _dir: tempfile::TempDir,
}

pub fn harness(host: MockHost) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = BindingStore::open(dir.path()).unwrap();
    let chat = Arc::new(MockChat::new());
    let host = Arc::new(host);
    let relay = Relay::new(
        RelaySettings {
            webhook_secret: SECRET.into(),
            webhook_url: WEBHOOK_URL.into(),
            admin_role_id: Some("R1".into()),
            default_repository: None,
            default_branch: "main".into(),
        },
        store,
        chat.clone(),
        host.clone(),
    );
    Harness {
        relay,
        chat,
        host,
        _dir: dir,
    }
}
