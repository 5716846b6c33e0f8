//! The service facade: webhook ingestion, binding management, and the
//! revert entry point, sharing one store and one pair of remote clients.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::auth;
use crate::config::Config;
use crate::discord::{ChatPlatform, Destination};
use crate::github::{CodeHost, RepoRef};
use crate::notify;
use crate::revert::{self, RevertEntry};
use crate::store::BindingStore;
use crate::types::{Actor, Binding, PushEvent, RevertOutcome};
use crate::verification;

/// What became of an inbound delivery. The HTTP layer maps `Rejected` to
/// 401 and everything else to 200; tests assert on the classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Signature verification failed; the event never reached the core.
    Rejected,
    /// Acknowledged with nothing to do: non-push event, branch deletion,
    /// empty push, or unparseable payload.
    Ignored,
    /// No usable binding; the defensive cleanup ran instead of a send.
    CleanedUp,
    /// Notification rendered and sent.
    Delivered,
}

/// The slice of configuration the relay actually consumes.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub webhook_secret: String,
    pub webhook_url: String,
    pub admin_role_id: Option<String>,
    pub default_repository: Option<String>,
    pub default_branch: String,
}

impl From<&Config> for RelaySettings {
    fn from(config: &Config) -> Self {
        Self {
            webhook_secret: config.webhook_secret.clone(),
            webhook_url: config.webhook_url.clone(),
            admin_role_id: config.admin_role_id.clone(),
            default_repository: config.default_repository.clone(),
            default_branch: config.default_branch.clone(),
        }
    }
}

pub struct Relay {
    settings: RelaySettings,
    store: RwLock<BindingStore>,
    chat: Arc<dyn ChatPlatform>,
    host: Arc<dyn CodeHost>,
}

impl Relay {
    pub fn new(
        settings: RelaySettings,
        store: BindingStore,
        chat: Arc<dyn ChatPlatform>,
        host: Arc<dyn CodeHost>,
    ) -> Self {
        Self {
            settings,
            store: RwLock::new(store),
            chat,
            host,
        }
    }

    // ─── Webhook ingestion ───────────────────────────────────────────────

    /// Process one inbound delivery: verify, classify, resolve, dispatch.
    /// Steps run strictly in order; any downstream failure degrades into
    /// defensive cleanup rather than a retry.
    pub async fn handle_push_event(
        &self,
        event_kind: &str,
        raw: &[u8],
        signature: &str,
    ) -> IngestOutcome {
        if !verification::verify_signature(&self.settings.webhook_secret, raw, signature) {
            warn!(event_kind, "rejected delivery with invalid signature");
            return IngestOutcome::Rejected;
        }

        if event_kind != "push" {
            debug!(event_kind, "acknowledged non-push event");
            return IngestOutcome::Ignored;
        }

        let event: PushEvent = match serde_json::from_slice(raw) {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "failed to parse push payload");
                return IngestOutcome::Ignored;
            }
        };

        // A push without a head commit is a branch deletion; nothing to report.
        if event.head_commit.is_none() {
            debug!(repository = %event.repository.full_name, "ignoring branch deletion");
            return IngestOutcome::Ignored;
        }
        if event.commits.is_empty() {
            debug!(repository = %event.repository.full_name, "ignoring empty push");
            return IngestOutcome::Ignored;
        }

        let repository = event.repository.full_name.clone();
        let channel_id = {
            let store = self.store.read().await;
            store.lookup(&repository)
        };

        let Some(channel_id) = channel_id else {
            // A hook still fires for a repository whose binding was removed
            // out-of-band; revoke it so it stops firing.
            info!(%repository, "push for unbound repository, running cleanup");
            self.cleanup(&repository).await;
            return IngestOutcome::CleanedUp;
        };

        match self.chat.resolve_channel(&channel_id).await {
            Ok(Destination::Postable) => {}
            Ok(Destination::Missing) | Ok(Destination::NotPostable) => {
                info!(%repository, %channel_id, "bound channel unusable, running cleanup");
                self.cleanup(&repository).await;
                return IngestOutcome::CleanedUp;
            }
            Err(e) => {
                warn!(%repository, %channel_id, error = %format!("{e:#}"), "channel resolution failed, running cleanup");
                self.cleanup(&repository).await;
                return IngestOutcome::CleanedUp;
            }
        }

        let note = notify::render_push(&event);
        if let Err(e) = self.chat.send_notification(&channel_id, &note).await {
            warn!(%repository, %channel_id, error = %format!("{e:#}"), "notification send failed, running cleanup");
            self.cleanup(&repository).await;
            return IngestOutcome::CleanedUp;
        }

        info!(
            %repository,
            %channel_id,
            commits = event.commits.len(),
            "sent commit notification"
        );
        IngestOutcome::Delivered
    }

    // ─── Binding management ──────────────────────────────────────────────

    /// Bind a repository to a channel: register the push hook first, then
    /// upsert the row, so a stored binding always has an active hook.
    pub async fn bind(&self, repository: &str, channel_id: &str, actor: &Actor) -> Result<()> {
        self.require_authorized(actor)?;
        let Some(repo) = RepoRef::parse(repository) else {
            bail!("Invalid repository format. Please use format: owner/repo");
        };

        let hooks = self
            .host
            .list_hooks(&repo)
            .await
            .context("listing existing hooks")?;
        if !hooks.iter().any(|h| h.url == self.settings.webhook_url) {
            self.host
                .create_hook(&repo, &self.settings.webhook_url, &self.settings.webhook_secret)
                .await
                .context("registering push hook")?;
        }

        let mut store = self.store.write().await;
        store.bind(repository, channel_id)?;
        info!(repository, channel_id, "bound repository to channel");
        Ok(())
    }

    /// Unbind a repository: revoke the hook, then drop the row. Unbinding a
    /// repository that was never bound is not an error.
    pub async fn unbind(&self, repository: &str, actor: &Actor) -> Result<()> {
        self.require_authorized(actor)?;
        self.cleanup(repository).await;
        Ok(())
    }

    pub async fn list_bindings(&self) -> Vec<Binding> {
        self.store.read().await.list()
    }

    /// Revoke the remote hook (best-effort), then remove the binding row.
    /// Hook revocation failure never blocks row removal: a stale hook only
    /// costs rejected deliveries, a stale binding causes repeated failures.
    async fn cleanup(&self, repository: &str) {
        if let Some(repo) = RepoRef::parse(repository) {
            match self.host.list_hooks(&repo).await {
                Ok(hooks) => {
                    for hook in hooks.iter().filter(|h| h.url == self.settings.webhook_url) {
                        if let Err(e) = self.host.delete_hook(&repo, hook.id).await {
                            warn!(repository, hook_id = hook.id, error = %format!("{e:#}"), "failed to delete hook");
                        }
                    }
                }
                Err(e) => {
                    warn!(repository, error = %format!("{e:#}"), "failed to list hooks, leaving hook in place");
                }
            }
        }

        let mut store = self.store.write().await;
        if let Err(e) = store.unbind(repository) {
            warn!(repository, error = %e, "failed to remove binding");
        } else {
            info!(repository, "binding removed");
        }
    }

    // ─── Revert entry point ──────────────────────────────────────────────

    pub async fn request_revert(&self, entry: RevertEntry, actor: &Actor) -> RevertOutcome {
        let request = entry.resolve(self.settings.default_repository.as_deref());
        revert::perform_revert(
            self.host.as_ref(),
            actor,
            self.settings.admin_role_id.as_deref(),
            &request,
            &self.settings.default_branch,
        )
        .await
    }

    fn require_authorized(&self, actor: &Actor) -> Result<()> {
        if !auth::is_authorized(actor, self.settings.admin_role_id.as_deref()) {
            bail!("You do not have permission to use this command.");
        }
        Ok(())
    }
}
