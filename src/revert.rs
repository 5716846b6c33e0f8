//! The revert workflow: entry-point resolution, preconditions, and the
//! compensating write against the code host.
//!
//! Three entry points (explicit command, guided dialog, notification
//! selector) converge on [`perform_revert`]. Everything that can go wrong
//! downstream of the preconditions is folded into a failure
//! [`RevertOutcome`]; nothing escapes as a fault.

use tracing::{info, warn};

use crate::auth;
use crate::github::{CodeHost, RepoRef};
use crate::notify::SELECTOR_PREFIX;
use crate::types::{Actor, RevertOutcome};

const PERMISSION_DENIED: &str = "You do not have permission to revert commits. \
     You need either the Administrator permission or the configured admin role.";
const MISSING_FIELDS: &str = "Both commit hash and repository are required.";
const INVALID_REPOSITORY: &str = "Invalid repository format. Please use format: owner/repo";
const ROOT_COMMIT: &str = "Cannot revert the initial commit (no parent commit found).";

/// How a revert was requested. An explicit tagged union so routing is
/// exhaustive instead of probed at runtime.
#[derive(Debug, Clone)]
pub enum RevertEntry {
    /// Both repository and commit hash supplied up front.
    Direct {
        repository: String,
        commit_id: String,
    },
    /// Completed guided dialog; either field may have been left empty.
    Guided {
        repository: Option<String>,
        commit_id: Option<String>,
    },
    /// A selection from a rendered notification's commit selector. The
    /// selector's custom id embeds the repository.
    Selector {
        custom_id: String,
        commit_id: String,
    },
}

/// Ephemeral revert parameters; produced by entry resolution, consumed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertRequest {
    pub repository: String,
    pub commit_id: String,
}

impl RevertEntry {
    /// Collapse any entry point into a concrete request. Unknown or missing
    /// pieces become empty strings and fail validation downstream, so the
    /// caller sees a corrective message rather than an error.
    pub fn resolve(self, default_repository: Option<&str>) -> RevertRequest {
        match self {
            RevertEntry::Direct {
                repository,
                commit_id,
            } => RevertRequest {
                repository,
                commit_id,
            },
            RevertEntry::Guided {
                repository,
                commit_id,
            } => RevertRequest {
                repository: repository
                    .filter(|r| !r.is_empty())
                    .or_else(|| default_repository.map(str::to_string))
                    .unwrap_or_default(),
                commit_id: commit_id.unwrap_or_default(),
            },
            RevertEntry::Selector {
                custom_id,
                commit_id,
            } => RevertRequest {
                repository: custom_id
                    .strip_prefix(SELECTOR_PREFIX)
                    .unwrap_or_default()
                    .to_string(),
                commit_id,
            },
        }
    }
}

/// Run the revert workflow. Preconditions, in order: authorization, both
/// fields present, repository carries an `owner/name` separator. No remote
/// call is made until all three hold.
pub async fn perform_revert(
    host: &dyn CodeHost,
    actor: &Actor,
    admin_role: Option<&str>,
    request: &RevertRequest,
    branch: &str,
) -> RevertOutcome {
    if !auth::is_authorized(actor, admin_role) {
        return RevertOutcome::failure(PERMISSION_DENIED);
    }
    if request.repository.is_empty() || request.commit_id.is_empty() {
        return RevertOutcome::failure(MISSING_FIELDS);
    }
    let Some(repo) = RepoRef::parse(&request.repository) else {
        return RevertOutcome::failure(INVALID_REPOSITORY);
    };

    match execute(host, &repo, &request.commit_id, actor, branch).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(
                repository = %repo.full_name(),
                commit = %request.commit_id,
                error = %format!("{e:#}"),
                "revert failed"
            );
            RevertOutcome::failure(format!("Failed to revert commit: {e:#}"))
        }
    }
}

/// The compensating write: a new commit carrying the parent's tree,
/// attached to the current branch tip so the ref update is always
/// fast-forward, even if pushes landed after the reverted commit.
async fn execute(
    host: &dyn CodeHost,
    repo: &RepoRef,
    commit_id: &str,
    actor: &Actor,
    branch: &str,
) -> anyhow::Result<RevertOutcome> {
    let commit = host.commit(repo, commit_id).await?;

    let Some(parent_sha) = commit.parents.first() else {
        return Ok(RevertOutcome::failure(ROOT_COMMIT));
    };
    let parent = host.commit(repo, parent_sha).await?;

    let tip = host.branch_tip(repo, branch).await?;

    let message = format!(
        "Revert \"{}\"\n\nThis reverts commit {}.\n\nRequested by: {}",
        commit.summary(),
        commit.sha,
        actor.tag,
    );
    let new_sha = host
        .create_commit(repo, &message, &parent.tree, std::slice::from_ref(&tip))
        .await?;
    host.update_ref(repo, &format!("heads/{branch}"), &new_sha)
        .await?;

    let short = commit.sha.get(..7).unwrap_or(&commit.sha);
    info!(
        repository = %repo.full_name(),
        reverted = %commit.sha,
        new_commit = %new_sha,
        "reverted commit"
    );
    Ok(RevertOutcome::ok(format!(
        "Successfully reverted commit `{short}` in {}",
        repo.full_name()
    )))
}
