//! Code-host capability interface and its GitHub REST implementation.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

const API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("commit-relay/", env!("CARGO_PKG_VERSION"));

/// An `owner/name` repository reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    /// Parse an `owner/name` string. Both halves must be non-empty.
    pub fn parse(full_name: &str) -> Option<Self> {
        let (owner, name) = full_name.split_once('/')?;
        if owner.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// A commit as returned by the code host, with enough detail to build a
/// revert: message, content tree, and parent shas.
#[derive(Debug, Clone)]
pub struct HostCommit {
    pub sha: String,
    pub message: String,
    pub tree: String,
    pub parents: Vec<String>,
}

impl HostCommit {
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

/// A registered webhook on the code host.
#[derive(Debug, Clone)]
pub struct Hook {
    pub id: u64,
    pub url: String,
}

/// Capability interface over the code host's REST surface. One concrete
/// implementation talks to GitHub; tests substitute recording mocks.
#[async_trait]
pub trait CodeHost: Send + Sync {
    async fn commit(&self, repo: &RepoRef, git_ref: &str) -> Result<HostCommit>;
    async fn branch_tip(&self, repo: &RepoRef, branch: &str) -> Result<String>;
    async fn create_commit(
        &self,
        repo: &RepoRef,
        message: &str,
        tree: &str,
        parents: &[String],
    ) -> Result<String>;
    async fn update_ref(&self, repo: &RepoRef, git_ref: &str, sha: &str) -> Result<()>;
    async fn create_hook(&self, repo: &RepoRef, url: &str, secret: &str) -> Result<()>;
    async fn list_hooks(&self, repo: &RepoRef) -> Result<Vec<Hook>>;
    async fn delete_hook(&self, repo: &RepoRef, hook_id: u64) -> Result<()>;
}

// ─── GitHub REST client ──────────────────────────────────────────────────────

pub struct GitHubClient {
    http: reqwest::Client,
    token: String,
    api_base: String,
}

#[derive(Deserialize)]
struct CommitResponse {
    sha: String,
    commit: CommitDetail,
    #[serde(default)]
    parents: Vec<ShaRef>,
}

#[derive(Deserialize)]
struct CommitDetail {
    message: String,
    tree: ShaRef,
}

#[derive(Deserialize)]
struct ShaRef {
    sha: String,
}

#[derive(Deserialize)]
struct BranchResponse {
    commit: ShaRef,
}

#[derive(Deserialize)]
struct CreatedCommit {
    sha: String,
}

#[derive(Deserialize)]
struct HookResponse {
    id: u64,
    #[serde(default)]
    config: HookConfig,
}

#[derive(Deserialize, Default)]
struct HookConfig {
    #[serde(default)]
    url: String,
}

impl GitHubClient {
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
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
    }

    async fn check(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("{what} returned status {status}: {body}");
        }
        Ok(response)
    }
}

#[async_trait]
impl CodeHost for GitHubClient {
    async fn commit(&self, repo: &RepoRef, git_ref: &str) -> Result<HostCommit> {
        let path = format!("/repos/{}/{}/commits/{git_ref}", repo.owner, repo.name);
        let response = self
            .request(reqwest::Method::GET, &path)
            .send()
            .await
            .with_context(|| format!("fetching commit {git_ref} in {}", repo.full_name()))?;
        let data: CommitResponse = Self::check(response, "get commit")
            .await?
            .json()
            .await
            .context("parsing commit response")?;
        Ok(HostCommit {
            sha: data.sha,
            message: data.commit.message,
            tree: data.commit.tree.sha,
            parents: data.parents.into_iter().map(|p| p.sha).collect(),
        })
    }

    async fn branch_tip(&self, repo: &RepoRef, branch: &str) -> Result<String> {
        let path = format!("/repos/{}/{}/branches/{branch}", repo.owner, repo.name);
        let response = self
            .request(reqwest::Method::GET, &path)
            .send()
            .await
            .with_context(|| format!("fetching branch {branch} in {}", repo.full_name()))?;
        let data: BranchResponse = Self::check(response, "get branch")
            .await?
            .json()
            .await
            .context("parsing branch response")?;
        Ok(data.commit.sha)
    }

    async fn create_commit(
        &self,
        repo: &RepoRef,
        message: &str,
        tree: &str,
        parents: &[String],
    ) -> Result<String> {
        let path = format!("/repos/{}/{}/git/commits", repo.owner, repo.name);
        let response = self
            .request(reqwest::Method::POST, &path)
            .json(&json!({
                "message": message,
                "tree": tree,
                "parents": parents,
            }))
            .send()
            .await
            .with_context(|| format!("creating commit in {}", repo.full_name()))?;
        let data: CreatedCommit = Self::check(response, "create commit")
            .await?
            .json()
            .await
            .context("parsing created commit response")?;
        Ok(data.sha)
    }

    async fn update_ref(&self, repo: &RepoRef, git_ref: &str, sha: &str) -> Result<()> {
        let path = format!("/repos/{}/{}/git/refs/{git_ref}", repo.owner, repo.name);
        let response = self
            .request(reqwest::Method::PATCH, &path)
            .json(&json!({ "sha": sha, "force": false }))
            .send()
            .await
            .with_context(|| format!("updating ref {git_ref} in {}", repo.full_name()))?;
        Self::check(response, "update ref").await?;
        Ok(())
    }

    async fn create_hook(&self, repo: &RepoRef, url: &str, secret: &str) -> Result<()> {
        let path = format!("/repos/{}/{}/hooks", repo.owner, repo.name);
        let response = self
            .request(reqwest::Method::POST, &path)
            .json(&json!({
                "name": "web",
                "active": true,
                "events": ["push"],
                "config": {
                    "url": url,
                    "content_type": "json",
                    "secret": secret,
                },
            }))
            .send()
            .await
            .with_context(|| format!("creating hook in {}", repo.full_name()))?;
        Self::check(response, "create hook").await?;
        Ok(())
    }

    async fn list_hooks(&self, repo: &RepoRef) -> Result<Vec<Hook>> {
        let path = format!("/repos/{}/{}/hooks", repo.owner, repo.name);
        let response = self
            .request(reqwest::Method::GET, &path)
            .send()
            .await
            .with_context(|| format!("listing hooks in {}", repo.full_name()))?;
        let data: Vec<HookResponse> = Self::check(response, "list hooks")
            .await?
            .json()
            .await
            .context("parsing hooks response")?;
        Ok(data
            .into_iter()
            .map(|h| Hook {
                id: h.id,
                url: h.config.url,
            })
            .collect())
    }

    async fn delete_hook(&self, repo: &RepoRef, hook_id: u64) -> Result<()> {
        let path = format!("/repos/{}/{}/hooks/{hook_id}", repo.owner, repo.name);
        let response = self
            .request(reqwest::Method::DELETE, &path)
            .send()
            .await
            .with_context(|| format!("deleting hook {hook_id} in {}", repo.full_name()))?;
        Self::check(response, "delete hook").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_ref_parses_owner_and_name() {
        let repo = RepoRef::parse("acme/widgets").unwrap();
        assert_eq!(repo.owner, "acme");
        assert_eq!(repo.name, "widgets");
        assert_eq!(repo.full_name(), "acme/widgets");
    }

    #[test]
    fn repo_ref_rejects_malformed_input() {
        assert!(RepoRef::parse("widgets").is_none());
        assert!(RepoRef::parse("/widgets").is_none());
        assert!(RepoRef::parse("acme/").is_none());
        assert!(RepoRef::parse("").is_none());
    }

    #[test]
    fn host_commit_summary_is_first_line() {
        let commit = HostCommit {
            sha: "abc".into(),
            message: "feat: thing\n\nbody".into(),
            tree: "t".into(),
            parents: vec![],
        };
        assert_eq!(commit.summary(), "feat: thing");
    }
}
