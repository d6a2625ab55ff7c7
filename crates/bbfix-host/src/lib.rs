//! GitHub host CLI adapter consumed by the fix engine.
//!
//! Narrow surface: auth check, repo create, repo fork, and a permission
//! probe. Everything else about `gh` is out of scope.

use async_trait::async_trait;
use bbfix_api::config::RepoVisibility;
use bbfix_api::Error;
use serde::Deserialize;
use std::process::Output;

pub type Result<T> = std::result::Result<T, Error>;

#[async_trait]
pub trait HostOps: Send + Sync {
    /// `gh auth status`. Returns [`Error::AuthRequired`] with a login hint
    /// when not authenticated.
    async fn ensure_authenticated(&self) -> Result<()>;
    async fn create_repo(&self, owner: &str, name: &str, visibility: RepoVisibility) -> Result<()>;
    async fn fork_repo(&self, owner_repo: &str) -> Result<()>;
    /// The caller's permission on `owner/repo` (`"ADMIN"`, `"WRITE"`,
    /// `"READ"`, ...), as reported by `gh repo view`.
    async fn viewer_permission(&self, owner_repo: &str) -> Result<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GhCli;

impl GhCli {
    pub fn new() -> Self {
        Self
    }

    async fn spawn(&self, args: &[&str]) -> Result<Output> {
        tokio::process::Command::new("gh")
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .await
            .map_err(|e| {
                Error::external_command_failed(args.join(" "), format!("failed to spawn gh: {e}"))
            })
    }

    fn ensure_success(step: &str, output: &Output) -> Result<()> {
        if output.status.success() {
            Ok(())
        } else {
            Err(Error::external_command_failed(
                step,
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ))
        }
    }
}

#[derive(Debug, Deserialize)]
struct ViewerPermissionJson {
    #[serde(rename = "viewerPermission")]
    viewer_permission: String,
}

#[async_trait]
impl HostOps for GhCli {
    async fn ensure_authenticated(&self) -> Result<()> {
        let output = self.spawn(&["auth", "status"]).await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(Error::new(
                bbfix_api::ErrorCode::AuthRequired,
                "GitHub CLI is not authenticated",
            )
            .with_remediation("run `gh auth login` and retry"))
        }
    }

    async fn create_repo(&self, owner: &str, name: &str, visibility: RepoVisibility) -> Result<()> {
        let full = format!("{owner}/{name}");
        let visibility_flag = match visibility {
            RepoVisibility::Private => "--private",
            RepoVisibility::Public => "--public",
        };
        let output = self
            .spawn(&["repo", "create", &full, visibility_flag])
            .await?;
        Self::ensure_success("gh repo create", &output)
    }

    async fn fork_repo(&self, owner_repo: &str) -> Result<()> {
        let output = self
            .spawn(&["repo", "fork", owner_repo, "--remote=false", "--clone=false"])
            .await?;
        Self::ensure_success("gh repo fork", &output)
    }

    async fn viewer_permission(&self, owner_repo: &str) -> Result<String> {
        let output = self
            .spawn(&["repo", "view", owner_repo, "--json", "viewerPermission"])
            .await?;
        Self::ensure_success("gh repo view", &output)?;
        let parsed: ViewerPermissionJson = serde_json::from_slice(&output.stdout).map_err(|e| {
            Error::external_command_failed("gh repo view", format!("unparsable response: {e}"))
        })?;
        Ok(parsed.viewer_permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewer_permission_json_parses() {
        let parsed: ViewerPermissionJson =
            serde_json::from_str(r#"{"viewerPermission":"WRITE"}"#).unwrap();
        assert_eq!(parsed.viewer_permission, "WRITE");
    }
}
