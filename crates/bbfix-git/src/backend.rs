//! Git CLI implementation of [`crate::GitOps`]; every command is spawned via
//! `tokio::process::Command` with interactive credential prompts disabled.

use crate::status::parse_status_porcelain;
use crate::{GitOps, NumstatEntry, ParsedStatus, Result};
use async_trait::async_trait;
use bbfix_api::config::SyncStrategy;
use bbfix_api::{Error, OperationInProgress, PushAccess};
use std::path::{Path, PathBuf};
use std::process::Output;

/// Environment overrides applied to every invocation so a missing credential
/// never blocks on a terminal prompt, SSH askpass, or credential manager UI.
fn non_interactive_envs() -> [(&'static str, &'static str); 6] {
    [
        ("GIT_TERMINAL_PROMPT", "0"),
        ("GCM_INTERACTIVE", "never"),
        ("GIT_ASKPASS", ""),
        ("SSH_ASKPASS", ""),
        ("SSH_ASKPASS_REQUIRE", "never"),
        ("GIT_CONFIG_GLOBAL", "/dev/null"),
    ]
}

/// Git CLI backend that shells out to the `git` binary on `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CliGit;

impl CliGit {
    pub fn new() -> Self {
        Self
    }

    async fn spawn(&self, cwd: Option<&Path>, args: &[&str]) -> Result<Output> {
        let mut cmd = tokio::process::Command::new("git");
        if let Some(cwd) = cwd {
            cmd.arg("-C").arg(cwd);
        }
        cmd.args(args);
        cmd.envs(non_interactive_envs());
        cmd.output().await.map_err(|e| {
            Error::external_command_failed(args.join(" "), format!("failed to spawn git: {e}"))
        })
    }

    async fn run(&self, path: &Path, args: &[&str]) -> Result<Output> {
        self.spawn(Some(path), args).await
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

    fn stdout_trimmed(output: &Output) -> String {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    async fn git_dir(&self, path: &Path) -> Result<PathBuf> {
        let output = self.run(path, &["rev-parse", "--git-dir"]).await?;
        Self::ensure_success("rev-parse --git-dir", &output)?;
        let raw = Self::stdout_trimmed(&output);
        let candidate = PathBuf::from(raw);
        Ok(if candidate.is_absolute() {
            candidate
        } else {
            path.join(candidate)
        })
    }
}

#[async_trait]
impl GitOps for CliGit {
    async fn is_repo(&self, path: &Path) -> Result<bool> {
        let output = self.run(path, &["rev-parse", "--git-dir"]).await?;
        Ok(output.status.success())
    }

    async fn current_branch(&self, path: &Path) -> Result<Option<String>> {
        let output = self.run(path, &["rev-parse", "--abbrev-ref", "HEAD"]).await?;
        if !output.status.success() {
            return Ok(None);
        }
        let branch = Self::stdout_trimmed(&output);
        Ok(if branch == "HEAD" { None } else { Some(branch) })
    }

    async fn upstream(&self, path: &Path) -> Result<Option<String>> {
        let output = self
            .run(
                path,
                &["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"],
            )
            .await?;
        Ok(if output.status.success() {
            Some(Self::stdout_trimmed(&output))
        } else {
            None
        })
    }

    async fn head_sha(&self, path: &Path) -> Result<Option<String>> {
        let output = self.run(path, &["rev-parse", "HEAD"]).await?;
        Ok(if output.status.success() {
            Some(Self::stdout_trimmed(&output))
        } else {
            None
        })
    }

    async fn remote_names(&self, path: &Path) -> Result<Vec<String>> {
        let output = self.run(path, &["remote"]).await?;
        Self::ensure_success("remote", &output)?;
        Ok(Self::stdout_trimmed(&output)
            .lines()
            .map(str::to_string)
            .filter(|s| !s.is_empty())
            .collect())
    }

    async fn repo_origin(&self, path: &Path) -> Result<Option<String>> {
        let output = self.run(path, &["remote", "get-url", "origin"]).await?;
        Ok(if output.status.success() {
            Some(Self::stdout_trimmed(&output))
        } else {
            None
        })
    }

    async fn default_branch(&self, path: &Path, remote: &str) -> Result<Option<String>> {
        let symbolic_ref = format!("refs/remotes/{remote}/HEAD");
        let output = self
            .run(path, &["symbolic-ref", "--short", &symbolic_ref])
            .await?;
        if !output.status.success() {
            return Ok(None);
        }
        let full = Self::stdout_trimmed(&output);
        Ok(full.strip_prefix(&format!("{remote}/")).map(str::to_string))
    }

    async fn operation_in_progress(&self, path: &Path) -> Result<OperationInProgress> {
        let git_dir = self.git_dir(path).await?;
        if tokio::fs::metadata(git_dir.join("MERGE_HEAD")).await.is_ok() {
            return Ok(OperationInProgress::Merge);
        }
        if tokio::fs::metadata(git_dir.join("CHERRY_PICK_HEAD")).await.is_ok() {
            return Ok(OperationInProgress::CherryPick);
        }
        if tokio::fs::metadata(git_dir.join("rebase-merge")).await.is_ok()
            || tokio::fs::metadata(git_dir.join("rebase-apply")).await.is_ok()
        {
            return Ok(OperationInProgress::Rebase);
        }
        if tokio::fs::metadata(git_dir.join("BISECT_LOG")).await.is_ok() {
            return Ok(OperationInProgress::Bisect);
        }
        Ok(OperationInProgress::None)
    }

    async fn status(&self, path: &Path) -> Result<ParsedStatus> {
        let output = self
            .run(path, &["status", "--porcelain=v1", "-z"])
            .await?;
        Self::ensure_success("status", &output)?;
        Ok(parse_status_porcelain(&output.stdout))
    }

    async fn ahead_behind(&self, path: &Path, local: &str, upstream: &str) -> Result<(u32, u32)> {
        let range = format!("{local}...{upstream}");
        let output = self
            .run(path, &["rev-list", "--left-right", "--count", &range])
            .await?;
        Self::ensure_success("rev-list --left-right --count", &output)?;
        let text = Self::stdout_trimmed(&output);
        let mut parts = text.split_whitespace();
        let ahead = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
        let behind = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
        Ok((ahead, behind))
    }

    async fn diff_numstat(&self, path: &Path, cached: bool) -> Result<Vec<NumstatEntry>> {
        let mut args = vec!["diff", "--numstat"];
        if cached {
            args.push("--cached");
        }
        let output = self.run(path, &args).await?;
        Self::ensure_success("diff --numstat", &output)?;
        let text = String::from_utf8_lossy(&output.stdout);
        Ok(text
            .lines()
            .filter_map(|line| {
                let mut cols = line.splitn(3, '\t');
                let added = cols.next()?;
                let removed = cols.next()?;
                let path = cols.next()?.to_string();
                let binary = added == "-" || removed == "-";
                Some(NumstatEntry {
                    path,
                    added: added.parse().unwrap_or(0),
                    removed: removed.parse().unwrap_or(0),
                    binary,
                })
            })
            .collect())
    }

    async fn has_root_gitignore(&self, path: &Path) -> Result<bool> {
        Ok(tokio::fs::metadata(path.join(".gitignore")).await.is_ok())
    }

    async fn init_repo(&self, path: &Path) -> Result<()> {
        let output = self.run(path, &["init"]).await?;
        Self::ensure_success("init", &output)
    }

    async fn add_origin(&self, path: &Path, url: &str) -> Result<()> {
        let output = self.run(path, &["remote", "add", "origin", url]).await?;
        Self::ensure_success("remote add origin", &output)
    }

    async fn add_remote(&self, path: &Path, name: &str, url: &str) -> Result<()> {
        let output = self.run(path, &["remote", "add", name, url]).await?;
        Self::ensure_success("remote add", &output)
    }

    async fn set_remote_url(&self, path: &Path, name: &str, url: &str) -> Result<()> {
        let output = self.run(path, &["remote", "set-url", name, url]).await?;
        Self::ensure_success("remote set-url", &output)
    }

    async fn add_all(&self, path: &Path) -> Result<()> {
        let output = self.run(path, &["add", "-A"]).await?;
        Self::ensure_success("add -A", &output)
    }

    async fn commit(&self, path: &Path, message: &str) -> Result<()> {
        let output = self.run(path, &["commit", "-m", message]).await?;
        Self::ensure_success("commit", &output)
    }

    async fn push(&self, path: &Path, remote: &str, branch: &str, force: bool) -> Result<()> {
        let mut args = vec!["push"];
        if force {
            args.push("--force");
        }
        args.push(remote);
        args.push(branch);
        let output = self.run(path, &args).await?;
        Self::ensure_success("push", &output)
    }

    async fn push_upstream_with_preferred_remote(
        &self,
        path: &Path,
        remote: &str,
        branch: &str,
    ) -> Result<()> {
        let output = self.run(path, &["push", "-u", remote, branch]).await?;
        Self::ensure_success("push -u", &output)
    }

    async fn pull_ff_only(&self, path: &Path) -> Result<()> {
        let output = self.run(path, &["pull", "--ff-only"]).await?;
        Self::ensure_success("pull --ff-only", &output)
    }

    async fn fetch_prune(&self, path: &Path, remote: &str) -> Result<()> {
        let output = self.run(path, &["fetch", "--prune", remote]).await?;
        Self::ensure_success("fetch --prune", &output)
    }

    async fn merge_abort(&self, path: &Path) -> Result<()> {
        let output = self.run(path, &["merge", "--abort"]).await?;
        Self::ensure_success("merge --abort", &output)
    }

    async fn rebase_abort(&self, path: &Path) -> Result<()> {
        let output = self.run(path, &["rebase", "--abort"]).await?;
        Self::ensure_success("rebase --abort", &output)
    }

    async fn cherry_pick_abort(&self, path: &Path) -> Result<()> {
        let output = self.run(path, &["cherry-pick", "--abort"]).await?;
        Self::ensure_success("cherry-pick --abort", &output)
    }

    async fn bisect_reset(&self, path: &Path) -> Result<()> {
        let output = self.run(path, &["bisect", "reset"]).await?;
        Self::ensure_success("bisect reset", &output)
    }

    async fn rename_current_branch(&self, path: &Path, new_name: &str) -> Result<()> {
        let output = self.run(path, &["branch", "-m", new_name]).await?;
        Self::ensure_success("branch -m", &output)
    }

    async fn sync_with_upstream(
        &self,
        path: &Path,
        upstream: &str,
        strategy: SyncStrategy,
    ) -> Result<()> {
        let output = match strategy {
            SyncStrategy::Rebase => self.run(path, &["rebase", upstream]).await?,
            SyncStrategy::Merge => self.run(path, &["merge", "--no-edit", upstream]).await?,
        };
        Self::ensure_success("sync with upstream", &output)
    }

    async fn probe_push_access(&self, path: &Path, remote: &str, branch: &str) -> Result<PushAccess> {
        let output = self
            .run(path, &["push", "--dry-run", remote, branch])
            .await?;
        if output.status.success() {
            return Ok(PushAccess::ReadWrite);
        }
        let stderr = String::from_utf8_lossy(&output.stderr).to_lowercase();
        if stderr.contains("permission") || stderr.contains("403") || stderr.contains("denied") {
            Ok(PushAccess::ReadOnly)
        } else {
            Ok(PushAccess::Unknown)
        }
    }

    async fn clone(&self, origin: &str, path: &Path) -> Result<()> {
        let path_str = path.to_string_lossy().into_owned();
        let output = self.spawn(None, &["clone", origin, &path_str]).await?;
        Self::ensure_success("clone", &output)
    }

    async fn stash_push(&self, path: &Path) -> Result<()> {
        let output = self.run(path, &["stash", "push", "--include-untracked"]).await?;
        Self::ensure_success("stash push", &output)
    }

    async fn checkout_new_branch(&self, path: &Path, name: &str) -> Result<()> {
        let output = self.run(path, &["checkout", "-b", name]).await?;
        Self::ensure_success("checkout -b", &output)
    }

    async fn checkout(&self, path: &Path, name: &str) -> Result<()> {
        let output = self.run(path, &["checkout", name]).await?;
        Self::ensure_success("checkout", &output)
    }

    async fn snapshot_index(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        let index_path = self.git_dir(path).await?.join("index");
        match tokio::fs::read(&index_path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::state_io(format!("failed to read git index: {e}"))),
        }
    }

    async fn restore_index(&self, path: &Path, snapshot: Option<Vec<u8>>) -> Result<()> {
        let index_path = self.git_dir(path).await?.join("index");
        match snapshot {
            Some(bytes) => tokio::fs::write(&index_path, bytes)
                .await
                .map_err(|e| Error::state_io(format!("failed to restore git index: {e}"))),
            None => match tokio::fs::remove_file(&index_path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(Error::state_io(format!("failed to remove git index: {e}"))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn init_repo(dir: &Path) {
        let git = CliGit::new();
        git.init_repo(dir).await.unwrap();
        git.run(dir, &["config", "user.email", "test@example.com"])
            .await
            .unwrap();
        git.run(dir, &["config", "user.name", "Test"]).await.unwrap();
    }

    #[tokio::test]
    async fn is_repo_false_outside_git() {
        let dir = tempfile::tempdir().unwrap();
        let git = CliGit::new();
        assert!(!git.is_repo(dir.path()).await.unwrap());
    }

    #[tokio::test]
    async fn status_reports_untracked_file() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path()).await;
        tokio::fs::write(dir.path().join("a.txt"), b"hi").await.unwrap();
        let git = CliGit::new();
        let status = git.status(dir.path()).await.unwrap();
        assert!(status.has_untracked());
        assert!(!status.has_dirty_tracked());
    }

    #[tokio::test]
    async fn operation_in_progress_is_none_by_default() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path()).await;
        let git = CliGit::new();
        assert_eq!(
            git.operation_in_progress(dir.path()).await.unwrap(),
            OperationInProgress::None
        );
    }
}
