//! Narrow git plumbing adapter consumed by the fix engine.
//!
//! The engine never shells out to `git` directly; every operation it needs
//! is named explicitly on [`GitOps`] and dispatched through [`CliGit`].

pub mod backend;
pub mod status;

use async_trait::async_trait;
use bbfix_api::{Error, OperationInProgress, PushAccess};
use std::path::Path;

pub use backend::CliGit;
pub use status::{ParsedStatus, RawStatusEntry};

pub type Result<T> = std::result::Result<T, Error>;

/// One row of `git diff --numstat` output, already associated with a path.
#[derive(Debug, Clone, PartialEq)]
pub struct NumstatEntry {
    pub path: String,
    pub added: u64,
    pub removed: u64,
    /// `true` when git printed `-`/`-` (binary file, line counts unknown).
    pub binary: bool,
}

/// The read/write surface the fix engine is allowed to use. Implementations
/// must scrub the environment of interactive credential prompts (see
/// [`backend::non_interactive_envs`]) for every invocation.
#[async_trait]
pub trait GitOps: Send + Sync {
    async fn is_repo(&self, path: &Path) -> Result<bool>;
    async fn current_branch(&self, path: &Path) -> Result<Option<String>>;
    async fn upstream(&self, path: &Path) -> Result<Option<String>>;
    async fn head_sha(&self, path: &Path) -> Result<Option<String>>;
    async fn remote_names(&self, path: &Path) -> Result<Vec<String>>;
    async fn repo_origin(&self, path: &Path) -> Result<Option<String>>;
    async fn default_branch(&self, path: &Path, remote: &str) -> Result<Option<String>>;
    async fn operation_in_progress(&self, path: &Path) -> Result<OperationInProgress>;
    async fn status(&self, path: &Path) -> Result<ParsedStatus>;
    async fn ahead_behind(&self, path: &Path, local: &str, upstream: &str) -> Result<(u32, u32)>;
    async fn diff_numstat(&self, path: &Path, cached: bool) -> Result<Vec<NumstatEntry>>;
    async fn has_root_gitignore(&self, path: &Path) -> Result<bool>;

    async fn init_repo(&self, path: &Path) -> Result<()>;
    async fn add_origin(&self, path: &Path, url: &str) -> Result<()>;
    async fn add_remote(&self, path: &Path, name: &str, url: &str) -> Result<()>;
    async fn set_remote_url(&self, path: &Path, name: &str, url: &str) -> Result<()>;
    async fn add_all(&self, path: &Path) -> Result<()>;
    async fn commit(&self, path: &Path, message: &str) -> Result<()>;
    async fn push(&self, path: &Path, remote: &str, branch: &str, force: bool) -> Result<()>;
    async fn push_upstream_with_preferred_remote(
        &self,
        path: &Path,
        remote: &str,
        branch: &str,
    ) -> Result<()>;
    async fn pull_ff_only(&self, path: &Path) -> Result<()>;
    async fn fetch_prune(&self, path: &Path, remote: &str) -> Result<()>;
    async fn merge_abort(&self, path: &Path) -> Result<()>;
    async fn rebase_abort(&self, path: &Path) -> Result<()>;
    async fn cherry_pick_abort(&self, path: &Path) -> Result<()>;
    async fn bisect_reset(&self, path: &Path) -> Result<()>;
    async fn rename_current_branch(&self, path: &Path, new_name: &str) -> Result<()>;
    async fn sync_with_upstream(
        &self,
        path: &Path,
        upstream: &str,
        strategy: bbfix_api::config::SyncStrategy,
    ) -> Result<()>;
    /// Best-effort probe: attempts a push dry-run and classifies the result.
    async fn probe_push_access(&self, path: &Path, remote: &str, branch: &str) -> Result<PushAccess>;

    /// Clones `origin` into `path` (parent directories must already exist).
    async fn clone(&self, origin: &str, path: &Path) -> Result<()>;
    /// Stashes the working tree, including untracked files.
    async fn stash_push(&self, path: &Path) -> Result<()>;
    async fn checkout_new_branch(&self, path: &Path, name: &str) -> Result<()>;
    async fn checkout(&self, path: &Path, name: &str) -> Result<()>;

    /// Copies the index file aside; returns `None` if no index existed.
    async fn snapshot_index(&self, path: &Path) -> Result<Option<Vec<u8>>>;
    /// Restores (or removes) the index from a prior [`GitOps::snapshot_index`].
    async fn restore_index(&self, path: &Path, snapshot: Option<Vec<u8>>) -> Result<()>;
}
