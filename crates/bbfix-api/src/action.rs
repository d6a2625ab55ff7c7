//! The closed set of remediation actions the fix engine can offer.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Ignore,
    AbortOperation,
    Clone,
    Stash,
    CreateProject,
    ForkAndRetarget,
    SyncWithUpstream,
    Push,
    StageCommitPush,
    PublishNewBranch,
    CheckpointThenSync,
    PullFfOnly,
    SetUpstreamPush,
    EnableAutoPush,
    MoveToCatalog,
}

impl Action {
    /// All fifteen keys, in the canonical order used by the UI and tests.
    pub const ALL: [Action; 15] = [
        Action::AbortOperation,
        Action::CreateProject,
        Action::Push,
        Action::StageCommitPush,
        Action::PullFfOnly,
        Action::SetUpstreamPush,
        Action::ForkAndRetarget,
        Action::EnableAutoPush,
        Action::MoveToCatalog,
        Action::Clone,
        Action::Stash,
        Action::SyncWithUpstream,
        Action::PublishNewBranch,
        Action::CheckpointThenSync,
        Action::Ignore,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Action::Ignore => "Ignore",
            Action::AbortOperation => "Abort in-progress operation",
            Action::Clone => "Clone",
            Action::Stash => "Stash changes",
            Action::CreateProject => "Create remote project",
            Action::ForkAndRetarget => "Fork and retarget",
            Action::SyncWithUpstream => "Sync with upstream",
            Action::Push => "Push",
            Action::StageCommitPush => "Stage, commit and push",
            Action::PublishNewBranch => "Publish as new branch",
            Action::CheckpointThenSync => "Checkpoint, then sync",
            Action::PullFfOnly => "Pull (fast-forward only)",
            Action::SetUpstreamPush => "Set upstream and push",
            Action::EnableAutoPush => "Enable auto-push",
            Action::MoveToCatalog => "Move to expected catalog",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Action::Ignore => "Hide this repository from the current session",
            Action::AbortOperation => {
                "Cancel an in-progress merge, rebase, cherry-pick or bisect"
            }
            Action::Clone => "Clone a repository that exists remotely but not locally",
            Action::Stash => "Stash the working tree",
            Action::CreateProject => "Create the remote project, set origin, and push",
            Action::ForkAndRetarget => "Fork the upstream project and retarget the branch to it",
            Action::SyncWithUpstream => "Rebase or merge upstream into the local branch",
            Action::Push => "Push already-committed local commits",
            Action::StageCommitPush => "Stage all changes, commit, and push",
            Action::PublishNewBranch => "Create a new branch, then stage, commit, and push it",
            Action::CheckpointThenSync => "Stage and commit, then sync, then push",
            Action::PullFfOnly => "Fast-forward the local branch to upstream",
            Action::SetUpstreamPush => "Set the upstream branch and push",
            Action::EnableAutoPush => "Flip this repository's auto-push preference on",
            Action::MoveToCatalog => "Move the working tree into its expected catalog path",
        }
    }

    /// True for actions that may push to a remote, rewrite origin, or modify
    /// files beyond metadata; always confirmed in the interactive wizard.
    pub fn is_risky(&self) -> bool {
        !matches!(
            self,
            Action::Ignore
                | Action::Clone
                | Action::PullFfOnly
                | Action::EnableAutoPush
                | Action::MoveToCatalog
        )
    }

    /// Kebab-case key, stable across versions; used as the prefix for plan
    /// entry IDs and as the CLI `--action` value.
    pub fn slug(&self) -> &'static str {
        match self {
            Action::Ignore => "ignore",
            Action::AbortOperation => "abort-operation",
            Action::Clone => "clone",
            Action::Stash => "stash",
            Action::CreateProject => "create-project",
            Action::ForkAndRetarget => "fork-and-retarget",
            Action::SyncWithUpstream => "sync-with-upstream",
            Action::Push => "push",
            Action::StageCommitPush => "stage-commit-push",
            Action::PublishNewBranch => "publish-new-branch",
            Action::CheckpointThenSync => "checkpoint-then-sync",
            Action::PullFfOnly => "pull-ff-only",
            Action::SetUpstreamPush => "set-upstream-push",
            Action::EnableAutoPush => "enable-auto-push",
            Action::MoveToCatalog => "move-to-catalog",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Action::ALL.into_iter().find(|a| a.slug() == slug)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abort_operation_is_risky() {
        assert!(Action::AbortOperation.is_risky());
    }

    #[test]
    fn move_to_catalog_is_not_risky() {
        assert!(!Action::MoveToCatalog.is_risky());
    }

    #[test]
    fn all_contains_every_variant_once() {
        let mut seen: Vec<Action> = Action::ALL.to_vec();
        seen.sort_by_key(|a| format!("{a:?}"));
        seen.dedup();
        assert_eq!(seen.len(), 15);
    }
}
