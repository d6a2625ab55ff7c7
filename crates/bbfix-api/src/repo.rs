//! Repository record: the snapshot-owned, engine-read view of one working tree.

use serde::{Deserialize, Serialize};

/// Catalog-qualified identifier, stable across renames via
/// [`crate::metadata::RepoMetadata::previous_repo_keys`].
pub type RepoKey = String;

/// In-progress git operation that blocks every other remediation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationInProgress {
    None,
    Merge,
    Rebase,
    CherryPick,
    Bisect,
}

impl OperationInProgress {
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// The exact git verb used to abort this operation, if any is active.
    pub fn abort_verb(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Merge => Some("merge"),
            Self::Rebase => Some("rebase"),
            Self::CherryPick => Some("cherry-pick"),
            Self::Bisect => Some("bisect"),
        }
    }
}

/// Reasons a repository is considered unsyncable, in the order they were
/// detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsyncableReason {
    MissingOrigin,
    DirtyTracked,
    DirtyUntracked,
    MissingUpstream,
    Diverged,
    OperationInProgress,
    CatalogMismatch,
    PushAccessBlocked,
}

/// One working tree as surfaced by the catalog scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoRecord {
    pub repo_key: RepoKey,
    pub name: String,
    pub catalog: String,
    pub path: String,
    pub origin_url: Option<String>,
    pub branch: Option<String>,
    pub upstream: Option<String>,
    pub head_sha: Option<String>,

    pub has_dirty_tracked: bool,
    pub has_untracked: bool,
    pub ahead: u32,
    pub behind: u32,
    pub diverged: bool,
    pub operation_in_progress: OperationInProgress,

    pub syncable: bool,
    pub unsyncable_reasons: Vec<UnsyncableReason>,

    pub expected_repo_key: Option<RepoKey>,
    pub expected_catalog: Option<String>,
    pub expected_path: Option<String>,

    pub state_hash: String,
}

impl RepoRecord {
    pub fn is_catalog_mismatch(&self) -> bool {
        self.unsyncable_reasons
            .contains(&UnsyncableReason::CatalogMismatch)
            && self.expected_path.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abort_verb_matches_operation() {
        assert_eq!(OperationInProgress::Rebase.abort_verb(), Some("rebase"));
        assert_eq!(OperationInProgress::None.abort_verb(), None);
    }

    #[test]
    fn none_is_not_active() {
        assert!(!OperationInProgress::None.is_active());
        assert!(OperationInProgress::Bisect.is_active());
    }
}
