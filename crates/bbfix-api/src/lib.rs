//! Typed data model and error contract shared by every `bb fix` crate.
//!
//! Nothing in this crate touches the filesystem or spawns a process — it is
//! the vocabulary the rest of the workspace speaks.

pub mod action;
pub mod config;
pub mod error;
pub mod metadata;
pub mod notify;
pub mod plan;
pub mod repo;
pub mod risk;
pub mod snapshot;

pub use action::Action;
pub use config::Config;
pub use error::{Error, ErrorCode, FixResult};
pub use metadata::{build_repo_move_index, AutoPush, PushAccess, RepoMetadata};
pub use notify::{NotifyCache, NotifyCacheEntry};
pub use plan::{ApplyStepEvent, PlanEntry, StepStatus};
pub use repo::{OperationInProgress, RepoKey, RepoRecord, UnsyncableReason};
pub use risk::{ChangedFile, RiskSnapshot};
pub use snapshot::{CatalogInfo, MachineSnapshot};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let record = RepoRecord {
            repo_key: "software/api".into(),
            name: "api".into(),
            catalog: "software".into(),
            path: "/home/x/software/api".into(),
            origin_url: Some("git@github.com:you/api.git".into()),
            branch: Some("main".into()),
            upstream: Some("origin/main".into()),
            head_sha: Some("abc123".into()),
            has_dirty_tracked: false,
            has_untracked: false,
            ahead: 0,
            behind: 0,
            diverged: false,
            operation_in_progress: OperationInProgress::None,
            syncable: true,
            unsyncable_reasons: Vec::new(),
            expected_repo_key: None,
            expected_catalog: None,
            expected_path: None,
            state_hash: "deadbeef".into(),
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: RepoRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
