//! Test-only fixture builders shared across the `bb fix` workspace.

pub mod synth_repo;

pub use synth_repo::{FixtureError, SynthRepo};

use bbfix_api::{OperationInProgress, PushAccess, RepoMetadata, RepoRecord};

/// A [`RepoRecord`] with sane defaults; override individual fields with
/// struct update syntax in the calling test.
pub fn repo_record(repo_key: &str, path: &str) -> RepoRecord {
    RepoRecord {
        repo_key: repo_key.to_string(),
        name: repo_key.rsplit('/').next().unwrap_or(repo_key).to_string(),
        catalog: repo_key.split('/').next().unwrap_or("software").to_string(),
        path: path.to_string(),
        origin_url: Some(format!("git@github.com:you/{repo_key}.git")),
        branch: Some("main".to_string()),
        upstream: Some("origin/main".to_string()),
        head_sha: Some("0000000000000000000000000000000000000000".to_string()),
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
        state_hash: "fixture".to_string(),
    }
}

/// A [`RepoMetadata`] with read/write push access, matching a freshly-cloned
/// repo the user owns.
pub fn repo_metadata(repo_key: &str) -> RepoMetadata {
    let mut metadata = RepoMetadata::new(repo_key, repo_key.rsplit('/').next().unwrap_or(repo_key));
    metadata.push_access = PushAccess::ReadWrite;
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_record_defaults_are_syncable() {
        let repo = repo_record("software/api", "/tmp/api");
        assert!(repo.syncable);
        assert_eq!(repo.name, "api");
    }

    #[test]
    fn repo_metadata_defaults_to_read_write() {
        let metadata = repo_metadata("software/api");
        assert!(metadata.push_allowed(Some("git@github.com:you/api.git")));
    }
}
