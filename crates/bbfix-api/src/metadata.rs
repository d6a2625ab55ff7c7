//! Persisted, per-repository metadata: the one piece of engine-owned state
//! that survives across machine-snapshot refreshes.

use crate::repo::RepoKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How aggressively the engine should offer to push this repo's default
/// branch on the fleet owner's behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoPush {
    Disabled,
    IncludeDefaultBranch,
    All,
}

impl Default for AutoPush {
    fn default() -> Self {
        Self::Disabled
    }
}

/// Last known push permission for the configured remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushAccess {
    Unknown,
    ReadOnly,
    ReadWrite,
}

impl Default for PushAccess {
    fn default() -> Self {
        Self::Unknown
    }
}

/// One `repos/<repo_key>.yaml` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoMetadata {
    pub repo_key: RepoKey,
    #[serde(default)]
    pub previous_repo_keys: Vec<RepoKey>,
    pub name: String,
    pub origin_url: Option<String>,
    pub preferred_catalog: Option<String>,
    pub preferred_remote: Option<String>,

    #[serde(default)]
    pub auto_push: AutoPush,

    #[serde(default)]
    pub push_access: PushAccess,
    pub push_access_checked_at: Option<DateTime<Utc>>,
    pub push_access_checked_remote: Option<String>,
    #[serde(default)]
    pub push_access_manual_override: bool,

    #[serde(default)]
    pub branch_follow_enabled: bool,
}

impl RepoMetadata {
    pub fn new(repo_key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            repo_key: repo_key.into(),
            previous_repo_keys: Vec::new(),
            name: name.into(),
            origin_url: None,
            preferred_catalog: None,
            preferred_remote: None,
            auto_push: AutoPush::Disabled,
            push_access: PushAccess::Unknown,
            push_access_checked_at: None,
            push_access_checked_remote: None,
            push_access_manual_override: false,
            branch_follow_enabled: false,
        }
    }

    /// Records a rename: the old key becomes a previous key and is never
    /// duplicated.
    pub fn rename_to(&mut self, new_key: impl Into<String>) {
        let old_key = std::mem::replace(&mut self.repo_key, new_key.into());
        if !self.previous_repo_keys.contains(&old_key) {
            self.previous_repo_keys.push(old_key);
        }
    }

    /// `repo_origin_url` is the repo record's `origin_url`, not this
    /// metadata's own `origin_url` (which only tracks the remote push
    /// access was last checked against).
    pub fn push_allowed(&self, repo_origin_url: Option<&str>) -> bool {
        repo_origin_url.is_none() || matches!(self.push_access, PushAccess::Unknown | PushAccess::ReadWrite)
    }
}

/// Builds `old_key -> current_key` from every metadata file's
/// `previous_repo_keys`. Rejects a dataset where one previous key maps to
/// more than one distinct current key.
pub fn build_repo_move_index(
    metas: &[RepoMetadata],
) -> Result<std::collections::HashMap<RepoKey, RepoKey>, crate::error::Error> {
    let mut index: std::collections::HashMap<RepoKey, RepoKey> = std::collections::HashMap::new();
    for meta in metas {
        for prev in &meta.previous_repo_keys {
            match index.get(prev) {
                Some(existing) if existing != &meta.repo_key => {
                    return Err(crate::error::Error::new(
                        crate::error::ErrorCode::Internal,
                        format!(
                            "repo key '{prev}' maps to both '{existing}' and '{}'",
                            meta.repo_key
                        ),
                    ));
                }
                _ => {
                    index.insert(prev.clone(), meta.repo_key.clone());
                }
            }
        }
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rename_appends_previous_key_once() {
        let mut meta = RepoMetadata::new("software/api", "api");
        meta.rename_to("references/api");
        assert_eq!(meta.repo_key, "references/api");
        assert_eq!(meta.previous_repo_keys, vec!["software/api".to_string()]);
    }

    #[test]
    fn move_index_rejects_conflicting_mapping() {
        let mut a = RepoMetadata::new("current-a", "a");
        a.previous_repo_keys.push("old".into());
        let mut b = RepoMetadata::new("current-b", "b");
        b.previous_repo_keys.push("old".into());
        assert!(build_repo_move_index(&[a, b]).is_err());
    }

    #[test]
    fn move_index_accumulates_distinct_keys() {
        let mut a = RepoMetadata::new("current-a", "a");
        a.previous_repo_keys.push("old-a".into());
        let mut b = RepoMetadata::new("current-b", "b");
        b.previous_repo_keys.push("old-b".into());
        let index = build_repo_move_index(&[a, b]).unwrap();
        assert_eq!(index.get("old-a"), Some(&"current-a".to_string()));
        assert_eq!(index.get("old-b"), Some(&"current-b".to_string()));
    }
}
