//! The aggregate shape handed back by the (out-of-scope) catalog scanner.

use crate::repo::RepoRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogInfo {
    pub name: String,
    pub root: PathBuf,
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineSnapshot {
    pub machine_id: String,
    pub generated_at: DateTime<Utc>,
    pub catalogs: Vec<CatalogInfo>,
    pub repos: Vec<RepoRecord>,
}

impl MachineSnapshot {
    pub fn default_catalog(&self) -> Option<&CatalogInfo> {
        self.catalogs.iter().find(|c| c.is_default)
    }

    pub fn repo_by_key(&self, key: &str) -> Option<&RepoRecord> {
        self.repos.iter().find(|r| r.repo_key == key)
    }

    /// Replaces one repo record in place, matched by `repo_key`. Used after
    /// a targeted revalidation refresh.
    pub fn replace_repo(&mut self, updated: RepoRecord) {
        if let Some(existing) = self.repos.iter_mut().find(|r| r.repo_key == updated.repo_key) {
            *existing = updated;
        } else {
            self.repos.push(updated);
        }
    }
}
