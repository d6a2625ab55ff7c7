//! Risk snapshot: the on-demand, never-persisted view of what a `git status`
//! and `git diff` pair would disturb.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Modified,
    Added,
    Deleted,
    Renamed,
    Untracked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangedFile {
    pub path: String,
    pub status: FileStatus,
    pub added_lines: u64,
    pub removed_lines: u64,
}

/// Fixed classification tables, shared by the collector and its tests.
pub const SECRET_LIKE_BASENAMES: &[&str] = &["id_rsa", "id_dsa", "id_ecdsa", "id_ed25519", ".env"];
pub const SECRET_LIKE_EXTENSIONS: &[&str] =
    &["pem", "key", "p12", "pfx", "jks", "keystore"];
pub const NOISY_PATH_SEGMENTS: &[&str] = &[
    "node_modules",
    ".venv",
    "venv",
    "dist",
    "build",
    "target",
    "coverage",
    ".next",
    ".turbo",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskSnapshot {
    pub changed_files: Vec<ChangedFile>,
    pub secret_like_changed_paths: Vec<String>,
    pub noisy_changed_paths: Vec<String>,
    pub missing_root_gitignore: bool,
    pub suggested_gitignore_patterns: Vec<String>,
    pub missing_gitignore_patterns: Vec<String>,
}

impl RiskSnapshot {
    pub fn has_secret_like(&self) -> bool {
        !self.secret_like_changed_paths.is_empty()
    }

    pub fn has_noisy_without_gitignore(&self) -> bool {
        !self.noisy_changed_paths.is_empty() && !self.missing_gitignore_patterns.is_empty()
    }
}

/// True if `basename` (not the full path) looks like a credential file.
pub fn is_secret_like_basename(basename: &str) -> bool {
    if SECRET_LIKE_BASENAMES.contains(&basename) {
        return true;
    }
    match basename.rsplit_once('.') {
        Some((_, ext)) => SECRET_LIKE_EXTENSIONS.contains(&ext),
        None => false,
    }
}

/// True if any path segment matches a well-known generated/vendored directory.
pub fn noisy_segment(path: &str) -> Option<&'static str> {
    path.split('/')
        .find_map(|seg| NOISY_PATH_SEGMENTS.iter().find(|n| **n == seg).copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotenv_is_secret_like() {
        assert!(is_secret_like_basename(".env"));
        assert!(is_secret_like_basename("id_ed25519"));
        assert!(is_secret_like_basename("prod.pem"));
        assert!(!is_secret_like_basename("main.rs"));
    }

    #[test]
    fn noisy_segment_matches_any_path_component() {
        assert_eq!(noisy_segment("app/node_modules/lib/index.js"), Some("node_modules"));
        assert_eq!(noisy_segment("src/main.rs"), None);
    }

    #[test]
    fn secret_like_blocks_regardless_of_mode() {
        let mut risk = RiskSnapshot::default();
        risk.secret_like_changed_paths.push(".env".into());
        assert!(risk.has_secret_like());
    }
}
