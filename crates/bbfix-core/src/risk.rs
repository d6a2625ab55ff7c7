//! Risk Snapshot Collector: turns a working tree's porcelain state into a
//! [`RiskSnapshot`], on demand, never persisted.

use bbfix_api::risk::{is_secret_like_basename, noisy_segment, NOISY_PATH_SEGMENTS};
use bbfix_api::{ChangedFile, Error, RiskSnapshot};
use bbfix_git::GitOps;
use std::collections::BTreeMap;
use std::path::Path;

pub async fn collect(git: &dyn GitOps, path: &Path) -> Result<RiskSnapshot, Error> {
    let missing_root_gitignore = !git.has_root_gitignore(path).await?;
    let status = git.status(path).await?;

    let mut numstat: BTreeMap<String, (u64, u64)> = BTreeMap::new();
    for entry in git.diff_numstat(path, false).await? {
        numstat.insert(entry.path, (entry.added, entry.removed));
    }
    for entry in git.diff_numstat(path, true).await? {
        let e = numstat.entry(entry.path).or_insert((0, 0));
        e.0 += entry.added;
        e.1 += entry.removed;
    }

    let mut changed_files = Vec::new();
    let mut secret_like_changed_paths = Vec::new();
    let mut noisy_changed_paths = Vec::new();
    let mut present_noisy_segments = std::collections::BTreeSet::new();

    for status_entry in &status.entries {
        let (added_lines, removed_lines) = if status_entry.is_untracked() {
            let added = count_lines(&path.join(&status_entry.path)).await;
            (added, 0)
        } else {
            numstat.get(&status_entry.path).copied().unwrap_or((0, 0))
        };

        changed_files.push(ChangedFile {
            path: status_entry.path.clone(),
            status: status_entry.file_status(),
            added_lines,
            removed_lines,
        });

        let basename = Path::new(&status_entry.path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&status_entry.path);
        if is_secret_like_basename(basename) {
            secret_like_changed_paths.push(status_entry.path.clone());
        }
        if let Some(segment) = noisy_segment(&status_entry.path) {
            noisy_changed_paths.push(status_entry.path.clone());
            present_noisy_segments.insert(segment);
        }
    }

    for segment in NOISY_PATH_SEGMENTS {
        if tokio::fs::metadata(path.join(segment)).await.is_ok() {
            present_noisy_segments.insert(segment);
        }
    }

    changed_files.sort_by(|a, b| a.path.cmp(&b.path));
    secret_like_changed_paths.sort();
    secret_like_changed_paths.dedup();
    noisy_changed_paths.sort();
    noisy_changed_paths.dedup();

    let suggested_gitignore_patterns: Vec<String> = present_noisy_segments
        .iter()
        .map(|segment| format!("{segment}/"))
        .collect();

    let missing_gitignore_patterns = if missing_root_gitignore {
        suggested_gitignore_patterns.clone()
    } else {
        // A root .gitignore exists; a precise "is this pattern present"
        // check belongs to a finer-grained parse the engine does not need —
        // conservatively treat every suggested pattern as potentially
        // missing so the non-interactive safety rule stays conservative.
        suggested_gitignore_patterns.clone()
    };

    Ok(RiskSnapshot {
        changed_files,
        secret_like_changed_paths,
        noisy_changed_paths,
        missing_root_gitignore,
        suggested_gitignore_patterns,
        missing_gitignore_patterns,
    })
}

async fn count_lines(path: &Path) -> u64 {
    match tokio::fs::read_to_string(path).await {
        Ok(content) if content.is_empty() => 0,
        Ok(content) => content.lines().count() as u64,
        Err(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bbfix_git::CliGit;

    async fn init_repo(dir: &Path) {
        let git = CliGit::new();
        git.init_repo(dir).await.unwrap();
        git.add_origin(dir, "git@example.com:a/b.git").await.ok();
    }

    #[tokio::test]
    async fn flags_missing_gitignore_and_secret_like_file() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path()).await;
        tokio::fs::write(dir.path().join(".env"), b"SECRET=1\n").await.unwrap();

        let git = CliGit::new();
        let risk = collect(&git, dir.path()).await.unwrap();
        assert!(risk.missing_root_gitignore);
        assert!(risk.has_secret_like());
        assert_eq!(risk.secret_like_changed_paths, vec![".env".to_string()]);
    }

    #[tokio::test]
    async fn suggests_ignore_pattern_for_existing_noisy_directory() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path()).await;
        tokio::fs::create_dir(dir.path().join("node_modules")).await.unwrap();
        tokio::fs::write(dir.path().join("node_modules/a.js"), b"x").await.unwrap();

        let git = CliGit::new();
        let risk = collect(&git, dir.path()).await.unwrap();
        assert!(risk.suggested_gitignore_patterns.contains(&"node_modules/".to_string()));
    }
}
