//! Selector resolution: path / repo-key / name -> a unique [`RepoRecord`].

use bbfix_api::{Error, RepoRecord};
use std::path::Path;

fn normalize_path(p: &str) -> String {
    Path::new(p)
        .canonicalize()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| p.trim_end_matches('/').to_string())
}

/// Resolves `selector` against `repos` by, in order: exact normalized path,
/// case-insensitive repo key, exact name. Returns [`Error::Ambiguous`] the
/// first time a stage produces more than one match, and [`Error::NotFound`]
/// if no stage matches.
pub fn resolve<'a>(selector: &str, repos: &'a [RepoRecord]) -> Result<&'a RepoRecord, Error> {
    let normalized_selector = normalize_path(selector);
    let path_matches: Vec<&RepoRecord> = repos
        .iter()
        .filter(|r| normalize_path(&r.path) == normalized_selector)
        .collect();
    if path_matches.len() == 1 {
        return Ok(path_matches[0]);
    }
    if path_matches.len() > 1 {
        return Err(ambiguous(selector, &path_matches));
    }

    let key_matches: Vec<&RepoRecord> = repos
        .iter()
        .filter(|r| r.repo_key.eq_ignore_ascii_case(selector))
        .collect();
    if key_matches.len() == 1 {
        return Ok(key_matches[0]);
    }
    if key_matches.len() > 1 {
        return Err(ambiguous(selector, &key_matches));
    }

    let name_matches: Vec<&RepoRecord> = repos.iter().filter(|r| r.name == selector).collect();
    match name_matches.len() {
        1 => Ok(name_matches[0]),
        0 => Err(Error::not_found(format!("no repository matches '{selector}'"))),
        _ => Err(ambiguous(selector, &name_matches)),
    }
}

fn ambiguous(selector: &str, matches: &[&RepoRecord]) -> Error {
    Error::ambiguous(
        format!("'{selector}' matches more than one repository"),
        matches.iter().map(|r| r.path.clone()).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bbfix_api::OperationInProgress;

    fn repo(name: &str, key: &str, path: &str) -> RepoRecord {
        RepoRecord {
            repo_key: key.into(),
            name: name.into(),
            catalog: "software".into(),
            path: path.into(),
            origin_url: None,
            branch: None,
            upstream: None,
            head_sha: None,
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
            state_hash: "h".into(),
        }
    }

    #[test]
    fn resolves_unique_name() {
        let repos = vec![repo("api", "software/api", "/a"), repo("web", "software/web", "/b")];
        let found = resolve("api", &repos).unwrap();
        assert_eq!(found.repo_key, "software/api");
    }

    #[test]
    fn ambiguous_name_lists_both_paths() {
        let repos = vec![repo("api", "a/api", "/a"), repo("api", "b/api", "/b")];
        let err = resolve("api", &repos).unwrap_err();
        assert_eq!(err.code, bbfix_api::ErrorCode::Ambiguous);
    }

    #[test]
    fn repo_key_match_is_case_insensitive() {
        let repos = vec![repo("api", "Software/Api", "/a")];
        assert!(resolve("software/api", &repos).is_ok());
    }

    #[test]
    fn order_independent() {
        let a = repo("api", "a/api", "/a");
        let b = repo("web", "b/web", "/b");
        let forward = vec![a.clone(), b.clone()];
        let backward = vec![b, a];
        assert_eq!(resolve("api", &forward).unwrap().repo_key, resolve("api", &backward).unwrap().repo_key);
    }
}
