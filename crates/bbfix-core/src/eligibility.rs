//! Pure eligibility rules: `(RepoRecord, RepoMetadata, RiskSnapshot,
//! interactive) -> ordered eligible actions`. No I/O.

use bbfix_api::{Action, AutoPush, RepoMetadata, RepoRecord, RiskSnapshot};

/// Evaluates every rule in order and returns the eligible subset, in the
/// canonical order defined by [`Action::ALL`].
pub fn evaluate(
    repo: &RepoRecord,
    metadata: &RepoMetadata,
    risk: &RiskSnapshot,
    interactive: bool,
) -> Vec<Action> {
    if repo.operation_in_progress.is_active() {
        return vec![Action::AbortOperation];
    }

    let mut eligible = std::collections::HashSet::new();
    let push_allowed = metadata.push_allowed(repo.origin_url.as_deref());
    let origin_ok = repo.origin_url.is_none() || push_allowed;
    let dirty = repo.has_dirty_tracked || repo.has_untracked;

    if repo.origin_url.is_none() {
        eligible.insert(Action::CreateProject);
    }
    if repo.origin_url.is_some() && repo.upstream.is_some() && repo.ahead > 0 && !repo.diverged && push_allowed {
        eligible.insert(Action::Push);
    }
    if dirty
        && !repo.diverged
        && origin_ok
        && !risk.has_secret_like()
        && !(risk.has_noisy_without_gitignore() && !interactive)
    {
        eligible.insert(Action::StageCommitPush);
    }
    if repo.upstream.is_some()
        && repo.behind > 0
        && repo.ahead == 0
        && !repo.diverged
        && !repo.has_dirty_tracked
        && !repo.has_untracked
    {
        eligible.insert(Action::PullFfOnly);
    }
    if repo.origin_url.is_some()
        && repo.upstream.is_none()
        && repo.branch.as_deref().is_some_and(|b| !b.is_empty())
        && !repo.diverged
        && push_allowed
    {
        eligible.insert(Action::SetUpstreamPush);
    }
    if repo.origin_url.is_some() && !push_allowed && !repo.repo_key.is_empty() {
        eligible.insert(Action::ForkAndRetarget);
    }
    if metadata.auto_push == AutoPush::Disabled && !repo.repo_key.is_empty() && push_allowed {
        eligible.insert(Action::EnableAutoPush);
    }
    if repo.is_catalog_mismatch() {
        eligible.insert(Action::MoveToCatalog);
    }

    // The actions below have no counterpart in the literal ordered rule
    // list; their conditions are inferred so the Apply Pipeline's
    // re-validation step (which always re-runs `evaluate`) can accept them
    // when offered from the interactive session's manual action picker.
    if dirty {
        eligible.insert(Action::Stash);
    }
    if repo.upstream.is_some() && (repo.diverged || repo.behind > 0) && !dirty {
        eligible.insert(Action::SyncWithUpstream);
    }
    if dirty && (repo.diverged || repo.behind > 0) && repo.upstream.is_some() && origin_ok {
        eligible.insert(Action::CheckpointThenSync);
    }
    if dirty && repo.origin_url.is_some() && push_allowed && !risk.has_secret_like() {
        eligible.insert(Action::PublishNewBranch);
    }
    if repo.head_sha.is_none() && repo.origin_url.is_some() {
        eligible.insert(Action::Clone);
    }
    // Session-local; the interactive session never forwards it to the Apply
    // Pipeline, but it is always offerable.
    eligible.insert(Action::Ignore);

    Action::ALL
        .into_iter()
        .filter(|a| eligible.contains(a))
        .collect()
}

/// Human-readable reason `action` is blocked, populated only for policy
/// blocks on `stage-commit-push`.
pub fn ineligible_reason(action: Action, risk: &RiskSnapshot, interactive: bool) -> Option<String> {
    if action != Action::StageCommitPush {
        return None;
    }
    if risk.has_secret_like() {
        return Some(format!(
            "blocked: secret-like files changed: {}",
            risk.secret_like_changed_paths.join(", ")
        ));
    }
    if risk.has_noisy_without_gitignore() && !interactive {
        return Some(format!(
            "blocked: noisy paths changed without a matching .gitignore entry: {}",
            risk.noisy_changed_paths.join(", ")
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use bbfix_api::{OperationInProgress, PushAccess};

    fn base_repo() -> RepoRecord {
        RepoRecord {
            repo_key: "software/api".into(),
            name: "api".into(),
            catalog: "software".into(),
            path: "/tmp/api".into(),
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
            state_hash: "h".into(),
        }
    }

    fn base_metadata() -> RepoMetadata {
        let mut m = RepoMetadata::new("software/api", "api");
        m.push_access = PushAccess::ReadWrite;
        m
    }

    #[test]
    fn operation_in_progress_excludes_everything_else() {
        let mut repo = base_repo();
        repo.operation_in_progress = OperationInProgress::Rebase;
        let eligible = evaluate(&repo, &base_metadata(), &RiskSnapshot::default(), false);
        assert_eq!(eligible, vec![Action::AbortOperation]);
    }

    #[test]
    fn ahead_only_offers_push_not_stage_commit_push() {
        let mut repo = base_repo();
        repo.ahead = 1;
        let eligible = evaluate(&repo, &base_metadata(), &RiskSnapshot::default(), false);
        assert!(eligible.contains(&Action::Push));
        assert!(!eligible.contains(&Action::StageCommitPush));
    }

    #[test]
    fn secret_like_blocks_stage_commit_push_in_every_mode() {
        let mut repo = base_repo();
        repo.has_dirty_tracked = true;
        let mut risk = RiskSnapshot::default();
        risk.secret_like_changed_paths.push(".env".into());
        assert!(!evaluate(&repo, &base_metadata(), &risk, false).contains(&Action::StageCommitPush));
        assert!(!evaluate(&repo, &base_metadata(), &risk, true).contains(&Action::StageCommitPush));
        assert!(ineligible_reason(Action::StageCommitPush, &risk, false)
            .unwrap()
            .contains(".env"));
    }

    #[test]
    fn noisy_without_gitignore_blocks_only_non_interactive() {
        let mut repo = base_repo();
        repo.has_untracked = true;
        let mut risk = RiskSnapshot::default();
        risk.noisy_changed_paths.push("node_modules/a".into());
        risk.missing_gitignore_patterns.push("node_modules/".into());
        assert!(!evaluate(&repo, &base_metadata(), &risk, false).contains(&Action::StageCommitPush));
        assert!(evaluate(&repo, &base_metadata(), &risk, true).contains(&Action::StageCommitPush));
    }

    #[test]
    fn behind_only_offers_pull_ff_only() {
        let mut repo = base_repo();
        repo.behind = 3;
        let eligible = evaluate(&repo, &base_metadata(), &RiskSnapshot::default(), false);
        assert!(eligible.contains(&Action::PullFfOnly));
    }

    #[test]
    fn read_only_push_access_offers_fork_and_retarget_not_push() {
        let mut repo = base_repo();
        repo.ahead = 1;
        let mut metadata = base_metadata();
        metadata.push_access = PushAccess::ReadOnly;
        let eligible = evaluate(&repo, &metadata, &RiskSnapshot::default(), false);
        assert!(eligible.contains(&Action::ForkAndRetarget));
        assert!(!eligible.contains(&Action::Push));
    }

    #[test]
    fn catalog_mismatch_offers_move_to_catalog() {
        let mut repo = base_repo();
        repo.unsyncable_reasons.push(bbfix_api::UnsyncableReason::CatalogMismatch);
        repo.expected_path = Some("/home/x/references/api".into());
        let eligible = evaluate(&repo, &base_metadata(), &RiskSnapshot::default(), false);
        assert!(eligible.contains(&Action::MoveToCatalog));
    }

    #[test]
    fn disabled_auto_push_with_access_offers_enable_auto_push() {
        let repo = base_repo();
        let eligible = evaluate(&repo, &base_metadata(), &RiskSnapshot::default(), false);
        assert!(eligible.contains(&Action::EnableAutoPush));
    }
}
