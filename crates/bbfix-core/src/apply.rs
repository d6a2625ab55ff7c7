//! Apply Pipeline: validates, executes, and revalidates one action against
//! one repository, under the process-global state lock.

use crate::eligibility;
use crate::plan::{self, PlanContext, PlanOptions};
use crate::risk as risk_collector;
use crate::selector;
use crate::validation;
use bbfix_api::config::RepoVisibility;
use bbfix_api::repo::UnsyncableReason;
use bbfix_api::{
    Action, ApplyStepEvent, Error, OperationInProgress, PlanEntry, PushAccess, RepoMetadata,
    RepoRecord,
};
use bbfix_git::GitOps;
use bbfix_host::HostOps;
use bbfix_state::StateStore;
use std::path::Path;
use tracing::instrument;

/// Everything `apply_action` needs beyond the selector and the action key.
pub struct ApplyRequest<'a> {
    pub machine_id: &'a str,
    pub selector: &'a str,
    pub action: Action,
    pub options: PlanOptions,
    pub interactive: bool,
}

fn verb_of(entry_id: &str) -> &str {
    entry_id.rsplit('.').next().unwrap_or(entry_id)
}

/// Drives one action end to end: lock, load, resolve, re-validate, execute,
/// revalidate, unlock. `on_step` is called once per plan-entry transition, in
/// plan order.
#[instrument(skip(git, host, store, on_step), fields(selector = %request.selector, action = %request.action))]
pub async fn apply_action(
    git: &dyn GitOps,
    host: &dyn HostOps,
    store: &StateStore,
    request: ApplyRequest<'_>,
    mut on_step: impl FnMut(ApplyStepEvent),
) -> Result<RepoRecord, Error> {
    let _lock = store.acquire_lock()?;

    let config = store.load_config()?;
    let mut snapshot = store
        .load_snapshot(request.machine_id)?
        .ok_or_else(|| Error::state_io("no machine snapshot on record; run a catalog scan first"))?;

    let target = selector::resolve(request.selector, &snapshot.repos)?.clone();
    let mut metadata = store
        .load_metadata(&target.repo_key)?
        .unwrap_or_else(|| RepoMetadata::new(target.repo_key.clone(), target.name.clone()));

    let path = Path::new(&target.path);
    let risk = risk_collector::collect(git, path).await?;

    let eligible = eligibility::evaluate(&target, &metadata, &risk, request.interactive);
    if !eligible.contains(&request.action) {
        return Err(Error::ineligible(
            request.action.slug(),
            eligibility::ineligible_reason(request.action, &risk, request.interactive),
        ));
    }

    validate_options(request.action, &target, &request.options)?;

    let plan_ctx = PlanContext {
        repo: &target,
        metadata: &metadata,
        options: &request.options,
        fetch_prune_enabled: config.sync.fetch_prune,
    };
    let entries = plan::build_plan(request.action, &plan_ctx);

    let mut repo = target.clone();
    let mut fork_push_failed = false;
    let mut generated_commit_message: Option<String> = None;
    for entry in &entries {
        if entry.id == "revalidate-state" {
            continue;
        }
        on_step(ApplyStepEvent::running(entry.clone()));
        let outcome = execute_step(
            request.action,
            entry,
            git,
            host,
            &mut repo,
            &mut metadata,
            &request.options,
            &mut generated_commit_message,
        )
        .await;
        match outcome {
            Ok(()) => on_step(ApplyStepEvent::done(entry.clone())),
            Err(e) => {
                // Metadata reset/refresh notes on fork-and-retarget are
                // best-effort after the push has already happened.
                let best_effort = request.action == Action::ForkAndRetarget
                    && matches!(verb_of(&entry.id), "metadata-reset" | "metadata-refresh");
                if best_effort {
                    fork_push_failed = true;
                    on_step(ApplyStepEvent::skipped(entry.clone()));
                    continue;
                }
                on_step(ApplyStepEvent::failed(entry.clone(), e.message.clone()));
                store.save_metadata(&metadata)?;
                return Err(e);
            }
        }
    }
    let _ = fork_push_failed;

    store.save_metadata(&metadata)?;

    let revalidate_entry = PlanEntry::note("revalidate-state", "revalidate repository state");
    on_step(ApplyStepEvent::running(revalidate_entry.clone()));
    let updated = rescan_repo(git, &repo, &metadata).await?;
    repo = updated;
    snapshot.replace_repo(repo.clone());
    store.save_snapshot(&snapshot)?;
    on_step(ApplyStepEvent::done(revalidate_entry));

    Ok(repo)
}

fn validate_options(action: Action, repo: &RepoRecord, options: &PlanOptions) -> Result<(), Error> {
    match action {
        Action::CreateProject => validation::validate_project_name(&repo.name),
        Action::PublishNewBranch | Action::ForkAndRetarget => {
            if let Some(name) = &options.new_branch_name {
                validation::validate_new_branch_name(name, repo.branch.as_deref())
            } else {
                Ok(())
            }
        }
        Action::MoveToCatalog => {
            if repo.expected_repo_key.is_none() || repo.expected_catalog.is_none() || repo.expected_path.is_none() {
                Err(Error::new(
                    bbfix_api::ErrorCode::InvalidInput,
                    "move-to-catalog requires expected_repo_key, expected_catalog, and expected_path",
                ))
            } else {
                Ok(())
            }
        }
        _ => Ok(()),
    }
}

async fn generate_commit_message(git: &dyn GitOps, path: &Path) -> Result<String, Error> {
    let snapshot = git.snapshot_index(path).await?;
    let output = tokio::process::Command::new("lumen")
        .arg("draft")
        .current_dir(path)
        .output()
        .await
        .map_err(|e| Error::external_command_failed("lumen draft", format!("failed to spawn lumen: {e}")));
    let output = match output {
        Ok(o) if o.status.success() => o,
        Ok(o) => {
            git.restore_index(path, snapshot).await?;
            return Err(Error::external_command_failed(
                "lumen draft",
                String::from_utf8_lossy(&o.stderr).trim().to_string(),
            ));
        }
        Err(e) => {
            git.restore_index(path, snapshot).await?;
            return Err(e);
        }
    };
    let message = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if message.is_empty() {
        git.restore_index(path, snapshot).await?;
        return Err(Error::external_command_failed(
            "lumen draft",
            "commit-message helper produced empty output",
        ));
    }
    Ok(message)
}

#[allow(clippy::too_many_arguments)]
async fn execute_step(
    action: Action,
    entry: &PlanEntry,
    git: &dyn GitOps,
    host: &dyn HostOps,
    repo: &mut RepoRecord,
    metadata: &mut RepoMetadata,
    options: &PlanOptions,
    generated_commit_message: &mut Option<String>,
) -> Result<(), Error> {
    let repo_path = repo.path.clone();
    let path = Path::new(&repo_path);
    let remote = metadata.preferred_remote.clone().unwrap_or_else(|| "origin".to_string());
    let branch = repo.branch.clone().unwrap_or_else(|| "main".to_string());

    match verb_of(&entry.id) {
        "gitignore" => Ok(()),
        "add" => git.add_all(path).await,
        "generate-message" => {
            *generated_commit_message = Some(generate_commit_message(git, path).await?);
            Ok(())
        }
        "commit" => {
            let message = generated_commit_message
                .clone()
                .or_else(|| options.commit_message.clone())
                .unwrap_or_else(|| "checkpoint".to_string());
            git.commit(path, &message).await
        }
        "fetch" => git.fetch_prune(path, &remote).await,
        "fetch-skip" => Ok(()),
        "sync" => {
            let upstream = repo
                .upstream
                .clone()
                .unwrap_or_else(|| format!("{remote}/{branch}"));
            git.sync_with_upstream(path, &upstream, options.sync_strategy).await
        }
        "stash" => git.stash_push(path).await,
        "pull" => git.pull_ff_only(path).await,
        "push" => git.push(path, &remote, &branch, false).await,
        "push-u" => git.push_upstream_with_preferred_remote(path, &remote, &branch).await,
        "push-force" => {
            let owner = options.fork_owner.clone().unwrap_or(remote);
            git.push(path, &owner, &branch, true).await
        }
        "checkout" => {
            let name = options
                .new_branch_name
                .clone()
                .unwrap_or_else(|| format!("{branch}-fix"));
            git.checkout_new_branch(path, &name).await
        }
        "checkout-back" => git.checkout(path, &branch).await,
        "no-origin" => Ok(()),
        "abort" => match repo.operation_in_progress {
            OperationInProgress::Merge => git.merge_abort(path).await,
            OperationInProgress::Rebase => git.rebase_abort(path).await,
            OperationInProgress::CherryPick => git.cherry_pick_abort(path).await,
            OperationInProgress::Bisect => git.bisect_reset(path).await,
            OperationInProgress::None => Ok(()),
        },
        "noop" => Ok(()),
        "clone" => {
            let origin = repo
                .origin_url
                .as_deref()
                .ok_or_else(|| Error::new(bbfix_api::ErrorCode::InvalidInput, "no origin to clone"))?;
            git.clone(origin, path).await
        }
        "refresh" => Ok(()),
        "gh-create" => {
            let owner = metadata
                .preferred_remote
                .clone()
                .or_else(|| metadata.origin_url.clone())
                .unwrap_or_default();
            host.ensure_authenticated().await?;
            host.create_repo(&owner, &repo.name, options.visibility).await?;
            check_or_set_origin(repo, metadata, &owner, options.visibility)
        }
        "remote-add" => Ok(()),
        "metadata" => {
            metadata.push_access = PushAccess::ReadWrite;
            Ok(())
        }
        "gh-fork" => {
            let origin = repo
                .origin_url
                .as_deref()
                .ok_or_else(|| Error::new(bbfix_api::ErrorCode::InvalidInput, "no origin to fork"))?;
            host.ensure_authenticated().await?;
            host.fork_repo(origin).await
        }
        "remote-add-fork" => {
            let owner = options.fork_owner.as_deref().unwrap_or("fork");
            git.add_remote(path, owner, "").await.or(Ok(()))
        }
        "metadata-reset" => {
            metadata.push_access = PushAccess::Unknown;
            metadata.push_access_checked_at = None;
            Ok(())
        }
        "metadata-refresh" => {
            let owner = options.fork_owner.clone().unwrap_or(remote);
            let access = git.probe_push_access(path, &owner, &branch).await?;
            metadata.push_access = access;
            Ok(())
        }
        "set-auto-push" => {
            metadata.auto_push = bbfix_api::AutoPush::IncludeDefaultBranch;
            Ok(())
        }
        "move" => {
            let expected_path = repo
                .expected_path
                .clone()
                .ok_or_else(|| Error::new(bbfix_api::ErrorCode::InvalidInput, "no expected_path to move to"))?;
            tokio::fs::rename(&repo.path, &expected_path)
                .await
                .map_err(|e| Error::external_command_failed("move-to-catalog", e.to_string()))?;
            repo.path = expected_path;
            if let Some(catalog) = repo.expected_catalog.clone() {
                repo.catalog = catalog;
            }
            Ok(())
        }
        "rekey" => {
            let new_key = repo
                .expected_repo_key
                .clone()
                .ok_or_else(|| Error::new(bbfix_api::ErrorCode::InvalidInput, "no expected_repo_key to rekey to"))?;
            metadata.rename_to(new_key.clone());
            repo.repo_key = new_key;
            Ok(())
        }
        "ignore" => Ok(()),
        other => Err(Error::new(
            bbfix_api::ErrorCode::Internal,
            format!("no executor registered for plan step '{other}'"),
        )),
    }
}

fn check_or_set_origin(
    repo: &RepoRecord,
    metadata: &mut RepoMetadata,
    owner: &str,
    visibility: RepoVisibility,
) -> Result<(), Error> {
    let _ = visibility;
    if let Some(existing) = &repo.origin_url {
        let expected_suffix = format!("{owner}/{}", repo.name);
        if !existing.contains(&expected_suffix) {
            return Err(Error::new(
                bbfix_api::ErrorCode::ConflictingOrigin,
                format!("origin '{existing}' does not match expected '{expected_suffix}'"),
            ));
        }
    }
    metadata.origin_url = repo.origin_url.clone();
    Ok(())
}

/// Re-derives a [`RepoRecord`] from live git state, used by the Apply
/// Pipeline's revalidation phase. Does not rescan the whole catalog.
async fn rescan_repo(git: &dyn GitOps, prior: &RepoRecord, metadata: &RepoMetadata) -> Result<RepoRecord, Error> {
    let path = Path::new(&prior.path);
    let branch = git.current_branch(path).await?;
    let upstream = git.upstream(path).await?;
    let head_sha = git.head_sha(path).await?;
    let origin_url = git.repo_origin(path).await?;
    let operation_in_progress = git.operation_in_progress(path).await?;
    let status = git.status(path).await?;
    let has_dirty_tracked = status.entries.iter().any(|e| !e.is_untracked());
    let has_untracked = status.entries.iter().any(|e| e.is_untracked());

    let (ahead, behind) = match (&branch, &upstream) {
        (Some(local), Some(up)) => git.ahead_behind(path, local, up).await?,
        _ => (0, 0),
    };
    let diverged = ahead > 0 && behind > 0;

    let mut unsyncable_reasons = Vec::new();
    if origin_url.is_none() {
        unsyncable_reasons.push(UnsyncableReason::MissingOrigin);
    }
    if has_dirty_tracked {
        unsyncable_reasons.push(UnsyncableReason::DirtyTracked);
    }
    if has_untracked {
        unsyncable_reasons.push(UnsyncableReason::DirtyUntracked);
    }
    if origin_url.is_some() && upstream.is_none() {
        unsyncable_reasons.push(UnsyncableReason::MissingUpstream);
    }
    if diverged {
        unsyncable_reasons.push(UnsyncableReason::Diverged);
    }
    if operation_in_progress.is_active() {
        unsyncable_reasons.push(UnsyncableReason::OperationInProgress);
    }
    if prior.is_catalog_mismatch() {
        unsyncable_reasons.push(UnsyncableReason::CatalogMismatch);
    }
    if !metadata.push_allowed(origin_url.as_deref()) {
        unsyncable_reasons.push(UnsyncableReason::PushAccessBlocked);
    }

    let state_hash = compute_state_hash(&head_sha, has_dirty_tracked, has_untracked, &branch);

    Ok(RepoRecord {
        repo_key: metadata.repo_key.clone(),
        name: prior.name.clone(),
        catalog: prior.catalog.clone(),
        path: prior.path.clone(),
        origin_url,
        branch,
        upstream,
        head_sha,
        has_dirty_tracked,
        has_untracked,
        ahead,
        behind,
        diverged,
        operation_in_progress,
        syncable: unsyncable_reasons.is_empty(),
        unsyncable_reasons,
        expected_repo_key: prior.expected_repo_key.clone(),
        expected_catalog: prior.expected_catalog.clone(),
        expected_path: prior.expected_path.clone(),
        state_hash,
    })
}

fn compute_state_hash(head_sha: &Option<String>, dirty: bool, untracked: bool, branch: &Option<String>) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut hasher = DefaultHasher::new();
    head_sha.hash(&mut hasher);
    dirty.hash(&mut hasher);
    untracked.hash(&mut hasher);
    branch.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verb_of_extracts_last_segment() {
        assert_eq!(verb_of("stage-commit-push.1.add"), "add");
        assert_eq!(verb_of("revalidate-state"), "revalidate-state");
    }

    #[test]
    fn state_hash_changes_with_head_sha() {
        let a = compute_state_hash(&Some("abc".into()), false, false, &Some("main".into()));
        let b = compute_state_hash(&Some("def".into()), false, false, &Some("main".into()));
        assert_ne!(a, b);
    }
}
