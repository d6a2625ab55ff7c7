//! Plan Builder: deterministic, per-action scripts of [`PlanEntry`] rows.

use bbfix_api::config::{RepoVisibility, SyncStrategy};
use bbfix_api::{Action, PlanEntry, RepoMetadata, RepoRecord};

/// User-supplied knobs the builder needs for actions that aren't fully
/// determined by the repo/metadata alone.
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    pub commit_message: Option<String>,
    pub sync_strategy: SyncStrategy,
    pub new_branch_name: Option<String>,
    pub visibility: RepoVisibility,
    pub generate_gitignore: bool,
    pub return_to_origin_branch: bool,
    pub fork_owner: Option<String>,
    pub auto_generate_commit_message: bool,
}

pub struct PlanContext<'a> {
    pub repo: &'a RepoRecord,
    pub metadata: &'a RepoMetadata,
    pub options: &'a PlanOptions,
    pub fetch_prune_enabled: bool,
}

fn id(action: Action, seq: u32, verb: &str) -> String {
    format!("{}.{seq}.{verb}", action.slug())
}

fn remote(ctx: &PlanContext) -> String {
    ctx.metadata
        .preferred_remote
        .clone()
        .unwrap_or_else(|| "origin".to_string())
}

fn branch(ctx: &PlanContext) -> String {
    ctx.repo.branch.clone().unwrap_or_else(|| "main".to_string())
}

fn staging_steps(action: Action, ctx: &PlanContext, entries: &mut Vec<PlanEntry>, start: u32) -> u32 {
    let mut seq = start;
    if ctx.options.generate_gitignore {
        entries.push(PlanEntry::note(
            id(action, seq, "gitignore"),
            "append suggested patterns to .gitignore",
        ));
        seq += 1;
    }
    entries.push(PlanEntry::command(id(action, seq, "add"), "git add -A"));
    seq += 1;
    if ctx.options.auto_generate_commit_message {
        entries.push(PlanEntry::note(
            id(action, seq, "generate-message"),
            "generate commit message from staged diff",
        ));
        seq += 1;
    }
    let message = ctx
        .options
        .commit_message
        .clone()
        .unwrap_or_else(|| "checkpoint".to_string());
    entries.push(PlanEntry::command(
        id(action, seq, "commit"),
        format!("git commit -m \"{message}\""),
    ));
    seq + 1
}

fn sync_steps(action: Action, ctx: &PlanContext, entries: &mut Vec<PlanEntry>, start: u32) -> u32 {
    let mut seq = start;
    let remote = remote(ctx);
    if ctx.fetch_prune_enabled {
        entries.push(PlanEntry::command(
            id(action, seq, "fetch"),
            format!("git fetch --prune {remote}"),
        ));
    } else {
        entries.push(PlanEntry::note(
            id(action, seq, "fetch-skip"),
            "fetch --prune disabled by config, skipping",
        ));
    }
    seq += 1;
    let upstream = ctx.repo.upstream.clone().unwrap_or_else(|| format!("{remote}/{}", branch(ctx)));
    let verb = match ctx.options.sync_strategy {
        SyncStrategy::Rebase => format!("git rebase {upstream}"),
        SyncStrategy::Merge => format!("git merge --no-edit {upstream}"),
    };
    entries.push(PlanEntry::command(id(action, seq, "sync"), verb));
    seq + 1
}

/// Builds the deterministic plan for `action`. Every plan ends with a
/// non-command `revalidate-state` entry so the UI can show the post-apply
/// recheck as a discrete step.
pub fn build_plan(action: Action, ctx: &PlanContext) -> Vec<PlanEntry> {
    let mut entries = Vec::new();
    let remote_name = remote(ctx);
    let branch_name = branch(ctx);

    match action {
        Action::AbortOperation => {
            if let Some(verb) = ctx.repo.operation_in_progress.abort_verb() {
                entries.push(PlanEntry::command(
                    id(action, 1, "abort"),
                    format!("git {verb} --abort"),
                ));
            } else {
                entries.push(PlanEntry::note(id(action, 1, "noop"), "no operation in progress"));
            }
        }
        Action::Clone => {
            entries.push(PlanEntry::command(
                id(action, 1, "clone"),
                format!(
                    "git clone {} {}",
                    ctx.repo.origin_url.as_deref().unwrap_or(""),
                    ctx.repo.path
                ),
            ));
            entries.push(PlanEntry::note(id(action, 2, "refresh"), "refresh repo metadata"));
        }
        Action::Stash => {
            entries.push(PlanEntry::command(
                id(action, 1, "stash"),
                "git stash push --include-untracked",
            ));
        }
        Action::PullFfOnly => {
            let mut seq = 1;
            if ctx.fetch_prune_enabled {
                entries.push(PlanEntry::command(
                    id(action, seq, "fetch"),
                    format!("git fetch --prune {remote_name}"),
                ));
            } else {
                entries.push(PlanEntry::note(
                    id(action, seq, "fetch-skip"),
                    "fetch --prune disabled by config, skipping",
                ));
            }
            seq += 1;
            entries.push(PlanEntry::command(id(action, seq, "pull"), "git pull --ff-only"));
        }
        Action::SyncWithUpstream => {
            sync_steps(action, ctx, &mut entries, 1);
        }
        Action::StageCommitPush => {
            let next = staging_steps(action, ctx, &mut entries, 1);
            match (&ctx.repo.origin_url, &ctx.repo.upstream) {
                (None, _) => entries.push(PlanEntry::note(
                    id(action, next, "no-origin"),
                    "no origin configured, skipping push",
                )),
                (Some(_), None) => entries.push(PlanEntry::command(
                    id(action, next, "push-u"),
                    format!("git push -u {remote_name} {branch_name}"),
                )),
                (Some(_), Some(_)) => {
                    entries.push(PlanEntry::command(id(action, next, "push"), "git push"))
                }
            }
        }
        Action::PublishNewBranch => {
            let new_branch = ctx.options.new_branch_name.clone().unwrap_or_else(|| format!("{branch_name}-fix"));
            entries.push(PlanEntry::command(
                id(action, 1, "checkout"),
                format!("git checkout -b {new_branch}"),
            ));
            let next = staging_steps(action, ctx, &mut entries, 2);
            entries.push(PlanEntry::command(
                id(action, next, "push-u"),
                format!("git push -u {remote_name} {new_branch}"),
            ));
            if ctx.options.return_to_origin_branch {
                entries.push(PlanEntry::command(
                    id(action, next + 1, "checkout-back"),
                    format!("git checkout {branch_name}"),
                ));
                entries.push(PlanEntry::command(
                    id(action, next + 2, "pull"),
                    "git pull --ff-only",
                ));
            }
        }
        Action::CheckpointThenSync => {
            let next = staging_steps(action, ctx, &mut entries, 1);
            let next = sync_steps(action, ctx, &mut entries, next);
            entries.push(PlanEntry::command(id(action, next, "push"), "git push"));
        }
        Action::CreateProject => {
            let owner = ctx.metadata.preferred_remote.clone();
            let visibility_flag = match ctx.options.visibility {
                RepoVisibility::Private => "--private",
                RepoVisibility::Public => "--public",
            };
            entries.push(PlanEntry::command(
                id(action, 1, "gh-create"),
                format!(
                    "gh repo create {}/{} {visibility_flag}",
                    owner.as_deref().unwrap_or("<owner>"),
                    ctx.repo.name
                ),
            ));
            entries.push(PlanEntry::command(
                id(action, 2, "remote-add"),
                "git remote add origin <created-url>",
            ));
            entries.push(PlanEntry::note(id(action, 3, "metadata"), "record origin in metadata"));
            if ctx.repo.has_dirty_tracked || ctx.repo.has_untracked {
                staging_steps(action, ctx, &mut entries, 4);
            }
            entries.push(PlanEntry::command(
                id(action, 9, "push-u"),
                format!("git push -u origin {branch_name}"),
            ));
        }
        Action::ForkAndRetarget => {
            let owner = ctx.options.fork_owner.clone().unwrap_or_else(|| "<owner>".to_string());
            let src = ctx
                .repo
                .origin_url
                .clone()
                .unwrap_or_else(|| "<invalid origin>".to_string());
            entries.push(PlanEntry::command(
                id(action, 1, "gh-fork"),
                format!("gh repo fork {src} --remote=false --clone=false"),
            ));
            entries.push(PlanEntry::command(
                id(action, 2, "remote-add-fork"),
                format!("git remote add {owner} <fork-url>"),
            ));
            entries.push(PlanEntry::note(id(action, 3, "metadata-reset"), "reset push access in metadata"));
            if let Some(new_branch) = &ctx.options.new_branch_name {
                entries.push(PlanEntry::command(
                    id(action, 4, "checkout"),
                    format!("git checkout -b {new_branch}"),
                ));
            }
            entries.push(PlanEntry::command(
                id(action, 5, "push-force"),
                format!("git push -u --force {owner} {branch_name}"),
            ));
            entries.push(PlanEntry::note(id(action, 6, "metadata-refresh"), "refresh push access after push"));
        }
        Action::SetUpstreamPush => {
            entries.push(PlanEntry::command(
                id(action, 1, "push-u"),
                format!("git push -u {remote_name} {branch_name}"),
            ));
        }
        Action::Push => {
            entries.push(PlanEntry::command(id(action, 1, "push"), "git push"));
        }
        Action::EnableAutoPush => {
            entries.push(PlanEntry::note(
                id(action, 1, "set-auto-push"),
                "set AutoPush = include-default-branch",
            ));
        }
        Action::MoveToCatalog => {
            entries.push(PlanEntry::note(
                id(action, 1, "move"),
                format!(
                    "move {} to {}",
                    ctx.repo.path,
                    ctx.repo.expected_path.as_deref().unwrap_or("<expected path>")
                ),
            ));
            entries.push(PlanEntry::note(id(action, 2, "rekey"), "update repo key and metadata"));
        }
        Action::Ignore => {
            entries.push(PlanEntry::note(id(action, 1, "ignore"), "hide from this session"));
            return entries;
        }
    }

    entries.push(PlanEntry::note("revalidate-state", "revalidate repository state"));
    bbfix_api::plan::assert_unique_ids(&entries);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use bbfix_api::OperationInProgress;

    fn repo() -> RepoRecord {
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
            ahead: 1,
            behind: 0,
            diverged: false,
            operation_in_progress: OperationInProgress::None,
            syncable: false,
            unsyncable_reasons: Vec::new(),
            expected_repo_key: None,
            expected_catalog: None,
            expected_path: None,
            state_hash: "h".into(),
        }
    }

    #[test]
    fn push_plan_has_exactly_one_command_plus_revalidate() {
        let repo = repo();
        let metadata = RepoMetadata::new("software/api", "api");
        let options = PlanOptions::default();
        let ctx = PlanContext {
            repo: &repo,
            metadata: &metadata,
            options: &options,
            fetch_prune_enabled: true,
        };
        let plan = build_plan(Action::Push, &ctx);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].summary, "git push");
        assert_eq!(plan[1].id, "revalidate-state");
    }

    #[test]
    fn plan_is_deterministic() {
        let repo = repo();
        let metadata = RepoMetadata::new("software/api", "api");
        let options = PlanOptions::default();
        let ctx = PlanContext {
            repo: &repo,
            metadata: &metadata,
            options: &options,
            fetch_prune_enabled: true,
        };
        assert_eq!(build_plan(Action::Push, &ctx), build_plan(Action::Push, &ctx));
    }

    #[test]
    fn abort_operation_names_exact_verb() {
        let mut repo = repo();
        repo.operation_in_progress = OperationInProgress::Rebase;
        let metadata = RepoMetadata::new("software/api", "api");
        let options = PlanOptions::default();
        let ctx = PlanContext {
            repo: &repo,
            metadata: &metadata,
            options: &options,
            fetch_prune_enabled: true,
        };
        let plan = build_plan(Action::AbortOperation, &ctx);
        assert_eq!(plan[0].summary, "git rebase --abort");
    }

    #[test]
    fn fork_and_retarget_plan_contains_force_push() {
        let repo = repo();
        let metadata = RepoMetadata::new("software/api", "api");
        let mut options = PlanOptions::default();
        options.fork_owner = Some("me".into());
        let ctx = PlanContext {
            repo: &repo,
            metadata: &metadata,
            options: &options,
            fetch_prune_enabled: true,
        };
        let plan = build_plan(Action::ForkAndRetarget, &ctx);
        assert!(plan.iter().any(|e| e.summary.contains("--force")));
    }
}
