//! Thin CLI entry point for `bb fix`.
//!
//! Prints JSON to stdout for machine consumption; diagnostics go to stderr
//! via `tracing`. Exit codes: `0` success and syncable, `1` applied but
//! still unsyncable (or ineligible without an error), `2` an operational
//! error (lock, I/O, bad input, no TTY).

use bbfix_api::{Action, ApplyStepEvent};
use bbfix_core::apply::ApplyRequest;
use bbfix_core::plan::PlanOptions;
use bbfix_git::CliGit;
use bbfix_host::GhCli;
use bbfix_state::StateStore;
use clap::Parser;
use std::io::{IsTerminal, Write};
use std::path::Path;

#[derive(Parser)]
#[command(name = "bb-fix")]
#[command(about = "Remediation engine for the bb multi-repository management tool")]
#[command(version)]
struct Cli {
    /// Selector (path, repo key, or name) of the repository to act on.
    #[arg(long)]
    project: Option<String>,

    /// Action key to apply (see `Action::slug`); never `ignore`.
    #[arg(long)]
    action: Option<String>,

    /// Commit message for actions that stage and commit.
    #[arg(long)]
    commit_message: Option<String>,

    /// Catalogs to include when resolving the selector (currently informational).
    #[arg(long)]
    include_catalogs: Vec<String>,

    /// Skip the machine-snapshot refresh before acting.
    #[arg(long)]
    no_refresh: bool,

    /// Log filter, e.g. "debug" or "bbfix_core=trace".
    #[arg(long)]
    log: Option<String>,

    /// Emit logs as JSON instead of plain text.
    #[arg(long)]
    log_json: bool,
}

fn print_line(out: &mut dyn Write, line: &str) {
    let _ = writeln!(out, "{line}");
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    bbfix_core::telemetry::init_telemetry(cli.log.as_deref(), cli.log_json);

    let exit_code = run(cli).await;
    std::process::exit(exit_code);
}

async fn run(cli: Cli) -> i32 {
    let Some(project) = cli.project.clone() else {
        if !std::io::stdin().is_terminal() {
            print_line(&mut std::io::stderr(), "bb fix: interactive session requires a TTY");
            return 2;
        }
        return match bbfix_tui::run_session().await {
            Ok(()) => 0,
            Err(e) => {
                print_line(&mut std::io::stderr(), &format!("bb fix: {e}"));
                2
            }
        };
    };

    let machine_id = std::env::var("BB_MACHINE_ID").unwrap_or_else(|_| "local".to_string());
    let state_root = bbfix_state::default_state_root();
    let store = match StateStore::open(state_root) {
        Ok(s) => s,
        Err(e) => {
            print_line(&mut std::io::stderr(), &format!("bb fix: {e}"));
            return 2;
        }
    };

    let git = CliGit::new();
    let host = GhCli::new();

    match cli.action.as_deref() {
        None => print_status(&git, &store, &machine_id, &project).await,
        Some("ignore") => {
            print_line(&mut std::io::stderr(), "bb fix: 'ignore' is interactive-only");
            2
        }
        Some(action_slug) => {
            let Some(action) = Action::from_slug(action_slug) else {
                print_line(&mut std::io::stderr(), &format!("bb fix: unknown action '{action_slug}'"));
                return 2;
            };
            apply(&git, &host, &store, &machine_id, &project, action, &cli).await
        }
    }
}

async fn print_status(git: &CliGit, store: &StateStore, machine_id: &str, selector: &str) -> i32 {
    let mut stderr = std::io::stderr();
    let snapshot = match store.load_snapshot(machine_id) {
        Ok(Some(s)) => s,
        Ok(None) => {
            print_line(&mut stderr, "bb fix: no machine snapshot on record; run a catalog scan first");
            return 2;
        }
        Err(e) => {
            print_line(&mut stderr, &format!("bb fix: {e}"));
            return 2;
        }
    };
    let repo = match bbfix_core::resolve(selector, &snapshot.repos) {
        Ok(r) => r.clone(),
        Err(e) => {
            print_line(&mut stderr, &format!("bb fix: {e}"));
            return 2;
        }
    };
    let metadata = match store.load_metadata(&repo.repo_key) {
        Ok(Some(m)) => m,
        Ok(None) => bbfix_api::RepoMetadata::new(repo.repo_key.clone(), repo.name.clone()),
        Err(e) => {
            print_line(&mut stderr, &format!("bb fix: {e}"));
            return 2;
        }
    };
    let risk = match bbfix_core::risk::collect(git, Path::new(&repo.path)).await {
        Ok(r) => r,
        Err(e) => {
            print_line(&mut stderr, &format!("bb fix: {e}"));
            return 2;
        }
    };
    let eligible = bbfix_core::evaluate(&repo, &metadata, &risk, false);

    let output = serde_json::json!({
        "repo_key": repo.repo_key,
        "syncable": repo.syncable,
        "unsyncable_reasons": repo.unsyncable_reasons,
        "eligible_actions": eligible.iter().map(|a| a.slug()).collect::<Vec<_>>(),
    });
    print_line(&mut std::io::stdout(), &output.to_string());

    if repo.syncable {
        0
    } else {
        1
    }
}

async fn apply(
    git: &CliGit,
    host: &GhCli,
    store: &StateStore,
    machine_id: &str,
    selector: &str,
    action: Action,
    cli: &Cli,
) -> i32 {
    let request = ApplyRequest {
        machine_id,
        selector,
        action,
        options: PlanOptions {
            commit_message: cli.commit_message.clone(),
            ..Default::default()
        },
        interactive: false,
    };

    let result = bbfix_core::apply_action(git, host, store, request, |event: ApplyStepEvent| {
        tracing::info!(id = %event.entry.id, status = ?event.status, "apply step");
    })
    .await;

    match result {
        Ok(repo) => {
            let output = serde_json::json!({
                "repo_key": repo.repo_key,
                "syncable": repo.syncable,
                "unsyncable_reasons": repo.unsyncable_reasons,
            });
            print_line(&mut std::io::stdout(), &output.to_string());
            if repo.syncable {
                0
            } else {
                1
            }
        }
        Err(e) => {
            let output = serde_json::json!({ "error": e });
            print_line(&mut std::io::stderr(), &output.to_string());
            match e.code {
                bbfix_api::ErrorCode::Ineligible => 1,
                _ => 2,
            }
        }
    }
}
