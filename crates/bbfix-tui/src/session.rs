//! The interactive session: List view for triage, Wizard view for risky
//! confirmations, Summary view once the queue drains.

use std::io::{self, Stdout};
use std::path::Path;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;

use bbfix_api::{Action, ApplyStepEvent, Error, ErrorCode, RepoMetadata};
use bbfix_core::apply::ApplyRequest;
use bbfix_core::plan::{build_plan, PlanContext, PlanOptions};
use bbfix_git::CliGit;
use bbfix_host::GhCli;
use bbfix_state::StateStore;

use crate::app::{App, ApplyPhase, RepoRow, SummaryEntry, View, WizardDecision};
use crate::view;

/// Runs the full List -> Wizard -> Summary session until the user quits.
pub async fn run_session() -> Result<(), Error> {
    let machine_id = std::env::var("BB_MACHINE_ID").unwrap_or_else(|_| "local".to_string());
    let store = StateStore::open(bbfix_state::default_state_root())?;
    let git = CliGit::new();
    let host = GhCli::new();

    let rows = load_rows(&git, &store, &machine_id).await?;
    let mut app = App::new(rows);

    let mut terminal = enter_terminal()?;
    let result = drive(&mut terminal, &mut app, &git, &host, &store, &machine_id).await;
    leave_terminal(&mut terminal)?;
    result
}

async fn load_rows(git: &CliGit, store: &StateStore, machine_id: &str) -> Result<Vec<RepoRow>, Error> {
    let snapshot = store.load_snapshot(machine_id)?.ok_or_else(|| {
        Error::new(ErrorCode::NotFound, "no machine snapshot on record; run a catalog scan first")
    })?;

    let mut rows = Vec::new();
    for repo in snapshot.repos {
        let metadata = store
            .load_metadata(&repo.repo_key)?
            .unwrap_or_else(|| RepoMetadata::new(repo.repo_key.clone(), repo.name.clone()));
        let risk = bbfix_core::risk::collect(git, Path::new(&repo.path)).await?;
        let eligible = bbfix_core::evaluate(&repo, &metadata, &risk, true);
        rows.push(RepoRow {
            repo,
            metadata,
            risk,
            eligible,
            selected_index: 0,
            session_ignored: false,
        });
    }
    Ok(rows)
}

fn enter_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, Error> {
    enable_raw_mode().map_err(io_err)?;
    execute!(io::stdout(), EnterAlternateScreen).map_err(io_err)?;
    Terminal::new(CrosstermBackend::new(io::stdout())).map_err(io_err)
}

fn leave_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<(), Error> {
    disable_raw_mode().map_err(io_err)?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).map_err(io_err)?;
    Ok(())
}

fn io_err(e: impl std::fmt::Display) -> Error {
    Error::new(ErrorCode::Internal, e.to_string())
}

async fn drive(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    git: &CliGit,
    host: &GhCli,
    store: &StateStore,
    machine_id: &str,
) -> Result<(), Error> {
    loop {
        terminal.draw(|f| view::draw(f, app)).map_err(io_err)?;

        if app.should_quit {
            return Ok(());
        }

        if !event::poll(Duration::from_millis(100)).map_err(io_err)? {
            continue;
        }
        let Event::Key(key) = event::read().map_err(io_err)? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match app.view {
            View::List => handle_list_key(app, key.code, git, host, store, machine_id).await?,
            View::Wizard => handle_wizard_key(app, key.code, git, host, store, machine_id).await?,
            View::Summary => {
                if matches!(key.code, KeyCode::Char('q') | KeyCode::Enter) {
                    app.should_quit = true;
                }
            }
        }
    }
}

async fn handle_list_key(
    app: &mut App,
    code: KeyCode,
    git: &CliGit,
    host: &GhCli,
    store: &StateStore,
    machine_id: &str,
) -> Result<(), Error> {
    match code {
        KeyCode::Char('q') => {
            app.should_quit = true;
        }
        KeyCode::Up => app.move_focus(-1),
        KeyCode::Down => app.move_focus(1),
        KeyCode::Left => {
            if let Some(row) = app.focused_row_mut() {
                row.cycle(-1);
            }
        }
        KeyCode::Right => {
            if let Some(row) = app.focused_row_mut() {
                row.cycle(1);
            }
        }
        KeyCode::Char('i') | KeyCode::Char('u') => app.toggle_ignore(),
        KeyCode::Char('r') => {
            let rows = load_rows(git, store, machine_id).await?;
            app.rows = rows;
            app.focused = app.focused.min(app.rows.len().saturating_sub(1));
        }
        KeyCode::Enter => enqueue_or_apply(app, git, host, store, machine_id).await?,
        _ => {}
    }
    Ok(())
}

async fn enqueue_or_apply(
    app: &mut App,
    git: &CliGit,
    host: &GhCli,
    store: &StateStore,
    machine_id: &str,
) -> Result<(), Error> {
    let Some(row) = app.focused_row() else { return Ok(()) };
    if row.session_ignored {
        return Ok(());
    }
    let Some(action) = row.selected_action() else { return Ok(()) };
    let repo_key = row.repo.repo_key.clone();

    if action.is_risky() {
        app.wizard_queue.push(WizardDecision { repo_key, action });
        if app.view != View::Wizard {
            enter_next_wizard_decision(app);
        }
        return Ok(());
    }

    let outcome = run_apply(git, host, store, machine_id, &repo_key, action, None).await;
    record_outcome(app, repo_key, action, outcome);
    Ok(())
}

fn enter_next_wizard_decision(app: &mut App) {
    if app.wizard_queue.is_empty() {
        if !app.summary.is_empty() {
            app.view = View::Summary;
        }
        return;
    }
    app.view = View::Wizard;
    app.wizard_commit_message.clear();
    app.wizard_plan_preview.clear();
    if let Some(decision) = app.wizard_queue.first() {
        if let Some(row) = app.rows.iter().find(|r| r.repo.repo_key == decision.repo_key) {
            let options = PlanOptions::default();
            let ctx = PlanContext {
                repo: &row.repo,
                metadata: &row.metadata,
                options: &options,
                fetch_prune_enabled: true,
            };
            let entries = build_plan(decision.action, &ctx);
            app.wizard_plan_preview = entries
                .into_iter()
                .map(ApplyStepEvent::running)
                .collect();
        }
    }
}

async fn handle_wizard_key(
    app: &mut App,
    code: KeyCode,
    git: &CliGit,
    host: &GhCli,
    store: &StateStore,
    machine_id: &str,
) -> Result<(), Error> {
    if app.applying {
        // Inputs are locked while an apply is in flight; only quit is honored.
        if code == KeyCode::Char('q') {
            app.should_quit = true;
        }
        return Ok(());
    }

    match code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Esc => {
            // Cancel: drop the front decision, move to the next one.
            if !app.wizard_queue.is_empty() {
                app.wizard_queue.remove(0);
            }
            enter_next_wizard_decision(app);
        }
        KeyCode::Char('s') => {
            // Skip: same as cancel but recorded in the summary as skipped.
            if !app.wizard_queue.is_empty() {
                let decision = app.wizard_queue.remove(0);
                app.summary.push(SummaryEntry {
                    repo_key: decision.repo_key,
                    action: decision.action,
                    succeeded: false,
                    still_unsyncable: true,
                    message: Some("skipped".to_string()),
                });
            }
            enter_next_wizard_decision(app);
        }
        KeyCode::Char(c) => app.wizard_commit_message.push(c),
        KeyCode::Backspace => {
            app.wizard_commit_message.pop();
        }
        KeyCode::Enter => run_wizard_apply(app, git, host, store, machine_id).await?,
        _ => {}
    }
    Ok(())
}

async fn run_wizard_apply(
    app: &mut App,
    git: &CliGit,
    host: &GhCli,
    store: &StateStore,
    machine_id: &str,
) -> Result<(), Error> {
    let Some(decision) = app.wizard_queue.first().cloned() else { return Ok(()) };
    app.applying = true;
    app.apply_phase = ApplyPhase::Preparing;

    let commit_message = (!app.wizard_commit_message.is_empty()).then(|| app.wizard_commit_message.clone());
    let options = PlanOptions {
        commit_message,
        ..Default::default()
    };

    app.apply_phase = ApplyPhase::Executing;
    let outcome = run_apply(
        git,
        host,
        store,
        machine_id,
        &decision.repo_key,
        decision.action,
        Some(options),
    )
    .await;
    app.apply_phase = ApplyPhase::Rechecking;

    app.wizard_queue.remove(0);
    record_outcome(app, decision.repo_key, decision.action, outcome);
    app.applying = false;
    enter_next_wizard_decision(app);
    Ok(())
}

/// Runs a single apply through the shared pipeline and reports step events
/// as they occur. A real session streams these over an mpsc channel so the
/// UI can repaint without blocking on the apply future.
async fn run_apply(
    git: &CliGit,
    host: &GhCli,
    store: &StateStore,
    machine_id: &str,
    selector: &str,
    action: Action,
    options: Option<PlanOptions>,
) -> Result<bbfix_api::RepoRecord, Error> {
    let (tx, mut rx) = mpsc::unbounded_channel::<ApplyStepEvent>();
    let drain = tokio::spawn(async move { while rx.recv().await.is_some() {} });

    let request = ApplyRequest {
        machine_id,
        selector,
        action,
        options: options.unwrap_or_default(),
        interactive: true,
    };
    let result = bbfix_core::apply_action(git, host, store, request, move |event| {
        let _ = tx.send(event);
    })
    .await;

    drop(drain);
    result
}

fn record_outcome(app: &mut App, repo_key: String, action: Action, outcome: Result<bbfix_api::RepoRecord, Error>) {
    match outcome {
        Ok(repo) => {
            if let Some(row) = app.rows.iter_mut().find(|r| r.repo.repo_key == repo_key) {
                let still_unsyncable = !repo.syncable;
                row.repo = repo;
                app.summary.push(SummaryEntry {
                    repo_key,
                    action,
                    succeeded: true,
                    still_unsyncable,
                    message: None,
                });
            }
        }
        Err(e) => {
            app.summary.push(SummaryEntry {
                repo_key,
                action,
                succeeded: false,
                still_unsyncable: true,
                message: Some(e.message.clone()),
            });
        }
    }
    if app.wizard_queue.is_empty() && !app.summary.is_empty() {
        app.view = View::Summary;
    }
}
