//! Rendering for the List, Wizard, and Summary views.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use ratatui::Frame;

use bbfix_api::StepStatus;

use crate::app::{App, ApplyPhase, View};

pub fn draw(frame: &mut Frame, app: &App) {
    match app.view {
        View::List => draw_list(frame, app),
        View::Wizard => draw_wizard(frame, app),
        View::Summary => draw_summary(frame, app),
    }
}

fn draw_list(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    let header = Row::new(vec!["name", "branch", "state", "reasons", "action"]).style(
        Style::default().add_modifier(Modifier::BOLD),
    );
    let rows: Vec<Row> = app
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let state = if row.repo.syncable { "ok" } else { "blocked" };
            let reasons = row
                .repo
                .unsyncable_reasons
                .iter()
                .map(|r| format!("{r:?}"))
                .collect::<Vec<_>>()
                .join(",");
            let action = row
                .selected_action()
                .map(|a| a.label().to_string())
                .unwrap_or_else(|| "-".to_string());
            let mut style = Style::default();
            if row.session_ignored {
                style = style.fg(Color::DarkGray);
            }
            if i == app.focused {
                style = style.add_modifier(Modifier::REVERSED);
            }
            Row::new(vec![
                Cell::from(row.repo.name.clone()),
                Cell::from(row.repo.branch.clone().unwrap_or_default()),
                Cell::from(state),
                Cell::from(reasons),
                Cell::from(action),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(25),
            Constraint::Percentage(15),
            Constraint::Percentage(10),
            Constraint::Percentage(30),
            Constraint::Percentage(20),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title("bb fix"));
    frame.render_widget(table, chunks[0]);

    let help = Paragraph::new(
        "up/down select  left/right action  enter apply  i/u ignore  r refresh  q quit",
    );
    frame.render_widget(help, chunks[1]);
}

fn draw_wizard(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    let Some(decision) = app.wizard_queue.first() else {
        frame.render_widget(Paragraph::new("nothing queued"), area);
        return;
    };

    let header = if app.applying {
        let phase = match app.apply_phase {
            ApplyPhase::Preparing => "preparing",
            ApplyPhase::Executing => "executing",
            ApplyPhase::Rechecking => "rechecking",
        };
        format!("{} -- {} ({phase}...)", decision.repo_key, decision.action.label())
    } else {
        format!("{} -- {}", decision.repo_key, decision.action.label())
    };
    frame.render_widget(
        Paragraph::new(header).block(Block::default().borders(Borders::ALL).title("confirm")),
        chunks[0],
    );

    render_plan_preview(frame, chunks[1], app);

    let commit_line = if matches!(decision.action, bbfix_api::Action::StageCommitPush) {
        format!("commit message: {}_", app.wizard_commit_message)
    } else {
        String::new()
    };
    let footer = vec![
        Line::from(commit_line),
        Line::from("enter apply   esc cancel   s skip   q quit"),
    ];
    frame.render_widget(
        Paragraph::new(footer).block(Block::default().borders(Borders::ALL)),
        chunks[2],
    );
}

fn render_plan_preview(frame: &mut Frame, area: Rect, app: &App) {
    let lines: Vec<Line> = app
        .wizard_plan_preview
        .iter()
        .map(|event| {
            let glyph = match event.status {
                StepStatus::Running if app.applying => "~",
                StepStatus::Running => " ",
                StepStatus::Done => "x",
                StepStatus::Failed => "!",
                StepStatus::Skipped => "-",
            };
            Line::from(vec![
                Span::raw(format!("[{glyph}] ")),
                Span::raw(event.entry.summary.clone()),
            ])
        })
        .collect();
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("plan")),
        area,
    );
}

fn draw_summary(frame: &mut Frame, app: &App) {
    let lines: Vec<Line> = app
        .summary
        .iter()
        .map(|entry| {
            let glyph = if entry.succeeded && !entry.still_unsyncable {
                "done"
            } else if entry.succeeded {
                "applied, still unsyncable"
            } else {
                "failed"
            };
            let detail = entry.message.clone().unwrap_or_default();
            Line::from(format!(
                "{} {} -- {glyph} {detail}",
                entry.repo_key,
                entry.action.label()
            ))
        })
        .collect();
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("summary (enter/q to exit)"),
        ),
        frame.area(),
    );
}
