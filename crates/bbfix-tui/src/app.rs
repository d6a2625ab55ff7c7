//! Session state shared by every view: the focused repo list, the pending
//! wizard queue, and the running summary.

use bbfix_api::{Action, ApplyStepEvent, RepoMetadata, RepoRecord, RiskSnapshot};

/// One row in the List view.
#[derive(Debug, Clone)]
pub struct RepoRow {
    pub repo: RepoRecord,
    pub metadata: RepoMetadata,
    pub risk: RiskSnapshot,
    pub eligible: Vec<Action>,
    pub selected_index: usize,
    pub session_ignored: bool,
}

impl RepoRow {
    pub fn selected_action(&self) -> Option<Action> {
        self.eligible.get(self.selected_index).copied()
    }

    pub fn cycle(&mut self, delta: i32) {
        if self.eligible.is_empty() {
            return;
        }
        let len = self.eligible.len() as i32;
        let next = (self.selected_index as i32 + delta).rem_euclid(len);
        self.selected_index = next as usize;
    }
}

/// One queued risky confirmation.
#[derive(Debug, Clone)]
pub struct WizardDecision {
    pub repo_key: String,
    pub action: Action,
}

/// Where the running apply is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyPhase {
    Preparing,
    Executing,
    Rechecking,
}

/// One completed result, shown in the Summary view.
#[derive(Debug, Clone)]
pub struct SummaryEntry {
    pub repo_key: String,
    pub action: Action,
    pub succeeded: bool,
    pub still_unsyncable: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    List,
    Wizard,
    Summary,
}

pub struct App {
    pub rows: Vec<RepoRow>,
    pub focused: usize,
    pub view: View,
    pub wizard_queue: Vec<WizardDecision>,
    pub wizard_commit_message: String,
    pub wizard_plan_preview: Vec<ApplyStepEvent>,
    pub applying: bool,
    pub apply_phase: ApplyPhase,
    pub summary: Vec<SummaryEntry>,
    pub should_quit: bool,
}

impl App {
    pub fn new(rows: Vec<RepoRow>) -> Self {
        Self {
            rows,
            focused: 0,
            view: View::List,
            wizard_queue: Vec::new(),
            wizard_commit_message: String::new(),
            wizard_plan_preview: Vec::new(),
            applying: false,
            apply_phase: ApplyPhase::Preparing,
            summary: Vec::new(),
            should_quit: false,
        }
    }

    pub fn focused_row(&self) -> Option<&RepoRow> {
        self.rows.get(self.focused)
    }

    pub fn focused_row_mut(&mut self) -> Option<&mut RepoRow> {
        self.rows.get_mut(self.focused)
    }

    pub fn move_focus(&mut self, delta: i32) {
        if self.rows.is_empty() {
            return;
        }
        let len = self.rows.len() as i32;
        let next = (self.focused as i32 + delta).rem_euclid(len);
        self.focused = next as usize;
    }

    pub fn toggle_ignore(&mut self) {
        if let Some(row) = self.focused_row_mut() {
            row.session_ignored = !row.session_ignored;
        }
    }
}
