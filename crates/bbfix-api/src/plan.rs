//! Plan entries and apply-progress events.

use serde::{Deserialize, Serialize};

/// One row of a deterministic action plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    /// Stable slug, unique within a plan. Identity for progress tracking;
    /// never derived from `summary`.
    pub id: String,
    /// `true` for an external git/host command, `false` for a metadata
    /// mutation or skip explanation.
    pub command: bool,
    /// Human-readable description shown in the wizard's plan preview.
    pub summary: String,
}

impl PlanEntry {
    pub fn command(id: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            command: true,
            summary: summary.into(),
        }
    }

    pub fn note(id: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            command: false,
            summary: summary.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Running,
    Done,
    Failed,
    Skipped,
}

/// One event in the apply-progress stream, in strict plan order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyStepEvent {
    pub entry: PlanEntry,
    pub status: StepStatus,
    pub error: Option<String>,
}

impl ApplyStepEvent {
    pub fn running(entry: PlanEntry) -> Self {
        Self {
            entry,
            status: StepStatus::Running,
            error: None,
        }
    }

    pub fn done(entry: PlanEntry) -> Self {
        Self {
            entry,
            status: StepStatus::Done,
            error: None,
        }
    }

    pub fn failed(entry: PlanEntry, error: impl Into<String>) -> Self {
        Self {
            entry,
            status: StepStatus::Failed,
            error: Some(error.into()),
        }
    }

    pub fn skipped(entry: PlanEntry) -> Self {
        Self {
            entry,
            status: StepStatus::Skipped,
            error: None,
        }
    }
}

/// Asserts plan-entry IDs are unique, a precondition every plan builder
/// function must satisfy.
pub fn assert_unique_ids(entries: &[PlanEntry]) {
    let mut seen = std::collections::HashSet::new();
    for entry in entries {
        debug_assert!(seen.insert(&entry.id), "duplicate plan entry id: {}", entry.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_is_not_a_command() {
        let entry = PlanEntry::note("enable-auto-push.1", "set AutoPush = include-default-branch");
        assert!(!entry.command);
    }

    #[test]
    fn command_is_a_command() {
        let entry = PlanEntry::command("push.1", "git push");
        assert!(entry.command);
    }
}
