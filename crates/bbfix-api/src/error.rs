//! Typed error model shared by every `bb fix` crate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of error kinds the fix engine can produce, by observable effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Another process holds the state lock.
    LockBusy,
    /// Selector resolved to nothing.
    NotFound,
    /// Selector resolved to more than one repository.
    Ambiguous,
    /// Action is not in the eligible set for this repository.
    Ineligible,
    /// Repository name, sync strategy, or branch rename failed validation.
    InvalidInput,
    /// A git or host command returned a non-zero exit status.
    ExternalCommandFailed,
    /// The host CLI is missing or not authenticated.
    AuthRequired,
    /// A persisted-state read or write failed.
    StateIo,
    /// Origin URL did not match the expected identity.
    ConflictingOrigin,
    /// Anything else: a bug, not a policy outcome.
    Internal,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LockBusy => write!(f, "lock_busy"),
            Self::NotFound => write!(f, "not_found"),
            Self::Ambiguous => write!(f, "ambiguous"),
            Self::Ineligible => write!(f, "ineligible"),
            Self::InvalidInput => write!(f, "invalid_input"),
            Self::ExternalCommandFailed => write!(f, "external_command_failed"),
            Self::AuthRequired => write!(f, "auth_required"),
            Self::StateIo => write!(f, "state_io"),
            Self::ConflictingOrigin => write!(f, "conflicting_origin"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// Structured error carried across every fix-engine crate boundary.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct Error {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional remediation hint shown to the user
    pub remediation: Option<String>,
    /// Optional structured context (e.g. ambiguous-selector candidates)
    pub details: Option<serde_json::Value>,
}

impl Error {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            remediation: None,
            details: None,
        }
    }

    /// Add a remediation hint.
    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = Some(remediation.into());
        self
    }

    /// Add structured details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn ambiguous(message: impl Into<String>, candidates: Vec<String>) -> Self {
        Self::new(ErrorCode::Ambiguous, message)
            .with_details(serde_json::json!({ "candidates": candidates }))
    }

    pub fn ineligible(action: impl Into<String>, reason: Option<String>) -> Self {
        let action = action.into();
        let mut err = Self::new(
            ErrorCode::Ineligible,
            format!("action '{action}' is not eligible for this repository"),
        )
        .with_details(serde_json::json!({ "action": action }));
        if let Some(reason) = reason {
            err = err.with_remediation(reason);
        }
        err
    }

    pub fn lock_busy(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::LockBusy, message)
    }

    pub fn external_command_failed(step: impl Into<String>, detail: impl Into<String>) -> Self {
        let step = step.into();
        Self::new(
            ErrorCode::ExternalCommandFailed,
            format!("command failed during '{step}'"),
        )
        .with_details(serde_json::json!({ "step": step, "detail": detail.into() }))
    }

    pub fn state_io(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StateIo, message)
    }

    pub fn is_ineligible(&self) -> bool {
        self.code == ErrorCode::Ineligible
    }
}

/// Result alias used by every public, fallible function in the fix engine.
pub type FixResult<T> = Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_code_and_message() {
        let err = Error::not_found("repo not found");
        assert_eq!(err.to_string(), "not_found: repo not found");
    }

    #[test]
    fn ambiguous_carries_candidates() {
        let err = Error::ambiguous("multiple repos match", vec!["/a".into(), "/b".into()]);
        assert!(err.details.is_some());
        assert!(err.is_ineligible() == false);
    }
}
