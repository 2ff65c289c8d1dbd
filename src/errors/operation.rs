// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error type surfaced by the dispatch pipeline.
//!
//! Every failure inside `Executor::execute` (configuration, hooks, handler
//! resolution, handlers and the nested executions they start) is reported as
//! one `OperationError`. Detached jobs record the error text in their
//! `JobDetail` instead of returning it.

use crate::operation::OperationKind;
use std::fmt;
use thiserror::Error;

/// Phase of the hook contract in which a hook failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    PreExecute,
    PostExecute,
    OnFailure,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookPhase::PreExecute => f.write_str("pre_execute"),
            HookPhase::PostExecute => f.write_str("post_execute"),
            HookPhase::OnFailure => f.write_str("on_failure"),
        }
    }
}

#[derive(Error, Debug)]
pub enum OperationError {
    /// No handler resolves for the operation kind.
    #[error("Operation {0} is not supported by this executor")]
    UnsupportedOperation(OperationKind),

    /// The authoriser rejected an operation node.
    #[error(
        "User '{user_id}' is not authorised to run {operation}: missing operation auths [{}]",
        .missing.join(", ")
    )]
    Unauthorised {
        user_id: String,
        operation: OperationKind,
        missing: Vec<String>,
    },

    /// A handler failed while running its operation.
    #[error("{operation} handler failed: {reason}")]
    HandlerFailure {
        operation: OperationKind,
        reason: String,
    },

    /// Missing or invalid executor configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A hook failed for a reason of its own.
    #[error("Hook '{hook}' failed during {phase}: {reason}")]
    HookFailure {
        hook: String,
        phase: HookPhase,
        reason: String,
    },

    /// The operation is malformed (missing input, wrong input shape, ...).
    #[error("Invalid {operation} operation: {reason}")]
    InvalidOperation {
        operation: OperationKind,
        reason: String,
    },

    #[error("Serialisation error: {0}")]
    Serialisation(String),

    #[error("Cache error: {0}")]
    Cache(String),

    /// Nested execution went deeper than the executor allows.
    #[error("Operation nesting exceeded the maximum depth of {0}")]
    RecursionLimit(usize),

    /// A job status change that would revisit or leave a terminal state.
    #[error("Job '{job_id}' cannot move from {from} to {to}")]
    JobTransition {
        job_id: String,
        from: String,
        to: String,
    },
}

impl OperationError {
    pub fn handler(operation: OperationKind, reason: impl Into<String>) -> Self {
        OperationError::HandlerFailure {
            operation,
            reason: reason.into(),
        }
    }

    pub fn invalid(operation: OperationKind, reason: impl Into<String>) -> Self {
        OperationError::InvalidOperation {
            operation,
            reason: reason.into(),
        }
    }

    pub fn configuration(reason: impl Into<String>) -> Self {
        OperationError::Configuration(reason.into())
    }

    /// Short, stable name of the variant, used as a structured log field.
    pub fn kind_name(&self) -> &'static str {
        match self {
            OperationError::UnsupportedOperation(_) => "unsupported_operation",
            OperationError::Unauthorised { .. } => "unauthorised",
            OperationError::HandlerFailure { .. } => "handler_failure",
            OperationError::Configuration(_) => "configuration",
            OperationError::HookFailure { .. } => "hook_failure",
            OperationError::InvalidOperation { .. } => "invalid_operation",
            OperationError::Serialisation(_) => "serialisation",
            OperationError::Cache(_) => "cache",
            OperationError::RecursionLimit(_) => "recursion_limit",
            OperationError::JobTransition { .. } => "job_transition",
        }
    }
}

impl From<serde_json::Error> for OperationError {
    fn from(e: serde_json::Error) -> Self {
        OperationError::Serialisation(e.to_string())
    }
}

impl From<serde_yaml::Error> for OperationError {
    fn from(e: serde_yaml::Error) -> Self {
        OperationError::Serialisation(e.to_string())
    }
}

pub type OperationResult<T> = Result<T, OperationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorised_message_names_operation_and_missing_auths() {
        let error = OperationError::Unauthorised {
            user_id: "alice".to_string(),
            operation: OperationKind::ToSet,
            missing: vec!["AdminUser".to_string(), "SuperUser".to_string()],
        };

        let message = error.to_string();
        assert!(message.contains("alice"));
        assert!(message.contains("ToSet"));
        assert!(message.contains("[AdminUser, SuperUser]"));
    }

    #[test]
    fn hook_failure_message_includes_phase() {
        let error = OperationError::HookFailure {
            hook: "monitor".to_string(),
            phase: HookPhase::PostExecute,
            reason: "sink unavailable".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Hook 'monitor' failed during post_execute: sink unavailable"
        );
    }

    #[test]
    fn serde_errors_convert_to_serialisation() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: OperationError = json_error.into();
        assert_eq!(error.kind_name(), "serialisation");
    }
}
