// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for hook events.

use crate::context::ExecutionTrackingInfo;
use crate::errors::{HookPhase, OperationError};
use crate::observability::messages::StructuredLog;
use crate::operation::OperationKind;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A hook raised an error in one of its phases.
///
/// # Log Level
/// `warn!` - The error replaces or starts the failure path
pub struct HookFailed<'a> {
    pub hook: &'a str,
    pub phase: HookPhase,
    pub operation: OperationKind,
    pub error: &'a OperationError,
}

impl Display for HookFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Hook '{}' failed in {} for {}: {}",
            self.hook, self.phase, self.operation, self.error
        )
    }
}

impl StructuredLog for HookFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            hook = self.hook,
            phase = %self.phase,
            operation = %self.operation,
            error_kind = self.error.kind_name(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "hook_failed",
            span_name = name,
            hook = self.hook,
            phase = %self.phase,
            operation = %self.operation,
        )
    }
}

/// The authoriser rejected an operation node.
///
/// # Log Level
/// `info!` - Expected outcome of a policy decision
pub struct AuthorisationDenied<'a> {
    pub user_id: &'a str,
    pub operation: OperationKind,
    pub missing: &'a [String],
}

impl Display for AuthorisationDenied<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "User '{}' denied {}: missing [{}]",
            self.user_id,
            self.operation,
            self.missing.join(", ")
        )
    }
}

impl StructuredLog for AuthorisationDenied<'_> {
    fn log(&self) {
        tracing::info!(
            user_id = self.user_id,
            operation = %self.operation,
            missing = ?self.missing,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "authorisation_denied",
            span_name = name,
            user_id = self.user_id,
            operation = %self.operation,
        )
    }
}

/// Execution tracking record reported by the monitor hook.
///
/// # Log Level
/// `info!` for begin and end, `warn!` for failures
pub struct ExecutionTracked<'a> {
    pub info: &'a ExecutionTrackingInfo,
    pub stage: &'a str,
    pub error: Option<&'a OperationError>,
}

impl Display for ExecutionTracked<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} job={} user={} executor={}",
            self.stage, self.info.operation, self.info.job_id, self.info.user_id, self.info.executor_id
        )?;
        if let Some(end) = self.info.time_end {
            let elapsed = end - self.info.time_begin;
            write!(f, " elapsed_ms={}", elapsed.num_milliseconds())?;
        }
        if let Some(error) = self.error {
            write!(f, " error={}", error)?;
        }
        Ok(())
    }
}

impl StructuredLog for ExecutionTracked<'_> {
    fn log(&self) {
        match self.error {
            Some(error) => tracing::warn!(
                stage = self.stage,
                operation = %self.info.operation,
                job_id = %self.info.job_id,
                parent_job_id = ?self.info.parent_job_id,
                user_id = %self.info.user_id,
                executor_id = %self.info.executor_id,
                error_kind = error.kind_name(),
                "{}", self
            ),
            None => tracing::info!(
                stage = self.stage,
                operation = %self.info.operation,
                job_id = %self.info.job_id,
                parent_job_id = ?self.info.parent_job_id,
                user_id = %self.info.user_id,
                executor_id = %self.info.executor_id,
                "{}", self
            ),
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "execution_tracked",
            span_name = name,
            stage = self.stage,
            operation = %self.info.operation,
            job_id = %self.info.job_id,
        )
    }
}
