// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for executor lifecycle and dispatch events.
//!
//! This module contains message types for logging events related to:
//! * Executor construction
//! * Operation execution (start, completion, failure, recovery)
//! * Handler resolution

use crate::errors::OperationError;
use crate::observability::messages::StructuredLog;
use crate::operation::OperationKind;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Executor constructed from its configuration.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use maestro::observability::messages::engine::ExecutorCreated;
///
/// let msg = ExecutorCreated {
///     executor_id: "primary",
///     handler_count: 17,
///     hook_count: 2,
///     job_tracking: true,
///     worker_threads: 50,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ExecutorCreated<'a> {
    pub executor_id: &'a str,
    pub handler_count: usize,
    pub hook_count: usize,
    pub job_tracking: bool,
    pub worker_threads: usize,
}

impl Display for ExecutorCreated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Executor '{}' created: {} handlers, {} hooks, job_tracking={}, worker_threads={}",
            self.executor_id, self.handler_count, self.hook_count, self.job_tracking, self.worker_threads
        )
    }
}

impl StructuredLog for ExecutorCreated<'_> {
    fn log(&self) {
        tracing::info!(
            executor_id = self.executor_id,
            handler_count = self.handler_count,
            hook_count = self.hook_count,
            job_tracking = self.job_tracking,
            worker_threads = self.worker_threads,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "executor",
            span_name = name,
            executor_id = self.executor_id,
            handler_count = self.handler_count,
            hook_count = self.hook_count,
        )
    }
}

/// Operation execution started.
///
/// # Log Level
/// `debug!` - Emitted for every nested execution
pub struct OperationExecutionStarted<'a> {
    pub executor_id: &'a str,
    pub operation: OperationKind,
    pub job_id: &'a str,
    pub depth: usize,
}

impl Display for OperationExecutionStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Executing {} on '{}' for job {} at depth {}",
            self.operation, self.executor_id, self.job_id, self.depth
        )
    }
}

impl StructuredLog for OperationExecutionStarted<'_> {
    fn log(&self) {
        tracing::debug!(
            executor_id = self.executor_id,
            operation = %self.operation,
            job_id = self.job_id,
            depth = self.depth,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "operation",
            span_name = name,
            executor_id = self.executor_id,
            operation = %self.operation,
            job_id = self.job_id,
            depth = self.depth,
        )
    }
}

/// Operation execution completed successfully.
///
/// # Log Level
/// `debug!` - Emitted for every nested execution
pub struct OperationExecutionCompleted<'a> {
    pub executor_id: &'a str,
    pub operation: OperationKind,
    pub job_id: &'a str,
    pub duration: Duration,
}

impl Display for OperationExecutionCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} completed for job {} in {:?}",
            self.operation, self.job_id, self.duration
        )
    }
}

impl StructuredLog for OperationExecutionCompleted<'_> {
    fn log(&self) {
        tracing::debug!(
            executor_id = self.executor_id,
            operation = %self.operation,
            job_id = self.job_id,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "operation_completed",
            span_name = name,
            executor_id = self.executor_id,
            operation = %self.operation,
            duration = ?self.duration,
        )
    }
}

/// Operation execution failed; the error is returned to the caller.
///
/// # Log Level
/// `warn!` - The caller sees the error, this is for operators
pub struct OperationExecutionFailed<'a> {
    pub executor_id: &'a str,
    pub operation: OperationKind,
    pub job_id: &'a str,
    pub error: &'a OperationError,
}

impl Display for OperationExecutionFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} failed for job {}: {}",
            self.operation, self.job_id, self.error
        )
    }
}

impl StructuredLog for OperationExecutionFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            executor_id = self.executor_id,
            operation = %self.operation,
            job_id = self.job_id,
            error_kind = self.error.kind_name(),
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "operation_failed",
            span_name = name,
            executor_id = self.executor_id,
            operation = %self.operation,
            error_kind = self.error.kind_name(),
        )
    }
}

/// A hook recovered a failed execution.
///
/// # Log Level
/// `info!` - The error is not returned to the caller
pub struct OperationRecovered<'a> {
    pub executor_id: &'a str,
    pub operation: OperationKind,
    pub job_id: &'a str,
    pub error: &'a OperationError,
}

impl Display for OperationRecovered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} for job {} recovered by hook after: {}",
            self.operation, self.job_id, self.error
        )
    }
}

impl StructuredLog for OperationRecovered<'_> {
    fn log(&self) {
        tracing::info!(
            executor_id = self.executor_id,
            operation = %self.operation,
            job_id = self.job_id,
            error_kind = self.error.kind_name(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "operation_recovered",
            span_name = name,
            executor_id = self.executor_id,
            operation = %self.operation,
        )
    }
}

/// Handler resolved through the kind hierarchy.
///
/// # Log Level
/// `trace!` - Only useful when debugging registration
pub struct HandlerResolved<'a> {
    pub operation: OperationKind,
    pub resolved_as: OperationKind,
    pub handler: &'a str,
}

impl Display for HandlerResolved<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.operation == self.resolved_as {
            write!(f, "{} handled by {}", self.operation, self.handler)
        } else {
            write!(
                f,
                "{} handled by {} registered for {}",
                self.operation, self.handler, self.resolved_as
            )
        }
    }
}

impl StructuredLog for HandlerResolved<'_> {
    fn log(&self) {
        tracing::trace!(
            operation = %self.operation,
            resolved_as = %self.resolved_as,
            handler = self.handler,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!(
            "handler_resolved",
            span_name = name,
            operation = %self.operation,
            handler = self.handler,
        )
    }
}
