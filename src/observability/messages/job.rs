// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the job subsystem.

use crate::jobs::JobStatus;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Job accepted and queued.
///
/// # Log Level
/// `info!` - Important operational event
pub struct JobScheduled<'a> {
    pub job_id: &'a str,
    pub parent_job_id: Option<&'a str>,
    pub user_id: &'a str,
    pub operation: &'a str,
}

impl Display for JobScheduled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Job {} scheduled for user '{}': {}",
            self.job_id, self.user_id, self.operation
        )
    }
}

impl StructuredLog for JobScheduled<'_> {
    fn log(&self) {
        tracing::info!(
            job_id = self.job_id,
            parent_job_id = ?self.parent_job_id,
            user_id = self.user_id,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "job",
            span_name = name,
            job_id = self.job_id,
            parent_job_id = ?self.parent_job_id,
            user_id = self.user_id,
        )
    }
}

/// Job moved to a new status.
///
/// # Log Level
/// `debug!` - Routine state change
pub struct JobStatusChanged<'a> {
    pub job_id: &'a str,
    pub from: JobStatus,
    pub to: JobStatus,
}

impl Display for JobStatusChanged<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Job {}: {} -> {}", self.job_id, self.from, self.to)
    }
}

impl StructuredLog for JobStatusChanged<'_> {
    fn log(&self) {
        tracing::debug!(
            job_id = self.job_id,
            from = %self.from,
            to = %self.to,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("job_status", span_name = name, job_id = self.job_id, to = %self.to)
    }
}

/// A status change was refused by the job state machine.
///
/// # Log Level
/// `error!` - Indicates a sequencing bug
pub struct JobTransitionRejected<'a> {
    pub job_id: &'a str,
    pub from: JobStatus,
    pub to: JobStatus,
}

impl Display for JobTransitionRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Rejected status change for job {}: {} -> {}",
            self.job_id, self.from, self.to
        )
    }
}

impl StructuredLog for JobTransitionRejected<'_> {
    fn log(&self) {
        tracing::error!(
            job_id = self.job_id,
            from = %self.from,
            to = %self.to,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("job_transition_rejected", span_name = name, job_id = self.job_id)
    }
}

/// Job finished with an error; the error is recorded on the job detail.
///
/// # Log Level
/// `warn!` - Submitters only see this by querying the job
pub struct JobFailed<'a> {
    pub job_id: &'a str,
    pub reason: &'a str,
}

impl Display for JobFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Job {} failed: {}", self.job_id, self.reason)
    }
}

impl StructuredLog for JobFailed<'_> {
    fn log(&self) {
        tracing::warn!(job_id = self.job_id, reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("job_failed", span_name = name, job_id = self.job_id)
    }
}

/// Job result exported to the result cache.
pub struct JobResultExported<'a> {
    pub job_id: &'a str,
    pub key: &'a str,
}

impl Display for JobResultExported<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Exported result of job {} under key '{}'", self.job_id, self.key)
    }
}

impl StructuredLog for JobResultExported<'_> {
    fn log(&self) {
        tracing::debug!(job_id = self.job_id, key = self.key, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("job_export", span_name = name, job_id = self.job_id, key = self.key)
    }
}

/// Worker pool started its workers.
///
/// # Log Level
/// `info!` - Happens once per executor, on the first job
pub struct WorkerPoolStarted {
    pub threads: usize,
}

impl Display for WorkerPoolStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Job worker pool started with {} workers", self.threads)
    }
}

impl StructuredLog for WorkerPoolStarted {
    fn log(&self) {
        tracing::info!(threads = self.threads, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("worker_pool", span_name = name, threads = self.threads)
    }
}

/// A job task panicked inside a worker.
///
/// # Log Level
/// `error!` - The job's status is left as it was when the panic happened
pub struct JobTaskPanicked<'a> {
    pub worker: usize,
    pub error: &'a str,
}

impl Display for JobTaskPanicked<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Job task on worker {} panicked: {}", self.worker, self.error)
    }
}

impl StructuredLog for JobTaskPanicked<'_> {
    fn log(&self) {
        tracing::error!(worker = self.worker, error = self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("job_panic", span_name = name, worker = self.worker)
    }
}
