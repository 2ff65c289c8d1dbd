// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Job submission and job queries.

use async_trait::async_trait;
use serde_json::Value;
use tracing::Instrument;
use uuid::Uuid;

use super::mismatched;
use crate::context::Context;
use crate::errors::{OperationError, OperationResult};
use crate::executor::Executor;
use crate::jobs::{JobDetail, JobStatus};
use crate::observability::messages::job::{JobFailed, JobResultExported, JobScheduled};
use crate::observability::messages::StructuredLog;
use crate::operation::{ExportToResultCache, GetResultCacheExport, Operation, OperationKind, Options};
use crate::traits::OperationHandler;

/// Schedules the wrapped operation on the worker pool and returns its
/// `SCHEDULED` job detail straight away.
pub struct JobHandler;

#[async_trait]
impl OperationHandler for JobHandler {
    async fn do_operation(
        &self,
        operation: &Operation,
        context: &mut Context,
        executor: &Executor,
    ) -> OperationResult<Value> {
        let Operation::Job(job) = operation else {
            return Err(mismatched(OperationKind::Job, operation));
        };

        let job_id = Uuid::new_v4().to_string();
        let detail = JobDetail::scheduled(
            &job_id,
            Some(context.job_id().to_string()),
            context.user().user_id(),
            &job.operation,
        )?;

        if let Some(tracker) = executor.tracker_if_enabled() {
            tracker.add_or_update_job(&detail)?;
        }

        let scheduled = JobScheduled {
            job_id: &job_id,
            parent_job_id: detail.parent_job_id.as_deref(),
            user_id: &detail.user_id,
            operation: &detail.operation,
        };
        scheduled.log();
        let span = scheduled.span("run_job");

        let runner = executor.clone();
        let child = context.child(&job_id);
        let inner = (*job.operation).clone();
        let key = job.key.clone();
        executor.submit(Box::pin(run_job(runner, inner, child, key).instrument(span)))?;

        Ok(serde_json::to_value(&detail)?)
    }

    fn name(&self) -> &'static str {
        "job"
    }
}

fn record_status(executor: &Executor, job_id: &str, status: JobStatus, description: Option<String>) {
    if let Some(tracker) = executor.tracker_if_enabled() {
        if let Err(e) = tracker.transition(job_id, status, description) {
            JobFailed {
                job_id,
                reason: &format!("status update to {} failed: {}", status, e),
            }
            .log();
        }
    }
}

/// Detached run of one job on a worker: status updates around a full
/// pipeline execution, then the result export.
async fn run_job(executor: Executor, operation: Operation, mut context: Context, key: Option<String>) {
    let job_id = context.job_id().to_string();
    let running = if operation.contains_job() {
        JobStatus::ScheduledParent
    } else {
        JobStatus::Running
    };
    record_status(&executor, &job_id, running, None);

    let outcome = match executor.execute(&operation, &mut context).await {
        Ok(result) => export_result(&executor, &mut context, key, result).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(()) => record_status(&executor, &job_id, JobStatus::Completed, None),
        Err(e) => {
            let reason = e.to_string();
            JobFailed {
                job_id: &job_id,
                reason: &reason,
            }
            .log();
            record_status(&executor, &job_id, JobStatus::Failed, Some(reason));
        }
    }
}

async fn export_result(
    executor: &Executor,
    context: &mut Context,
    key: Option<String>,
    result: Value,
) -> OperationResult<()> {
    if !executor.is_supported(OperationKind::ExportToResultCache) {
        return Ok(());
    }

    let export = Operation::ExportToResultCache(ExportToResultCache {
        input: Some(result),
        key,
        options: Options::new(),
    });
    executor.execute(&export, context).await?;

    if let Operation::ExportToResultCache(export) = &export {
        JobResultExported {
            job_id: context.job_id(),
            key: export.key_or_default(),
        }
        .log();
    }
    Ok(())
}

/// Lists tracked jobs. Callers holding the admin auth see every job, other
/// callers only their own.
pub struct GetAllJobDetailsHandler;

#[async_trait]
impl OperationHandler for GetAllJobDetailsHandler {
    async fn do_operation(
        &self,
        _operation: &Operation,
        context: &mut Context,
        executor: &Executor,
    ) -> OperationResult<Value> {
        let tracker = executor.job_tracker()?;
        let user = context.user();
        let is_admin = executor
            .config()
            .properties()
            .admin_auth()
            .map_or(false, |auth| user.has_auth(auth));

        let visible: Vec<JobDetail> = tracker
            .get_all_jobs()?
            .into_iter()
            .filter(|job| is_admin || job.user_id == user.user_id())
            .collect();
        Ok(serde_json::to_value(visible)?)
    }

    fn name(&self) -> &'static str {
        "get_all_job_details"
    }
}

/// Returns one job detail, or `null` for an unknown job id.
pub struct GetJobDetailsHandler;

#[async_trait]
impl OperationHandler for GetJobDetailsHandler {
    async fn do_operation(
        &self,
        operation: &Operation,
        _context: &mut Context,
        executor: &Executor,
    ) -> OperationResult<Value> {
        let Operation::GetJobDetails(get) = operation else {
            return Err(mismatched(OperationKind::GetJobDetails, operation));
        };
        let tracker = executor.job_tracker()?;
        match tracker.get_job(&get.job_id)? {
            Some(detail) => Ok(serde_json::to_value(detail)?),
            None => Ok(Value::Null),
        }
    }

    fn name(&self) -> &'static str {
        "get_job_details"
    }
}

/// Fetches a job's exported results through `GetResultCacheExport`.
pub struct GetJobResultsHandler;

#[async_trait]
impl OperationHandler for GetJobResultsHandler {
    async fn do_operation(
        &self,
        operation: &Operation,
        context: &mut Context,
        executor: &Executor,
    ) -> OperationResult<Value> {
        let Operation::GetJobResults(get) = operation else {
            return Err(mismatched(OperationKind::GetJobResults, operation));
        };

        if !executor.is_supported(OperationKind::GetResultCacheExport) {
            return Err(OperationError::configuration(
                "GetJobResults requires GetResultCacheExport, which this executor does not support",
            ));
        }

        let lookup = Operation::GetResultCacheExport(GetResultCacheExport {
            job_id: get.job_id.clone(),
            key: get.key.clone(),
            options: get.options.clone(),
        });
        executor.execute(&lookup, context).await
    }

    fn name(&self) -> &'static str {
        "get_job_results"
    }
}
