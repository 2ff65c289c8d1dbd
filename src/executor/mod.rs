// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The dispatch pipeline.
//!
//! [`Executor::execute`] runs one operation:
//!
//! 1. the config id must be set;
//! 2. `pre_execute` on each hook in order, stopping at the first error;
//! 3. the handler is resolved by exact kind, then by declared supertypes;
//! 4. the handler runs, re-entering `execute` for nested operations;
//! 5. on success, `post_execute` on each hook whose `pre_execute` ran;
//! 6. on failure, `on_failure` on the same hooks, then the error is returned
//!    unless a hook recovered.
//!
//! Nested operations go through the same pipeline, so hooks and
//! authorisation apply at every depth.

mod config;
mod registry;

#[cfg(test)]
mod integration_tests;

pub use config::{Config, ConfigBuilder};
pub use registry::HandlerRegistry;

use crate::cache::CacheService;
use crate::context::{Context, Request, User};
use crate::errors::{HookPhase, OperationError, OperationResult};
use crate::jobs::{JobDetail, JobTask, JobTracker, WorkerPool};
use crate::observability::messages::engine::{
    ExecutorCreated, HandlerResolved, OperationExecutionCompleted, OperationExecutionFailed,
    OperationExecutionStarted, OperationRecovered,
};
use crate::observability::messages::hook::HookFailed;
use crate::observability::messages::StructuredLog;
use crate::operation::{Operation, OperationKind, MAX_OPERATION_DEPTH};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

struct ExecutorInner {
    config: Config,
    job_tracker: Option<JobTracker>,
    workers: WorkerPool,
}

/// Entry point for running operations. Cheap to clone; clones share the
/// config, the job tracker and the worker pool.
#[derive(Clone)]
pub struct Executor {
    inner: Arc<ExecutorInner>,
}

impl Executor {
    pub fn new(config: Config) -> OperationResult<Self> {
        let properties = config.properties();

        let job_tracker = if properties.job_tracker_enabled {
            let cache = config.cache().ok_or_else(|| {
                OperationError::configuration("job tracking is enabled but no cache service is configured")
            })?;
            Some(JobTracker::new(cache.clone()))
        } else {
            None
        };
        let workers = WorkerPool::new(properties.job_executor_threads());

        ExecutorCreated {
            executor_id: config.id(),
            handler_count: config.handlers().len(),
            hook_count: config.hooks().len(),
            job_tracking: job_tracker.is_some(),
            worker_threads: workers.threads(),
        }
        .log();

        Ok(Self {
            inner: Arc::new(ExecutorInner {
                config,
                job_tracker,
                workers,
            }),
        })
    }

    pub fn id(&self) -> &str {
        self.inner.config.id()
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// True iff `execute` would find a handler for `kind`.
    pub fn is_supported(&self, kind: OperationKind) -> bool {
        self.inner.config.handlers().is_supported(kind)
    }

    /// Concrete kinds this executor can run.
    pub fn supported_operations(&self) -> Vec<OperationKind> {
        OperationKind::ALL
            .iter()
            .copied()
            .filter(|kind| !kind.is_abstract() && self.is_supported(*kind))
            .collect()
    }

    /// The job tracker, or a configuration error when tracking is disabled.
    pub fn job_tracker(&self) -> OperationResult<&JobTracker> {
        self.inner
            .job_tracker
            .as_ref()
            .ok_or_else(|| OperationError::configuration("job tracking is not enabled for this executor"))
    }

    pub(crate) fn tracker_if_enabled(&self) -> Option<&JobTracker> {
        self.inner.job_tracker.as_ref()
    }

    pub fn cache(&self) -> OperationResult<&Arc<dyn CacheService>> {
        self.inner
            .config
            .cache()
            .ok_or_else(|| OperationError::configuration("no cache service is configured for this executor"))
    }

    pub(crate) fn submit(&self, task: JobTask) -> OperationResult<()> {
        self.inner.workers.submit(task)
    }

    /// Runs `operation` with a fresh context for `user`.
    pub async fn execute_as(&self, operation: &Operation, user: User) -> OperationResult<Value> {
        let mut context = Context::new(user);
        self.execute(operation, &mut context).await
    }

    /// Wraps `operation` in a `Job`, runs it through the pipeline and returns
    /// the scheduled job detail.
    pub async fn execute_job(&self, operation: Operation, context: &mut Context) -> OperationResult<JobDetail> {
        let detail = self.execute(&Operation::job(operation), context).await?;
        Ok(serde_json::from_value(detail)?)
    }

    pub async fn execute(&self, operation: &Operation, context: &mut Context) -> OperationResult<Value> {
        let config = &self.inner.config;
        if config.id().trim().is_empty() {
            return Err(OperationError::configuration(
                "executor config id must be set before operations are executed",
            ));
        }

        let depth = context.enter(operation);
        let result = if depth > MAX_OPERATION_DEPTH {
            Err(OperationError::RecursionLimit(MAX_OPERATION_DEPTH))
        } else {
            let span = OperationExecutionStarted {
                executor_id: config.id(),
                operation: operation.kind(),
                job_id: context.job_id(),
                depth,
            }
            .span("execute");
            self.run_pipeline(operation, context, depth).instrument(span).await
        };
        context.exit();
        result
    }

    async fn run_pipeline(
        &self,
        operation: &Operation,
        context: &mut Context,
        depth: usize,
    ) -> OperationResult<Value> {
        let config = &self.inner.config;
        let kind = operation.kind();
        let job_id = context.job_id().to_string();
        let started = Instant::now();

        OperationExecutionStarted {
            executor_id: config.id(),
            operation: kind,
            job_id: &job_id,
            depth,
        }
        .log();

        let hooks = config.hooks();
        let mut request = Request::new(operation, context, config.id());
        let mut ran = 0;
        let mut failure: Option<OperationError> = None;

        for hook in hooks {
            ran += 1;
            let outcome = hook.pre_execute(&mut request).await;
            if let Err(e) = outcome {
                log_hook_failure(hook.name(), HookPhase::PreExecute, kind, &e);
                failure = Some(e);
                break;
            }
        }

        let mut result = Value::Null;
        if failure.is_none() {
            match self.dispatch(operation, &mut *request.context).await {
                Ok(value) => {
                    result = value;
                    for hook in &hooks[..ran] {
                        let outcome = hook.post_execute(result, &mut request).await;
                        match outcome {
                            Ok(value) => result = value,
                            Err(e) => {
                                log_hook_failure(hook.name(), HookPhase::PostExecute, kind, &e);
                                result = Value::Null;
                                failure = Some(e);
                                break;
                            }
                        }
                    }
                }
                Err(e) => failure = Some(e),
            }
        }

        let Some(mut error) = failure else {
            OperationExecutionCompleted {
                executor_id: config.id(),
                operation: kind,
                job_id: &job_id,
                duration: started.elapsed(),
            }
            .log();
            return Ok(result);
        };

        request.clear_recovery();
        for hook in &hooks[..ran] {
            let outcome = hook.on_failure(result, &mut request, &error).await;
            match outcome {
                Ok(value) => result = value,
                Err(e) => {
                    log_hook_failure(hook.name(), HookPhase::OnFailure, kind, &e);
                    result = Value::Null;
                    error = e;
                }
            }
        }

        if request.is_recovered() {
            OperationRecovered {
                executor_id: config.id(),
                operation: kind,
                job_id: &job_id,
                error: &error,
            }
            .log();
            return Ok(result);
        }

        OperationExecutionFailed {
            executor_id: config.id(),
            operation: kind,
            job_id: &job_id,
            error: &error,
        }
        .log();
        Err(error)
    }

    async fn dispatch(&self, operation: &Operation, context: &mut Context) -> OperationResult<Value> {
        let kind = operation.kind();
        let (resolved_as, handler) = self
            .inner
            .config
            .handlers()
            .resolve(kind)
            .ok_or(OperationError::UnsupportedOperation(kind))?;
        let handler = handler.clone();

        HandlerResolved {
            operation: kind,
            resolved_as,
            handler: handler.name(),
        }
        .log();

        handler.do_operation(operation, context, self).await
    }
}

fn log_hook_failure(hook: &str, phase: HookPhase, operation: OperationKind, error: &OperationError) {
    HookFailed {
        hook,
        phase,
        operation,
        error,
    }
    .log();
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("config", &self.inner.config)
            .field("job_tracker", &self.inner.job_tracker)
            .field("workers", &self.inner.workers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecutorProperties;

    #[test]
    fn tracking_without_cache_is_rejected() {
        let config = Config::builder("exec")
            .properties(ExecutorProperties::default().with_job_tracker(true))
            .without_cache()
            .build();
        assert!(matches!(
            Executor::new(config),
            Err(OperationError::Configuration(_))
        ));
    }

    #[test]
    fn supported_operations_lists_concrete_kinds_only() {
        let executor = Executor::new(
            Config::builder("exec")
                .without_handler(OperationKind::Limit)
                .build(),
        )
        .unwrap();
        let supported = executor.supported_operations();
        assert!(supported.contains(&OperationKind::ToList));
        assert!(!supported.contains(&OperationKind::Limit));
        assert!(supported.iter().all(|k| !k.is_abstract()));
    }

    #[tokio::test]
    async fn empty_config_id_fails_fast() {
        let executor = Executor::new(Config::builder("  ").build()).unwrap();
        let err = executor
            .execute_as(&Operation::to_list(), User::new("u"))
            .await
            .unwrap_err();
        assert!(matches!(err, OperationError::Configuration(_)));
    }

    #[tokio::test]
    async fn job_tracker_accessor_reports_disabled_tracking() {
        let executor = Executor::new(Config::builder("exec").build()).unwrap();
        assert!(matches!(
            executor.job_tracker(),
            Err(OperationError::Configuration(_))
        ));
    }
}
