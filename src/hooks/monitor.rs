// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::context::{ExecutionTrackingInfo, Request};
use crate::errors::{OperationError, OperationResult};
use crate::observability::messages::hook::ExecutionTracked;
use crate::observability::messages::StructuredLog;
use crate::traits::Hook;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingStage {
    Begin,
    End,
    Failure,
}

impl TrackingStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingStage::Begin => "begin",
            TrackingStage::End => "end",
            TrackingStage::Failure => "failure",
        }
    }
}

impl fmt::Display for TrackingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Destination for execution tracking records.
pub trait TrackingSink: Send + Sync {
    fn record(&self, stage: TrackingStage, info: &ExecutionTrackingInfo, error: Option<&OperationError>);
}

/// Emits each record as a structured `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TrackingSink for TracingSink {
    fn record(&self, stage: TrackingStage, info: &ExecutionTrackingInfo, error: Option<&OperationError>) {
        ExecutionTracked {
            info,
            stage: stage.as_str(),
            error,
        }
        .log();
    }
}

/// Records when each execution begins and ends.
///
/// `pre_execute` writes a fresh [`ExecutionTrackingInfo`] into the context;
/// `post_execute` and `on_failure` stamp its end time and restore it into the
/// context, since nested executions overwrite the slot in between. Results
/// pass through unchanged.
pub struct MonitorHook {
    sink: Arc<dyn TrackingSink>,
    in_flight: DashMap<(String, usize), ExecutionTrackingInfo>,
}

impl MonitorHook {
    pub fn new(sink: Arc<dyn TrackingSink>) -> Self {
        Self {
            sink,
            in_flight: DashMap::new(),
        }
    }

    /// Number of executions that have begun and not yet finished.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    fn finish(&self, stage: TrackingStage, request: &mut Request<'_>, error: Option<&OperationError>) {
        let key = (request.context.job_id().to_string(), request.context.depth());
        let Some((_, mut info)) = self.in_flight.remove(&key) else {
            return;
        };
        info.time_end = Some(Utc::now());
        self.sink.record(stage, &info, error);
        request.context.set_tracking(info);
    }
}

impl Default for MonitorHook {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}

#[async_trait]
impl Hook for MonitorHook {
    fn name(&self) -> &str {
        "MonitorHook"
    }

    async fn pre_execute(&self, request: &mut Request<'_>) -> OperationResult<()> {
        let context = &*request.context;
        let info = ExecutionTrackingInfo {
            operation: request.operation.kind(),
            time_begin: Utc::now(),
            time_end: None,
            job_id: context.job_id().to_string(),
            parent_job_id: context.parent_job_id().map(String::from),
            executor_id: request.executor_id().to_string(),
            user_id: context.user().user_id().to_string(),
        };
        let key = (info.job_id.clone(), context.depth());

        self.sink.record(TrackingStage::Begin, &info, None);
        self.in_flight.insert(key, info.clone());
        request.context.set_tracking(info);
        Ok(())
    }

    async fn post_execute(&self, result: Value, request: &mut Request<'_>) -> OperationResult<Value> {
        self.finish(TrackingStage::End, request, None);
        Ok(result)
    }

    async fn on_failure(
        &self,
        result: Value,
        request: &mut Request<'_>,
        error: &OperationError,
    ) -> OperationResult<Value> {
        self.finish(TrackingStage::Failure, request, Some(error));
        Ok(result)
    }
}
