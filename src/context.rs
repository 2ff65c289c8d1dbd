// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Request-scoped state: the calling user, the job identity and the
//! tracking slot written by hooks.

use crate::operation::{Operation, OperationKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Identity of the caller together with the operation auths they hold.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    user_id: String,
    #[serde(default)]
    op_auths: BTreeSet<String>,
}

impl User {
    pub const UNKNOWN_USER_ID: &'static str = "UNKNOWN";

    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            op_auths: BTreeSet::new(),
        }
    }

    pub fn builder(user_id: impl Into<String>) -> UserBuilder {
        UserBuilder {
            user: Self::new(user_id),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn op_auths(&self) -> &BTreeSet<String> {
        &self.op_auths
    }

    pub fn has_auth(&self, auth: &str) -> bool {
        self.op_auths.contains(auth)
    }
}

pub struct UserBuilder {
    user: User,
}

impl UserBuilder {
    pub fn op_auth(mut self, auth: impl Into<String>) -> Self {
        self.user.op_auths.insert(auth.into());
        self
    }

    pub fn op_auths<I, S>(mut self, auths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.user.op_auths.extend(auths.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> User {
        self.user
    }
}

/// Snapshot of one execution, written into the context by the monitor hook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionTrackingInfo {
    pub operation: OperationKind,
    pub time_begin: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_end: Option<DateTime<Utc>>,
    pub job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_job_id: Option<String>,
    pub executor_id: String,
    pub user_id: String,
}

/// State shared by every nested execution of one top-level request.
///
/// The job id is fixed at construction. Nested handlers and hooks receive the
/// same context by `&mut`, so anything a hook writes is visible to the rest of
/// the request.
#[derive(Debug, Clone)]
pub struct Context {
    job_id: String,
    parent_job_id: Option<String>,
    user: User,
    tracking: Option<ExecutionTrackingInfo>,
    original_operation: Option<Operation>,
    depth: usize,
}

impl Context {
    /// Fresh context with a generated job id.
    pub fn new(user: User) -> Self {
        Self::for_job(Uuid::new_v4().to_string(), None, user)
    }

    pub fn for_job(job_id: impl Into<String>, parent_job_id: Option<String>, user: User) -> Self {
        Self {
            job_id: job_id.into(),
            parent_job_id,
            user,
            tracking: None,
            original_operation: None,
            depth: 0,
        }
    }

    /// Context for a detached job submitted from this request.
    pub fn child(&self, job_id: impl Into<String>) -> Self {
        Self::for_job(job_id, Some(self.job_id.clone()), self.user.clone())
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn parent_job_id(&self) -> Option<&str> {
        self.parent_job_id.as_deref()
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn tracking(&self) -> Option<&ExecutionTrackingInfo> {
        self.tracking.as_ref()
    }

    pub fn tracking_mut(&mut self) -> Option<&mut ExecutionTrackingInfo> {
        self.tracking.as_mut()
    }

    pub fn set_tracking(&mut self, info: ExecutionTrackingInfo) {
        self.tracking = Some(info);
    }

    /// The operation the request started with.
    pub fn original_operation(&self) -> Option<&Operation> {
        self.original_operation.as_ref()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Called by the executor on entry; records the top-level operation.
    pub(crate) fn enter(&mut self, operation: &Operation) -> usize {
        if self.depth == 0 && self.original_operation.is_none() {
            self.original_operation = Some(operation.clone());
        }
        self.depth += 1;
        self.depth
    }

    pub(crate) fn exit(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

/// One execution as seen by hooks: the operation, the shared context and
/// the id of the executor running it.
pub struct Request<'a> {
    pub operation: &'a Operation,
    pub context: &'a mut Context,
    executor_id: &'a str,
    recovered: bool,
}

impl<'a> Request<'a> {
    pub fn new(operation: &'a Operation, context: &'a mut Context, executor_id: &'a str) -> Self {
        Self {
            operation,
            context,
            executor_id,
            recovered: false,
        }
    }

    pub fn executor_id(&self) -> &str {
        self.executor_id
    }

    /// Marks the failure as handled. Only meaningful inside `on_failure`:
    /// the executor then returns the running result instead of the error.
    pub fn recover(&mut self) {
        self.recovered = true;
    }

    pub fn is_recovered(&self) -> bool {
        self.recovered
    }

    pub(crate) fn clear_recovery(&mut self) {
        self.recovered = false;
    }
}
