// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;

use crate::context::Request;
use crate::errors::{OperationError, OperationResult};

/// Cross-cutting logic run around every execution.
///
/// The executor calls `pre_execute` on hooks in registration order. Only the
/// hooks whose `pre_execute` ran see `post_execute` (on success) or
/// `on_failure` (on any failure). Both may replace the running result.
/// An `on_failure` hook can call [`Request::recover`] to turn the failure
/// into a successful return of the running result.
#[async_trait]
pub trait Hook: Send + Sync {
    fn name(&self) -> &str;

    async fn pre_execute(&self, _request: &mut Request<'_>) -> OperationResult<()> {
        Ok(())
    }

    async fn post_execute(&self, result: Value, _request: &mut Request<'_>) -> OperationResult<Value> {
        Ok(result)
    }

    async fn on_failure(
        &self,
        result: Value,
        _request: &mut Request<'_>,
        _error: &OperationError,
    ) -> OperationResult<Value> {
        Ok(result)
    }
}
