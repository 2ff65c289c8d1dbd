// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;

use crate::context::Context;
use crate::errors::OperationResult;
use crate::executor::Executor;
use crate::operation::Operation;

/// Executes operations of the kinds it is registered for.
///
/// Handlers that run nested operations (chains, jobs, named operations) call
/// back into `executor.execute_nested` with the same context, so hooks and
/// handler resolution apply at every level.
#[async_trait]
pub trait OperationHandler: Send + Sync {
    async fn do_operation(
        &self,
        operation: &Operation,
        context: &mut Context,
        executor: &Executor,
    ) -> OperationResult<Value>;

    fn name(&self) -> &'static str;
}
