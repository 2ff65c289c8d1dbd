// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;

use super::mismatched;
use crate::context::Context;
use crate::errors::OperationResult;
use crate::executor::Executor;
use crate::operation::{Operation, OperationKind};
use crate::traits::OperationHandler;

/// Runs chain steps in order through the executor.
///
/// The chain's input goes to the first step, and each step's output goes to
/// the next. A step that already carries its own input keeps it. `Null` is
/// passed on like any other value.
pub struct OperationChainHandler;

#[async_trait]
impl OperationHandler for OperationChainHandler {
    async fn do_operation(
        &self,
        operation: &Operation,
        context: &mut Context,
        executor: &Executor,
    ) -> OperationResult<Value> {
        let Operation::OperationChain(chain) = operation else {
            return Err(mismatched(OperationKind::OperationChain, operation));
        };

        let mut carried = chain.input.clone();
        for step in &chain.operations {
            let mut step = step.clone();
            if let Some(value) = carried.take() {
                step.offer_input(value);
            }
            carried = Some(executor.execute(&step, context).await?);
        }

        match carried {
            Some(value) if !chain.is_empty() => Ok(value),
            _ => Ok(Value::Null),
        }
    }

    fn name(&self) -> &'static str {
        "operation_chain"
    }
}
