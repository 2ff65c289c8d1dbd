// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Handlers that reshape the value flowing through a chain.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;

use super::mismatched;
use crate::context::Context;
use crate::errors::{OperationError, OperationResult};
use crate::executor::Executor;
use crate::operation::{Operation, OperationKind};
use crate::traits::OperationHandler;

fn input_of(operation: &Operation) -> Value {
    operation.input().cloned().unwrap_or(Value::Null)
}

/// `Null` stays `Null`, arrays pass through and any other value becomes a
/// one element array.
fn into_array(input: Value) -> Value {
    match input {
        Value::Null | Value::Array(_) => input,
        other => Value::Array(vec![other]),
    }
}

pub struct ToListHandler;

#[async_trait]
impl OperationHandler for ToListHandler {
    async fn do_operation(
        &self,
        operation: &Operation,
        _context: &mut Context,
        _executor: &Executor,
    ) -> OperationResult<Value> {
        Ok(into_array(input_of(operation)))
    }

    fn name(&self) -> &'static str {
        "to_list"
    }
}

pub struct ToArrayHandler;

#[async_trait]
impl OperationHandler for ToArrayHandler {
    async fn do_operation(
        &self,
        operation: &Operation,
        _context: &mut Context,
        _executor: &Executor,
    ) -> OperationResult<Value> {
        Ok(into_array(input_of(operation)))
    }

    fn name(&self) -> &'static str {
        "to_array"
    }
}

/// Removes duplicates, keeping the first occurrence of each value.
pub struct ToSetHandler;

#[async_trait]
impl OperationHandler for ToSetHandler {
    async fn do_operation(
        &self,
        operation: &Operation,
        _context: &mut Context,
        _executor: &Executor,
    ) -> OperationResult<Value> {
        let Value::Array(items) = into_array(input_of(operation)) else {
            return Ok(Value::Null);
        };

        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(items.len());
        for item in items {
            if seen.insert(serde_json::to_string(&item)?) {
                unique.push(item);
            }
        }
        Ok(Value::Array(unique))
    }

    fn name(&self) -> &'static str {
        "to_set"
    }
}

pub struct ToSingletonListHandler;

#[async_trait]
impl OperationHandler for ToSingletonListHandler {
    async fn do_operation(
        &self,
        operation: &Operation,
        _context: &mut Context,
        _executor: &Executor,
    ) -> OperationResult<Value> {
        match input_of(operation) {
            Value::Null => Err(OperationError::invalid(
                OperationKind::ToSingletonList,
                "input cannot be null",
            )),
            input => Ok(Value::Array(vec![input])),
        }
    }

    fn name(&self) -> &'static str {
        "to_singleton_list"
    }
}

pub struct DiscardOutputHandler;

#[async_trait]
impl OperationHandler for DiscardOutputHandler {
    async fn do_operation(
        &self,
        _operation: &Operation,
        _context: &mut Context,
        _executor: &Executor,
    ) -> OperationResult<Value> {
        Ok(Value::Null)
    }

    fn name(&self) -> &'static str {
        "discard_output"
    }
}

/// Caps the number of items. Over the limit, the input is truncated when
/// `truncate` is set and rejected otherwise.
pub struct LimitHandler;

#[async_trait]
impl OperationHandler for LimitHandler {
    async fn do_operation(
        &self,
        operation: &Operation,
        _context: &mut Context,
        _executor: &Executor,
    ) -> OperationResult<Value> {
        let Operation::Limit(limit) = operation else {
            return Err(mismatched(OperationKind::Limit, operation));
        };

        let Value::Array(mut items) = into_array(input_of(operation)) else {
            return Ok(Value::Null);
        };

        if items.len() > limit.result_limit {
            if !limit.truncate {
                return Err(OperationError::invalid(
                    OperationKind::Limit,
                    format!("limit of {} exceeded", limit.result_limit),
                ));
            }
            items.truncate(limit.result_limit);
        }
        Ok(Value::Array(items))
    }

    fn name(&self) -> &'static str {
        "limit"
    }
}
