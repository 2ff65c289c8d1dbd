// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Named operations: parameterised chains stored in the cache service and
//! run by name.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::mismatched;
use crate::context::Context;
use crate::errors::{OperationError, OperationResult};
use crate::executor::Executor;
use crate::operation::{
    substitute_parameters, Operation, OperationChain, OperationKind, ParameterDetail,
};
use crate::traits::OperationHandler;

pub const NAMED_OPERATION_NAMESPACE: &str = "NamedOperation";

/// A stored named operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedOperationDetail {
    pub operation_name: String,
    pub operation_chain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub creator_id: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,
}

fn load_detail(executor: &Executor, name: &str) -> OperationResult<Option<NamedOperationDetail>> {
    match executor.cache()?.get(NAMED_OPERATION_NAMESPACE, name)? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

fn not_found(kind: OperationKind, name: &str) -> OperationError {
    OperationError::invalid(kind, format!("no named operation called '{}'", name))
}

pub struct AddNamedOperationHandler;

#[async_trait]
impl OperationHandler for AddNamedOperationHandler {
    async fn do_operation(
        &self,
        operation: &Operation,
        context: &mut Context,
        executor: &Executor,
    ) -> OperationResult<Value> {
        let Operation::AddNamedOperation(add) = operation else {
            return Err(mismatched(OperationKind::AddNamedOperation, operation));
        };

        if add.operation_name.trim().is_empty() {
            return Err(OperationError::invalid(
                OperationKind::AddNamedOperation,
                "operation name cannot be empty",
            ));
        }
        add.embedded_kinds()?;

        let detail = NamedOperationDetail {
            operation_name: add.operation_name.clone(),
            operation_chain: add.operation_chain.clone(),
            description: add.description.clone(),
            creator_id: context.user().user_id().to_string(),
            parameters: add.parameters.clone(),
            score: add.score,
        };
        let value = serde_json::to_value(&detail)?;
        let cache = executor.cache()?;

        if add.overwrite {
            cache.put(NAMED_OPERATION_NAMESPACE, &add.operation_name, value)?;
        } else if !cache.put_if_absent(NAMED_OPERATION_NAMESPACE, &add.operation_name, value)? {
            return Err(OperationError::invalid(
                OperationKind::AddNamedOperation,
                format!(
                    "named operation '{}' already exists and overwrite is not set",
                    add.operation_name
                ),
            ));
        }
        Ok(Value::Null)
    }

    fn name(&self) -> &'static str {
        "add_named_operation"
    }
}

/// Substitutes parameters into the stored chain and runs it through the
/// executor, so hooks see every operation of its body.
pub struct NamedOperationHandler;

#[async_trait]
impl OperationHandler for NamedOperationHandler {
    async fn do_operation(
        &self,
        operation: &Operation,
        context: &mut Context,
        executor: &Executor,
    ) -> OperationResult<Value> {
        let Operation::NamedOperation(named) = operation else {
            return Err(mismatched(OperationKind::NamedOperation, operation));
        };

        let detail = load_detail(executor, &named.operation_name)?
            .ok_or_else(|| not_found(OperationKind::NamedOperation, &named.operation_name))?;
        let text = substitute_parameters(&detail.operation_chain, &detail.parameters, &named.parameters)?;
        let mut chain: OperationChain = serde_json::from_str(&text).map_err(|e| {
            OperationError::invalid(
                OperationKind::NamedOperation,
                format!("'{}' does not resolve to a chain: {}", named.operation_name, e),
            )
        })?;
        if chain.input.is_none() {
            chain.input = named.input.clone();
        }

        executor.execute(&Operation::OperationChain(chain), context).await
    }

    fn name(&self) -> &'static str {
        "named_operation"
    }
}

/// Deletes a named operation. Only its creator or a holder of the admin
/// auth may do so.
pub struct DeleteNamedOperationHandler;

#[async_trait]
impl OperationHandler for DeleteNamedOperationHandler {
    async fn do_operation(
        &self,
        operation: &Operation,
        context: &mut Context,
        executor: &Executor,
    ) -> OperationResult<Value> {
        let Operation::DeleteNamedOperation(delete) = operation else {
            return Err(mismatched(OperationKind::DeleteNamedOperation, operation));
        };

        let detail = load_detail(executor, &delete.operation_name)?
            .ok_or_else(|| not_found(OperationKind::DeleteNamedOperation, &delete.operation_name))?;

        let user = context.user();
        let admin_auth = executor.config().properties().admin_auth();
        let is_admin = admin_auth.map_or(false, |auth| user.has_auth(auth));
        if detail.creator_id != user.user_id() && !is_admin {
            return Err(OperationError::Unauthorised {
                user_id: user.user_id().to_string(),
                operation: OperationKind::DeleteNamedOperation,
                missing: admin_auth.map(String::from).into_iter().collect(),
            });
        }

        executor
            .cache()?
            .remove(NAMED_OPERATION_NAMESPACE, &delete.operation_name)?;
        Ok(Value::Null)
    }

    fn name(&self) -> &'static str {
        "delete_named_operation"
    }
}

/// Lists stored named operations ordered by name.
pub struct GetAllNamedOperationsHandler;

#[async_trait]
impl OperationHandler for GetAllNamedOperationsHandler {
    async fn do_operation(
        &self,
        _operation: &Operation,
        _context: &mut Context,
        executor: &Executor,
    ) -> OperationResult<Value> {
        let mut details = Vec::new();
        for name in executor.cache()?.keys(NAMED_OPERATION_NAMESPACE)? {
            if let Some(detail) = load_detail(executor, &name)? {
                details.push(detail);
            }
        }
        Ok(serde_json::to_value(details)?)
    }

    fn name(&self) -> &'static str {
        "get_all_named_operations"
    }
}
