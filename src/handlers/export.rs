// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Result cache: values exported under `(job id, key)`.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::Value;

use super::mismatched;
use crate::context::Context;
use crate::errors::OperationResult;
use crate::executor::Executor;
use crate::operation::{Operation, OperationKind};
use crate::traits::OperationHandler;

pub const RESULT_CACHE_NAMESPACE: &str = "ResultCache";

/// Cache key for `(job_id, key)`. Both parts are encoded, so no pair of
/// ids can collide however they are spelled.
pub fn result_cache_key(job_id: &str, key: &str) -> String {
    format!("{}.{}", STANDARD.encode(job_id), STANDARD.encode(key))
}

/// Stores the input under the current job id and passes it on.
pub struct ExportToResultCacheHandler;

#[async_trait]
impl OperationHandler for ExportToResultCacheHandler {
    async fn do_operation(
        &self,
        operation: &Operation,
        context: &mut Context,
        executor: &Executor,
    ) -> OperationResult<Value> {
        let Operation::ExportToResultCache(export) = operation else {
            return Err(mismatched(OperationKind::ExportToResultCache, operation));
        };

        let input = export.input.clone().unwrap_or(Value::Null);
        let cache_key = result_cache_key(context.job_id(), export.key_or_default());
        executor
            .cache()?
            .put(RESULT_CACHE_NAMESPACE, &cache_key, input.clone())?;
        Ok(input)
    }

    fn name(&self) -> &'static str {
        "export_to_result_cache"
    }
}

/// Reads an exported value back as an array; absent exports are empty.
pub struct GetResultCacheExportHandler;

#[async_trait]
impl OperationHandler for GetResultCacheExportHandler {
    async fn do_operation(
        &self,
        operation: &Operation,
        _context: &mut Context,
        executor: &Executor,
    ) -> OperationResult<Value> {
        let Operation::GetResultCacheExport(get) = operation else {
            return Err(mismatched(OperationKind::GetResultCacheExport, operation));
        };

        let cache_key = result_cache_key(&get.job_id, get.key_or_default());
        let stored = executor.cache()?.get(RESULT_CACHE_NAMESPACE, &cache_key)?;
        Ok(match stored {
            None | Some(Value::Null) => Value::Array(Vec::new()),
            Some(Value::Array(items)) => Value::Array(items),
            Some(other) => Value::Array(vec![other]),
        })
    }

    fn name(&self) -> &'static str {
        "get_result_cache_export"
    }
}
