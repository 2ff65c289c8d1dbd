// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Built-in operation handlers and the factory that creates them by name.

pub mod chain;
pub mod export;
pub mod job;
pub mod named;
pub mod output;

use crate::errors::OperationError;
use crate::operation::{Operation, OperationKind};
use crate::traits::OperationHandler;
use std::sync::Arc;

pub use chain::OperationChainHandler;
pub use export::{ExportToResultCacheHandler, GetResultCacheExportHandler};
pub use job::{GetAllJobDetailsHandler, GetJobDetailsHandler, GetJobResultsHandler, JobHandler};
pub use named::{
    AddNamedOperationHandler, DeleteNamedOperationHandler, GetAllNamedOperationsHandler,
    NamedOperationDetail, NamedOperationHandler,
};
pub use output::{
    DiscardOutputHandler, LimitHandler, ToArrayHandler, ToListHandler, ToSetHandler,
    ToSingletonListHandler,
};

/// Error for a handler asked to run an operation it has no fields for.
pub(crate) fn mismatched(expected: OperationKind, operation: &Operation) -> OperationError {
    OperationError::invalid(
        expected,
        format!("handler cannot run a {} operation", operation.kind()),
    )
}

/// Factory for creating handler instances from declaration names
pub struct HandlerFactory;

impl HandlerFactory {
    /// Create a handler from its declared name
    ///
    /// Names are the snake_case form of the operation the handler was
    /// written for, e.g. "operation_chain", "to_set", "get_job_results".
    pub fn create_handler(name: &str) -> Result<Arc<dyn OperationHandler>, String> {
        match name {
            "operation_chain" => Ok(Arc::new(OperationChainHandler)),

            // Output conversions
            "to_list" => Ok(Arc::new(ToListHandler)),
            "to_set" => Ok(Arc::new(ToSetHandler)),
            "to_array" => Ok(Arc::new(ToArrayHandler)),
            "to_singleton_list" => Ok(Arc::new(ToSingletonListHandler)),
            "discard_output" => Ok(Arc::new(DiscardOutputHandler)),
            "limit" => Ok(Arc::new(LimitHandler)),

            // Jobs
            "job" => Ok(Arc::new(JobHandler)),
            "get_all_job_details" => Ok(Arc::new(GetAllJobDetailsHandler)),
            "get_job_details" => Ok(Arc::new(GetJobDetailsHandler)),
            "get_job_results" => Ok(Arc::new(GetJobResultsHandler)),

            // Result cache
            "export_to_result_cache" => Ok(Arc::new(ExportToResultCacheHandler)),
            "get_result_cache_export" => Ok(Arc::new(GetResultCacheExportHandler)),

            // Named operations
            "add_named_operation" => Ok(Arc::new(AddNamedOperationHandler)),
            "named_operation" => Ok(Arc::new(NamedOperationHandler)),
            "delete_named_operation" => Ok(Arc::new(DeleteNamedOperationHandler)),
            "get_all_named_operations" => Ok(Arc::new(GetAllNamedOperationsHandler)),

            _ => Err(format!("Unknown operation handler: '{}'", name)),
        }
    }

    /// Name of the built-in handler for a concrete kind
    pub fn default_handler_name(kind: OperationKind) -> Option<&'static str> {
        use OperationKind::*;
        match kind {
            OperationChain => Some("operation_chain"),
            ToList => Some("to_list"),
            ToSet => Some("to_set"),
            ToArray => Some("to_array"),
            ToSingletonList => Some("to_singleton_list"),
            DiscardOutput => Some("discard_output"),
            Limit => Some("limit"),
            Job => Some("job"),
            GetAllJobDetails => Some("get_all_job_details"),
            GetJobDetails => Some("get_job_details"),
            GetJobResults => Some("get_job_results"),
            ExportToResultCache => Some("export_to_result_cache"),
            GetResultCacheExport => Some("get_result_cache_export"),
            AddNamedOperation => Some("add_named_operation"),
            NamedOperation => Some("named_operation"),
            DeleteNamedOperation => Some("delete_named_operation"),
            GetAllNamedOperations => Some("get_all_named_operations"),
            Operation | Input | Output | InputOutput | Export | GetExport => None,
        }
    }

    pub fn default_handler(kind: OperationKind) -> Option<Arc<dyn OperationHandler>> {
        Self::default_handler_name(kind).and_then(|name| Self::create_handler(name).ok())
    }

    /// List all available handler implementations
    pub fn list_available_implementations() -> Vec<&'static str> {
        OperationKind::ALL
            .iter()
            .filter_map(|kind| Self::default_handler_name(*kind))
            .collect()
    }

    /// Check if an implementation is available
    pub fn is_implementation_available(name: &str) -> bool {
        Self::list_available_implementations().contains(&name)
    }
}
