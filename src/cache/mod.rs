// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Namespaced key/value store shared by the job tracker, the result cache
//! and the named operation store.

mod hash_map;

pub use hash_map::HashMapCacheService;

use crate::errors::{OperationError, OperationResult};
use serde_json::Value;
use std::sync::Arc;

/// Cache contract keyed by `(namespace, key)`.
///
/// Implementations must be safe to share between the caller's task and the
/// job workers.
pub trait CacheService: Send + Sync {
    fn put(&self, namespace: &str, key: &str, value: Value) -> OperationResult<()>;

    /// Stores the value only if the key is free. Returns true if it was stored.
    fn put_if_absent(&self, namespace: &str, key: &str, value: Value) -> OperationResult<bool>;

    fn get(&self, namespace: &str, key: &str) -> OperationResult<Option<Value>>;

    fn remove(&self, namespace: &str, key: &str) -> OperationResult<Option<Value>>;

    fn keys(&self, namespace: &str) -> OperationResult<Vec<String>>;

    fn clear(&self, namespace: &str) -> OperationResult<()>;

    fn name(&self) -> &'static str;
}

/// Selects a cache backend by configured name.
pub struct CacheServiceLoader;

impl CacheServiceLoader {
    pub fn load(name: &str) -> OperationResult<Arc<dyn CacheService>> {
        match name {
            HashMapCacheService::NAME => Ok(Arc::new(HashMapCacheService::new())),
            _ => Err(OperationError::Cache(format!(
                "Unknown cache service '{}', available: {:?}",
                name,
                Self::list_available_services()
            ))),
        }
    }

    pub fn list_available_services() -> Vec<&'static str> {
        vec![HashMapCacheService::NAME]
    }

    pub fn is_service_available(name: &str) -> bool {
        Self::list_available_services().contains(&name)
    }
}
