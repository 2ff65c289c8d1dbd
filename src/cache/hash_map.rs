// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::CacheService;
use crate::errors::OperationResult;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;

/// In-memory cache: one concurrent map per namespace.
#[derive(Debug, Default)]
pub struct HashMapCacheService {
    namespaces: DashMap<String, DashMap<String, Value>>,
}

impl HashMapCacheService {
    pub const NAME: &'static str = "hash_map";

    pub fn new() -> Self {
        Self::default()
    }

    fn namespace(&self, namespace: &str) -> dashmap::mapref::one::Ref<'_, String, DashMap<String, Value>> {
        if let Some(existing) = self.namespaces.get(namespace) {
            return existing;
        }
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .downgrade()
    }
}

impl CacheService for HashMapCacheService {
    fn put(&self, namespace: &str, key: &str, value: Value) -> OperationResult<()> {
        self.namespace(namespace).insert(key.to_string(), value);
        Ok(())
    }

    fn put_if_absent(&self, namespace: &str, key: &str, value: Value) -> OperationResult<bool> {
        let ns = self.namespace(namespace);
        let stored = match ns.entry(key.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        };
        Ok(stored)
    }

    fn get(&self, namespace: &str, key: &str) -> OperationResult<Option<Value>> {
        Ok(self
            .namespaces
            .get(namespace)
            .and_then(|ns| ns.get(key).map(|v| v.value().clone())))
    }

    fn remove(&self, namespace: &str, key: &str) -> OperationResult<Option<Value>> {
        Ok(self
            .namespaces
            .get(namespace)
            .and_then(|ns| ns.remove(key).map(|(_, v)| v)))
    }

    fn keys(&self, namespace: &str) -> OperationResult<Vec<String>> {
        let mut keys: Vec<String> = self
            .namespaces
            .get(namespace)
            .map(|ns| ns.iter().map(|entry| entry.key().clone()).collect())
            .unwrap_or_default();
        keys.sort();
        Ok(keys)
    }

    fn clear(&self, namespace: &str) -> OperationResult<()> {
        if let Some(ns) = self.namespaces.get(namespace) {
            ns.clear();
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn namespaces_are_isolated() {
        let cache = HashMapCacheService::new();
        cache.put("a", "k", json!(1)).unwrap();
        cache.put("b", "k", json!(2)).unwrap();

        assert_eq!(cache.get("a", "k").unwrap(), Some(json!(1)));
        assert_eq!(cache.get("b", "k").unwrap(), Some(json!(2)));
        assert_eq!(cache.get("c", "k").unwrap(), None);
    }

    #[test]
    fn put_if_absent_keeps_first_value() {
        let cache = HashMapCacheService::new();
        assert!(cache.put_if_absent("ns", "k", json!("first")).unwrap());
        assert!(!cache.put_if_absent("ns", "k", json!("second")).unwrap());
        assert_eq!(cache.get("ns", "k").unwrap(), Some(json!("first")));
    }

    #[test]
    fn remove_keys_and_clear() {
        let cache = HashMapCacheService::new();
        cache.put("ns", "b", json!(2)).unwrap();
        cache.put("ns", "a", json!(1)).unwrap();
        assert_eq!(cache.keys("ns").unwrap(), vec!["a", "b"]);

        assert_eq!(cache.remove("ns", "a").unwrap(), Some(json!(1)));
        assert_eq!(cache.remove("ns", "a").unwrap(), None);

        cache.clear("ns").unwrap();
        assert!(cache.keys("ns").unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_writers_do_not_lose_entries() {
        let cache = Arc::new(HashMapCacheService::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache.put("ns", &format!("key-{}", i), json!(i)).unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(cache.keys("ns").unwrap().len(), 16);
    }
}
