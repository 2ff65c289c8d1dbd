// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::HandlerRegistry;
use crate::cache::{CacheService, CacheServiceLoader};
use crate::config::consts::CACHE_SERVICE_CLASS;
use crate::config::{ExecutorProperties, OperationDeclarations};
use crate::errors::ConfigError;
use crate::hooks::{HookFactory, OperationAuthoriser};
use crate::operation::OperationKind;
use crate::traits::{Hook, OperationHandler};
use std::sync::Arc;

/// Everything one executor needs: its id, handlers, hooks, properties and
/// cache. Read-only once the executor owns it.
#[derive(Clone)]
pub struct Config {
    id: String,
    handlers: HandlerRegistry,
    hooks: Vec<Arc<dyn Hook>>,
    properties: ExecutorProperties,
    cache: Option<Arc<dyn CacheService>>,
}

impl Config {
    pub fn builder(id: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder::new(id)
    }

    /// Builds a config the way the binary does: default handlers overlaid
    /// with declared ones, the configured cache backend, an authoriser hook
    /// when a path is set, then the named hooks in order.
    pub fn from_properties(id: impl Into<String>, properties: ExecutorProperties) -> Result<Self, ConfigError> {
        let mut handlers = HandlerRegistry::with_defaults();
        if !properties.operation_declarations.is_empty() {
            let declarations = OperationDeclarations::from_paths(&properties.operation_declarations)?;
            handlers.apply_declarations(&declarations)?;
        }

        let cache = CacheServiceLoader::load(&properties.cache_service).map_err(|_| {
            ConfigError::InvalidProperty {
                key: CACHE_SERVICE_CLASS.to_string(),
                value: properties.cache_service.clone(),
            }
        })?;

        let mut hooks: Vec<Arc<dyn Hook>> = Vec::new();
        if let Some(path) = properties.authoriser_path.as_deref() {
            hooks.push(Arc::new(OperationAuthoriser::from_path(path)?));
        }
        for name in &properties.hooks {
            let hook = HookFactory::create_hook(name)
                .map_err(|_| ConfigError::UnknownHook { hook: name.clone() })?;
            hooks.push(hook);
        }

        Ok(Self {
            id: id.into(),
            handlers,
            hooks,
            properties,
            cache: Some(cache),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    pub fn hooks(&self) -> &[Arc<dyn Hook>] {
        &self.hooks
    }

    pub fn properties(&self) -> &ExecutorProperties {
        &self.properties
    }

    pub fn cache(&self) -> Option<&Arc<dyn CacheService>> {
        self.cache.as_ref()
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("id", &self.id)
            .field("handlers", &self.handlers)
            .field("hooks", &self.hooks.iter().map(|h| h.name().to_string()).collect::<Vec<_>>())
            .field("properties", &self.properties)
            .field("cache", &self.cache.as_ref().map(|c| c.name()))
            .finish()
    }
}

pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Starts from the built-in handlers, an in-memory cache and default
    /// properties.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            config: Config {
                id: id.into(),
                handlers: HandlerRegistry::with_defaults(),
                hooks: Vec::new(),
                properties: ExecutorProperties::default(),
                cache: Some(Arc::new(crate::cache::HashMapCacheService::new())),
            },
        }
    }

    pub fn handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.config.handlers = handlers;
        self
    }

    pub fn handler(mut self, kind: OperationKind, handler: Arc<dyn OperationHandler>) -> Self {
        self.config.handlers.insert(kind, handler);
        self
    }

    pub fn without_handler(mut self, kind: OperationKind) -> Self {
        self.config.handlers.remove(kind);
        self
    }

    /// Appends a hook; hooks run in the order they are added.
    pub fn hook(mut self, hook: Arc<dyn Hook>) -> Self {
        self.config.hooks.push(hook);
        self
    }

    pub fn properties(mut self, properties: ExecutorProperties) -> Self {
        self.config.properties = properties;
        self
    }

    pub fn cache(mut self, cache: Arc<dyn CacheService>) -> Self {
        self.config.cache = Some(cache);
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.config.cache = None;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_starts_with_defaults() {
        let config = Config::builder("exec").build();
        assert_eq!(config.id(), "exec");
        assert!(config.handlers().is_supported(OperationKind::OperationChain));
        assert!(config.hooks().is_empty());
        assert_eq!(config.cache().map(|c| c.name()), Some("hash_map"));
    }

    #[test]
    fn builder_can_drop_handlers_and_cache() {
        let config = Config::builder("exec")
            .without_handler(OperationKind::GetResultCacheExport)
            .without_cache()
            .build();
        assert!(!config.handlers().is_supported(OperationKind::GetResultCacheExport));
        assert!(config.cache().is_none());
    }

    #[test]
    fn from_properties_rejects_unknown_cache_backend() {
        let properties = ExecutorProperties {
            cache_service: "memcached".to_string(),
            ..ExecutorProperties::default()
        };
        let err = Config::from_properties("exec", properties).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidProperty { ref key, .. } if key == CACHE_SERVICE_CLASS));
    }
}
