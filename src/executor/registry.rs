// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::OperationDeclarations;
use crate::errors::ConfigError;
use crate::handlers::HandlerFactory;
use crate::operation::OperationKind;
use crate::traits::OperationHandler;
use std::collections::HashMap;
use std::sync::Arc;

/// Newtype wrapper mapping operation kinds to their handlers.
#[derive(Clone, Default)]
pub struct HandlerRegistry(HashMap<OperationKind, Arc<dyn OperationHandler>>);

impl HandlerRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Registry with the built-in handler for every concrete kind.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for kind in OperationKind::ALL.iter().copied().filter(|k| !k.is_abstract()) {
            if let Some(handler) = HandlerFactory::default_handler(kind) {
                registry.insert(kind, handler);
            }
        }
        registry
    }

    /// Overlays declared bindings onto `self`.
    pub fn apply_declarations(&mut self, declarations: &OperationDeclarations) -> Result<(), ConfigError> {
        for (kind, handler_name) in declarations.resolve()? {
            let handler = HandlerFactory::create_handler(&handler_name).map_err(|_| {
                ConfigError::UnknownHandler {
                    operation: kind.to_string(),
                    handler: handler_name.clone(),
                }
            })?;
            self.insert(kind, handler);
        }
        Ok(())
    }

    pub fn insert(&mut self, kind: OperationKind, handler: Arc<dyn OperationHandler>) {
        self.0.insert(kind, handler);
    }

    pub fn remove(&mut self, kind: OperationKind) -> Option<Arc<dyn OperationHandler>> {
        self.0.remove(&kind)
    }

    pub fn get(&self, kind: OperationKind) -> Option<&Arc<dyn OperationHandler>> {
        self.0.get(&kind)
    }

    /// Exact kind first, then declared supertypes most specific first.
    /// Returns the kind the handler was registered under.
    pub fn resolve(&self, kind: OperationKind) -> Option<(OperationKind, &Arc<dyn OperationHandler>)> {
        kind.lookup_order()
            .find_map(|candidate| self.0.get(&candidate).map(|handler| (candidate, handler)))
    }

    pub fn is_supported(&self, kind: OperationKind) -> bool {
        self.resolve(kind).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn kinds(&self) -> impl Iterator<Item = &OperationKind> {
        self.0.keys()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.0.keys().map(|k| k.name()).collect();
        kinds.sort_unstable();
        f.debug_struct("HandlerRegistry")
            .field("handler_count", &self.0.len())
            .field("operations", &kinds)
            .finish()
    }
}

impl From<HashMap<OperationKind, Arc<dyn OperationHandler>>> for HandlerRegistry {
    fn from(map: HashMap<OperationKind, Arc<dyn OperationHandler>>) -> Self {
        Self(map)
    }
}
