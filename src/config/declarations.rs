// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::ConfigError;
use crate::handlers::HandlerFactory;
use crate::operation::OperationKind;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Binding of one operation kind to a named handler implementation.
///
/// # Example
/// ```yaml
/// operations:
///   - operation: ToSet
///     handler: to_set
///   - operation: InputOutput
///     handler: to_list
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OperationDeclaration {
    pub operation: String,
    pub handler: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct OperationDeclarations {
    #[serde(default)]
    pub operations: Vec<OperationDeclaration>,
}

impl OperationDeclarations {
    pub fn from_yaml_str(content: &str, source: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
            path: source.to_string(),
            reason: e.to_string(),
        })
    }

    /// Loads and concatenates declaration files in order; later files win
    /// when they bind the same kind.
    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Self, ConfigError> {
        let mut all = Self::default();
        for path in paths {
            all.operations.extend(load_declarations(path)?.operations);
        }
        Ok(all)
    }

    /// Checks every kind and handler name, returning the parsed bindings.
    pub fn resolve(&self) -> Result<Vec<(OperationKind, String)>, ConfigError> {
        self.operations
            .iter()
            .map(|decl| {
                let kind = decl
                    .operation
                    .parse::<OperationKind>()
                    .map_err(|_| ConfigError::UnknownOperation {
                        operation: decl.operation.clone(),
                    })?;
                if !HandlerFactory::is_implementation_available(&decl.handler) {
                    return Err(ConfigError::UnknownHandler {
                        operation: decl.operation.clone(),
                        handler: decl.handler.clone(),
                    });
                }
                Ok((kind, decl.handler.clone()))
            })
            .collect()
    }
}

/// Load operation declarations from a YAML file
pub fn load_declarations<P: AsRef<Path>>(path: P) -> Result<OperationDeclarations, ConfigError> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: display.clone(),
        source,
    })?;
    OperationDeclarations::from_yaml_str(&content, &display)
}
