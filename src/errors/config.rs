// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

/// Errors raised while loading executor properties, operation declarations
/// and authoriser definitions.
#[derive(Debug)]
pub enum ConfigError {
    /// A configuration file could not be read
    Io {
        /// Path of the file that failed to load
        path: String,
        /// Underlying I/O error
        source: std::io::Error,
    },
    /// A configuration file could not be parsed
    Parse {
        /// Path (or description) of the document that failed to parse
        path: String,
        /// Parser message
        reason: String,
    },
    /// A flat property carried a value of the wrong shape
    InvalidProperty {
        /// The property key
        key: String,
        /// The rejected value
        value: String,
    },
    /// An operation declaration names a handler the factory does not know
    UnknownHandler {
        /// The operation kind being declared
        operation: String,
        /// The unknown handler name
        handler: String,
    },
    /// An operation declaration names an unknown operation kind
    UnknownOperation {
        /// The unknown operation kind
        operation: String,
    },
    /// The hooks property names a hook the factory does not know
    UnknownHook {
        /// The unknown hook name
        hook: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "Failed to read configuration file '{}': {}", path, source)
            }
            ConfigError::Parse { path, reason } => {
                write!(f, "Failed to parse configuration '{}': {}", path, reason)
            }
            ConfigError::InvalidProperty { key, value } => {
                write!(f, "Invalid value '{}' for property '{}'", value, key)
            }
            ConfigError::UnknownHandler { operation, handler } => {
                write!(
                    f,
                    "Operation '{}' is declared with unknown handler '{}'",
                    operation, handler
                )
            }
            ConfigError::UnknownOperation { operation } => {
                write!(f, "Unknown operation kind '{}' in declaration", operation)
            }
            ConfigError::UnknownHook { hook } => {
                write!(f, "Unknown hook '{}' in hooks property", hook)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
