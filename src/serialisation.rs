// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Wire representation of operations.

use crate::config::SerialiserProperties;
use crate::errors::{OperationError, OperationResult};
use crate::operation::Operation;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SerialisationFormat {
    #[default]
    Json,
    Yaml,
}

impl FromStr for SerialisationFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(SerialisationFormat::Json),
            "yaml" | "yml" => Ok(SerialisationFormat::Yaml),
            other => Err(format!("Unknown serialisation format: '{}'", other)),
        }
    }
}

/// Reads and writes operations in JSON or YAML.
///
/// In strict mode a document is rejected when it carries a field that the
/// operation model would drop on the way in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OperationSerialiser {
    format: SerialisationFormat,
    strict: bool,
}

impl OperationSerialiser {
    pub fn new(format: SerialisationFormat, strict: bool) -> Self {
        Self { format, strict }
    }

    pub fn from_properties(properties: &SerialiserProperties) -> Self {
        Self::new(properties.format, properties.strict)
    }

    pub fn format(&self) -> SerialisationFormat {
        self.format
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn serialise(&self, operation: &Operation) -> OperationResult<String> {
        match self.format {
            SerialisationFormat::Json => Ok(serde_json::to_string(operation)?),
            SerialisationFormat::Yaml => Ok(serde_yaml::to_string(operation)?),
        }
    }

    pub fn deserialise(&self, content: &str) -> OperationResult<Operation> {
        let document: Value = match self.format {
            SerialisationFormat::Json => serde_json::from_str(content)?,
            SerialisationFormat::Yaml => serde_yaml::from_str(content)?,
        };
        let operation: Operation = serde_json::from_value(document.clone())?;

        if self.strict {
            let canonical = serde_json::to_value(&operation)?;
            if let Some(path) = first_unknown_field(&document, &canonical, String::new()) {
                return Err(OperationError::Serialisation(format!(
                    "unknown field '{}'",
                    path
                )));
            }
        }

        Ok(operation)
    }
}

/// Path of the first non-null field present in `input` but absent from
/// `canonical`.
fn first_unknown_field(input: &Value, canonical: &Value, path: String) -> Option<String> {
    match (input, canonical) {
        (Value::Object(given), Value::Object(kept)) => given.iter().find_map(|(key, value)| {
            let field = if path.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", path, key)
            };
            match kept.get(key) {
                Some(kept_value) => first_unknown_field(value, kept_value, field),
                None if value.is_null() => None,
                None => Some(field),
            }
        }),
        (Value::Array(given), Value::Array(kept)) => given
            .iter()
            .zip(kept.iter())
            .enumerate()
            .find_map(|(i, (g, k))| first_unknown_field(g, k, format!("{}[{}]", path, i))),
        _ => None,
    }
}
