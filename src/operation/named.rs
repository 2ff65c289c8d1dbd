// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Parameter declarations and `${name}` substitution for named operations.

use super::OperationKind;
use crate::errors::{OperationError, OperationResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Declared parameter of a named operation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default)]
    pub required: bool,
}

/// JSON-escaped text of a value, without surrounding quotes, for use inside
/// an existing string literal.
fn inline_text(value: &Value) -> OperationResult<String> {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let quoted = serde_json::to_string(&text)?;
    Ok(quoted[1..quoted.len() - 1].to_string())
}

/// Replaces every `${name}` placeholder of `chain` with the provided value,
/// falling back to the declared default.
///
/// A placeholder that makes up a whole JSON string (`"${limit}"`) is replaced
/// by the value's JSON form, so numbers and objects keep their type. A
/// placeholder embedded in a longer string is replaced by the value's text.
///
/// Fails when a provided parameter is not declared, or when a required
/// parameter has neither a provided value nor a default.
pub fn substitute_parameters(
    chain: &str,
    declared: &BTreeMap<String, ParameterDetail>,
    provided: &BTreeMap<String, Value>,
) -> OperationResult<String> {
    if let Some(unknown) = provided.keys().find(|name| !declared.contains_key(*name)) {
        return Err(OperationError::invalid(
            OperationKind::NamedOperation,
            format!("unexpected parameter '{}'", unknown),
        ));
    }

    let mut values = BTreeMap::new();
    for (name, detail) in declared {
        let value = match provided.get(name).or(detail.default_value.as_ref()) {
            Some(value) => value.clone(),
            None if detail.required => {
                return Err(OperationError::invalid(
                    OperationKind::NamedOperation,
                    format!("missing required parameter '{}'", name),
                ));
            }
            None => Value::Null,
        };
        values.insert(name.as_str(), value);
    }

    // Single pass over the original text: substituted values are never
    // scanned for further placeholders.
    let mut result = String::with_capacity(chain.len());
    let mut rest = chain;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        let end = start + len + 3;
        let Some(value) = values.get(&rest[start + 2..end - 1]) else {
            result.push_str(&rest[..end]);
            rest = &rest[end..];
            continue;
        };

        let before = &rest[..start];
        let whole_string =
            before.ends_with('"') && !before.ends_with("\\\"") && rest[end..].starts_with('"');
        if whole_string {
            result.push_str(&before[..start - 1]);
            result.push_str(&serde_json::to_string(value)?);
            rest = &rest[end + 1..];
        } else {
            result.push_str(before);
            result.push_str(&inline_text(value)?);
            rest = &rest[end..];
        }
    }
    result.push_str(rest);

    Ok(result)
}
