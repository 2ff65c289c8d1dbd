// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The operation model.
//!
//! An [`Operation`] is a serializable unit of work. Its `class` tag is the
//! operation kind, which drives handler resolution and authority lookup.
//! Leaf operations carry their own parameters and an option mapping; an
//! [`OperationChain`] is the composite operation whose steps are executed in
//! order with each step's output threaded into the next step's input.
//!
//! # Wire format
//!
//! ```json
//! {"class":"OperationChain","operations":[{"class":"ToList","options":{}}],"options":{}}
//! ```

mod kind;
mod named;

pub use kind::OperationKind;
pub use named::{substitute_parameters, ParameterDetail};

use crate::errors::{OperationError, OperationResult};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// String options carried by every operation. Ordered for stable output.
pub type Options = BTreeMap<String, String>;

/// Reads a present `input` field as `Some`, so an explicit `null` input stays
/// distinct from an absent one.
fn explicit_input<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Result-cache key used when a caller does not name one.
pub const DEFAULT_RESULT_KEY: &str = "ALL";

/// Deepest nesting of operations the executor and the authoriser will follow.
pub const MAX_OPERATION_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class")]
pub enum Operation {
    OperationChain(OperationChain),
    ToList(Conversion),
    ToSet(Conversion),
    ToArray(Conversion),
    ToSingletonList(Conversion),
    DiscardOutput(Conversion),
    Limit(Limit),
    Job(Job),
    GetAllJobDetails(GetAllJobDetails),
    GetJobDetails(GetJobDetails),
    GetJobResults(GetJobResults),
    ExportToResultCache(ExportToResultCache),
    GetResultCacheExport(GetResultCacheExport),
    AddNamedOperation(AddNamedOperation),
    NamedOperation(NamedOperation),
    DeleteNamedOperation(DeleteNamedOperation),
    GetAllNamedOperations(GetAllNamedOperations),
}

/// Ordered sequence of operations executed as one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationChain {
    #[serde(default)]
    pub operations: Vec<Operation>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "explicit_input"
    )]
    pub input: Option<Value>,
    #[serde(default)]
    pub options: Options,
}

/// Payload shared by the simple output conversions (`ToList`, `ToSet`, ...).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversion {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "explicit_input"
    )]
    pub input: Option<Value>,
    #[serde(default)]
    pub options: Options,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Limit {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "explicit_input"
    )]
    pub input: Option<Value>,
    pub result_limit: usize,
    #[serde(default = "default_truncate")]
    pub truncate: bool,
    #[serde(default)]
    pub options: Options,
}

fn default_truncate() -> bool {
    true
}

/// Wraps an operation for detached, tracked execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub operation: Box<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub options: Options,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAllJobDetails {
    #[serde(default)]
    pub options: Options,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetJobDetails {
    pub job_id: String,
    #[serde(default)]
    pub options: Options,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetJobResults {
    pub job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub options: Options,
}

impl GetJobResults {
    pub fn key_or_default(&self) -> &str {
        self.key.as_deref().unwrap_or(DEFAULT_RESULT_KEY)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportToResultCache {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "explicit_input"
    )]
    pub input: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub options: Options,
}

impl ExportToResultCache {
    pub fn key_or_default(&self) -> &str {
        self.key.as_deref().unwrap_or(DEFAULT_RESULT_KEY)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetResultCacheExport {
    pub job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub options: Options,
}

impl GetResultCacheExport {
    pub fn key_or_default(&self) -> &str {
        self.key.as_deref().unwrap_or(DEFAULT_RESULT_KEY)
    }
}

/// Stores a serialized chain under a name for later execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddNamedOperation {
    pub operation_name: String,
    /// Serialized chain, e.g. `{"operations":[{"class":"ToSet"}]}`
    pub operation_chain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub overwrite: bool,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,
    #[serde(default)]
    pub options: Options,
}

impl AddNamedOperation {
    fn invalid(&self, reason: impl std::fmt::Display) -> OperationError {
        OperationError::invalid(
            OperationKind::AddNamedOperation,
            format!("operation chain of '{}' {}", self.operation_name, reason),
        )
    }

    /// Parses the embedded chain as-is. Fails while typed placeholders such as
    /// `"resultLimit":"${limit}"` are still unsubstituted.
    pub fn embedded_chain(&self) -> OperationResult<OperationChain> {
        serde_json::from_str(&self.operation_chain)
            .map_err(|e| self.invalid(format!("cannot be parsed: {}", e)))
    }

    /// Kinds of every operation inside the embedded chain, at any depth,
    /// read from the `class` tags. Placeholders in other fields do not get
    /// in the way.
    pub fn embedded_kinds(&self) -> OperationResult<Vec<OperationKind>> {
        let mut kinds = Vec::new();
        collect_chain_kinds(&self.operation_chain, 1, &mut kinds)
            .map_err(|reason| match reason {
                KindScanError::TooDeep => OperationError::RecursionLimit(MAX_OPERATION_DEPTH),
                KindScanError::Invalid(reason) => self.invalid(reason),
            })?;
        Ok(kinds)
    }
}

enum KindScanError {
    TooDeep,
    Invalid(String),
}

fn collect_chain_kinds(
    chain: &str,
    depth: usize,
    kinds: &mut Vec<OperationKind>,
) -> Result<(), KindScanError> {
    let document: Value = serde_json::from_str(chain)
        .map_err(|e| KindScanError::Invalid(format!("cannot be parsed: {}", e)))?;
    let steps = document
        .get("operations")
        .and_then(Value::as_array)
        .ok_or_else(|| KindScanError::Invalid("has no operations list".to_string()))?;
    for step in steps {
        collect_kinds(step, depth + 1, kinds)?;
    }
    Ok(())
}

fn collect_kinds(
    element: &Value,
    depth: usize,
    kinds: &mut Vec<OperationKind>,
) -> Result<(), KindScanError> {
    if depth > MAX_OPERATION_DEPTH {
        return Err(KindScanError::TooDeep);
    }

    let class = element
        .get("class")
        .and_then(Value::as_str)
        .ok_or_else(|| KindScanError::Invalid("contains an operation without a class".to_string()))?;
    let kind = class
        .parse::<OperationKind>()
        .ok()
        .filter(|kind| !kind.is_abstract())
        .ok_or_else(|| KindScanError::Invalid(format!("contains unknown operation '{}'", class)))?;
    kinds.push(kind);

    if let Some(steps) = element.get("operations").and_then(Value::as_array) {
        for step in steps {
            collect_kinds(step, depth + 1, kinds)?;
        }
    }
    if let Some(inner) = element.get("operation").filter(|v| v.is_object()) {
        collect_kinds(inner, depth + 1, kinds)?;
    }
    if let Some(chain) = element.get("operationChain").and_then(Value::as_str) {
        collect_chain_kinds(chain, depth + 1, kinds)?;
    }
    Ok(())
}

/// Runs a previously stored named operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedOperation {
    pub operation_name: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "explicit_input"
    )]
    pub input: Option<Value>,
    #[serde(default)]
    pub options: Options,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteNamedOperation {
    pub operation_name: String,
    #[serde(default)]
    pub options: Options,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAllNamedOperations {
    #[serde(default)]
    pub options: Options,
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::OperationChain(_) => OperationKind::OperationChain,
            Operation::ToList(_) => OperationKind::ToList,
            Operation::ToSet(_) => OperationKind::ToSet,
            Operation::ToArray(_) => OperationKind::ToArray,
            Operation::ToSingletonList(_) => OperationKind::ToSingletonList,
            Operation::DiscardOutput(_) => OperationKind::DiscardOutput,
            Operation::Limit(_) => OperationKind::Limit,
            Operation::Job(_) => OperationKind::Job,
            Operation::GetAllJobDetails(_) => OperationKind::GetAllJobDetails,
            Operation::GetJobDetails(_) => OperationKind::GetJobDetails,
            Operation::GetJobResults(_) => OperationKind::GetJobResults,
            Operation::ExportToResultCache(_) => OperationKind::ExportToResultCache,
            Operation::GetResultCacheExport(_) => OperationKind::GetResultCacheExport,
            Operation::AddNamedOperation(_) => OperationKind::AddNamedOperation,
            Operation::NamedOperation(_) => OperationKind::NamedOperation,
            Operation::DeleteNamedOperation(_) => OperationKind::DeleteNamedOperation,
            Operation::GetAllNamedOperations(_) => OperationKind::GetAllNamedOperations,
        }
    }

    pub fn options(&self) -> &Options {
        match self {
            Operation::OperationChain(op) => &op.options,
            Operation::ToList(op)
            | Operation::ToSet(op)
            | Operation::ToArray(op)
            | Operation::ToSingletonList(op)
            | Operation::DiscardOutput(op) => &op.options,
            Operation::Limit(op) => &op.options,
            Operation::Job(op) => &op.options,
            Operation::GetAllJobDetails(op) => &op.options,
            Operation::GetJobDetails(op) => &op.options,
            Operation::GetJobResults(op) => &op.options,
            Operation::ExportToResultCache(op) => &op.options,
            Operation::GetResultCacheExport(op) => &op.options,
            Operation::AddNamedOperation(op) => &op.options,
            Operation::NamedOperation(op) => &op.options,
            Operation::DeleteNamedOperation(op) => &op.options,
            Operation::GetAllNamedOperations(op) => &op.options,
        }
    }

    pub fn options_mut(&mut self) -> &mut Options {
        match self {
            Operation::OperationChain(op) => &mut op.options,
            Operation::ToList(op)
            | Operation::ToSet(op)
            | Operation::ToArray(op)
            | Operation::ToSingletonList(op)
            | Operation::DiscardOutput(op) => &mut op.options,
            Operation::Limit(op) => &mut op.options,
            Operation::Job(op) => &mut op.options,
            Operation::GetAllJobDetails(op) => &mut op.options,
            Operation::GetJobDetails(op) => &mut op.options,
            Operation::GetJobResults(op) => &mut op.options,
            Operation::ExportToResultCache(op) => &mut op.options,
            Operation::GetResultCacheExport(op) => &mut op.options,
            Operation::AddNamedOperation(op) => &mut op.options,
            Operation::NamedOperation(op) => &mut op.options,
            Operation::DeleteNamedOperation(op) => &mut op.options,
            Operation::GetAllNamedOperations(op) => &mut op.options,
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options_mut().insert(key.into(), value.into());
        self
    }

    fn input_slot(&mut self) -> Option<&mut Option<Value>> {
        match self {
            Operation::OperationChain(op) => Some(&mut op.input),
            Operation::ToList(op)
            | Operation::ToSet(op)
            | Operation::ToArray(op)
            | Operation::ToSingletonList(op)
            | Operation::DiscardOutput(op) => Some(&mut op.input),
            Operation::Limit(op) => Some(&mut op.input),
            Operation::ExportToResultCache(op) => Some(&mut op.input),
            Operation::NamedOperation(op) => Some(&mut op.input),
            _ => None,
        }
    }

    /// The input carried by an input-capable operation, if set.
    pub fn input(&self) -> Option<&Value> {
        match self {
            Operation::OperationChain(op) => op.input.as_ref(),
            Operation::ToList(op)
            | Operation::ToSet(op)
            | Operation::ToArray(op)
            | Operation::ToSingletonList(op)
            | Operation::DiscardOutput(op) => op.input.as_ref(),
            Operation::Limit(op) => op.input.as_ref(),
            Operation::ExportToResultCache(op) => op.input.as_ref(),
            Operation::NamedOperation(op) => op.input.as_ref(),
            _ => None,
        }
    }

    /// Sets the input when the operation accepts one and has none yet.
    /// `Value::Null` counts as a real input. Returns true if the input was set.
    pub fn offer_input(&mut self, value: Value) -> bool {
        match self.input_slot() {
            Some(slot) if slot.is_none() => {
                *slot = Some(value);
                true
            }
            _ => false,
        }
    }

    /// Operations reachable one level below this one: chain steps and the
    /// operation wrapped by a job. Chains embedded as text in an
    /// `AddNamedOperation` are reached through
    /// [`AddNamedOperation::embedded_kinds`].
    pub fn nested_operations(&self) -> Vec<&Operation> {
        match self {
            Operation::OperationChain(chain) => chain.operations.iter().collect(),
            Operation::Job(job) => vec![job.operation.as_ref()],
            _ => Vec::new(),
        }
    }

    /// True if this operation, or anything nested in it, is a `Job`.
    pub fn contains_job(&self) -> bool {
        match self {
            Operation::Job(_) => true,
            Operation::OperationChain(chain) => chain.operations.iter().any(Operation::contains_job),
            _ => false,
        }
    }

    pub fn to_list() -> Self {
        Operation::ToList(Conversion::default())
    }

    pub fn to_set() -> Self {
        Operation::ToSet(Conversion::default())
    }

    pub fn to_array() -> Self {
        Operation::ToArray(Conversion::default())
    }

    pub fn to_singleton_list() -> Self {
        Operation::ToSingletonList(Conversion::default())
    }

    pub fn discard_output() -> Self {
        Operation::DiscardOutput(Conversion::default())
    }

    pub fn limit(result_limit: usize) -> Self {
        Operation::Limit(Limit {
            input: None,
            result_limit,
            truncate: true,
            options: Options::new(),
        })
    }

    pub fn job(operation: Operation) -> Self {
        Operation::Job(Job {
            operation: Box::new(operation),
            key: None,
            options: Options::new(),
        })
    }

    pub fn get_all_job_details() -> Self {
        Operation::GetAllJobDetails(GetAllJobDetails::default())
    }

    pub fn get_job_details(job_id: impl Into<String>) -> Self {
        Operation::GetJobDetails(GetJobDetails {
            job_id: job_id.into(),
            options: Options::new(),
        })
    }

    pub fn get_job_results(job_id: impl Into<String>) -> Self {
        Operation::GetJobResults(GetJobResults {
            job_id: job_id.into(),
            key: None,
            options: Options::new(),
        })
    }

    /// Sets the input unconditionally; used by callers building requests.
    pub fn with_input(mut self, value: Value) -> Self {
        if let Some(slot) = self.input_slot() {
            *slot = Some(value);
        }
        self
    }
}

impl OperationChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder entry point mirroring `then`.
    pub fn first(operation: Operation) -> Self {
        Self::new().then(operation)
    }

    pub fn then(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl From<OperationChain> for Operation {
    fn from(chain: OperationChain) -> Self {
        Operation::OperationChain(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_chain() -> Operation {
        OperationChain::first(Operation::to_list())
            .then(Operation::to_set().with_option("optionKey", "value"))
            .then(Operation::limit(3))
            .into()
    }

    #[test]
    fn serialized_operation_carries_class_tag_and_options() {
        let json = serde_json::to_value(Operation::to_list().with_option("a", "b")).unwrap();
        assert_eq!(json, json!({"class": "ToList", "options": {"a": "b"}}));
    }

    #[test]
    fn serialization_is_stable_across_round_trip() {
        let with_null_step: Operation = OperationChain::first(Operation::to_list().with_input(Value::Null))
            .then(Operation::to_set())
            .into();
        let cases = vec![
            sample_chain(),
            with_null_step,
            Operation::to_list().with_input(Value::Null),
            Operation::limit(2).with_input(json!([1, 2, 3])),
        ];

        for op in cases {
            let first = serde_json::to_string(&op).unwrap();
            let parsed: Operation = serde_json::from_str(&first).unwrap();
            let second = serde_json::to_string(&parsed).unwrap();
            assert_eq!(first, second);
            assert_eq!(parsed, op);
        }
    }

    #[test]
    fn explicit_null_input_differs_from_absent_input() {
        let null_input: Operation = serde_json::from_str(r#"{"class":"ToList","input":null}"#).unwrap();
        assert_eq!(null_input.input(), Some(&Value::Null));

        let absent: Operation = serde_json::from_str(r#"{"class":"ToList"}"#).unwrap();
        assert_eq!(absent.input(), None);
    }

    #[test]
    fn missing_options_default_to_empty() {
        let op: Operation = serde_json::from_str(r#"{"class":"ToArray"}"#).unwrap();
        assert_eq!(op.kind(), OperationKind::ToArray);
        assert!(op.options().is_empty());
    }

    #[test]
    fn offer_input_only_fills_empty_input_slots() {
        let mut op = Operation::to_list();
        assert!(op.offer_input(Value::Null));
        assert_eq!(op.input(), Some(&Value::Null));
        assert!(!op.offer_input(json!([1])));
        assert_eq!(op.input(), Some(&Value::Null));

        let mut lookup = Operation::get_all_job_details();
        assert!(!lookup.offer_input(json!(1)));
    }

    #[test]
    fn nested_operations_of_chain_and_job() {
        let chain = sample_chain();
        assert_eq!(chain.nested_operations().len(), 3);

        let job = Operation::job(Operation::to_set());
        let nested = job.nested_operations();
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].kind(), OperationKind::ToSet);

        assert!(Operation::to_list().nested_operations().is_empty());
    }

    fn add_named(chain: &str) -> AddNamedOperation {
        AddNamedOperation {
            operation_name: "Test".to_string(),
            operation_chain: chain.to_string(),
            description: None,
            overwrite: false,
            parameters: BTreeMap::new(),
            score: None,
            options: Options::new(),
        }
    }

    #[test]
    fn embedded_chain_parses_string_placeholders() {
        let add = add_named(
            r#"{"operations":[{"class":"ToSet","options":{"optionKey":"${testParameter}"}}]}"#,
        );
        let chain = add.embedded_chain().unwrap();
        assert_eq!(chain.operations[0].kind(), OperationKind::ToSet);
        assert_eq!(
            chain.operations[0].options().get("optionKey").unwrap(),
            "${testParameter}"
        );
    }

    #[test]
    fn embedded_kinds_reach_every_depth() {
        let add = add_named(
            r#"{"operations":[
                {"class":"ToList"},
                {"class":"Limit","resultLimit":"${limit}"},
                {"class":"OperationChain","operations":[{"class":"ToSet"}]},
                {"class":"Job","operation":{"class":"ToArray"}},
                {"class":"AddNamedOperation","operationName":"inner",
                 "operationChain":"{\"operations\":[{\"class\":\"DiscardOutput\"}]}"}
            ]}"#,
        );

        assert!(add.embedded_chain().is_err());
        assert_eq!(
            add.embedded_kinds().unwrap(),
            vec![
                OperationKind::ToList,
                OperationKind::Limit,
                OperationKind::OperationChain,
                OperationKind::ToSet,
                OperationKind::Job,
                OperationKind::ToArray,
                OperationKind::AddNamedOperation,
                OperationKind::DiscardOutput,
            ]
        );
    }

    #[test]
    fn embedded_kinds_reject_bad_documents() {
        for chain in [
            "not json",
            r#"{"steps":[]}"#,
            r#"{"operations":[{"class":"Teleport"}]}"#,
            r#"{"operations":[{"class":"InputOutput"}]}"#,
            r#"{"operations":[{"options":{}}]}"#,
        ] {
            assert!(
                matches!(add_named(chain).embedded_kinds(), Err(OperationError::InvalidOperation { .. })),
                "{} should be rejected",
                chain
            );
        }
    }

    #[test]
    fn contains_job_looks_through_chains() {
        let chain: Operation = OperationChain::first(Operation::to_list())
            .then(Operation::job(Operation::to_set()))
            .into();
        assert!(chain.contains_job());
        assert!(!sample_chain().contains_job());
    }
}
