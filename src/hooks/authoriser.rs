// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use crate::context::{Request, User};
use crate::errors::{ConfigError, OperationError, OperationResult};
use crate::observability::messages::hook::AuthorisationDenied;
use crate::observability::messages::StructuredLog;
use crate::operation::{Operation, OperationKind, MAX_OPERATION_DEPTH};
use crate::traits::Hook;

/// Checks the caller's operation auths against every operation reachable
/// from the submitted one.
///
/// The required set for a node is the entry for its exact kind, else the
/// entry of its nearest declared supertype, else the `Operation` entry. A
/// node with no entry at all is always allowed.
///
/// # Example
/// ```yaml
/// auths:
///   Operation: [User]
///   ToSet: [User, SuperUser]
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OperationAuthoriser {
    #[serde(default)]
    auths: BTreeMap<OperationKind, BTreeSet<String>>,
}

impl OperationAuthoriser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_auths<I, S>(mut self, kind: OperationKind, auths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.auths
            .insert(kind, auths.into_iter().map(Into::into).collect());
        self
    }

    pub fn set_auths(&mut self, auths: BTreeMap<OperationKind, BTreeSet<String>>) {
        self.auths = auths;
    }

    pub fn auths(&self) -> &BTreeMap<OperationKind, BTreeSet<String>> {
        &self.auths
    }

    /// Union of every registered auth set.
    pub fn all_auths(&self) -> BTreeSet<String> {
        self.auths.values().flatten().cloned().collect()
    }

    pub fn required_auths(&self, kind: OperationKind) -> Option<&BTreeSet<String>> {
        kind.lookup_order().find_map(|k| self.auths.get(&k))
    }

    /// Visits `operation` and everything nested in it, failing on the first
    /// node the user is not authorised for.
    pub fn authorise(&self, operation: &Operation, user: &User) -> OperationResult<()> {
        self.authorise_node(operation, user, 1)
    }

    fn authorise_node(&self, operation: &Operation, user: &User, depth: usize) -> OperationResult<()> {
        if depth > MAX_OPERATION_DEPTH {
            return Err(OperationError::RecursionLimit(MAX_OPERATION_DEPTH));
        }

        self.check(operation.kind(), user)?;
        if let Operation::AddNamedOperation(add) = operation {
            for kind in add.embedded_kinds()? {
                self.check(kind, user)?;
            }
        }
        for nested in operation.nested_operations() {
            self.authorise_node(nested, user, depth + 1)?;
        }
        Ok(())
    }

    fn check(&self, kind: OperationKind, user: &User) -> OperationResult<()> {
        let Some(required) = self.required_auths(kind) else {
            return Ok(());
        };
        let missing: Vec<String> = required.difference(user.op_auths()).cloned().collect();
        if missing.is_empty() {
            return Ok(());
        }

        AuthorisationDenied {
            user_id: user.user_id(),
            operation: kind,
            missing: &missing,
        }
        .log();

        Err(OperationError::Unauthorised {
            user_id: user.user_id().to_string(),
            operation: kind,
            missing,
        })
    }

    pub fn from_yaml_str(content: &str, source: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
            path: source.to_string(),
            reason: e.to_string(),
        })
    }

    /// Load an authoriser from a YAML operation-auths file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        Self::from_yaml_str(&content, &display)
    }
}

#[async_trait]
impl Hook for OperationAuthoriser {
    fn name(&self) -> &str {
        "OperationAuthoriser"
    }

    async fn pre_execute(&self, request: &mut Request<'_>) -> OperationResult<()> {
        self.authorise(request.operation, request.context.user())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::operation::{AddNamedOperation, OperationChain, Options};

    const FIXTURE: &str = r#"
auths:
  Operation: [User]
  AddNamedOperation: [User, SuperUser]
  ToArray: [User, ReadUser]
  DiscardOutput: [User, WriteUser]
  ToSet: [User, AdminUser]
  GetAllJobDetails: [AdminUser]
"#;

    fn fixture() -> OperationAuthoriser {
        OperationAuthoriser::from_yaml_str(FIXTURE, "fixture").unwrap()
    }

    fn user(auths: &[&str]) -> User {
        User::builder("user01").op_auths(auths.iter().copied()).build()
    }

    fn nested_chain() -> Operation {
        OperationChain::first(Operation::to_list())
            .then(Operation::to_singleton_list())
            .then(Operation::to_array())
            .then(Operation::discard_output())
            .then(OperationChain::first(Operation::to_set()).into())
            .into()
    }

    fn add_named(body_class: &str) -> Operation {
        let chain = format!(
            r#"{{"operations":[{{"class":"{}","options":{{"optionKey":"${{testParameter}}"}}}}]}}"#,
            body_class
        );
        OperationChain::first(Operation::AddNamedOperation(AddNamedOperation {
            operation_name: "Test".to_string(),
            operation_chain: chain,
            description: Some("Test Named Operation".to_string()),
            overwrite: false,
            parameters: BTreeMap::new(),
            score: Some(2),
            options: Options::new(),
        }))
        .into()
    }

    async fn pre_execute(hook: &OperationAuthoriser, op: &Operation, user: User) -> OperationResult<()> {
        let mut context = Context::new(user);
        let mut request = Request::new(op, &mut context, "authoriser-tests");
        hook.pre_execute(&mut request).await
    }

    #[tokio::test]
    async fn rejects_chain_naming_the_denied_kind_and_auth() {
        let hook = OperationAuthoriser::new().with_auths(OperationKind::ToSet, ["SuperUser"]);
        let op: Operation = OperationChain::first(Operation::to_list())
            .then(Operation::to_set())
            .into();

        let err = pre_execute(&hook, &op, user(&["User"])).await.unwrap_err();
        match err {
            OperationError::Unauthorised {
                operation, missing, ..
            } => {
                assert_eq!(operation, OperationKind::ToSet);
                assert_eq!(missing, vec!["SuperUser".to_string()]);
            }
            other => panic!("expected Unauthorised, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn accepts_nested_chain_when_user_has_every_auth() {
        let all = user(&["AdminUser", "SuperUser", "ReadUser", "User", "WriteUser"]);
        pre_execute(&fixture(), &nested_chain(), all).await.unwrap();
    }

    #[tokio::test]
    async fn rejects_nested_chain_when_an_auth_is_missing() {
        let partial = user(&["SuperUser", "ReadUser", "User"]);
        let err = pre_execute(&fixture(), &nested_chain(), partial).await.unwrap_err();
        assert!(matches!(
            err,
            OperationError::Unauthorised { operation: OperationKind::DiscardOutput, .. }
        ));
    }

    #[tokio::test]
    async fn embedded_named_chain_is_checked() {
        struct Case {
            name: &'static str,
            body: &'static str,
            auths: &'static [&'static str],
            denied: Option<OperationKind>,
        }

        let cases = vec![
            Case {
                name: "allowed body",
                body: "ToArray",
                auths: &["SuperUser", "ReadUser", "User"],
                denied: None,
            },
            Case {
                name: "denied body",
                body: "ToSet",
                auths: &["SuperUser", "ReadUser", "User"],
                denied: Some(OperationKind::ToSet),
            },
            Case {
                name: "denied add",
                body: "ToSet",
                auths: &["ReadUser", "User"],
                denied: Some(OperationKind::AddNamedOperation),
            },
        ];

        for case in cases {
            let result = pre_execute(&fixture(), &add_named(case.body), user(case.auths)).await;
            match (case.denied, result) {
                (None, Ok(())) => {}
                (Some(expected), Err(OperationError::Unauthorised { operation, .. })) => {
                    assert_eq!(operation, expected, "{}", case.name)
                }
                (expected, actual) => panic!("{}: expected {:?}, got {:?}", case.name, expected, actual),
            }
        }
    }

    #[tokio::test]
    async fn job_wrapped_operations_are_checked() {
        let op = Operation::job(Operation::to_set());
        let err = pre_execute(&fixture(), &op, user(&["User"])).await.unwrap_err();
        assert!(matches!(
            err,
            OperationError::Unauthorised { operation: OperationKind::ToSet, .. }
        ));
    }

    #[test]
    fn required_auths_fall_back_through_supertypes() {
        let hook = OperationAuthoriser::new()
            .with_auths(OperationKind::Operation, ["User"])
            .with_auths(OperationKind::Output, ["Reader"]);

        assert_eq!(
            hook.required_auths(OperationKind::ToList).unwrap(),
            &BTreeSet::from(["Reader".to_string()])
        );
        assert_eq!(
            hook.required_auths(OperationKind::AddNamedOperation).unwrap(),
            &BTreeSet::from(["User".to_string()])
        );
        assert!(OperationAuthoriser::new()
            .required_auths(OperationKind::ToList)
            .is_none());
    }

    #[test]
    fn all_auths_is_the_union() {
        let expected: BTreeSet<String> = ["AdminUser", "ReadUser", "SuperUser", "User", "WriteUser"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(fixture().all_auths(), expected);
    }

    #[test]
    fn widening_auths_never_rejects_an_accepted_chain() {
        let hook = fixture();
        let op = nested_chain();
        let ladder: [&[&str]; 4] = [
            &["User"],
            &["User", "ReadUser", "WriteUser"],
            &["User", "ReadUser", "WriteUser", "AdminUser"],
            &["User", "ReadUser", "WriteUser", "AdminUser", "SuperUser"],
        ];

        let mut accepted = false;
        for auths in ladder {
            let ok = hook.authorise(&op, &user(auths)).is_ok();
            assert!(ok || !accepted, "rejected after accepting with {:?}", auths);
            accepted = ok;
        }
        assert!(accepted);
    }

    #[test]
    fn deep_nesting_is_bounded() {
        let mut op = Operation::to_list();
        for _ in 0..=MAX_OPERATION_DEPTH {
            op = OperationChain::first(op).into();
        }
        let err = OperationAuthoriser::new().authorise(&op, &user(&[])).unwrap_err();
        assert!(matches!(err, OperationError::RecursionLimit(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            OperationAuthoriser::from_path("/nonexistent/operation-auths.yaml"),
            Err(ConfigError::Io { .. })
        ));
    }
}
