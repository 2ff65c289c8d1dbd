// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use super::{Config, Executor, HandlerRegistry};
use crate::config::ExecutorProperties;
use crate::context::{Context, Request, User};
use crate::errors::{HookPhase, OperationError, OperationResult};
use crate::handlers::{ToListHandler, ToSetHandler};
use crate::hooks::OperationAuthoriser;
use crate::jobs::{JobDetail, JobStatus};
use crate::operation::{
    AddNamedOperation, Limit, NamedOperation, Operation, OperationChain, OperationKind, Options,
    ParameterDetail, MAX_OPERATION_DEPTH,
};
use crate::traits::Hook;

type Log = Arc<Mutex<Vec<String>>>;

#[derive(Default)]
struct RecordingHook {
    name: &'static str,
    log: Log,
    fail_pre: bool,
    fail_post: bool,
    fail_on_failure: bool,
    recover_with: Option<Value>,
}

impl RecordingHook {
    fn new(name: &'static str, log: &Log) -> Self {
        Self {
            name,
            log: log.clone(),
            ..Default::default()
        }
    }

    fn push(&self, phase: &str) {
        self.log.lock().push(format!("{}.{}", self.name, phase));
    }

    fn fault(&self, phase: HookPhase) -> OperationError {
        OperationError::HookFailure {
            hook: self.name.to_string(),
            phase,
            reason: "requested by test".to_string(),
        }
    }
}

#[async_trait]
impl Hook for RecordingHook {
    fn name(&self) -> &str {
        self.name
    }

    async fn pre_execute(&self, _request: &mut Request<'_>) -> OperationResult<()> {
        self.push("pre");
        if self.fail_pre {
            return Err(self.fault(HookPhase::PreExecute));
        }
        Ok(())
    }

    async fn post_execute(&self, result: Value, _request: &mut Request<'_>) -> OperationResult<Value> {
        self.push("post");
        if self.fail_post {
            return Err(self.fault(HookPhase::PostExecute));
        }
        Ok(result)
    }

    async fn on_failure(
        &self,
        result: Value,
        request: &mut Request<'_>,
        _error: &OperationError,
    ) -> OperationResult<Value> {
        self.push("fail");
        if self.fail_on_failure {
            return Err(self.fault(HookPhase::OnFailure));
        }
        if let Some(value) = &self.recover_with {
            request.recover();
            return Ok(value.clone());
        }
        Ok(result)
    }
}

fn executor_with_hooks(hooks: Vec<RecordingHook>) -> Executor {
    let mut builder = Config::builder("integration");
    for hook in hooks {
        builder = builder.hook(Arc::new(hook));
    }
    Executor::new(builder.build()).unwrap()
}

fn strict_limit(result_limit: usize, input: Value) -> Operation {
    Operation::Limit(Limit {
        input: Some(input),
        result_limit,
        truncate: false,
        options: Options::new(),
    })
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().clone()
}

#[tokio::test]
async fn test_hooks_run_in_order_on_success() {
    let log = Log::default();
    let executor = executor_with_hooks(vec![RecordingHook::new("A", &log), RecordingHook::new("B", &log)]);

    let result = executor
        .execute_as(&Operation::to_list().with_input(json!([1, 2])), User::new("u"))
        .await
        .unwrap();

    assert_eq!(result, json!([1, 2]));
    assert_eq!(entries(&log), vec!["A.pre", "B.pre", "A.post", "B.post"]);
}

#[tokio::test]
async fn test_failure_paths_reach_only_hooks_that_started() {
    struct Case {
        name: &'static str,
        a: fn(RecordingHook) -> RecordingHook,
        b: fn(RecordingHook) -> RecordingHook,
        operation: Operation,
        expected_log: Vec<&'static str>,
        expected_error: &'static str,
    }

    let cases = vec![
        Case {
            name: "pre_execute failure stops later hooks and the handler",
            a: |h| RecordingHook { fail_pre: true, ..h },
            b: |h| h,
            operation: Operation::to_list(),
            expected_log: vec!["A.pre", "A.fail"],
            expected_error: "hook_failure",
        },
        Case {
            name: "handler failure notifies every hook",
            a: |h| h,
            b: |h| h,
            operation: strict_limit(1, json!([1, 2, 3])),
            expected_log: vec!["A.pre", "B.pre", "A.fail", "B.fail"],
            expected_error: "invalid_operation",
        },
        Case {
            name: "post_execute failure switches to the failure path",
            a: |h| RecordingHook { fail_post: true, ..h },
            b: |h| h,
            operation: Operation::to_list(),
            expected_log: vec!["A.pre", "B.pre", "A.post", "A.fail", "B.fail"],
            expected_error: "hook_failure",
        },
    ];

    for case in cases {
        let log = Log::default();
        let executor = executor_with_hooks(vec![
            (case.a)(RecordingHook::new("A", &log)),
            (case.b)(RecordingHook::new("B", &log)),
        ]);

        let err = executor
            .execute_as(&case.operation, User::new("u"))
            .await
            .unwrap_err();

        assert_eq!(entries(&log), case.expected_log, "{}", case.name);
        assert_eq!(err.kind_name(), case.expected_error, "{}", case.name);
    }
}

#[tokio::test]
async fn test_on_failure_can_recover() {
    let log = Log::default();
    let recovering = RecordingHook {
        recover_with: Some(json!("recovered")),
        ..RecordingHook::new("B", &log)
    };
    let executor = executor_with_hooks(vec![RecordingHook::new("A", &log), recovering]);

    let result = executor
        .execute_as(&strict_limit(1, json!([1, 2])), User::new("u"))
        .await
        .unwrap();

    assert_eq!(result, json!("recovered"));
    assert_eq!(entries(&log), vec!["A.pre", "B.pre", "A.fail", "B.fail"]);
}

#[tokio::test]
async fn test_on_failure_error_replaces_the_original() {
    let log = Log::default();
    let faulty = RecordingHook {
        fail_on_failure: true,
        ..RecordingHook::new("A", &log)
    };
    let executor = executor_with_hooks(vec![faulty, RecordingHook::new("B", &log)]);

    let err = executor
        .execute_as(&strict_limit(1, json!([1, 2])), User::new("u"))
        .await
        .unwrap_err();

    assert!(matches!(err, OperationError::HookFailure { phase: HookPhase::OnFailure, .. }));
    assert_eq!(entries(&log), vec!["A.pre", "B.pre", "A.fail", "B.fail"]);
}

#[tokio::test]
async fn test_is_supported_matches_handler_reachability() {
    let mut handlers = HandlerRegistry::new();
    handlers.insert(OperationKind::InputOutput, Arc::new(ToSetHandler));
    handlers.insert(OperationKind::ToList, Arc::new(ToListHandler));
    let executor = Executor::new(Config::builder("integration").handlers(handlers).build()).unwrap();

    let operations = vec![
        Operation::to_list().with_input(json!([1, 1])),
        Operation::to_array().with_input(json!([1, 1])),
        Operation::discard_output(),
        Operation::get_all_job_details(),
    ];

    for operation in operations {
        let kind = operation.kind();
        let outcome = executor.execute_as(&operation, User::new("u")).await;
        let reached = !matches!(outcome, Err(OperationError::UnsupportedOperation(_)));
        assert_eq!(executor.is_supported(kind), reached, "{}", kind);
    }

    let through_supertype = executor
        .execute_as(&Operation::to_array().with_input(json!([1, 1])), User::new("u"))
        .await
        .unwrap();
    assert_eq!(through_supertype, json!([1]));
}

#[tokio::test]
async fn test_chain_rejected_when_user_lacks_auth_for_a_step() {
    let authoriser = OperationAuthoriser::new().with_auths(OperationKind::ToSet, ["SuperUser"]);
    let executor = Executor::new(Config::builder("integration").hook(Arc::new(authoriser)).build()).unwrap();
    let chain: Operation = OperationChain::first(Operation::to_list())
        .then(Operation::to_set())
        .into();

    let err = executor
        .execute_as(&chain, User::builder("user01").op_auth("User").build())
        .await
        .unwrap_err();

    match err {
        OperationError::Unauthorised { operation, missing, .. } => {
            assert_eq!(operation, OperationKind::ToSet);
            assert_eq!(missing, vec!["SuperUser".to_string()]);
        }
        other => panic!("expected Unauthorised, got {:?}", other),
    }
}

#[tokio::test]
async fn test_chain_accepted_with_all_auths() {
    let authoriser = OperationAuthoriser::new()
        .with_auths(OperationKind::Operation, ["User"])
        .with_auths(OperationKind::ToArray, ["User", "ReadUser"])
        .with_auths(OperationKind::ToSingletonList, ["User", "SuperUser"]);
    let executor = Executor::new(Config::builder("integration").hook(Arc::new(authoriser)).build()).unwrap();
    let chain: Operation = OperationChain::first(Operation::to_list())
        .then(Operation::to_singleton_list())
        .then(Operation::to_array())
        .into();
    let user = User::builder("user01")
        .op_auths(["AdminUser", "SuperUser", "ReadUser", "User", "WriteUser"])
        .build();

    let result = executor
        .execute_as(&chain.with_input(json!("only")), user)
        .await
        .unwrap();
    assert_eq!(result, json!([["only"]]));
}

#[tokio::test]
async fn test_job_queries_need_tracking() {
    let executor = Executor::new(Config::builder("integration").build()).unwrap();

    for operation in [Operation::get_all_job_details(), Operation::get_job_details("any")] {
        let err = executor.execute_as(&operation, User::new("u")).await.unwrap_err();
        assert!(matches!(err, OperationError::Configuration(_)), "{}", operation.kind());
    }
}

fn tracking_executor() -> Executor {
    let properties = ExecutorProperties::default()
        .with_job_tracker(true)
        .with_job_executor_threads(2)
        .with_admin_auth("AdminUser");
    Executor::new(Config::builder("integration").properties(properties).build()).unwrap()
}

async fn wait_for_terminal(executor: &Executor, job_id: &str) -> JobDetail {
    for _ in 0..500 {
        if let Some(detail) = executor.job_tracker().unwrap().get_job(job_id).unwrap() {
            if detail.status.is_terminal() {
                return detail;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} did not finish", job_id);
}

#[tokio::test]
async fn test_sequential_jobs_are_distinct_and_queryable() {
    let executor = tracking_executor();
    let mut context = Context::new(User::new("alice"));

    let first = executor
        .execute_job(Operation::to_list().with_input(json!([1])), &mut context)
        .await
        .unwrap();
    let second = executor
        .execute_job(Operation::to_set().with_input(json!([2, 2])), &mut context)
        .await
        .unwrap();

    assert_ne!(first.job_id, second.job_id);
    assert_eq!(first.status, JobStatus::Scheduled);
    assert_eq!(first.parent_job_id.as_deref(), Some(context.job_id()));

    for job in [&first, &second] {
        let done = wait_for_terminal(&executor, &job.job_id).await;
        assert_eq!(done.status, JobStatus::Completed);

        let queried = executor
            .execute(&Operation::get_job_details(job.job_id.clone()), &mut context)
            .await
            .unwrap();
        let queried: JobDetail = serde_json::from_value(queried).unwrap();
        assert_eq!(queried.job_id, job.job_id);
    }

    let all = executor
        .execute(&Operation::get_all_job_details(), &mut context)
        .await
        .unwrap();
    let all: Vec<JobDetail> = serde_json::from_value(all).unwrap();
    assert_eq!(all.len(), 2);

    let results = executor
        .execute(&Operation::get_job_results(second.job_id.clone()), &mut context)
        .await
        .unwrap();
    assert_eq!(results, json!([2]));
}

#[tokio::test]
async fn test_failed_job_records_reason() {
    let executor = tracking_executor();
    let mut context = Context::new(User::new("alice"));

    let job = executor
        .execute_job(strict_limit(1, json!([1, 2, 3])), &mut context)
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::Scheduled);

    let done = wait_for_terminal(&executor, &job.job_id).await;
    assert_eq!(done.status, JobStatus::Failed);
    assert!(done.description.unwrap().contains("limit of 1 exceeded"));
}

#[tokio::test]
async fn test_nested_job_links_to_its_parent() {
    let executor = tracking_executor();
    let mut context = Context::new(User::new("alice"));
    let inner = Operation::job(Operation::to_list().with_input(json!([7])));

    let outer = executor
        .execute_job(OperationChain::first(inner).into(), &mut context)
        .await
        .unwrap();
    let outer_done = wait_for_terminal(&executor, &outer.job_id).await;
    assert_eq!(outer_done.status, JobStatus::Completed);

    let child_id = {
        let mut child = None;
        for _ in 0..500 {
            let jobs = executor.job_tracker().unwrap().get_all_jobs().unwrap();
            child = jobs
                .into_iter()
                .find(|job| job.parent_job_id.as_deref() == Some(outer.job_id.as_str()));
            if child.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        child.expect("child job tracked").job_id
    };
    let child_done = wait_for_terminal(&executor, &child_id).await;
    assert_eq!(child_done.status, JobStatus::Completed);
}

/// Records the name of every span opened while it is the default subscriber.
#[derive(Clone, Default)]
struct SpanNames(Arc<Mutex<Vec<&'static str>>>);

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for SpanNames {
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        self.0.lock().push(attrs.metadata().name());
    }
}

#[tokio::test]
async fn test_executions_and_jobs_run_inside_message_spans() {
    use tracing_subscriber::layer::SubscriberExt;

    let names = SpanNames::default();
    let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(names.clone()));

    let executor = tracking_executor();
    let mut context = Context::new(User::new("alice"));
    let job = executor
        .execute_job(Operation::to_list().with_input(json!([1])), &mut context)
        .await
        .unwrap();
    wait_for_terminal(&executor, &job.job_id).await;

    let names = names.0.lock().clone();
    let jobs = names.iter().filter(|name| **name == "job").count();
    let operations = names.iter().filter(|name| **name == "operation").count();
    assert_eq!(jobs, 1, "{:?}", names);
    // The Job itself and the job's ToList.
    assert!(operations >= 2, "{:?}", names);
}

#[tokio::test]
async fn test_parent_job_outcome_is_independent_of_its_children() {
    let executor = tracking_executor();
    let mut context = Context::new(User::new("alice"));
    let failing_child = Operation::job(strict_limit(1, json!([1, 2, 3])));

    let parent = executor
        .execute_job(OperationChain::first(failing_child).into(), &mut context)
        .await
        .unwrap();
    let parent_done = wait_for_terminal(&executor, &parent.job_id).await;
    assert_eq!(parent_done.status, JobStatus::Completed);

    let mut child = None;
    for _ in 0..500 {
        let jobs = executor.job_tracker().unwrap().get_all_jobs().unwrap();
        child = jobs
            .into_iter()
            .find(|job| job.parent_job_id.as_deref() == Some(parent.job_id.as_str()));
        if child.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let child_done = wait_for_terminal(&executor, &child.expect("child job tracked").job_id).await;
    assert_eq!(child_done.status, JobStatus::Failed);
}

#[tokio::test]
async fn test_job_listing_is_scoped_to_the_caller() {
    let executor = tracking_executor();
    let mut alice = Context::new(User::new("alice"));
    let mut bob = Context::new(User::new("bob"));

    let a = executor.execute_job(Operation::to_list(), &mut alice).await.unwrap();
    let b = executor.execute_job(Operation::to_list(), &mut bob).await.unwrap();
    wait_for_terminal(&executor, &a.job_id).await;
    wait_for_terminal(&executor, &b.job_id).await;

    let list = |value: Value| -> Vec<String> {
        serde_json::from_value::<Vec<JobDetail>>(value)
            .unwrap()
            .into_iter()
            .map(|job| job.user_id)
            .collect()
    };

    let seen_by_alice = executor.execute(&Operation::get_all_job_details(), &mut alice).await.unwrap();
    assert_eq!(list(seen_by_alice), vec!["alice"]);

    let admin = User::builder("root").op_auth("AdminUser").build();
    let seen_by_admin = executor
        .execute_as(&Operation::get_all_job_details(), admin)
        .await
        .unwrap();
    assert_eq!(list(seen_by_admin).len(), 2);
}

#[tokio::test]
async fn test_job_results_need_result_cache_export() {
    let properties = ExecutorProperties::default().with_job_tracker(true);
    let executor = Executor::new(
        Config::builder("integration")
            .properties(properties)
            .without_handler(OperationKind::GetResultCacheExport)
            .build(),
    )
    .unwrap();

    let err = executor
        .execute_as(&Operation::get_job_results("any"), User::new("u"))
        .await
        .unwrap_err();
    assert!(matches!(err, OperationError::Configuration(_)));
}

#[tokio::test]
async fn test_named_operation_body_is_authorised() {
    let authoriser = OperationAuthoriser::new()
        .with_auths(OperationKind::Operation, ["User"])
        .with_auths(OperationKind::ToSet, ["User", "SuperUser"]);
    let executor = Executor::new(Config::builder("integration").hook(Arc::new(authoriser)).build()).unwrap();
    let super_user = User::builder("creator").op_auths(["User", "SuperUser"]).build();
    let plain = User::builder("caller").op_auth("User").build();

    let add = Operation::AddNamedOperation(AddNamedOperation {
        operation_name: "dedupe".to_string(),
        operation_chain: r#"{"operations":[{"class":"ToSet"},{"class":"Limit","resultLimit":"${limit}"}]}"#
            .to_string(),
        description: None,
        overwrite: false,
        parameters: BTreeMap::from([(
            "limit".to_string(),
            ParameterDetail {
                required: true,
                ..Default::default()
            },
        )]),
        score: None,
        options: Options::new(),
    });
    executor.execute_as(&add, super_user.clone()).await.unwrap();

    let run = Operation::NamedOperation(NamedOperation {
        operation_name: "dedupe".to_string(),
        parameters: BTreeMap::from([("limit".to_string(), json!(2))]),
        input: Some(json!(["x", "y", "x", "z"])),
        options: Options::new(),
    });

    assert_eq!(
        executor.execute_as(&run, super_user).await.unwrap(),
        json!(["x", "y"])
    );
    assert!(matches!(
        executor.execute_as(&run, plain).await,
        Err(OperationError::Unauthorised { operation: OperationKind::ToSet, .. })
    ));
}

#[tokio::test]
async fn test_nesting_beyond_the_limit_fails() {
    let executor = Executor::new(Config::builder("integration").build()).unwrap();
    let mut operation = Operation::to_list();
    for _ in 0..MAX_OPERATION_DEPTH {
        operation = OperationChain::first(operation).into();
    }

    let err = executor.execute_as(&operation, User::new("u")).await.unwrap_err();
    assert!(matches!(err, OperationError::RecursionLimit(_)));
}
