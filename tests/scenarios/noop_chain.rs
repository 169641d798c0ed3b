//! Test: Noop chain - decode, run, and re-encode a built-in pipeline

use crate::helpers::*;
use serde_json::json;
use wowza_bootstrap::{codec, ContinuationExecutor, ExecutorState};

#[tokio::test]
async fn test_noop_pipeline_round_trip() {
    let log = CallLog::default();
    let registry = test_registry(&log, 0);
    let source = json!({
        "actions": [
            { "action_name": "Noop", "value": 1 },
            { "action_name": "Noop", "value": 2 },
        ]
    });

    let context = decode(&registry, source.clone());
    let state = ContinuationExecutor::new(context.clone()).run_to_completion().await.unwrap();

    assert_eq!(state, ExecutorState::Complete);
    assert!(context.all_complete());
    assert_eq!(flags(&context), vec![(true, false), (true, false)]);
    assert_eq!(codec::encode(&context).to_value(), source);
}

#[tokio::test]
async fn test_actions_run_in_insertion_order() {
    let log = CallLog::default();
    let registry = test_registry(&log, 0);
    let context = decode(
        &registry,
        json!([
            { "action_name": "Record", "tag": "eip" },
            { "action_name": "Noop" },
            { "action_name": "Record", "tag": "logsync" },
            { "action_name": "Record", "tag": "cron" },
        ]),
    );

    ContinuationExecutor::new(context).run_to_completion().await.unwrap();
    assert_eq!(log.calls(), vec!["eip", "logsync", "cron"]);
}

#[tokio::test]
async fn test_independent_pipelines_do_not_mix() {
    let log = CallLog::default();
    let registry = test_registry(&log, 0);
    let first = decode(&registry, json!([{ "action_name": "Record", "tag": "first" }]));
    let second = decode(
        &registry,
        json!([
            { "action_name": "Record", "tag": "second-a" },
            { "action_name": "Record", "tag": "second-b" },
        ]),
    );

    ContinuationExecutor::new(second.clone()).run_to_completion().await.unwrap();
    assert_eq!(log.calls(), vec!["second-a", "second-b"]);
    assert_eq!(first.state(), ExecutorState::NotStarted);
    assert_eq!(first.len(), 1);

    ContinuationExecutor::new(first).run_to_completion().await.unwrap();
    assert_eq!(log.calls(), vec!["second-a", "second-b", "first"]);
}

#[tokio::test]
async fn test_step_by_step_with_bootstrap() {
    let log = CallLog::default();
    let registry = test_registry(&log, 0);
    let context = decode(
        &registry,
        json!([
            { "action_name": "Record", "tag": "a" },
            { "action_name": "Record", "tag": "b" },
        ]),
    );
    let executor = ContinuationExecutor::new(context.clone());

    // The first invocation only establishes the cursor.
    assert_eq!(executor.invoke().await.unwrap(), ExecutorState::Running);
    assert!(log.calls().is_empty());

    executor.advance().await.unwrap();
    assert_eq!(log.calls(), vec!["a"]);
    assert_eq!(context.cursor(), Some(1));

    assert_eq!(executor.invoke().await.unwrap(), ExecutorState::Complete);
    assert_eq!(log.calls(), vec!["a", "b"]);
}

#[tokio::test]
async fn test_long_pipeline_runs_on_a_test_thread_stack() {
    const LENGTH: usize = 50_000;

    let log = CallLog::default();
    let registry = test_registry(&log, 0);
    let records: Vec<_> = (0..LENGTH)
        .map(|i| json!({ "action_name": "Noop", "value": i }))
        .collect();
    let context = decode(&registry, json!({ "actions": records }));
    assert_eq!(context.len(), LENGTH);

    let state = ContinuationExecutor::new(context.clone()).run_to_completion().await.unwrap();

    assert_eq!(state, ExecutorState::Complete);
    assert!(context.all_complete());
    let outcomes = context.outcomes();
    assert_eq!(outcomes.len(), LENGTH);
    assert!(outcomes.iter().all(|o| o.completed && !o.failed));
}
