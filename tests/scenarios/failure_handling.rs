//! Test: Failure handling - soft failures are recorded and do not halt the run

use crate::helpers::*;
use serde_json::json;
use wowza_bootstrap::{ContinuationExecutor, ExecutionEvent, ExecutorState};

#[tokio::test]
async fn test_soft_failure_continues() {
    let log = CallLog::default();
    let registry = test_registry(&log, 0);
    let context = decode(
        &registry,
        json!([
            { "action_name": "Record", "tag": "a" },
            { "action_name": "Record", "tag": "b", "result": "fail" },
            { "action_name": "Record", "tag": "c" },
        ]),
    );

    let state = ContinuationExecutor::new(context.clone()).run_to_completion().await.unwrap();

    assert_eq!(state, ExecutorState::Complete);
    assert_eq!(log.calls(), vec!["a", "b", "c"]);
    assert_eq!(flags(&context), vec![(true, false), (true, true), (true, false)]);
    let failed = context.failed_actions();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].index, 1);
}

#[tokio::test]
async fn test_every_action_failing_still_completes() {
    let log = CallLog::default();
    let registry = test_registry(&log, 0);
    let context = decode(
        &registry,
        json!([
            { "action_name": "Record", "tag": "a", "result": "fail" },
            { "action_name": "Record", "tag": "b", "result": "fail" },
        ]),
    );

    let events = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = events.clone();
    let executor = ContinuationExecutor::new(context.clone()).with_event_handler(move |event| sink.lock().push(event));

    assert_eq!(executor.run_to_completion().await.unwrap(), ExecutorState::Complete);
    assert!(context.all_complete());
    assert!(matches!(
        events.lock().last(),
        Some(ExecutionEvent::PipelineCompleted { failed_actions: 2, .. })
    ));
}

#[tokio::test]
async fn test_bad_cron_fields_are_a_soft_failure() {
    let log = CallLog::default();
    let registry = test_registry(&log, 0);
    let dir = tempfile::tempdir().unwrap();
    let tab = dir.path().join("crontab");
    let context = decode(
        &registry,
        json!([
            { "action_name": "CronJob", "user": "root", "fields": "whenever", "command": "ls",
              "filename": tab.to_str().unwrap() },
            { "action_name": "Record", "tag": "after" },
        ]),
    );

    ContinuationExecutor::new(context.clone()).run_to_completion().await.unwrap();
    assert_eq!(flags(&context), vec![(true, true), (true, false)]);
    assert_eq!(log.calls(), vec!["after"]);
    assert!(!tab.exists());
}
