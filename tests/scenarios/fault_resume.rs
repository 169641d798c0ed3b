//! Test: Fault and resume - a handler error halts the run where it happened

use crate::helpers::*;
use serde_json::json;
use wowza_bootstrap::{ContinuationExecutor, ExecutorState, PipelineError};

#[tokio::test]
async fn test_fault_halts_and_invoke_resumes() {
    let log = CallLog::default();
    let registry = test_registry(&log, 1);
    let context = decode(
        &registry,
        json!([
            { "action_name": "Record", "tag": "before" },
            { "action_name": "Faulting", "tag": "flaky" },
            { "action_name": "Record", "tag": "after" },
        ]),
    );
    let executor = ContinuationExecutor::new(context.clone());

    let err = executor.run_to_completion().await.unwrap_err();
    match &err {
        PipelineError::HandlerFault { index, action_name, .. } => {
            assert_eq!(*index, 1);
            assert_eq!(action_name, "Faulting");
        }
        other => panic!("Expected HandlerFault, got {:?}", other),
    }
    assert!(err.to_string().contains("transient fault"));

    assert_eq!(executor.state(), ExecutorState::Running);
    assert!(!context.all_complete());
    assert_eq!(flags(&context), vec![(true, false), (false, false), (false, false)]);
    assert_eq!(log.calls(), vec!["before", "flaky"]);

    assert_eq!(executor.invoke().await.unwrap(), ExecutorState::Complete);
    assert_eq!(log.calls(), vec!["before", "flaky", "flaky", "after"]);
    assert_eq!(flags(&context), vec![(true, false); 3]);
}

#[tokio::test]
async fn test_repeated_faults_never_skip_the_action() {
    let log = CallLog::default();
    let registry = test_registry(&log, 2);
    let context = decode(
        &registry,
        json!([
            { "action_name": "Faulting", "tag": "flaky" },
            { "action_name": "Record", "tag": "after" },
        ]),
    );
    let executor = ContinuationExecutor::new(context.clone());

    assert!(executor.run_to_completion().await.is_err());
    assert!(executor.invoke().await.is_err());
    assert_eq!(context.cursor(), Some(0));

    assert_eq!(executor.invoke().await.unwrap(), ExecutorState::Complete);
    assert_eq!(log.calls(), vec!["flaky", "flaky", "flaky", "after"]);
}

#[tokio::test]
async fn test_no_appends_once_running() {
    let log = CallLog::default();
    let registry = test_registry(&log, 0);
    let context = decode(&registry, json!([{ "action_name": "Record", "tag": "a" }]));
    ContinuationExecutor::new(context.clone()).invoke().await.unwrap();

    let late = wowza_bootstrap::ActionInstance::create(&registry, "Noop", Default::default(), Some(&context));
    assert!(matches!(late, Err(PipelineError::ContextFrozen(id)) if id == context.id()));
    assert_eq!(context.len(), 1);
}
