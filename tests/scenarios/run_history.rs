//! Test: Run history - summaries of finished and halted runs

use crate::helpers::*;
use chrono::Utc;
use serde_json::json;
use wowza_bootstrap::persistence::create_summary;
use wowza_bootstrap::{ContinuationExecutor, ExecutorState, InMemoryPersistence, PersistenceBackend};

#[tokio::test]
async fn test_summary_of_finished_run() {
    let log = CallLog::default();
    let registry = test_registry(&log, 0);
    let source = json!({
        "actions": [
            { "action_name": "Record", "tag": "a" },
            { "action_name": "Record", "tag": "b", "result": "fail" },
        ]
    });
    let context = decode(&registry, source.clone());

    let started_at = Utc::now();
    ContinuationExecutor::new(context.clone()).run_to_completion().await.unwrap();
    let summary = create_summary(&context, started_at);

    assert_eq!(summary.run_id, context.id());
    assert_eq!(summary.state, ExecutorState::Complete);
    assert!(summary.completed_at.is_some());
    assert_eq!(summary.failed_actions(), 1);
    assert!(!summary.succeeded());
    assert_eq!(summary.document, document(source));

    let store = InMemoryPersistence::new();
    store.save_run(&summary).await.unwrap();
    assert_eq!(store.load_run(context.id()).await.unwrap(), Some(summary));
}

#[tokio::test]
async fn test_summary_of_halted_run() {
    let log = CallLog::default();
    let registry = test_registry(&log, 1);
    let context = decode(
        &registry,
        json!([
            { "action_name": "Record", "tag": "a" },
            { "action_name": "Faulting" },
        ]),
    );

    let started_at = Utc::now();
    assert!(ContinuationExecutor::new(context.clone()).run_to_completion().await.is_err());
    let summary = create_summary(&context, started_at);

    assert_eq!(summary.state, ExecutorState::Running);
    assert_eq!(summary.completed_at, None);
    assert!(summary.outcomes[0].succeeded());
    assert!(!summary.outcomes[1].completed);
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_sqlite_history_keeps_replayable_document() {
    use std::sync::Arc;
    use wowza_bootstrap::persistence::SqliteRunStore;
    use wowza_bootstrap::{codec, BootstrapConfig};

    let log = CallLog::default();
    let registry = test_registry(&log, 0);
    let context = decode(
        &registry,
        json!([
            { "action_name": "Record", "tag": "first-run" },
            { "action_name": "Noop", "nested": { "list": [1, 2] } },
        ]),
    );
    ContinuationExecutor::new(context.clone()).run_to_completion().await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let store = SqliteRunStore::new(&dir.path().join("runs.db")).await.unwrap();
    store.save_run(&create_summary(&context, Utc::now())).await.unwrap();

    let saved = store.load_run(context.id()).await.unwrap().unwrap();
    let replay = codec::decode(&registry, &saved.document, Arc::new(BootstrapConfig::default()))
        .unwrap()
        .unwrap();
    assert!(!replay.same_pipeline(&context));

    ContinuationExecutor::new(replay).run_to_completion().await.unwrap();
    assert_eq!(log.calls(), vec!["first-run", "first-run"]);
}
