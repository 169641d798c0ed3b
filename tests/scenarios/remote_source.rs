//! Test: Remote source - pipelines fetched over HTTP

use crate::helpers::*;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wowza_bootstrap::{codec, BootstrapConfig, ContinuationExecutor, PipelineError, PipelineSource};

#[tokio::test]
async fn test_load_and_run_from_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bootstrap.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "actions": [
                { "action_name": "Record", "tag": "remote-1" },
                { "action_name": "Record", "tag": "remote-2" },
            ]
        })))
        .mount(&server)
        .await;

    let log = CallLog::default();
    let registry = test_registry(&log, 0);
    let source = PipelineSource::new().url(format!("{}/bootstrap.json", server.uri()));

    let context = codec::load(&registry, &source, Arc::new(BootstrapConfig::default()))
        .await
        .unwrap()
        .unwrap();
    assert!(log.calls().is_empty());

    ContinuationExecutor::new(context).run_to_completion().await.unwrap();
    assert_eq!(log.calls(), vec!["remote-1", "remote-2"]);
}

#[tokio::test]
async fn test_server_error_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let log = CallLog::default();
    let registry = test_registry(&log, 0);
    let source = PipelineSource::new().url(format!("{}/bootstrap.json", server.uri()));

    let result = codec::load(&registry, &source, Arc::new(BootstrapConfig::default())).await;
    assert!(matches!(result, Err(PipelineError::SourceUnavailable(_))));
}

#[tokio::test]
async fn test_file_beats_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "action_name": "Record", "tag": "url" }])))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("pipeline.json");
    std::fs::write(&file, r#"[{"action_name": "Record", "tag": "file"}]"#).unwrap();

    let log = CallLog::default();
    let registry = test_registry(&log, 0);
    let source = PipelineSource::new().url(server.uri()).file(&file);

    let context = codec::load(&registry, &source, Arc::new(BootstrapConfig::default()))
        .await
        .unwrap()
        .unwrap();
    ContinuationExecutor::new(context).run_to_completion().await.unwrap();
    assert_eq!(log.calls(), vec!["file"]);
}

#[tokio::test]
async fn test_unknown_remote_action_fails_decode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "action_name": "AssociateEip" }])))
        .mount(&server)
        .await;

    let log = CallLog::default();
    let registry = test_registry(&log, 0);
    let source = PipelineSource::new().url(server.uri());

    let result = codec::load(&registry, &source, Arc::new(BootstrapConfig::default())).await;
    assert!(matches!(result, Err(PipelineError::UnresolvedActionType(name)) if name == "AssociateEip"));
}
