//! Test: Built-in handlers - a full bootstrap pipeline against a scratch directory

use crate::helpers::*;
use serde_json::json;
use std::sync::Arc;
use wowza_bootstrap::{codec, BootstrapConfig, ContinuationExecutor, ExecutorState};

#[tokio::test]
async fn test_bootstrap_pipeline_writes_files() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("WowzaStreamingEngine");
    let units = dir.path().join("systemd");
    let crontab = dir.path().join("crontab");
    let script = dir.path().join("post-install.sh");

    let yaml = format!(
        r#"
wowza:
  root_path: "{root}"
  server_license: "SVR-LICENSE"
  users:
    - name: "admin"
      password: "secret"
systemd:
  system_unit_dir: "{units}"
cron:
  system_tab: "{crontab}"
"#,
        root = root.display(),
        units = units.display(),
        crontab = crontab.display()
    );
    let config = Arc::new(BootstrapConfig::from_yaml(&yaml).unwrap());

    let log = CallLog::default();
    let registry = test_registry(&log, 0);
    let document = document(json!({
        "actions": [
            { "action_name": "SetConfig", "publish_users": [{ "name": "encoder", "password": "pub" }] },
            { "action_name": "SystemdServiceConf", "user": "wowza", "group": "wowza" },
            { "action_name": "CronJob", "user": "root", "fields": { "minute": "*/10" },
              "command": "/usr/local/bin/sync-logs" },
            { "action_name": "CustomScript", "filename": script.to_str().unwrap(),
              "contents": "#!/bin/sh\nexit 0\n" },
            { "action_name": "Noop" },
        ]
    }));

    let reports = codec::validate_document(&registry, &document).unwrap();
    assert!(reports.iter().all(|r| r.is_valid()), "{reports:?}");

    let context = codec::decode(&registry, &document, Arc::clone(&config)).unwrap().unwrap();
    let state = ContinuationExecutor::new(context.clone()).run_to_completion().await.unwrap();
    assert_eq!(state, ExecutorState::Complete);
    assert!(context.failed_actions().is_empty());

    let conf = root.join("conf");
    assert_eq!(std::fs::read_to_string(conf.join("Server.license")).unwrap(), "SVR-LICENSE");
    assert_eq!(std::fs::read_to_string(conf.join("admin.password")).unwrap(), "admin secret admin");
    assert_eq!(std::fs::read_to_string(conf.join("publish.password")).unwrap(), "encoder pub");

    let engine_unit = std::fs::read_to_string(units.join("WowzaStreamingEngine.service")).unwrap();
    assert!(engine_unit.contains("User=wowza\n"));
    assert!(engine_unit.contains(&format!("ExecStart={}/bin/WowzaStreamingEngine start", root.display())));

    assert_eq!(
        std::fs::read_to_string(&crontab).unwrap(),
        "*/10 * * * * root /usr/local/bin/sync-logs\n"
    );
    assert!(script.exists());
}

#[tokio::test]
async fn test_schema_catalog_lists_builtins() {
    let log = CallLog::default();
    let registry = test_registry(&log, 0);
    let catalog = registry.field_catalog();

    for name in ["Noop", "CustomScript", "SetConfig", "SystemdServiceConf", "CronJob", "Record"] {
        assert!(catalog.contains_key(name), "{name} missing from catalog");
    }
    assert!(!catalog.contains_key("BaseAction"));

    let exported = serde_json::to_value(&catalog).unwrap();
    assert_eq!(exported["CustomScript"]["filename"]["required"], json!(true));
    assert_eq!(exported["CustomScript"]["url"]["required"], json!(["contents", "url"]));
    assert_eq!(exported["SystemdServiceConf"]["unit_type"]["options"], json!(["system", "user"]));
    assert_eq!(exported["SystemdServiceConf"]["user"]["default"], json!("root"));
}

#[tokio::test]
async fn test_validation_flags_missing_fields() {
    let log = CallLog::default();
    let registry = test_registry(&log, 0);
    let document = document(json!([
        { "action_name": "CustomScript" },
        { "action_name": "SystemdServiceConf", "unit_type": "global" },
    ]));

    let reports = codec::validate_document(&registry, &document).unwrap();
    let messages: Vec<Vec<String>> = reports
        .iter()
        .map(|r| r.violations.iter().map(ToString::to_string).collect())
        .collect();
    assert_eq!(
        messages,
        vec![
            vec![
                "missing required field 'filename'".to_string(),
                "one of [contents, url] must be present".to_string(),
            ],
            vec!["value \"global\" is not a valid option for 'unit_type'".to_string()],
        ]
    );
}
