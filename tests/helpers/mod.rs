//! Test utilities for wowza-bootstrap pipelines

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use wowza_bootstrap::core::handler::param_str;
use wowza_bootstrap::{
    ActionHandler, BootstrapConfig, HandlerRegistry, HandlerType, Parameters, PipelineContext, PipelineDocument,
};

/// Shared record of handler invocations, in call order
#[derive(Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.calls.lock().push(entry.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

/// Logs the `tag` parameter and answers per the `result` parameter:
/// `"fail"` is a soft failure, `"fault"` an error, anything else success
pub struct RecordingHandler {
    log: CallLog,
}

#[async_trait]
impl ActionHandler for RecordingHandler {
    async fn execute(&self, parameters: &Parameters, _config: &BootstrapConfig) -> anyhow::Result<bool> {
        self.log.push(param_str(parameters, "tag").unwrap_or("untagged"));
        match param_str(parameters, "result") {
            Some("fail") => Ok(false),
            Some("fault") => anyhow::bail!("recorded fault"),
            _ => Ok(true),
        }
    }
}

/// Faults on its first `faults` calls, then succeeds
pub struct FaultingHandler {
    log: CallLog,
    remaining: Arc<AtomicUsize>,
}

#[async_trait]
impl ActionHandler for FaultingHandler {
    async fn execute(&self, parameters: &Parameters, _config: &BootstrapConfig) -> anyhow::Result<bool> {
        self.log.push(param_str(parameters, "tag").unwrap_or("faulting"));
        let left = self.remaining.load(Ordering::SeqCst);
        if left > 0 {
            self.remaining.store(left - 1, Ordering::SeqCst);
            anyhow::bail!("transient fault ({} left)", left - 1);
        }
        Ok(true)
    }
}

/// Built-in registry plus `Record` and `Faulting` test handlers sharing `log`
pub fn test_registry(log: &CallLog, faults: usize) -> HandlerRegistry {
    let mut registry = HandlerRegistry::with_builtin_handlers().unwrap();

    let record_log = log.clone();
    registry
        .register(HandlerType::concrete("Record", move || RecordingHandler {
            log: record_log.clone(),
        }))
        .unwrap();

    let fault_log = log.clone();
    let remaining = Arc::new(AtomicUsize::new(faults));
    registry
        .register(HandlerType::concrete("Faulting", move || FaultingHandler {
            log: fault_log.clone(),
            remaining: remaining.clone(),
        }))
        .unwrap();

    registry
}

pub fn document(value: Value) -> PipelineDocument {
    PipelineDocument::from_value(value).unwrap()
}

/// Decode `value` against `registry` with default configuration
pub fn decode(registry: &HandlerRegistry, value: Value) -> PipelineContext {
    wowza_bootstrap::codec::decode(registry, &document(value), Arc::new(BootstrapConfig::default()))
        .unwrap()
        .expect("document should not be empty")
}

/// (completed, failed) of every action, in order
pub fn flags(context: &PipelineContext) -> Vec<(bool, bool)> {
    context.outcomes().iter().map(|o| (o.completed, o.failed)).collect()
}
