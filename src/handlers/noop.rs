use crate::core::{
    config::BootstrapConfig,
    handler::{ActionHandler, HandlerType, Parameters},
};
use async_trait::async_trait;
use tracing::debug;

/// Does nothing and succeeds
pub struct Noop;

#[async_trait]
impl ActionHandler for Noop {
    async fn execute(&self, parameters: &Parameters, _config: &BootstrapConfig) -> anyhow::Result<bool> {
        debug!("Noop called with {} parameters", parameters.len());
        Ok(true)
    }
}

pub fn handler_type() -> HandlerType {
    HandlerType::concrete("Noop", || Noop)
}
