//! Action instances - configured, runnable pipeline steps

use crate::core::{
    config::BootstrapConfig,
    context::{ActionSpec, PipelineContext},
    error::{PipelineError, Result},
    handler::Parameters,
    registry::HandlerRegistry,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Handle to one action of a pipeline
///
/// The action belongs to the context it was created in for its whole life.
#[derive(Clone)]
pub struct ActionInstance {
    context: PipelineContext,
    index: usize,
    spec: Arc<ActionSpec>,
}

impl ActionInstance {
    /// Create an action, joining `context` if given or starting a new
    /// pipeline with default configuration otherwise
    pub fn create(
        registry: &HandlerRegistry,
        action_name: &str,
        parameters: Parameters,
        context: Option<&PipelineContext>,
    ) -> Result<Self> {
        match context {
            Some(context) => Self::create_in(registry, action_name, parameters, context),
            None => Self::create_root(
                registry,
                action_name,
                parameters,
                Arc::new(BootstrapConfig::default()),
            ),
        }
    }

    /// Create the first action of a new pipeline sharing `config`
    pub fn create_root(
        registry: &HandlerRegistry,
        action_name: &str,
        parameters: Parameters,
        config: Arc<BootstrapConfig>,
    ) -> Result<Self> {
        // Resolve before creating anything so an unknown name leaves no trace.
        let handler = registry.instantiate(action_name)?;
        let context = PipelineContext::new(config);
        let (index, spec) = context.append(ActionSpec {
            action_name: action_name.to_string(),
            handler,
            parameters,
        })?;
        debug!("Created pipeline {} with root action {}", context.id(), action_name);
        Ok(Self { context, index, spec })
    }

    /// Create an action appended to an existing pipeline
    pub fn create_in(
        registry: &HandlerRegistry,
        action_name: &str,
        parameters: Parameters,
        context: &PipelineContext,
    ) -> Result<Self> {
        let handler = registry.instantiate(action_name)?;
        let (index, spec) = context.append(ActionSpec {
            action_name: action_name.to_string(),
            handler,
            parameters,
        })?;
        debug!("Appended action #{} {} to pipeline {}", index, action_name, context.id());
        Ok(Self {
            context: context.clone(),
            index,
            spec,
        })
    }

    pub(crate) fn from_parts(context: PipelineContext, index: usize, spec: Arc<ActionSpec>) -> Self {
        Self { context, index, spec }
    }

    /// The pipeline this action belongs to
    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    /// Position within the pipeline
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn action_name(&self) -> &str {
        &self.spec.action_name
    }

    /// Parameters exactly as supplied at construction
    pub fn parameters(&self) -> &Parameters {
        &self.spec.parameters
    }

    pub fn completed(&self) -> bool {
        self.context.slot_flags(self.index).0
    }

    pub fn failed(&self) -> bool {
        self.context.slot_flags(self.index).1
    }

    /// Run the handler and record its result
    ///
    /// A handler error is returned as [`PipelineError::HandlerFault`] and
    /// leaves the action neither completed nor failed. An action that has
    /// already completed is not run again.
    pub(crate) async fn execute(&self) -> Result<bool> {
        let (completed, failed) = self.context.slot_flags(self.index);
        if completed {
            warn!(
                "Action #{} ({}) already completed, not running it again",
                self.index, self.spec.action_name
            );
            return Ok(!failed);
        }

        let config = Arc::clone(self.context.config());
        match self.spec.handler.execute(&self.spec.parameters, &config).await {
            Ok(success) => {
                self.context.record(self.index, success);
                Ok(success)
            }
            Err(e) => Err(PipelineError::HandlerFault {
                index: self.index,
                action_name: self.spec.action_name.clone(),
                source: e.into(),
            }),
        }
    }
}

impl fmt::Debug for ActionInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (completed, failed) = self.context.slot_flags(self.index);
        f.debug_struct("ActionInstance")
            .field("pipeline", &self.context.id())
            .field("index", &self.index)
            .field("action_name", &self.action_name())
            .field("completed", &completed)
            .field("failed", &failed)
            .finish()
    }
}
