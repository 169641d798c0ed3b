//! Continuation executor - drives a pipeline through its actions in order

use crate::{
    core::{
        context::PipelineContext,
        error::Result,
        state::ExecutorState,
        PipelineError,
    },
    execution::events::{EventBus, ExecutionEvent},
};
use tracing::{debug, error, info, warn};

/// What a single [`ContinuationExecutor::advance`] call did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// One action ran and reported `success`
    Executed {
        index: usize,
        action_name: String,
        success: bool,
    },
    /// Nothing left to run
    Complete,
}

/// Sequential driver over one pipeline context
///
/// The executor keeps no state of its own: the cursor and completion flag
/// live on the context, so any executor built over the same context picks
/// up where the last one stopped. Only one executor drives a context at a
/// time.
pub struct ContinuationExecutor {
    context: PipelineContext,
    events: EventBus,
}

impl ContinuationExecutor {
    pub fn new(context: PipelineContext) -> Self {
        Self {
            context,
            events: EventBus::default(),
        }
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.events.add(handler);
    }

    /// Builder form of [`add_event_handler`](Self::add_event_handler)
    pub fn with_event_handler<F>(self, handler: F) -> Self
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.events.add(handler);
        self
    }

    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    pub fn state(&self) -> ExecutorState {
        self.context.state()
    }

    /// Continue the pipeline
    ///
    /// On a pipeline that has not started this only places the cursor at the
    /// head of the list. On a running pipeline every remaining action is
    /// executed in order. A completed pipeline is left alone.
    ///
    /// A handler fault stops the loop with the cursor still on the faulted
    /// action, so a later call retries it. Calls overlapping on the same
    /// context, from this executor or another, wait for each other.
    pub async fn invoke(&self) -> Result<ExecutorState> {
        let _run = self.context.lock_run().await;
        self.continue_run().await
    }

    /// Execute exactly one action, starting the pipeline first if needed
    pub async fn advance(&self) -> Result<StepOutcome> {
        let _run = self.context.lock_run().await;
        if self.context.state() == ExecutorState::NotStarted {
            self.bootstrap();
        }
        Ok(self.step().await?.unwrap_or(StepOutcome::Complete))
    }

    /// Start the pipeline if needed and run it to the end
    pub async fn run_to_completion(&self) -> Result<ExecutorState> {
        let _run = self.context.lock_run().await;
        if self.context.state() == ExecutorState::NotStarted {
            self.bootstrap();
        }
        self.continue_run().await
    }

    /// Body of [`invoke`](Self::invoke); the caller holds the run lock
    async fn continue_run(&self) -> Result<ExecutorState> {
        match self.context.state() {
            ExecutorState::NotStarted => {
                self.bootstrap();
            }
            ExecutorState::Running => {
                while self.step().await?.is_some() {}
            }
            ExecutorState::Complete => {
                debug!("Pipeline {} already complete, nothing to do", self.context.id());
            }
        }
        Ok(self.context.state())
    }

    fn bootstrap(&self) {
        if !self.context.begin() {
            return;
        }

        let run_id = self.context.id();
        let total_actions = self.context.len();
        info!("Starting pipeline {} ({} actions)", run_id, total_actions);
        self.events.emit(ExecutionEvent::PipelineStarted {
            run_id,
            total_actions,
        });

        if self.context.all_complete() {
            self.finish();
        }
    }

    /// Run the action under the cursor; `None` once the list is exhausted
    async fn step(&self) -> Result<Option<StepOutcome>> {
        let Some(index) = self.context.current() else {
            return Ok(None);
        };
        let Some(action) = self.context.action(index) else {
            return Ok(None);
        };

        let run_id = self.context.id();
        let action_name = action.action_name().to_string();
        info!("Running action #{}: {}", index, action_name);
        debug!("Parameters for action #{}: {:?}", index, action.parameters());
        self.events.emit(ExecutionEvent::ActionStarted {
            run_id,
            index,
            action_name: action_name.clone(),
        });

        let success = match action.execute().await {
            Ok(success) => success,
            Err(e) => {
                error!("Action #{} ({}) faulted: {}", index, action_name, e);
                self.events.emit(ExecutionEvent::ActionFaulted {
                    run_id,
                    index,
                    action_name,
                    error: fault_message(&e),
                });
                return Err(e);
            }
        };

        if success {
            info!("Action #{} ({}) succeeded", index, action_name);
        } else {
            warn!("Action #{} ({}) reported failure, continuing", index, action_name);
        }
        self.events.emit(ExecutionEvent::ActionFinished {
            run_id,
            index,
            action_name: action_name.clone(),
            success,
        });

        if self.context.advance_past(index) {
            self.finish();
        }

        Ok(Some(StepOutcome::Executed {
            index,
            action_name,
            success,
        }))
    }

    fn finish(&self) {
        let run_id = self.context.id();
        let failed_actions = self.context.failed_actions().len();
        info!(
            "Pipeline {} complete ({} failed actions)",
            run_id, failed_actions
        );
        self.events.emit(ExecutionEvent::PipelineCompleted {
            run_id,
            failed_actions,
        });
    }
}

fn fault_message(err: &PipelineError) -> String {
    match err {
        PipelineError::HandlerFault { source, .. } => source.to_string(),
        other => other.to_string(),
    }
}
