//! Events emitted while a pipeline runs

use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

/// Events that can occur during pipeline execution
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionEvent {
    PipelineStarted {
        run_id: Uuid,
        total_actions: usize,
    },
    ActionStarted {
        run_id: Uuid,
        index: usize,
        action_name: String,
    },
    ActionFinished {
        run_id: Uuid,
        index: usize,
        action_name: String,
        success: bool,
    },
    /// The handler errored; the run halts on this action
    ActionFaulted {
        run_id: Uuid,
        index: usize,
        action_name: String,
        error: String,
    },
    PipelineCompleted {
        run_id: Uuid,
        failed_actions: usize,
    },
}

impl ExecutionEvent {
    pub fn run_id(&self) -> Uuid {
        match self {
            ExecutionEvent::PipelineStarted { run_id, .. }
            | ExecutionEvent::ActionStarted { run_id, .. }
            | ExecutionEvent::ActionFinished { run_id, .. }
            | ExecutionEvent::ActionFaulted { run_id, .. }
            | ExecutionEvent::PipelineCompleted { run_id, .. } => *run_id,
        }
    }
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// Registered event handlers
#[derive(Default)]
pub(crate) struct EventBus {
    handlers: Mutex<Vec<EventHandler>>,
}

impl EventBus {
    pub(crate) fn add<F>(&self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.handlers.lock().push(Arc::new(handler));
    }

    /// Deliver an event to every handler, outside the lock
    pub(crate) fn emit(&self, event: ExecutionEvent) {
        let handlers: Vec<EventHandler> = self.handlers.lock().clone();
        for handler in handlers {
            handler(event.clone());
        }
    }
}
