//! Pipeline context - the aggregate owning a pipeline's actions and run state

use crate::core::{
    action::ActionInstance,
    config::BootstrapConfig,
    error::{PipelineError, Result},
    handler::{ActionHandler, Parameters},
    state::{ActionOutcome, ExecutorState},
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Shared handle to one pipeline's action list and execution state
///
/// Cloning the handle shares the same pipeline. Every [`ActionInstance`]
/// holds one, so the pipeline lives as long as any of its actions or an
/// outside caller still references it.
#[derive(Clone)]
pub struct PipelineContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    id: Uuid,
    created_at: DateTime<Utc>,
    config: Arc<BootstrapConfig>,
    state: Mutex<ContextState>,
    /// Held by the executor for a whole invoke or advance
    run_lock: tokio::sync::Mutex<()>,
}

#[derive(Default)]
struct ContextState {
    actions: Vec<ActionSlot>,
    /// Index of the next action to execute; `None` until the run starts
    cursor: Option<usize>,
    all_complete: bool,
}

struct ActionSlot {
    spec: Arc<ActionSpec>,
    completed: bool,
    failed: bool,
}

/// The immutable part of an action, shared by its slot and its handles
pub(crate) struct ActionSpec {
    pub action_name: String,
    pub handler: Arc<dyn ActionHandler>,
    pub parameters: Parameters,
}

impl PipelineContext {
    /// Create an empty pipeline sharing `config`
    pub fn new(config: Arc<BootstrapConfig>) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                id: Uuid::new_v4(),
                created_at: Utc::now(),
                config,
                state: Mutex::new(ContextState::default()),
                run_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Unique identifier of this pipeline run
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    /// Configuration shared by every action
    pub fn config(&self) -> &Arc<BootstrapConfig> {
        &self.inner.config
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handles to every action, in insertion order
    pub fn actions(&self) -> Vec<ActionInstance> {
        let state = self.inner.state.lock();
        state
            .actions
            .iter()
            .enumerate()
            .map(|(index, slot)| ActionInstance::from_parts(self.clone(), index, Arc::clone(&slot.spec)))
            .collect()
    }

    pub fn action(&self, index: usize) -> Option<ActionInstance> {
        let state = self.inner.state.lock();
        state
            .actions
            .get(index)
            .map(|slot| ActionInstance::from_parts(self.clone(), index, Arc::clone(&slot.spec)))
    }

    /// Position of the next action to execute, once the run has started
    pub fn cursor(&self) -> Option<usize> {
        self.inner.state.lock().cursor
    }

    pub fn all_complete(&self) -> bool {
        self.inner.state.lock().all_complete
    }

    /// Current lifecycle state
    pub fn state(&self) -> ExecutorState {
        let state = self.inner.state.lock();
        match (state.cursor, state.all_complete) {
            (_, true) => ExecutorState::Complete,
            (Some(_), false) => ExecutorState::Running,
            (None, false) => ExecutorState::NotStarted,
        }
    }

    /// Snapshot of every action's recorded result
    pub fn outcomes(&self) -> Vec<ActionOutcome> {
        let state = self.inner.state.lock();
        state
            .actions
            .iter()
            .enumerate()
            .map(|(index, slot)| ActionOutcome {
                index,
                action_name: slot.spec.action_name.clone(),
                completed: slot.completed,
                failed: slot.failed,
            })
            .collect()
    }

    /// Actions that ran and reported failure
    pub fn failed_actions(&self) -> Vec<ActionOutcome> {
        self.outcomes().into_iter().filter(|o| o.failed).collect()
    }

    /// Whether two handles refer to the same pipeline
    pub fn same_pipeline(&self, other: &PipelineContext) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Append an action; rejected once execution has started
    pub(crate) fn append(&self, spec: ActionSpec) -> Result<(usize, Arc<ActionSpec>)> {
        let mut state = self.inner.state.lock();
        if state.cursor.is_some() {
            return Err(PipelineError::ContextFrozen(self.inner.id));
        }
        let spec = Arc::new(spec);
        state.actions.push(ActionSlot {
            spec: Arc::clone(&spec),
            completed: false,
            failed: false,
        });
        Ok((state.actions.len() - 1, spec))
    }

    /// Wait until no other executor is driving this pipeline
    pub(crate) async fn lock_run(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.inner.run_lock.lock().await
    }

    /// Create the cursor at the head of the list; false if it already exists
    pub(crate) fn begin(&self) -> bool {
        let mut state = self.inner.state.lock();
        if state.cursor.is_some() || state.all_complete {
            return false;
        }
        state.cursor = Some(0);
        if state.actions.is_empty() {
            state.all_complete = true;
        }
        true
    }

    /// Index of the action under the cursor, if the run is in progress
    pub(crate) fn current(&self) -> Option<usize> {
        let state = self.inner.state.lock();
        match state.cursor {
            Some(index) if !state.all_complete && index < state.actions.len() => Some(index),
            _ => None,
        }
    }

    /// Move the cursor past `index`; returns true when the list is exhausted
    pub(crate) fn advance_past(&self, index: usize) -> bool {
        let mut state = self.inner.state.lock();
        let next = index + 1;
        state.cursor = Some(next);
        if next >= state.actions.len() {
            state.all_complete = true;
        }
        state.all_complete
    }

    /// Record a handler result; the first recorded result is kept
    pub(crate) fn record(&self, index: usize, success: bool) {
        let mut state = self.inner.state.lock();
        if let Some(slot) = state.actions.get_mut(index) {
            if slot.completed {
                return;
            }
            slot.failed = !success;
            slot.completed = true;
        }
    }

    pub(crate) fn slot_flags(&self, index: usize) -> (bool, bool) {
        let state = self.inner.state.lock();
        state
            .actions
            .get(index)
            .map(|slot| (slot.completed, slot.failed))
            .unwrap_or((false, false))
    }
}

impl fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("PipelineContext")
            .field("id", &self.inner.id)
            .field(
                "actions",
                &state
                    .actions
                    .iter()
                    .map(|a| a.spec.action_name.as_str())
                    .collect::<Vec<_>>(),
            )
            .field("cursor", &state.cursor)
            .field("all_complete", &state.all_complete)
            .finish()
    }
}
