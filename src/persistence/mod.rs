//! Persistence layer for pipeline run history

#[cfg(feature = "sqlite")]
pub mod store;

#[cfg(feature = "sqlite")]
pub use store::SqliteRunStore;

use crate::codec::{self, PipelineDocument};
use crate::core::{context::PipelineContext, state::{ActionOutcome, ExecutorState}};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Snapshot of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Identifier of the pipeline context
    pub run_id: Uuid,

    /// Executor state when the snapshot was taken
    pub state: ExecutorState,

    pub started_at: DateTime<Utc>,

    /// Set once the run is complete
    pub completed_at: Option<DateTime<Utc>>,

    /// Per-action results, in pipeline order
    pub outcomes: Vec<ActionOutcome>,

    /// The pipeline as a replayable document
    pub document: PipelineDocument,
}

impl RunSummary {
    pub fn total_actions(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failed_actions(&self) -> usize {
        self.outcomes.iter().filter(|o| o.failed).count()
    }

    /// Ran to the end with no failed action
    pub fn succeeded(&self) -> bool {
        self.state == ExecutorState::Complete && self.failed_actions() == 0
    }
}

/// Trait for persistence backends
#[async_trait::async_trait]
pub trait PersistenceBackend: Send + Sync {
    /// Save a run, replacing any earlier snapshot with the same id
    async fn save_run(&self, run: &RunSummary) -> Result<()>;

    /// Load a run by ID
    async fn load_run(&self, run_id: Uuid) -> Result<Option<RunSummary>>;

    /// Most recent runs first, at most `limit`
    async fn list_runs(&self, limit: usize) -> Result<Vec<RunSummary>>;
}

/// In-memory persistence (for testing or ephemeral use)
pub struct InMemoryPersistence {
    runs: RwLock<HashMap<Uuid, RunSummary>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self {
            runs: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryPersistence {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PersistenceBackend for InMemoryPersistence {
    async fn save_run(&self, run: &RunSummary) -> Result<()> {
        self.runs.write().await.insert(run.run_id, run.clone());
        Ok(())
    }

    async fn load_run(&self, run_id: Uuid) -> Result<Option<RunSummary>> {
        Ok(self.runs.read().await.get(&run_id).cloned())
    }

    async fn list_runs(&self, limit: usize) -> Result<Vec<RunSummary>> {
        let runs = self.runs.read().await;
        let mut result: Vec<RunSummary> = runs.values().cloned().collect();
        result.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        result.truncate(limit);
        Ok(result)
    }
}

/// Create a summary from a pipeline context
pub fn create_summary(context: &PipelineContext, started_at: DateTime<Utc>) -> RunSummary {
    let state = context.state();
    RunSummary {
        run_id: context.id(),
        state,
        started_at,
        completed_at: (state == ExecutorState::Complete).then(Utc::now),
        outcomes: context.outcomes(),
        document: codec::encode(context),
    }
}
