//! wowza-bootstrap - declarative action pipelines for bootstrapping
//! Wowza Streaming Engine instances

pub mod cli;
pub mod codec;
pub mod core;
pub mod execution;
pub mod handlers;
pub mod persistence;

// Re-export commonly used types
pub use crate::codec::{PipelineDocument, PipelineSource};
pub use crate::core::{
    ActionHandler, ActionInstance, BootstrapConfig, ExecutorState, HandlerRegistry, HandlerType, Parameters,
    PipelineContext, PipelineError,
};
pub use crate::execution::{ContinuationExecutor, ExecutionEvent, StepOutcome};
pub use crate::persistence::{InMemoryPersistence, PersistenceBackend, RunSummary};
