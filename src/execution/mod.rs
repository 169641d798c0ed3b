//! Pipeline execution

pub mod events;
pub mod executor;

pub use events::{EventHandler, ExecutionEvent};
pub use executor::{ContinuationExecutor, StepOutcome};
