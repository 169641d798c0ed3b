//! Core domain models for the action pipeline
//!
//! This module defines handler types and their registry, action instances,
//! the pipeline context that owns them, and the configuration they share.

pub mod action;
pub mod config;
pub mod context;
pub mod error;
pub mod handler;
pub mod registry;
pub mod schema;
pub mod state;

pub use action::ActionInstance;
pub use config::BootstrapConfig;
pub use context::PipelineContext;
pub use error::{PipelineError, RegistryError, Result};
pub use handler::{ActionHandler, HandlerType, Parameters, BASE_ACTION};
pub use registry::HandlerRegistry;
pub use schema::{FieldCatalog, FieldSchema, FieldSpec, Requirement, SchemaViolation};
pub use state::{ActionOutcome, ExecutorState};
