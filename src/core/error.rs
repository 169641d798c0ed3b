//! Error types for the action pipeline

use thiserror::Error;
use uuid::Uuid;

/// Errors raised while building, decoding, or running a pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No registered handler answers to the action name
    #[error("could not locate handler for action '{0}'")]
    UnresolvedActionType(String),

    /// The pipeline document could not be parsed or is missing `actions`
    #[error("malformed pipeline document: {0}")]
    MalformedDocument(String),

    /// The pipeline source (file or URL) could not be read
    #[error("pipeline source unavailable: {0}")]
    SourceUnavailable(String),

    /// The encoded pipeline could not be written out
    #[error("failed to write pipeline document to {path}: {source}")]
    DocumentWrite {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A handler signalled an unrecoverable error; the run is halted
    #[error("action #{index} ({action_name}) faulted: {source}")]
    HandlerFault {
        index: usize,
        action_name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// An action was appended to a context that has already started running
    #[error("pipeline {0} has started executing; its action list is frozen")]
    ContextFrozen(Uuid),
}

/// Errors raised while registering handler types
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("handler type '{0}' is already registered")]
    DuplicateType(String),

    #[error("action name '{action_name}' is already claimed by handler type '{existing}'")]
    DuplicateActionName {
        action_name: String,
        existing: String,
    },

    #[error("handler type '{type_name}' extends unknown type '{parent}'")]
    UnknownParent { type_name: String, parent: String },

    #[error("concrete handler type '{0}' has no factory")]
    MissingFactory(String),
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
