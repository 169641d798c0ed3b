//! CLI command definitions

use crate::codec::PipelineSource;
use crate::core::BootstrapConfig;
use clap::Args;
use std::path::PathBuf;

/// Where to read the pipeline from
#[derive(Debug, Args, Clone, Default)]
pub struct SourceArgs {
    /// Path to a pipeline document (JSON, or YAML with a .yaml/.yml extension)
    #[arg(short, long, conflicts_with = "url")]
    pub file: Option<PathBuf>,

    /// URL of a JSON pipeline document
    #[arg(short, long)]
    pub url: Option<String>,
}

impl SourceArgs {
    /// The requested source, falling back to the pipeline embedded in the config
    pub fn to_source(&self, config: &BootstrapConfig) -> PipelineSource {
        let mut source = PipelineSource::new();
        if let Some(file) = &self.file {
            source = source.file(file);
        }
        if let Some(url) = &self.url {
            source = source.url(url);
        }
        if source.is_empty() {
            if let Some(document) = &config.pipeline {
                source = source.document(document.clone());
            }
        }
        source
    }
}

/// Run a pipeline
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Write the pipeline document, as run, to this path
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Don't save the run to history
    #[arg(long)]
    pub no_history: bool,
}

/// Validate a pipeline
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Show the field schema catalog
#[derive(Debug, Args, Clone)]
pub struct SchemaCommand {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Show run history
#[derive(Debug, Args, Clone)]
pub struct HistoryCommand {
    /// Number of recent runs to show
    #[arg(short, long, default_value_t = 10)]
    pub limit: usize,

    /// Show a single run in detail
    #[arg(long)]
    pub run_id: Option<String>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
