//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{HistoryCommand, RunCommand, SchemaCommand, ValidateCommand};
use std::ffi::OsString;
use std::path::PathBuf;

/// Bootstrap a Wowza Streaming Engine instance from a declarative action pipeline
#[derive(Debug, Parser, Clone)]
#[command(name = "wowza-bootstrap")]
#[command(version)]
#[command(about = "Run declarative action pipelines that bootstrap a Wowza Streaming Engine instance", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the bootstrap configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run a pipeline to completion
    Run(RunCommand),

    /// Decode a pipeline and check its parameters without running it
    Validate(ValidateCommand),

    /// Show the parameter fields of every action
    Schema(SchemaCommand),

    /// Show run history
    History(HistoryCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
