//! Scenario-based tests for wowza-bootstrap

mod builtin_pipeline;
mod failure_handling;
mod fault_resume;
mod noop_chain;
mod remote_source;
mod run_history;
