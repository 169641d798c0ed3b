//! CLI output formatting

use crate::{
    codec::RecordReport,
    core::{config::InstanceMetadata, ExecutorState, FieldSchema, Requirement},
    execution::ExecutionEvent,
    persistence::RunSummary,
};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Create a progress bar over `total` actions
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    if let Ok(bar_style) =
        ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        progress.set_style(bar_style.progress_chars("#>-"));
    }
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

fn short_id(id: &uuid::Uuid) -> String {
    id.to_string()[..8].to_string()
}

/// Format an executor state for display
pub fn format_state(state: ExecutorState) -> String {
    match state {
        ExecutorState::NotStarted => style("NOT STARTED").dim().to_string(),
        ExecutorState::Running => style("RUNNING").yellow().to_string(),
        ExecutorState::Complete => style("COMPLETE").green().to_string(),
    }
}

/// Describe the instance being bootstrapped; `None` off EC2
pub fn format_instance(instance: &InstanceMetadata) -> Option<String> {
    if !instance.is_ec2_instance {
        return None;
    }
    let unknown = || "unknown".to_string();
    Some(format!(
        "instance {} ({}) in {}",
        style(instance.instance_id.clone().unwrap_or_else(unknown)).cyan(),
        instance.instance_type.clone().unwrap_or_else(unknown),
        style(instance.region().unwrap_or_else(unknown)).bold()
    ))
}

/// One-line run summary for history listings
pub fn format_run_summary(summary: &RunSummary) -> String {
    let status_icon = if summary.succeeded() {
        CHECK
    } else if summary.state == ExecutorState::Complete {
        CROSS
    } else {
        WARN
    };

    format!(
        "{} {} - {} - {} ({} actions, {} failed)",
        status_icon,
        style(short_id(&summary.run_id)).dim(),
        style(summary.started_at.format("%Y-%m-%d %H:%M:%S")).bold(),
        format_state(summary.state),
        summary.total_actions(),
        style(summary.failed_actions()).red()
    )
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::PipelineStarted { run_id, total_actions } => format!(
            "{} Starting pipeline {} ({} actions)",
            ROCKET,
            style(short_id(run_id)).dim(),
            style(total_actions).cyan()
        ),
        ExecutionEvent::ActionStarted { index, action_name, .. } => {
            format!("{} #{} {}", SPINNER, index, style(action_name).cyan())
        }
        ExecutionEvent::ActionFinished {
            index,
            action_name,
            success: true,
            ..
        } => format!("{} #{} {}", CHECK, index, style(action_name).green()),
        ExecutionEvent::ActionFinished { index, action_name, .. } => format!(
            "{} #{} {} {}",
            CROSS,
            index,
            style(action_name).red(),
            style("(reported failure, continuing)").dim()
        ),
        ExecutionEvent::ActionFaulted {
            index,
            action_name,
            error,
            ..
        } => format!(
            "{} #{} {}: {}",
            CROSS,
            index,
            style(action_name).red(),
            style(error).dim()
        ),
        ExecutionEvent::PipelineCompleted { run_id, failed_actions } => {
            let status_str = if *failed_actions == 0 {
                format!("{} completed", style("successfully").green())
            } else {
                style(format!("completed with {} failed actions", failed_actions))
                    .red()
                    .to_string()
            };
            format!("{} Pipeline ({}) {}", INFO, style(short_id(run_id)).dim(), status_str)
        }
    }
}

/// Format one record's validation result
pub fn format_record_report(report: &RecordReport) -> String {
    if report.is_valid() {
        return format!("  {} #{} {}", CHECK, report.index, style(&report.action_name).green());
    }
    let mut lines = vec![format!(
        "  {} #{} {}",
        CROSS,
        report.index,
        style(&report.action_name).red()
    )];
    for violation in &report.violations {
        lines.push(format!("      {}", style(violation).dim()));
    }
    lines.join("\n")
}

/// Format the merged fields of one action
pub fn format_field_schema(action_name: &str, fields: &FieldSchema) -> String {
    let mut lines = vec![format!("{}", style(action_name).bold())];
    if fields.is_empty() {
        lines.push(format!("  {}", style("(no fields)").dim()));
    }
    for (name, spec) in fields {
        let requirement = match &spec.required {
            Requirement::Flag(true) => style("required".to_string()).yellow(),
            Requirement::Flag(false) => style("optional".to_string()).dim(),
            Requirement::OneOf(group) => style(format!("one of {}", group.join("|"))).yellow(),
        };
        let mut line = format!("  {} [{}]", style(name).cyan(), requirement);
        if !spec.default.is_null() {
            line.push_str(&format!(" default={}", spec.default));
        }
        if let Some(options) = &spec.options {
            let options: Vec<String> = options.iter().map(ToString::to_string).collect();
            line.push_str(&format!(" options={}", options.join(",")));
        }
        if !spec.help.is_empty() {
            line.push_str(&format!(" - {}", spec.help));
        }
        lines.push(line);
    }
    lines.join("\n")
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
