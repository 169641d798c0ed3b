//! Add an entry to the system crontab or a user crontab

use crate::core::{
    config::BootstrapConfig,
    handler::{param_str, ActionHandler, HandlerType, Parameters},
    schema::FieldSpec,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::OnceLock;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

const CRON_FIELDS: [&str; 5] = ["minute", "hour", "dom", "mon", "dow"];
const SYSTEM_USER: &str = "root";

pub struct CronJob;

fn field_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let item = r"(\*|[0-9A-Za-z]+(-[0-9A-Za-z]+)?)(/[0-9]+)?";
        Regex::new(&format!(r"^{item}(,{item})*$")).expect("valid cron field pattern")
    })
}

fn nickname_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^@(reboot|yearly|annually|monthly|weekly|daily|midnight|hourly)$")
            .expect("valid cron nickname pattern")
    })
}

/// Normalize the `fields` parameter to a single schedule string
///
/// Accepts `"m h dom mon dow"`, a five element list, a map keyed by
/// `minute`/`hour`/`dom`/`mon`/`dow` (missing keys are `*`), or an `@`
/// nickname such as `@daily`. Returns `None` when the schedule is malformed.
pub fn schedule_from(fields: &Value) -> Option<String> {
    let parts: Vec<String> = match fields {
        Value::String(s) => {
            let trimmed = s.trim();
            if nickname_pattern().is_match(trimmed) {
                return Some(trimmed.to_string());
            }
            trimmed.split_whitespace().map(str::to_string).collect()
        }
        Value::Array(items) => items.iter().map(scalar_to_string).collect::<Option<_>>()?,
        Value::Object(map) => {
            if map.keys().any(|k| !CRON_FIELDS.contains(&k.as_str())) {
                return None;
            }
            CRON_FIELDS
                .iter()
                .map(|name| match map.get(*name) {
                    None => Some("*".to_string()),
                    Some(value) => scalar_to_string(value),
                })
                .collect::<Option<_>>()?
        }
        _ => return None,
    };

    if parts.len() != CRON_FIELDS.len() || !parts.iter().all(|p| field_pattern().is_match(p)) {
        return None;
    }
    Some(parts.join(" "))
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn normalize(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Append `entry` to `tab` unless an identical line is already there
fn with_entry(tab: &str, entry: &str) -> Option<String> {
    let wanted = normalize(entry);
    if tab.lines().any(|line| normalize(line) == wanted) {
        return None;
    }

    let mut updated = tab.to_string();
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(entry);
    updated.push('\n');
    Some(updated)
}

async fn add_system_entry(tab_path: &Path, entry: &str) -> Result<()> {
    let tab = match tokio::fs::read_to_string(tab_path).await {
        Ok(tab) => tab,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", tab_path.display())),
    };

    match with_entry(&tab, entry) {
        Some(updated) => {
            tokio::fs::write(tab_path, updated)
                .await
                .with_context(|| format!("Failed to write {}", tab_path.display()))?;
            info!("Added cron entry to {}", tab_path.display());
        }
        None => debug!("Cron entry already present in {}", tab_path.display()),
    }
    Ok(())
}

fn crontab_command(config: &BootstrapConfig, user: Option<&str>) -> Result<Command> {
    let (program, leading) = config
        .cron
        .crontab_command
        .split_first()
        .context("cron.crontab_command is empty")?;
    let mut command = Command::new(program);
    command.args(leading);
    if let Some(user) = user {
        command.args(["-u", user]);
    }
    Ok(command)
}

async fn add_user_entry(config: &BootstrapConfig, user: Option<&str>, entry: &str) -> Result<()> {
    let listing = crontab_command(config, user)?
        .arg("-l")
        .output()
        .await
        .context("Failed to run crontab")?;
    // A user without a crontab makes `crontab -l` exit non-zero.
    let tab = if listing.status.success() {
        String::from_utf8_lossy(&listing.stdout).into_owned()
    } else {
        String::new()
    };

    let Some(updated) = with_entry(&tab, entry) else {
        debug!("Cron entry already present for {}", user.unwrap_or("current user"));
        return Ok(());
    };

    let mut child = crontab_command(config, user)?
        .arg("-")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .spawn()
        .context("Failed to run crontab")?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(updated.as_bytes()).await?;
    }
    let status = child.wait().await?;
    if !status.success() {
        anyhow::bail!("crontab exited with {}", status);
    }

    info!("Added cron entry for {}", user.unwrap_or("current user"));
    Ok(())
}

#[async_trait]
impl ActionHandler for CronJob {
    async fn execute(&self, parameters: &Parameters, config: &BootstrapConfig) -> Result<bool> {
        let command = param_str(parameters, "command").context("CronJob requires 'command'")?;
        let fields = parameters.get("fields").context("CronJob requires 'fields'")?;

        let Some(schedule) = schedule_from(fields) else {
            warn!("Invalid cron time fields: {}", fields);
            return Ok(false);
        };

        match param_str(parameters, "user") {
            Some(SYSTEM_USER) => {
                let tab_path = param_str(parameters, "filename")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| config.cron.system_tab.clone());
                let entry = format!("{} {} {}", schedule, SYSTEM_USER, command);
                add_system_entry(&tab_path, &entry).await?;
            }
            user => {
                let entry = format!("{} {}", schedule, command);
                add_user_entry(config, user, &entry).await?;
            }
        }

        Ok(true)
    }
}

pub fn handler_type() -> HandlerType {
    HandlerType::concrete("CronJob", || CronJob)
        .with_field(
            "user",
            FieldSpec::optional("User to attach the crontab to (Leave blank for current user)"),
        )
        .with_field(
            "fields",
            FieldSpec::required("Time fields for the cron job (m h dom mon dow)"),
        )
        .with_field("command", FieldSpec::required("The command to be inserted"))
        .with_field(
            "filename",
            FieldSpec::optional("System crontab to edit when user is root"),
        )
}
