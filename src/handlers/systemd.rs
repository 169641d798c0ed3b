//! Install systemd units for the engine and its manager

use crate::core::{
    config::BootstrapConfig,
    handler::{param_str, ActionHandler, HandlerType, Parameters},
    schema::FieldSpec,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{info, warn};

const ENGINE_UNIT_NAME: &str = "WowzaStreamingEngine.service";
const MANAGER_UNIT_NAME: &str = "WowzaStreamingEngineManager.service";
const DEFAULT_ACCOUNT: &str = "root";

pub struct SystemdServiceConf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitType {
    System,
    User,
}

impl UnitType {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "system" => Some(UnitType::System),
            "user" => Some(UnitType::User),
            _ => None,
        }
    }
}

/// Render one unit running `<root>/<binary> start|stop`
fn render_unit(description: &str, binary: &Path, user: &str, group: &str) -> String {
    let binary = binary.display();
    format!(
        "[Unit]
Description={description}
After=syslog.target
After=network.target
After=local-fs.target
After=remote-fs.target

[Service]
Type=simple
User={user}
Group={group}
ExecStart={binary} start
ExecStop={binary} stop
RemainAfterExit=yes

# Give a reasonable amount of time for the server to start up/shut down
TimeoutSec=300

[Install]
WantedBy=multi-user.target
"
    )
}

/// Engine and manager units for the engine installed at `root`
pub fn render_units(root: &Path, user: &str, group: &str) -> [(&'static str, String); 2] {
    [
        (
            ENGINE_UNIT_NAME,
            render_unit(
                "WowzaStreamingEngine",
                &root.join("bin/WowzaStreamingEngine"),
                user,
                group,
            ),
        ),
        (
            MANAGER_UNIT_NAME,
            render_unit(
                "WowzaStreamingEngineManager",
                &root.join("manager/bin/WowzaStreamingEngineManager"),
                user,
                group,
            ),
        ),
    ]
}

/// Run `id <flag>` and return its trimmed output
async fn id_of_invoking_user(flag: &str) -> Result<String> {
    let output = Command::new("id")
        .arg(flag)
        .output()
        .await
        .context("Failed to run 'id'")?;
    if !output.status.success() {
        anyhow::bail!("'id {}' exited with {}", flag, output.status);
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn user_unit_dir(config: &BootstrapConfig) -> Result<PathBuf> {
    if let Some(dir) = &config.systemd.user_unit_dir {
        return Ok(dir.clone());
    }
    dirs::home_dir()
        .map(|home| home.join(".config/systemd/user"))
        .context("Could not determine home directory for user units")
}

#[async_trait]
impl ActionHandler for SystemdServiceConf {
    async fn execute(&self, parameters: &Parameters, config: &BootstrapConfig) -> Result<bool> {
        let mut user = param_str(parameters, "user").unwrap_or(DEFAULT_ACCOUNT).to_string();
        let mut group = param_str(parameters, "group").unwrap_or(DEFAULT_ACCOUNT).to_string();

        let unit_type_name = param_str(parameters, "unit_type").unwrap_or("system");
        let Some(unit_type) = UnitType::parse(unit_type_name) else {
            warn!("Unknown unit_type '{}', expected 'system' or 'user'", unit_type_name);
            return Ok(false);
        };

        let unit_dir = match unit_type {
            UnitType::System => config.systemd.system_unit_dir.clone(),
            UnitType::User => {
                if user == DEFAULT_ACCOUNT {
                    user = id_of_invoking_user("-un").await?;
                }
                if group == DEFAULT_ACCOUNT {
                    group = id_of_invoking_user("-gn").await?;
                }
                user_unit_dir(config)?
            }
        };

        tokio::fs::create_dir_all(&unit_dir)
            .await
            .with_context(|| format!("Failed to create {}", unit_dir.display()))?;

        for (name, unit) in render_units(&config.wowza.root_path, &user, &group) {
            let path = unit_dir.join(name);
            tokio::fs::write(&path, unit)
                .await
                .with_context(|| format!("Failed to write unit {}", path.display()))?;
            info!("Installed {}", path.display());
        }

        Ok(true)
    }
}

pub fn handler_type() -> HandlerType {
    HandlerType::concrete("SystemdServiceConf", || SystemdServiceConf)
        .with_field(
            "user",
            FieldSpec::optional("User the services run as").with_default(DEFAULT_ACCOUNT),
        )
        .with_field(
            "group",
            FieldSpec::optional("Group the services run as").with_default(DEFAULT_ACCOUNT),
        )
        .with_field(
            "unit_type",
            FieldSpec::optional("Install as system or user units")
                .with_default("system")
                .with_options(["system", "user"]),
        )
}
