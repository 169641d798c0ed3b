//! Write the engine's license, user files, and extra configuration files

use crate::core::{
    config::{AdminUser, BootstrapConfig, ConfFile, PublishUser},
    handler::{ActionHandler, HandlerType, Parameters},
    schema::FieldSpec,
};
use crate::handlers::{fetch_text, typed_param};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct SetConfig;

/// Settings after merging parameters over the `wowza` config section
struct Settings {
    root_path: PathBuf,
    conf_dir: PathBuf,
    server_license: Option<String>,
    users: Vec<AdminUser>,
    publish_users: Vec<PublishUser>,
    conf_files: Vec<ConfFile>,
}

impl Settings {
    fn merge(parameters: &Parameters, config: &BootstrapConfig) -> Result<Self> {
        let wowza = &config.wowza;
        Ok(Self {
            root_path: wowza.root_path.clone(),
            conf_dir: wowza.conf_dir(),
            server_license: typed_param(parameters, "server_license")?.or_else(|| wowza.server_license.clone()),
            users: typed_param(parameters, "users")?.unwrap_or_else(|| wowza.users.clone()),
            publish_users: typed_param(parameters, "publish_users")?
                .unwrap_or_else(|| wowza.publish_users.clone()),
            conf_files: typed_param(parameters, "conf_files")?.unwrap_or_else(|| wowza.conf_files.clone()),
        })
    }
}

#[async_trait]
impl ActionHandler for SetConfig {
    async fn execute(&self, parameters: &Parameters, config: &BootstrapConfig) -> Result<bool> {
        let settings = Settings::merge(parameters, config)?;

        if let Some(license) = settings.server_license.as_deref().filter(|l| !l.is_empty()) {
            write_file(&settings.conf_dir.join("Server.license"), license).await?;
        }

        if !settings.users.is_empty() {
            let lines: Vec<String> = settings
                .users
                .iter()
                .map(|u| format!("{} {} {}", u.name, u.password, u.group))
                .collect();
            write_file(&settings.conf_dir.join("admin.password"), &lines.join("\n")).await?;
        }

        if !settings.publish_users.is_empty() {
            let lines: Vec<String> = settings
                .publish_users
                .iter()
                .map(|u| format!("{} {}", u.name, u.password))
                .collect();
            write_file(&settings.conf_dir.join("publish.password"), &lines.join("\n")).await?;
        }

        for file in &settings.conf_files {
            copy_conf_file(&settings.root_path, file).await?;
        }

        Ok(true)
    }
}

async fn copy_conf_file(root_path: &Path, file: &ConfFile) -> Result<()> {
    if file.path.is_absolute() {
        anyhow::bail!(
            "Conf file path '{}' must be relative to the engine root",
            file.path.display()
        );
    }

    let content = match (&file.content, &file.url) {
        (Some(content), _) => content.clone(),
        (None, Some(url)) => fetch_text(url).await?,
        (None, None) => anyhow::bail!("Conf file '{}' has neither content nor url", file.path.display()),
    };

    write_file(&root_path.join(&file.path), &content).await
}

async fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    debug!("Wrote {} bytes to {}", content.len(), path.display());
    info!("Updated {}", path.display());
    Ok(())
}

pub fn handler_type() -> HandlerType {
    HandlerType::concrete("SetConfig", || SetConfig)
        .with_field("server_license", FieldSpec::optional("Server license key"))
        .with_field(
            "users",
            FieldSpec::optional("Admin users: list of {name, password, group}").with_default(serde_json::json!([])),
        )
        .with_field(
            "publish_users",
            FieldSpec::optional("Publish users: list of {name, password}").with_default(serde_json::json!([])),
        )
        .with_field(
            "conf_files",
            FieldSpec::optional("Files to write below the engine root: list of {path, content | url}")
                .with_default(serde_json::json!([])),
        )
}
