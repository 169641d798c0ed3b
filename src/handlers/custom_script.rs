//! Write a script to disk and make it executable

use crate::core::{
    config::BootstrapConfig,
    handler::{param_str, ActionHandler, HandlerType, Parameters},
    schema::FieldSpec,
};
use crate::handlers::{expand_home, fetch_text};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use tracing::info;

const SOURCE_GROUP: [&str; 2] = ["contents", "url"];

pub struct CustomScript;

#[async_trait]
impl ActionHandler for CustomScript {
    async fn execute(&self, parameters: &Parameters, _config: &BootstrapConfig) -> Result<bool> {
        let filename = param_str(parameters, "filename").context("CustomScript requires 'filename'")?;
        let path = expand_home(filename);

        let contents = match (param_str(parameters, "contents"), param_str(parameters, "url")) {
            (Some(contents), _) => contents.to_string(),
            (None, Some(url)) => fetch_text(url).await?,
            (None, None) => anyhow::bail!("CustomScript requires 'contents' or 'url'"),
        };

        tokio::fs::write(&path, contents)
            .await
            .with_context(|| format!("Failed to write script {}", path.display()))?;
        make_executable(&path).await?;

        info!("Wrote script {}", path.display());
        Ok(true)
    }
}

/// Add user and group execute bits
#[cfg(unix)]
async fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = tokio::fs::metadata(path).await?.permissions();
    permissions.set_mode(permissions.mode() | 0o110);
    tokio::fs::set_permissions(path, permissions)
        .await
        .with_context(|| format!("Failed to mark {} executable", path.display()))
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

pub fn handler_type() -> HandlerType {
    HandlerType::concrete("CustomScript", || CustomScript)
        .with_field("filename", FieldSpec::required("Local filename to write the script to"))
        .with_field(
            "contents",
            FieldSpec::one_of(SOURCE_GROUP, "The script contents (as string)"),
        )
        .with_field("url", FieldSpec::one_of(SOURCE_GROUP, "URL to retrieve the script contents"))
}
