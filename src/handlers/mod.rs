//! Built-in action handlers
//!
//! Each handler module exposes a `handler_type()` describing its fields;
//! [`builtin_types`] collects them for [`HandlerRegistry::with_builtin_handlers`].
//!
//! [`HandlerRegistry::with_builtin_handlers`]: crate::core::HandlerRegistry::with_builtin_handlers

pub mod cronjob;
pub mod custom_script;
pub mod noop;
pub mod set_config;
pub mod systemd;

pub use cronjob::CronJob;
pub use custom_script::CustomScript;
pub use noop::Noop;
pub use set_config::SetConfig;
pub use systemd::SystemdServiceConf;

use crate::core::handler::{HandlerType, Parameters};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::PathBuf;

/// Every built-in handler type, in registration order
pub fn builtin_types() -> Vec<HandlerType> {
    vec![
        noop::handler_type(),
        custom_script::handler_type(),
        set_config::handler_type(),
        systemd::handler_type(),
        cronjob::handler_type(),
    ]
}

/// GET `url` and return the body, failing on a non-success status
pub(crate) async fn fetch_text(url: &str) -> Result<String> {
    reqwest::get(url)
        .await
        .with_context(|| format!("Failed to fetch {}", url))?
        .error_for_status()
        .with_context(|| format!("Failed to fetch {}", url))?
        .text()
        .await
        .with_context(|| format!("Failed to read response body from {}", url))
}

/// Expand a leading `~` to the home directory
pub(crate) fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix('~'), dirs::home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with('/') => {
            home.join(rest.trim_start_matches('/'))
        }
        _ => PathBuf::from(path),
    }
}

/// Deserialize an optional parameter into `T`
pub(crate) fn typed_param<T: DeserializeOwned>(parameters: &Parameters, key: &str) -> Result<Option<T>> {
    match parameters.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .with_context(|| format!("Invalid '{}' parameter", key)),
    }
}
