//! Bootstrap configuration loaded from YAML

use crate::codec::PipelineDocument;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const DEFAULT_WOWZA_ROOT: &str = "/usr/local/WowzaStreamingEngine";
const DEFAULT_SYSTEM_UNIT_DIR: &str = "/etc/systemd/system";
const DEFAULT_SYSTEM_CRONTAB: &str = "/etc/crontab";

/// Top-level configuration shared by every action of a pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Metadata describing the instance being bootstrapped
    #[serde(default)]
    pub instance: InstanceMetadata,

    /// Instance tags
    #[serde(default)]
    pub tags: HashMap<String, String>,

    /// Wowza Streaming Engine settings
    #[serde(default)]
    pub wowza: WowzaConfig,

    /// Bucket receiving synced server logs
    #[serde(default)]
    pub log_bucket_name: Option<String>,

    #[serde(default)]
    pub systemd: SystemdConfig,

    #[serde(default)]
    pub cron: CronConfig,

    /// Raw instance user data, passed through untouched
    #[serde(default)]
    pub userdata: Option<Value>,

    /// Pipeline to run when no other source is given
    #[serde(default)]
    pub pipeline: Option<PipelineDocument>,

    /// Keys this version does not know about
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Instance metadata as reported by the cloud provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstanceMetadata {
    #[serde(default)]
    pub is_ec2_instance: bool,
    #[serde(default)]
    pub instance_id: Option<String>,
    #[serde(default)]
    pub ami_id: Option<String>,
    #[serde(default)]
    pub instance_type: Option<String>,
    #[serde(default)]
    pub public_hostname: Option<String>,
    #[serde(default)]
    pub public_ipv4: Option<String>,
    #[serde(default)]
    pub availability_zone: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

impl InstanceMetadata {
    /// Region of the instance, derived from the availability zone if not set
    pub fn region(&self) -> Option<String> {
        if let Some(region) = &self.region {
            return Some(region.clone());
        }
        self.availability_zone.as_ref().and_then(|zone| {
            let mut chars = zone.chars();
            chars.next_back()?;
            let region = chars.as_str();
            (!region.is_empty()).then(|| region.to_string())
        })
    }
}

/// Wowza Streaming Engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WowzaConfig {
    #[serde(default = "default_wowza_root")]
    pub root_path: PathBuf,

    #[serde(default)]
    pub server_license: Option<String>,

    #[serde(default)]
    pub users: Vec<AdminUser>,

    #[serde(default)]
    pub publish_users: Vec<PublishUser>,

    #[serde(default)]
    pub conf_files: Vec<ConfFile>,
}

impl WowzaConfig {
    /// Directory holding the engine configuration
    pub fn conf_dir(&self) -> PathBuf {
        self.root_path.join("conf")
    }
}

impl Default for WowzaConfig {
    fn default() -> Self {
        Self {
            root_path: default_wowza_root(),
            server_license: None,
            users: Vec::new(),
            publish_users: Vec::new(),
            conf_files: Vec::new(),
        }
    }
}

/// Entry of `admin.password`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    pub name: String,
    pub password: String,
    #[serde(default = "default_admin_group")]
    pub group: String,
}

/// Entry of `publish.password`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishUser {
    pub name: String,
    pub password: String,
}

/// A configuration file copied below the engine root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfFile {
    /// Destination, relative to the engine root
    pub path: PathBuf,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemdConfig {
    #[serde(default = "default_system_unit_dir")]
    pub system_unit_dir: PathBuf,

    /// Where user units go; `~/.config/systemd/user` when unset
    #[serde(default)]
    pub user_unit_dir: Option<PathBuf>,
}

impl Default for SystemdConfig {
    fn default() -> Self {
        Self {
            system_unit_dir: default_system_unit_dir(),
            user_unit_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CronConfig {
    #[serde(default = "default_system_crontab")]
    pub system_tab: PathBuf,

    /// Program (and leading arguments) used to edit user crontabs
    #[serde(default = "default_crontab_command")]
    pub crontab_command: Vec<String>,
}

impl Default for CronConfig {
    fn default() -> Self {
        Self {
            system_tab: default_system_crontab(),
            crontab_command: default_crontab_command(),
        }
    }
}

fn default_wowza_root() -> PathBuf {
    PathBuf::from(DEFAULT_WOWZA_ROOT)
}

fn default_admin_group() -> String {
    "admin".to_string()
}

fn default_system_unit_dir() -> PathBuf {
    PathBuf::from(DEFAULT_SYSTEM_UNIT_DIR)
}

fn default_system_crontab() -> PathBuf {
    PathBuf::from(DEFAULT_SYSTEM_CRONTAB)
}

fn default_crontab_command() -> Vec<String> {
    vec!["crontab".to_string()]
}

impl BootstrapConfig {
    /// Load configuration from a YAML (or JSON) file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: BootstrapConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, else from the default location if it exists,
    /// else fall back to defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(default) if default.exists() => Self::from_file(default),
                _ => Ok(Self::default()),
            },
        }
    }

    /// `<config dir>/wowza-bootstrap/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("wowza-bootstrap").join("config.yaml"))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        for file in &self.wowza.conf_files {
            if file.content.is_none() && file.url.is_none() {
                anyhow::bail!(
                    "Conf file '{}' needs either 'content' or 'url'",
                    file.path.display()
                );
            }
            if file.path.is_absolute() {
                anyhow::bail!(
                    "Conf file path '{}' must be relative to the engine root",
                    file.path.display()
                );
            }
        }

        if self.cron.crontab_command.is_empty() {
            anyhow::bail!("cron.crontab_command must name a program");
        }

        if self.instance.is_ec2_instance && self.instance.instance_id.is_none() {
            anyhow::bail!("Instance is marked as EC2 but has no instance_id");
        }

        Ok(())
    }
}
