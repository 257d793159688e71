use serde::{Deserialize, Serialize};
use sitesensor_core::{ApplyOptions, ReadinessPolicy, SlotSweep};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for sitesensor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Author stamped into exported recipes
    #[serde(default)]
    pub author: String,

    /// Host database; the platform data dir is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,

    #[serde(default)]
    pub apply: ApplyConfig,

    #[serde(default)]
    pub readiness: ReadinessConfig,

    #[serde(default)]
    pub child_types: ChildTypesConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyConfig {
    /// Also sweep the highest slot index when applying a recipe
    #[serde(default)]
    pub inclusive_slot_sweep: bool,

    #[serde(default)]
    pub reload: ReloadPolicy,
}

/// What to do after an import that recommends a reload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReloadPolicy {
    #[default]
    Prompt,
    Always,
    Never,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessConfig {
    #[serde(default = "default_deadline")]
    pub deadline_secs: u64,

    #[serde(default = "default_min_interval")]
    pub min_interval_secs: u64,

    #[serde(default = "default_max_interval")]
    pub max_interval_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChildTypesConfig {
    /// URL serving a JSON child-type catalog; built-in types are used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            deadline_secs: default_deadline(),
            min_interval_secs: default_min_interval(),
            max_interval_secs: default_max_interval(),
        }
    }
}

fn default_deadline() -> u64 {
    90
}

fn default_min_interval() -> u64 {
    2
}

fn default_max_interval() -> u64 {
    5
}

impl ApplyConfig {
    pub fn options(&self) -> ApplyOptions {
        ApplyOptions {
            sweep: if self.inclusive_slot_sweep {
                SlotSweep::Inclusive
            } else {
                SlotSweep::Observed
            },
        }
    }
}

impl ReadinessConfig {
    pub fn policy(&self) -> ReadinessPolicy {
        let min_interval = Duration::from_secs(self.min_interval_secs.max(1));
        ReadinessPolicy {
            deadline: Duration::from_secs(self.deadline_secs),
            min_interval,
            max_interval: Duration::from_secs(self.max_interval_secs).max(min_interval),
        }
    }
}

impl Config {
    /// Load config from default location or create default if not found
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path();

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let content = toml::to_string_pretty(&config)?;
            std::fs::write(&path, content)?;
            Ok(config)
        }
    }

    /// Get config file path
    pub fn config_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "sitesensor", "sitesensor") {
            dirs.config_dir().join("config.toml")
        } else {
            PathBuf::from("~/.sitesensor/config.toml")
        }
    }
}
