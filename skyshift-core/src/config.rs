use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SkyshiftError};
use crate::paths::SkyshiftPaths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub network: NetworkConfig,
    pub display: DisplayConfig,
    pub search: SearchConfig,
}

impl Config {
    pub fn load(paths: &SkyshiftPaths) -> Result<Self> {
        let path = paths.config_file();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            SkyshiftError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn load_or_default(paths: &SkyshiftPaths) -> Self {
        Self::load(paths).unwrap_or_default()
    }

    pub fn save(&self, paths: &SkyshiftPaths) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SkyshiftError::Config(format!("failed to serialize config: {e}")))?;
        let path = paths.config_file();
        std::fs::write(&path, content).map_err(|e| {
            SkyshiftError::Config(format!("failed to write {}: {e}", path.display()))
        })
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackendType {
    #[default]
    System,
    Command,
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::Command => write!(f, "command"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub backend: BackendType,
    /// Downloaded wallpapers kept in the managed directory.
    pub keep_wallpapers: usize,
    pub command: CommandConfig,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            backend: BackendType::System,
            keep_wallpapers: 50,
            command: CommandConfig::default(),
        }
    }
}

/// External setter invoked by the `command` backend. `{path}` in any
/// argument is replaced with the image path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            program: "swww".into(),
            args: vec!["img".into(), "{path}".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub max_redirects: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: concat!("skyshift/", env!("CARGO_PKG_VERSION")).into(),
            max_redirects: 10,
        }
    }
}

impl NetworkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Shared client for catalog APIs. Downloads use their own client so
    /// they can follow redirects by hand.
    pub fn build_client(&self) -> Result<reqwest::Client> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout())
            .user_agent(&self.user_agent)
            .build()?;
        Ok(client)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Physical screen size; 0 means unknown.
    pub width: u32,
    pub height: u32,
}

impl DisplayConfig {
    pub fn screen_size(&self) -> (u32, u32) {
        if self.width == 0 || self.height == 0 {
            (1920, 1080)
        } else {
            (self.width, self.height)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Translate CJK queries to English before searching.
    pub translate: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { translate: true }
    }
}
