use std::path::PathBuf;

use crate::error::{Result, SkyshiftError};

#[derive(Debug, Clone)]
pub struct SkyshiftPaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl SkyshiftPaths {
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| SkyshiftError::Config("cannot resolve config dir".into()))?
            .join("skyshift");

        let data_dir = dirs::data_dir()
            .ok_or_else(|| SkyshiftError::Config("cannot resolve data dir".into()))?
            .join("skyshift");

        Ok(Self {
            config_dir,
            data_dir,
        })
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// JSON document backing one logical store (e.g. "auto-wallpaper").
    pub fn store_file(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{name}.json"))
    }

    /// Managed directory the download/apply pipeline writes into.
    pub fn wallpapers_dir(&self) -> PathBuf {
        self.data_dir.join("wallpapers")
    }

    pub fn socket_path() -> PathBuf {
        let uid = unsafe { libc::getuid() };
        PathBuf::from(format!("/tmp/skyshift-{uid}.sock"))
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.config_dir, &self.data_dir, &self.wallpapers_dir()] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}
