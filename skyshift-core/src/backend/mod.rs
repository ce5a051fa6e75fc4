pub mod command;
pub mod system;

use std::path::Path;

use async_trait::async_trait;

use crate::config::{BackendType, Config};
use crate::error::Result;

#[async_trait]
pub trait WallpaperBackend: Send + Sync {
    /// Make the image at `path` the desktop wallpaper on every screen.
    async fn set_wallpaper(&self, path: &Path) -> Result<()>;
    fn name(&self) -> &str;
}

pub fn create_backend(config: &Config) -> Box<dyn WallpaperBackend> {
    match config.general.backend {
        BackendType::System => Box::new(system::SystemBackend::new()),
        BackendType::Command => Box::new(command::CommandBackend::new(config.general.command.clone())),
    }
}
