use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::backend::WallpaperBackend;
use crate::download::Downloader;
use crate::error::Result;
use crate::retention;
use crate::store::JsonStore;
use crate::wallpapers::WallpaperManager;

pub use crate::wallpapers::MANAGER_STORE_NAME;

/// Turns an image URL into the active wallpaper.
#[async_trait]
pub trait WallpaperApplier: Send + Sync {
    /// Path of the applied file, or `None` when nothing was applied.
    async fn apply(&self, url: &str) -> Result<Option<PathBuf>>;
}

/// Download into the managed directory, set through the backend, remember
/// the file and prune old downloads.
pub struct DownloadApplier {
    downloader: Downloader,
    manager: Arc<WallpaperManager>,
    keep: usize,
}

impl DownloadApplier {
    pub fn new(
        downloader: Downloader,
        backend: Box<dyn WallpaperBackend>,
        store: Arc<JsonStore>,
        wallpapers_dir: PathBuf,
        keep: usize,
    ) -> Self {
        Self {
            downloader,
            manager: Arc::new(WallpaperManager::new(backend, store, wallpapers_dir)),
            keep,
        }
    }

    /// The local library sharing this applier's backend and directory.
    pub fn manager(&self) -> &Arc<WallpaperManager> {
        &self.manager
    }

    pub fn current_wallpaper(&self) -> Option<PathBuf> {
        self.manager.current_wallpaper()
    }

    pub fn downloader(&self) -> &Downloader {
        &self.downloader
    }

    pub fn wallpapers_dir(&self) -> &Path {
        self.manager.dir()
    }

    /// Apply the retention policy to the managed directory.
    pub fn prune(&self) -> Result<usize> {
        let current = self.current_wallpaper();
        retention::prune_wallpapers(self.manager.dir(), self.keep, current.as_deref())
    }
}

#[async_trait]
impl WallpaperApplier for DownloadApplier {
    async fn apply(&self, url: &str) -> Result<Option<PathBuf>> {
        let path = self.downloader.download(url, self.manager.dir()).await?;
        self.manager.set_wallpaper(&path).await?;
        info!(backend = self.manager.backend_name(), url, "downloaded wallpaper applied");

        if let Err(e) = self.prune() {
            warn!("failed to prune wallpapers: {e}");
        }
        Ok(Some(path))
    }
}
