use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Result, SkyshiftError};

use super::WallpaperBackend;

/// Desktop-native setter (GNOME, KDE, macOS, Windows, ...) through the
/// `wallpaper` crate.
pub struct SystemBackend;

impl SystemBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WallpaperBackend for SystemBackend {
    async fn set_wallpaper(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(SkyshiftError::FileNotFound(path.to_path_buf()));
        }
        let path_str = path
            .to_str()
            .ok_or_else(|| SkyshiftError::Backend(format!("non UTF-8 path: {}", path.display())))?
            .to_string();

        debug!(path = %path_str, "setting wallpaper through desktop api");
        // the setter blocks on desktop tooling and its error is not Send
        tokio::task::spawn_blocking(move || {
            wallpaper::set_from_path(&path_str).map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| SkyshiftError::Backend(format!("wallpaper task failed: {e}")))?
        .map_err(|e| SkyshiftError::Backend(format!("failed to set wallpaper: {e}")))
    }

    fn name(&self) -> &str {
        "system"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("gone.jpg");
        let err = SystemBackend::new().set_wallpaper(&missing).await.unwrap_err();
        assert!(matches!(err, SkyshiftError::FileNotFound(p) if p == missing));
    }
}
