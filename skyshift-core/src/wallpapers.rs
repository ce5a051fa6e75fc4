//! The managed wallpapers directory.
//!
//! Downloads land here, local files can be imported, and any image in the
//! directory can be applied directly or cycled through by the slideshow.
//! The file on screen is remembered as `currentWallpaper` in the
//! `wallpaper-manager` store.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::backend::WallpaperBackend;
use crate::error::{Result, SkyshiftError};
use crate::retention::is_image;
use crate::store::JsonStore;

pub const MANAGER_STORE_NAME: &str = "wallpaper-manager";

const CURRENT_WALLPAPER_KEY: &str = "currentWallpaper";
const SLIDESHOW_ENABLED_KEY: &str = "slideshowEnabled";
const SLIDESHOW_INTERVAL_KEY: &str = "slideshowInterval";

pub const DEFAULT_SLIDESHOW_INTERVAL_MS: u64 = 1_800_000;
/// Shorter slideshow intervals are raised to this.
pub const MIN_SLIDESHOW_INTERVAL_MS: u64 = 60_000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocalWallpaper {
    pub path: PathBuf,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlideshowStatus {
    pub enabled: bool,
    pub running: bool,
    pub interval: u64,
}

pub struct WallpaperManager {
    backend: Box<dyn WallpaperBackend>,
    store: Arc<JsonStore>,
    dir: PathBuf,
    slideshow: Mutex<Option<JoinHandle<()>>>,
    cursor: Mutex<usize>,
}

impl WallpaperManager {
    pub fn new(backend: Box<dyn WallpaperBackend>, store: Arc<JsonStore>, dir: PathBuf) -> Self {
        Self {
            backend,
            store,
            dir,
            slideshow: Mutex::new(None),
            cursor: Mutex::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Images in the managed directory, ordered by file name. A missing
    /// directory is an empty library.
    pub fn list(&self) -> Result<Vec<LocalWallpaper>> {
        let read_dir = match std::fs::read_dir(&self.dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut wallpapers: Vec<LocalWallpaper> = read_dir
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_image(path))
            .filter_map(|path| {
                let name = path.file_name()?.to_string_lossy().into_owned();
                Some(LocalWallpaper { path, name })
            })
            .collect();
        wallpapers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(wallpapers)
    }

    pub fn current_wallpaper(&self) -> Option<PathBuf> {
        self.store.get(CURRENT_WALLPAPER_KEY, None)
    }

    /// Put an image file on screen and remember it.
    pub async fn set_wallpaper(&self, path: &Path) -> Result<()> {
        if !path.is_file() {
            return Err(SkyshiftError::FileNotFound(path.to_path_buf()));
        }
        self.backend.set_wallpaper(path).await?;
        self.store.set(CURRENT_WALLPAPER_KEY, path)?;
        info!(backend = self.backend.name(), path = %path.display(), "wallpaper set");
        Ok(())
    }

    /// Copy a local image into the managed directory under a fresh
    /// `wallpaper_<unix millis>.<ext>` name.
    pub async fn add_wallpaper(&self, source: &Path) -> Result<PathBuf> {
        if !source.is_file() {
            return Err(SkyshiftError::FileNotFound(source.to_path_buf()));
        }
        if !is_image(source) {
            return Err(SkyshiftError::NotAnImage(source.to_path_buf()));
        }
        let ext = source
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        tokio::fs::create_dir_all(&self.dir).await?;
        let mut stamp = chrono::Utc::now().timestamp_millis();
        let mut dest = self.dir.join(format!("wallpaper_{stamp}.{ext}"));
        while dest.exists() {
            stamp += 1;
            dest = self.dir.join(format!("wallpaper_{stamp}.{ext}"));
        }

        tokio::fs::copy(source, &dest).await?;
        info!(from = %source.display(), to = %dest.display(), "wallpaper imported");
        Ok(dest)
    }

    /// Delete one image from the managed directory. A bare file name is
    /// looked up in the directory; paths elsewhere are refused.
    pub fn remove_wallpaper(&self, path: &Path) -> Result<()> {
        let path = self.resolve(path);
        if path.parent() != Some(self.dir.as_path()) || !is_image(&path) {
            return Err(SkyshiftError::OutsideLibrary(path));
        }
        if !path.is_file() {
            return Err(SkyshiftError::FileNotFound(path));
        }
        std::fs::remove_file(&path)?;
        self.forget_if_current(&path)?;
        info!(path = %path.display(), "wallpaper removed");
        Ok(())
    }

    /// Delete every image in the managed directory. Returns how many went.
    pub fn remove_all(&self) -> Result<usize> {
        let wallpapers = self.list()?;
        for wallpaper in &wallpapers {
            std::fs::remove_file(&wallpaper.path)?;
            self.forget_if_current(&wallpaper.path)?;
        }
        info!(removed = wallpapers.len(), "wallpaper library cleared");
        Ok(wallpapers.len())
    }

    /// Apply the image after the last one the slideshow showed, wrapping
    /// around. `None` when the directory holds no images.
    pub async fn next_wallpaper(&self) -> Result<Option<PathBuf>> {
        let wallpapers = self.list()?;
        if wallpapers.is_empty() {
            return Ok(None);
        }
        let index = (*lock(&self.cursor) + 1) % wallpapers.len();
        let path = wallpapers[index].path.clone();

        self.set_wallpaper(&path).await?;
        *lock(&self.cursor) = index;
        Ok(Some(path))
    }

    /// Cycle through the library every `interval_ms` (at least one minute).
    /// Returns `false` when there is nothing to show.
    pub fn start_slideshow(self: &Arc<Self>, interval_ms: u64) -> Result<bool> {
        self.abort_slideshow();
        if self.list()?.is_empty() {
            debug!("slideshow not started, library is empty");
            return Ok(false);
        }

        let interval = interval_ms.max(MIN_SLIDESHOW_INTERVAL_MS);
        self.store.set(SLIDESHOW_INTERVAL_KEY, &interval)?;
        self.store.set(SLIDESHOW_ENABLED_KEY, &true)?;

        let period = Duration::from_millis(interval);
        let handle = tokio::spawn(run_slideshow(Arc::downgrade(self), period));
        *lock(&self.slideshow) = Some(handle);
        info!(interval_ms = interval, "slideshow started");
        Ok(true)
    }

    pub fn stop_slideshow(&self) -> Result<()> {
        self.abort_slideshow();
        self.store.set(SLIDESHOW_ENABLED_KEY, &false)
    }

    pub fn slideshow_status(&self) -> SlideshowStatus {
        SlideshowStatus {
            enabled: self.store.get(SLIDESHOW_ENABLED_KEY, false),
            running: lock(&self.slideshow)
                .as_ref()
                .is_some_and(|handle| !handle.is_finished()),
            interval: self
                .store
                .get(SLIDESHOW_INTERVAL_KEY, DEFAULT_SLIDESHOW_INTERVAL_MS),
        }
    }

    /// Resume a slideshow that was running when the daemon last stopped.
    pub fn init(self: &Arc<Self>) -> Result<()> {
        let status = self.slideshow_status();
        if status.enabled {
            self.start_slideshow(status.interval)?;
        }
        Ok(())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_relative() && path.components().count() == 1 {
            self.dir.join(path)
        } else {
            path.to_path_buf()
        }
    }

    fn forget_if_current(&self, path: &Path) -> Result<()> {
        if self.current_wallpaper().as_deref() == Some(path) {
            self.store.delete(CURRENT_WALLPAPER_KEY)?;
        }
        Ok(())
    }

    fn abort_slideshow(&self) {
        if let Some(handle) = lock(&self.slideshow).take() {
            handle.abort();
            info!("slideshow stopped");
        }
    }
}

impl Drop for WallpaperManager {
    fn drop(&mut self) {
        self.abort_slideshow();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn run_slideshow(manager: Weak<WallpaperManager>, period: Duration) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let Some(manager) = manager.upgrade() else {
            break;
        };
        if let Err(e) = manager.next_wallpaper().await {
            warn!("slideshow step failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use super::*;

    struct ChannelBackend {
        tx: mpsc::UnboundedSender<PathBuf>,
        fail: bool,
    }

    #[async_trait]
    impl WallpaperBackend for ChannelBackend {
        async fn set_wallpaper(&self, path: &Path) -> Result<()> {
            if self.fail {
                return Err(SkyshiftError::Backend("no desktop".into()));
            }
            let _ = self.tx.send(path.to_path_buf());
            Ok(())
        }

        fn name(&self) -> &str {
            "channel"
        }
    }

    fn library_with(dir: &Path, fail: bool) -> (Arc<WallpaperManager>, mpsc::UnboundedReceiver<PathBuf>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let manager = WallpaperManager::new(
            Box::new(ChannelBackend { tx, fail }),
            Arc::new(JsonStore::in_memory(MANAGER_STORE_NAME)),
            dir.to_path_buf(),
        );
        (Arc::new(manager), rx)
    }

    fn library(dir: &Path) -> (Arc<WallpaperManager>, mpsc::UnboundedReceiver<PathBuf>) {
        library_with(dir, false)
    }

    fn write(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"img").unwrap();
        path
    }

    #[test]
    fn test_list_only_images_sorted_by_name() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "b.PNG");
        write(tmp.path(), "a.jpg");
        write(tmp.path(), "notes.txt");
        std::fs::create_dir(tmp.path().join("sub.jpg")).unwrap();

        let (manager, _rx) = library(tmp.path());
        let names: Vec<String> = manager.list().unwrap().into_iter().map(|w| w.name).collect();
        assert_eq!(names, vec!["a.jpg", "b.PNG"]);

        let (missing, _rx) = library(&tmp.path().join("absent"));
        assert!(missing.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_wallpaper_remembers_current() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(tmp.path(), "a.jpg");
        let (manager, mut rx) = library(tmp.path());

        manager.set_wallpaper(&path).await.unwrap();
        assert_eq!(rx.recv().await, Some(path.clone()));
        assert_eq!(manager.current_wallpaper(), Some(path));

        let err = manager
            .set_wallpaper(&tmp.path().join("gone.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, SkyshiftError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_backend_failure_keeps_previous_current() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(tmp.path(), "a.jpg");
        let (manager, _rx) = library_with(tmp.path(), true);

        assert!(manager.set_wallpaper(&path).await.is_err());
        assert_eq!(manager.current_wallpaper(), None);
    }

    #[tokio::test]
    async fn test_add_wallpaper_copies_into_library() {
        let src = tempfile::tempdir().unwrap();
        let lib = tempfile::tempdir().unwrap();
        let dir = lib.path().join("wallpapers");
        let (manager, _rx) = library(&dir);

        let original = write(src.path(), "Holiday.JPG");
        let first = manager.add_wallpaper(&original).await.unwrap();
        let second = manager.add_wallpaper(&original).await.unwrap();

        assert_ne!(first, second);
        assert!(original.exists());
        let name = first.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("wallpaper_") && name.ends_with(".jpg"), "{name}");
        assert_eq!(manager.list().unwrap().len(), 2);

        let text = write(src.path(), "notes.txt");
        assert!(matches!(
            manager.add_wallpaper(&text).await.unwrap_err(),
            SkyshiftError::NotAnImage(_)
        ));
        assert!(matches!(
            manager.add_wallpaper(&src.path().join("none.png")).await.unwrap_err(),
            SkyshiftError::FileNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_remove_wallpaper_by_name_and_path() {
        let tmp = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let a = write(tmp.path(), "a.jpg");
        let b = write(tmp.path(), "b.jpg");
        let stranger = write(outside.path(), "c.jpg");
        let (manager, _rx) = library(tmp.path());

        manager.set_wallpaper(&a).await.unwrap();
        manager.remove_wallpaper(Path::new("a.jpg")).unwrap();
        assert!(!a.exists());
        assert_eq!(manager.current_wallpaper(), None);

        manager.remove_wallpaper(&b).unwrap();
        assert!(!b.exists());

        assert!(matches!(
            manager.remove_wallpaper(&stranger).unwrap_err(),
            SkyshiftError::OutsideLibrary(_)
        ));
        assert!(stranger.exists());
        assert!(matches!(
            manager.remove_wallpaper(Path::new("a.jpg")).unwrap_err(),
            SkyshiftError::FileNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_remove_all_keeps_other_files() {
        let tmp = tempfile::tempdir().unwrap();
        let a = write(tmp.path(), "a.jpg");
        write(tmp.path(), "b.webp");
        let notes = write(tmp.path(), "notes.txt");
        let (manager, _rx) = library(tmp.path());
        manager.set_wallpaper(&a).await.unwrap();

        assert_eq!(manager.remove_all().unwrap(), 2);
        assert!(manager.list().unwrap().is_empty());
        assert!(notes.exists());
        assert_eq!(manager.current_wallpaper(), None);
    }

    #[tokio::test]
    async fn test_next_wallpaper_wraps_around() {
        let tmp = tempfile::tempdir().unwrap();
        let a = write(tmp.path(), "a.jpg");
        let b = write(tmp.path(), "b.jpg");
        let c = write(tmp.path(), "c.jpg");
        let (manager, _rx) = library(tmp.path());

        let mut shown = Vec::new();
        for _ in 0..4 {
            shown.push(manager.next_wallpaper().await.unwrap().unwrap());
        }
        assert_eq!(shown, vec![b.clone(), c, a, b]);

        let empty = tempfile::tempdir().unwrap();
        let (manager, _rx) = library(empty.path());
        assert_eq!(manager.next_wallpaper().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_slideshow_needs_images() {
        let tmp = tempfile::tempdir().unwrap();
        let (manager, _rx) = library(tmp.path());
        assert!(!manager.start_slideshow(120_000).unwrap());
        let status = manager.slideshow_status();
        assert!(!status.enabled);
        assert!(!status.running);
        assert_eq!(status.interval, DEFAULT_SLIDESHOW_INTERVAL_MS);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slideshow_cycles_on_floored_interval() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a.jpg");
        let b = write(tmp.path(), "b.jpg");
        let (manager, mut rx) = library(tmp.path());

        assert!(manager.start_slideshow(1_000).unwrap());
        let status = manager.slideshow_status();
        assert!(status.enabled && status.running);
        assert_eq!(status.interval, MIN_SLIDESHOW_INTERVAL_MS);

        let early = tokio::time::timeout(Duration::from_secs(59), rx.recv()).await;
        assert!(early.is_err());
        assert_eq!(rx.recv().await, Some(b));

        manager.stop_slideshow().unwrap();
        let status = manager.slideshow_status();
        assert!(!status.enabled && !status.running);
    }

    #[tokio::test]
    async fn test_init_resumes_enabled_slideshow() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a.jpg");
        let store = Arc::new(JsonStore::in_memory(MANAGER_STORE_NAME));
        store.set(SLIDESHOW_ENABLED_KEY, &true).unwrap();
        store.set(SLIDESHOW_INTERVAL_KEY, &300_000u64).unwrap();

        let (tx, _rx) = mpsc::unbounded_channel();
        let manager = Arc::new(WallpaperManager::new(
            Box::new(ChannelBackend { tx, fail: false }),
            store,
            tmp.path().to_path_buf(),
        ));
        manager.init().unwrap();

        let status = manager.slideshow_status();
        assert!(status.running);
        assert_eq!(status.interval, 300_000);
    }
}
