use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use skyshift_core::aggregator::Aggregator;
use skyshift_core::apply::{DownloadApplier, WallpaperApplier};
use skyshift_core::config::Config;
use skyshift_core::error::Result;
use skyshift_core::ipc::{IpcRequest, IpcResponse};
use skyshift_core::library::OnlineLibrary;
use skyshift_core::scheduler::AutoRotation;
use skyshift_core::wallpapers::WallpaperManager;

/// Everything the daemon serves, wired once in `main`.
pub struct Services {
    pub config: Config,
    pub aggregator: Arc<Aggregator>,
    pub library: Arc<OnlineLibrary>,
    pub applier: Arc<DownloadApplier>,
    pub rotation: Arc<AutoRotation>,
    pub shutdown: watch::Sender<bool>,
}

impl Services {
    pub async fn dispatch(&self, request: IpcRequest) -> IpcResponse {
        match request {
            IpcRequest::Status => IpcResponse::from_data(&self.rotation.status()),
            IpcRequest::ChangeNow => {
                let changed = self.rotation.change_wallpaper().await;
                if changed {
                    IpcResponse::from_data(&self.rotation.status())
                } else {
                    IpcResponse::error("no wallpaper was applied")
                }
            }
            IpcRequest::GetConfig => IpcResponse::from_data(&self.rotation.config()),
            IpcRequest::SaveConfig { config } => respond(self.rotation.save_config(config)),
            IpcRequest::Enable => respond(self.rotation.set_enabled(true)),
            IpcRequest::Disable => respond(self.rotation.set_enabled(false)),

            IpcRequest::Search { options } => {
                IpcResponse::from_data(&self.aggregator.search(&options).await)
            }
            IpcRequest::Popular => IpcResponse::from_data(&self.aggregator.popular().await),
            IpcRequest::ForResolution {
                width,
                height,
                options,
            } => {
                let (default_w, default_h) = self.config.display.screen_size();
                let width = width.filter(|w| *w > 0).unwrap_or(default_w);
                let height = height.filter(|h| *h > 0).unwrap_or(default_h);
                IpcResponse::from_data(
                    &self
                        .aggregator
                        .for_resolution(width, height, &options)
                        .await,
                )
            }
            IpcRequest::Category { name, page } => IpcResponse::from_data(
                &self
                    .aggregator
                    .category_wallpapers(&name, page.unwrap_or(1))
                    .await,
            ),
            IpcRequest::Categories => IpcResponse::from_data(&Aggregator::categories()),
            IpcRequest::Resolutions => IpcResponse::from_data(&Aggregator::common_resolutions()),
            IpcRequest::Query { source, options } => {
                IpcResponse::from_data(&self.aggregator.query(source, &options).await)
            }

            IpcRequest::Download { url, dir } => {
                let dir = dir.unwrap_or_else(|| self.applier.wallpapers_dir().to_path_buf());
                respond(self.applier.downloader().download(&url, &dir).await)
            }
            IpcRequest::ApplyUrl { url } => respond(self.applier.apply(&url).await),
            IpcRequest::Prune => respond(self.applier.prune()),

            IpcRequest::FavoritesList => IpcResponse::from_data(&self.library.favorites()),
            IpcRequest::FavoritesAdd { item } => respond(self.library.add_favorite(&item)),
            IpcRequest::FavoritesRemove { id } => respond(self.library.remove_favorite(&id)),
            IpcRequest::FavoritesCheck { id } => {
                IpcResponse::from_data(&self.library.is_favorite(&id))
            }
            IpcRequest::HistoryList => IpcResponse::from_data(&self.library.history()),
            IpcRequest::HistoryAdd { item } => respond(self.library.add_to_history(&item)),
            IpcRequest::HistoryClear => respond(self.library.clear_history()),
            IpcRequest::SetApiKey { source, key } => {
                respond(self.library.set_api_key(source, &key))
            }
            IpcRequest::HasApiKeys => IpcResponse::from_data(&self.library.has_api_keys()),

            IpcRequest::LocalList => respond(self.local().list()),
            IpcRequest::LocalSet { path } => respond(self.local().set_wallpaper(&path).await),
            IpcRequest::LocalAdd { path } => respond(self.local().add_wallpaper(&path).await),
            IpcRequest::LocalRemove { path } => respond(self.local().remove_wallpaper(&path)),
            IpcRequest::LocalRemoveAll => respond(self.local().remove_all()),
            IpcRequest::LocalNext => match self.local().next_wallpaper().await {
                Ok(Some(path)) => IpcResponse::from_data(&path),
                Ok(None) => IpcResponse::error("no local wallpapers"),
                Err(e) => respond::<()>(Err(e)),
            },
            IpcRequest::CurrentWallpaper => {
                IpcResponse::from_data(&self.applier.current_wallpaper())
            }
            IpcRequest::SlideshowStart { interval } => {
                let interval = interval.unwrap_or(self.local().slideshow_status().interval);
                match self.local().start_slideshow(interval) {
                    Ok(true) => IpcResponse::from_data(&self.local().slideshow_status()),
                    Ok(false) => IpcResponse::error("no local wallpapers"),
                    Err(e) => respond::<()>(Err(e)),
                }
            }
            IpcRequest::SlideshowStop => respond(self.local().stop_slideshow()),
            IpcRequest::SlideshowStatus => {
                IpcResponse::from_data(&self.local().slideshow_status())
            }

            // the connection handler triggers shutdown after replying
            IpcRequest::Quit => IpcResponse::ok(),
        }
    }

    fn local(&self) -> &Arc<WallpaperManager> {
        self.applier.manager()
    }

    pub fn request_shutdown(&self) {
        info!("shutdown requested");
        let _ = self.shutdown.send(true);
    }
}

/// Manual operations report their errors back to the caller.
fn respond<T: Serialize>(result: Result<T>) -> IpcResponse {
    match result {
        Ok(value) => IpcResponse::from_data(&value),
        Err(e) => {
            warn!("request failed: {e}");
            IpcResponse::error(e.to_string())
        }
    }
}
