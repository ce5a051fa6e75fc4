//! Periodic wallpaper rotation.
//!
//! Settings and bookkeeping live in the `auto-wallpaper` store so the
//! countdown survives restarts. The timer task only holds a weak handle to
//! the scheduler and ends once the scheduler is dropped.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use rand::seq::IndexedRandom;
use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::aggregator::Aggregator;
use crate::apply::WallpaperApplier;
use crate::error::Result;
use crate::models::{AutoChangeConfig, RotationStatus, SearchOptions, Source, WallpaperItem};
use crate::store::JsonStore;

pub const STORE_NAME: &str = "auto-wallpaper";

const CONFIG_KEY: &str = "config";
const LAST_START_KEY: &str = "lastStartTime";
const LAST_CHANGE_KEY: &str = "lastChangeTime";
const LAST_WALLPAPER_KEY: &str = "lastWallpaper";

/// Rotation picks from a random result page in this range.
const MAX_RANDOM_PAGE: u32 = 10;

pub struct AutoRotation {
    store: Arc<JsonStore>,
    aggregator: Arc<Aggregator>,
    applier: Arc<dyn WallpaperApplier>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl AutoRotation {
    pub fn new(
        store: Arc<JsonStore>,
        aggregator: Arc<Aggregator>,
        applier: Arc<dyn WallpaperApplier>,
    ) -> Self {
        Self {
            store,
            aggregator,
            applier,
            timer: Mutex::new(None),
        }
    }

    pub fn default_config() -> AutoChangeConfig {
        AutoChangeConfig::default()
    }

    /// Persisted settings; a record the store cannot read yields the
    /// defaults.
    pub fn config(&self) -> AutoChangeConfig {
        self.store
            .get(CONFIG_KEY, Self::default_config())
            .with_backfilled_interval()
    }

    /// Persist normalized settings, then start or stop the timer to match.
    pub fn save_config(self: &Arc<Self>, config: AutoChangeConfig) -> Result<AutoChangeConfig> {
        let config = config.normalized();
        self.store.set(CONFIG_KEY, &config)?;
        info!(
            enabled = config.enabled,
            interval_ms = config.interval,
            "rotation config saved"
        );

        if config.enabled {
            self.start()?;
        } else {
            self.stop();
        }
        Ok(config)
    }

    pub fn set_enabled(self: &Arc<Self>, enabled: bool) -> Result<AutoChangeConfig> {
        let mut config = self.config();
        config.enabled = enabled;
        self.save_config(config)
    }

    /// Arm the repeating timer. Returns `false` without doing anything when
    /// rotation is disabled. The first change happens one full interval
    /// after this call.
    pub fn start(self: &Arc<Self>) -> Result<bool> {
        let config = self.config();
        if !config.enabled {
            return Ok(false);
        }
        self.stop();
        self.store.set(LAST_START_KEY, &now_millis())?;

        let period = Duration::from_millis(config.interval.max(1));
        let weak = Arc::downgrade(self);
        let handle = tokio::spawn(run_timer(weak, period));
        *self.lock_timer() = Some(handle);
        info!(interval_ms = config.interval, "rotation started");
        Ok(true)
    }

    pub fn stop(&self) {
        if let Some(handle) = self.lock_timer().take() {
            handle.abort();
            info!("rotation stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock_timer()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Pick and apply a new wallpaper now. Every failure is logged and
    /// reported as `false`.
    pub async fn change_wallpaper(&self) -> bool {
        match self.try_change().await {
            Ok(changed) => changed,
            Err(e) => {
                error!("wallpaper change failed: {e}");
                false
            }
        }
    }

    async fn try_change(&self) -> Result<bool> {
        let config = self.config();
        let (min_w, min_h) = config.resolution.floor();

        let options = rotation_options(min_w, min_h, pick_category(&config.categories));
        debug!(query = options.query().unwrap_or(""), page = options.page(), "looking for a wallpaper");
        let mut candidates = self.aggregator.query(Source::Wallhaven, &options).await;

        if candidates.is_empty() {
            info!("no wallpapers found, retrying without category");
            let fallback = rotation_options(min_w, min_h, None);
            candidates = self.aggregator.query(Source::Wallhaven, &fallback).await;
        }

        let Some(item) = pick_item(&candidates) else {
            warn!("no wallpapers found for rotation");
            return Ok(false);
        };

        match self.applier.apply(&item.download_url).await? {
            Some(path) => {
                self.store.set(LAST_CHANGE_KEY, &now_millis())?;
                self.store.set(LAST_WALLPAPER_KEY, &item)?;
                info!(id = %item.id, path = %path.display(), "wallpaper rotated");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn status(&self) -> RotationStatus {
        let config = self.config();
        let last_change: Option<i64> = self.store.get(LAST_CHANGE_KEY, None);
        let last_start: Option<i64> = self.store.get(LAST_START_KEY, None);
        let last_wallpaper: Option<WallpaperItem> = self.store.get(LAST_WALLPAPER_KEY, None);

        let next_change_in = config.enabled.then(|| {
            let base = last_change.unwrap_or(0).max(last_start.unwrap_or(0));
            if base > 0 {
                let elapsed = now_millis().saturating_sub(base).max(0) as u64;
                config.interval.saturating_sub(elapsed)
            } else {
                config.interval
            }
        });

        RotationStatus {
            enabled: config.enabled,
            last_change_time: last_change,
            last_wallpaper,
            next_change_in,
        }
    }

    /// Resume rotation at startup when it was left enabled.
    pub fn init(self: &Arc<Self>) -> Result<()> {
        if self.config().enabled {
            self.start()?;
        } else {
            debug!("rotation disabled");
        }
        Ok(())
    }

    fn lock_timer(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.timer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for AutoRotation {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_timer(rotation: Weak<AutoRotation>, period: Duration) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let Some(rotation) = rotation.upgrade() else {
            break;
        };
        rotation.change_wallpaper().await;
    }
}

fn rotation_options(min_w: u32, min_h: u32, category: Option<String>) -> SearchOptions {
    let page = rand::rng().random_range(1..=MAX_RANDOM_PAGE);
    let options = SearchOptions::default()
        .with_page(page)
        .with_min_size(min_w, min_h);
    match category {
        Some(category) => options.with_query(category),
        None => options,
    }
}

fn pick_category(categories: &[String]) -> Option<String> {
    categories.choose(&mut rand::rng()).cloned()
}

fn pick_item(items: &[WallpaperItem]) -> Option<WallpaperItem> {
    items.choose(&mut rand::rng()).cloned()
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
