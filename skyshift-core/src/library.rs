use std::sync::Arc;

use tracing::info;

use crate::error::Result;
use crate::models::{ApiKeyStatus, Source, WallpaperItem};
use crate::sources::ApiKeyProvider;
use crate::store::JsonStore;

pub const STORE_NAME: &str = "online-wallpaper";

/// History keeps this many of the most recent entries.
pub const HISTORY_LIMIT: usize = 100;

const UNSPLASH_KEY: &str = "unsplashAccessKey";
const PEXELS_KEY: &str = "pexelsApiKey";
const FAVORITES_KEY: &str = "favorites";
const HISTORY_KEY: &str = "history";

/// API keys, favorites and history of the online catalogs.
pub struct OnlineLibrary {
    store: Arc<JsonStore>,
}

impl OnlineLibrary {
    pub fn new(store: Arc<JsonStore>) -> Self {
        Self { store }
    }

    // -- API keys --

    pub fn set_api_key(&self, source: Source, key: &str) -> Result<()> {
        let Some(field) = key_field(source) else {
            return Ok(());
        };
        self.store.set(field, key.trim())?;
        info!(source = %source, configured = !key.trim().is_empty(), "api key updated");
        Ok(())
    }

    pub fn has_api_keys(&self) -> ApiKeyStatus {
        ApiKeyStatus {
            unsplash: self.api_key(Source::Unsplash).is_some(),
            pexels: self.api_key(Source::Pexels).is_some(),
        }
    }

    // -- Favorites --

    pub fn favorites(&self) -> Vec<WallpaperItem> {
        self.store.get(FAVORITES_KEY, Vec::new())
    }

    /// Insert at the head unless an item with the same id is already there.
    pub fn add_favorite(&self, item: &WallpaperItem) -> Result<()> {
        self.store
            .update(FAVORITES_KEY, Vec::<WallpaperItem>::new(), |favorites| {
                if !favorites.iter().any(|f| f.id == item.id) {
                    favorites.insert(0, item.clone());
                }
            })?;
        Ok(())
    }

    pub fn remove_favorite(&self, id: &str) -> Result<()> {
        self.store
            .update(FAVORITES_KEY, Vec::<WallpaperItem>::new(), |favorites| {
                favorites.retain(|f| f.id != id);
            })?;
        Ok(())
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.favorites().iter().any(|f| f.id == id)
    }

    // -- History --

    pub fn history(&self) -> Vec<WallpaperItem> {
        self.store.get(HISTORY_KEY, Vec::new())
    }

    /// Move (or insert) the item to the front, keeping at most
    /// [`HISTORY_LIMIT`] entries.
    pub fn add_to_history(&self, item: &WallpaperItem) -> Result<()> {
        self.store
            .update(HISTORY_KEY, Vec::<WallpaperItem>::new(), |history| {
                history.retain(|h| h.id != item.id);
                history.insert(0, item.clone());
                history.truncate(HISTORY_LIMIT);
            })?;
        Ok(())
    }

    pub fn clear_history(&self) -> Result<()> {
        self.store.set(HISTORY_KEY, &Vec::<WallpaperItem>::new())
    }
}

impl ApiKeyProvider for OnlineLibrary {
    fn api_key(&self, source: Source) -> Option<String> {
        let field = key_field(source)?;
        let key: String = self.store.get(field, String::new());
        (!key.is_empty()).then_some(key)
    }
}

fn key_field(source: Source) -> Option<&'static str> {
    match source {
        Source::Unsplash => Some(UNSPLASH_KEY),
        Source::Pexels => Some(PEXELS_KEY),
        _ => None,
    }
}
