//! Fan-out queries over the registered catalogs.
//!
//! Every catalog call runs in its own task under a timeout; a catalog that
//! errors or hangs contributes nothing instead of failing the whole query.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, info, warn};

use crate::matcher;
use crate::models::{SearchOptions, Source, WallpaperItem};
use crate::sources::{CatalogKind, SourceRegistry, WallpaperSource};
use crate::translate::{needs_translation, Translator};

pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(10);

/// Wallhaven items taken into the popular feed.
const POPULAR_KEYWORD_LIMIT: usize = 12;
const POPULAR_RANDOM_PER_PAGE: u32 = 12;
/// Picsum page size when pinned to a screen resolution.
const RESOLUTION_RANDOM_PER_PAGE: u32 = 10;

/// Browse categories and the query each maps to.
pub const CATEGORIES: &[(&str, &str)] = &[
    ("Nature", "nature landscape"),
    ("City", "city architecture"),
    ("Abstract", "abstract art"),
    ("Animals", "animals wildlife"),
    ("Space", "space galaxy stars"),
    ("Minimal", "minimal"),
    ("Dark", "dark"),
    ("Anime", "anime"),
    ("Technology", "technology"),
    ("Photography", "landscape photography"),
];

pub struct Aggregator {
    registry: SourceRegistry,
    translator: Option<Arc<dyn Translator>>,
    timeout: Duration,
}

impl Aggregator {
    pub fn new(registry: SourceRegistry) -> Self {
        Self {
            registry,
            translator: None,
            timeout: DEFAULT_SOURCE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Query a single catalog. Unregistered catalogs and failures yield an
    /// empty list.
    pub async fn query(&self, source: Source, options: &SearchOptions) -> Vec<WallpaperItem> {
        let Some(catalog) = self.registry.get(source) else {
            debug!(source = %source, "catalog not registered");
            return Vec::new();
        };
        fetch_isolated(catalog, options.clone(), self.timeout).await
    }

    /// Unified search. A keyword query goes to the keyword catalogs only,
    /// translated to English first when needed; without one every keyword
    /// and random catalog is browsed. Results are interleaved per catalog.
    pub async fn search(&self, options: &SearchOptions) -> Vec<WallpaperItem> {
        let (kinds, options) = match options.query() {
            Some(query) => {
                let translated = self.translate(query).await;
                let options = options.clone().with_query(translated);
                (&[CatalogKind::Keyword][..], options)
            }
            None => (&[CatalogKind::Keyword, CatalogKind::Random][..], options.clone()),
        };

        let jobs = self
            .registry
            .of_kinds(kinds)
            .into_iter()
            .map(|catalog| (catalog, options.clone()))
            .collect();
        let merged = interleave(self.fetch_all(jobs).await);
        info!(query = options.query().unwrap_or(""), count = merged.len(), "search finished");
        merged
    }

    /// Daily feed, the first items of a random wallhaven page and a random
    /// picsum page, in that order.
    pub async fn popular(&self) -> Vec<WallpaperItem> {
        let page = rand::rng().random_range(1..=10);

        let mut jobs = Vec::new();
        let daily = self.registry.get(Source::Bing);
        let keyword = self.registry.get(Source::Wallhaven);
        let random = self.registry.get(Source::Picsum);
        if let Some(catalog) = &daily {
            jobs.push((catalog.clone(), SearchOptions::default()));
        }
        if let Some(catalog) = &keyword {
            jobs.push((catalog.clone(), SearchOptions::default().with_page(page)));
        }
        if let Some(catalog) = &random {
            jobs.push((
                catalog.clone(),
                SearchOptions::default()
                    .with_page(page)
                    .with_per_page(POPULAR_RANDOM_PER_PAGE),
            ));
        }

        let mut results = self.fetch_all(jobs).await.into_iter();
        let mut feed = Vec::new();
        if daily.is_some() {
            feed.extend(results.next().unwrap_or_default());
        }
        if keyword.is_some() {
            feed.extend(
                results
                    .next()
                    .unwrap_or_default()
                    .into_iter()
                    .take(POPULAR_KEYWORD_LIMIT),
            );
        }
        if random.is_some() {
            feed.extend(results.next().unwrap_or_default());
        }
        debug!(page, count = feed.len(), "popular feed assembled");
        feed
    }

    /// Candidates for a screen, best fit first. The screen is bucketed to
    /// the nearest standard resolution, which becomes the wallhaven size
    /// floor and the exact size of the picsum renditions.
    pub async fn for_resolution(
        &self,
        screen_w: u32,
        screen_h: u32,
        options: &SearchOptions,
    ) -> Vec<WallpaperItem> {
        let bucket = matcher::best_standard_match(screen_w, screen_h);
        info!(
            screen = %format!("{screen_w}x{screen_h}"),
            bucket = bucket.value,
            "matching wallpapers to screen"
        );

        let keyword_opts = options
            .clone()
            .with_min_size(bucket.width, bucket.height);
        let random_opts = SearchOptions::default()
            .with_page(options.page())
            .with_per_page(RESOLUTION_RANDOM_PER_PAGE)
            .with_resolution(bucket.width, bucket.height);

        let mut jobs = Vec::new();
        if let Some(catalog) = self.registry.get(Source::Wallhaven) {
            jobs.push((catalog, keyword_opts));
        }
        if let Some(catalog) = self.registry.get(Source::Picsum) {
            jobs.push((catalog, random_opts));
        }

        let merged: Vec<WallpaperItem> = self.fetch_all(jobs).await.into_iter().flatten().collect();
        matcher::rank(merged, screen_w, screen_h)
    }

    pub fn common_resolutions() -> &'static [matcher::StandardResolution] {
        matcher::STANDARD_RESOLUTIONS
    }

    pub fn categories() -> Vec<&'static str> {
        CATEGORIES.iter().map(|(name, _)| *name).collect()
    }

    /// Wallhaven results for a browse category. Unknown names are searched
    /// verbatim.
    pub async fn category_wallpapers(&self, category: &str, page: u32) -> Vec<WallpaperItem> {
        let query = CATEGORIES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(category))
            .map(|(_, query)| *query)
            .unwrap_or(category);
        let options = SearchOptions::default().with_query(query).with_page(page);
        self.query(Source::Wallhaven, &options).await
    }

    async fn translate(&self, query: &str) -> String {
        match &self.translator {
            Some(translator) if needs_translation(query) => translator.to_english(query).await,
            _ => query.to_string(),
        }
    }

    /// Run all jobs concurrently; results come back in job order.
    async fn fetch_all(
        &self,
        jobs: Vec<(Arc<dyn WallpaperSource>, SearchOptions)>,
    ) -> Vec<Vec<WallpaperItem>> {
        let handles: Vec<_> = jobs
            .into_iter()
            .map(|(catalog, options)| {
                let source = catalog.source();
                let handle = tokio::spawn(fetch_isolated(catalog, options, self.timeout));
                (source, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (source, handle) in handles {
            match handle.await {
                Ok(items) => results.push(items),
                Err(e) => {
                    warn!(source = %source, "catalog task failed: {e}");
                    results.push(Vec::new());
                }
            }
        }
        results
    }
}

async fn fetch_isolated(
    catalog: Arc<dyn WallpaperSource>,
    options: SearchOptions,
    limit: Duration,
) -> Vec<WallpaperItem> {
    let source = catalog.source();
    match tokio::time::timeout(limit, catalog.search(&options)).await {
        Ok(Ok(items)) => {
            debug!(source = %source, count = items.len(), "catalog answered");
            items
        }
        Ok(Err(e)) => {
            warn!(source = %source, "catalog query failed: {e}");
            Vec::new()
        }
        Err(_) => {
            warn!(source = %source, timeout_ms = limit.as_millis() as u64, "catalog query timed out");
            Vec::new()
        }
    }
}

/// Round-robin merge: the first item of every list, then the second of
/// every list that still has one, and so on.
pub fn interleave<T>(lists: Vec<Vec<T>>) -> Vec<T> {
    let total = lists.iter().map(Vec::len).sum();
    let mut iters: Vec<_> = lists.into_iter().map(Vec::into_iter).collect();
    let mut merged = Vec::with_capacity(total);
    while merged.len() < total {
        for iter in iters.iter_mut() {
            if let Some(item) = iter.next() {
                merged.push(item);
            }
        }
    }
    merged
}
