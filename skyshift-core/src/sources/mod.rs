use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{SearchOptions, Source, WallpaperItem};

/// How a catalog takes part in aggregated queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    /// Searchable by keyword.
    Keyword,
    /// Paginated random images, no keyword support.
    Random,
    /// Small fixed daily selection.
    Daily,
}

#[async_trait]
pub trait WallpaperSource: Send + Sync {
    /// Display name (e.g. "Wallhaven", "Bing Daily")
    fn name(&self) -> &str;
    fn source(&self) -> Source;
    fn kind(&self) -> CatalogKind;
    /// One page of results. Keyed catalogs return `Ok(vec![])` when no
    /// credential is configured.
    async fn search(&self, options: &SearchOptions) -> Result<Vec<WallpaperItem>>;
}

/// Supplies credentials for keyed catalogs at request time.
pub trait ApiKeyProvider: Send + Sync {
    fn api_key(&self, source: Source) -> Option<String>;
}

impl ApiKeyProvider for HashMap<Source, String> {
    fn api_key(&self, source: Source) -> Option<String> {
        self.get(&source).filter(|k| !k.is_empty()).cloned()
    }
}

/// Registered catalogs, in the order their results are interleaved.
pub struct SourceRegistry {
    sources: Vec<Arc<dyn WallpaperSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    pub fn register(&mut self, source: Arc<dyn WallpaperSource>) {
        self.sources.push(source);
    }

    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub fn get(&self, source: Source) -> Option<Arc<dyn WallpaperSource>> {
        self.sources.iter().find(|s| s.source() == source).cloned()
    }

    pub fn of_kinds(&self, kinds: &[CatalogKind]) -> Vec<Arc<dyn WallpaperSource>> {
        self.sources
            .iter()
            .filter(|s| kinds.contains(&s.kind()))
            .cloned()
            .collect()
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
