use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use skyshift_core::error::Result;
use skyshift_core::models::{SearchOptions, Source, WallpaperItem};
use skyshift_core::sources::{ApiKeyProvider, CatalogKind, WallpaperSource};

const API_BASE: &str = "https://api.unsplash.com";

/// Unsplash caps `per_page` at 30.
const MAX_PER_PAGE: u32 = 30;

pub fn create_source(
    client: reqwest::Client,
    keys: Arc<dyn ApiKeyProvider>,
) -> Arc<dyn WallpaperSource> {
    Arc::new(UnsplashClient::new(client, keys))
}

pub struct UnsplashClient {
    client: reqwest::Client,
    keys: Arc<dyn ApiKeyProvider>,
}

impl UnsplashClient {
    pub fn new(client: reqwest::Client, keys: Arc<dyn ApiKeyProvider>) -> Self {
        Self { client, keys }
    }

    fn build_request(&self, access_key: &str, options: &SearchOptions) -> reqwest::RequestBuilder {
        let page = options.page().to_string();
        let per_page = options.per_page().min(MAX_PER_PAGE).to_string();

        let req = match options.query() {
            Some(query) => self.client.get(format!("{API_BASE}/search/photos")).query(&[
                ("query", query),
                ("page", page.as_str()),
                ("per_page", per_page.as_str()),
                ("orientation", options.orientation().as_str()),
            ]),
            None => self
                .client
                .get(format!("{API_BASE}/photos"))
                .query(&[("page", &page), ("per_page", &per_page)]),
        };
        req.header("Authorization", format!("Client-ID {access_key}"))
    }
}

#[async_trait]
impl WallpaperSource for UnsplashClient {
    fn name(&self) -> &str {
        "Unsplash"
    }

    fn source(&self) -> Source {
        Source::Unsplash
    }

    fn kind(&self) -> CatalogKind {
        CatalogKind::Keyword
    }

    async fn search(&self, options: &SearchOptions) -> Result<Vec<WallpaperItem>> {
        let Some(access_key) = self.keys.api_key(Source::Unsplash) else {
            debug!("unsplash access key not configured");
            return Ok(Vec::new());
        };

        let resp = self
            .build_request(&access_key, options)
            .send()
            .await?
            .error_for_status()?;

        // search wraps the photos, the editorial list is a bare array
        let photos = if options.query().is_some() {
            resp.json::<UnsplashSearchResponse>().await?.results
        } else {
            resp.json::<Vec<UnsplashPhoto>>().await?
        };
        Ok(photos.into_iter().map(normalize).collect())
    }
}

fn normalize(photo: UnsplashPhoto) -> WallpaperItem {
    WallpaperItem {
        id: photo.id,
        url: photo.urls.regular,
        thumbnail_url: photo.urls.small,
        download_url: photo.urls.full,
        author: photo.user.name,
        author_url: photo.user.links.html,
        description: photo
            .description
            .filter(|d| !d.is_empty())
            .or(photo.alt_description)
            .unwrap_or_default(),
        width: photo.width,
        height: photo.height,
        source: Source::Unsplash,
        color: photo.color,
    }
}

// -- API response types --

#[derive(Debug, Deserialize)]
struct UnsplashSearchResponse {
    results: Vec<UnsplashPhoto>,
}

#[derive(Debug, Deserialize)]
struct UnsplashPhoto {
    id: String,
    width: u32,
    height: u32,
    color: Option<String>,
    description: Option<String>,
    alt_description: Option<String>,
    urls: UnsplashUrls,
    user: UnsplashUser,
}

#[derive(Debug, Deserialize)]
struct UnsplashUrls {
    full: String,
    regular: String,
    small: String,
}

#[derive(Debug, Deserialize)]
struct UnsplashUser {
    name: String,
    links: UnsplashUserLinks,
}

#[derive(Debug, Deserialize)]
struct UnsplashUserLinks {
    html: String,
}
