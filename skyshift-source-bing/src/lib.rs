use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use skyshift_core::error::Result;
use skyshift_core::models::{SearchOptions, Source, WallpaperItem};
use skyshift_core::sources::{CatalogKind, WallpaperSource};

const BING_BASE: &str = "https://www.bing.com";
const ARCHIVE_URL: &str = "https://www.bing.com/HPImageArchive.aspx";

/// Images in the daily archive feed.
const ARCHIVE_COUNT: &str = "8";
const MARKET: &str = "zh-CN";

pub fn create_source(client: reqwest::Client) -> Arc<dyn WallpaperSource> {
    Arc::new(BingClient::new(client))
}

/// Bing homepage images of the last days. The feed ignores every search
/// option.
pub struct BingClient {
    client: reqwest::Client,
}

impl BingClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn build_request(&self) -> reqwest::RequestBuilder {
        self.client.get(ARCHIVE_URL).query(&[
            ("format", "js"),
            ("idx", "0"),
            ("n", ARCHIVE_COUNT),
            ("mkt", MARKET),
        ])
    }
}

#[async_trait]
impl WallpaperSource for BingClient {
    fn name(&self) -> &str {
        "Bing Daily"
    }

    fn source(&self) -> Source {
        Source::Bing
    }

    fn kind(&self) -> CatalogKind {
        CatalogKind::Daily
    }

    async fn search(&self, _options: &SearchOptions) -> Result<Vec<WallpaperItem>> {
        let resp: BingArchive = self
            .build_request()
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!(count = resp.images.len(), "bing archive fetched");
        Ok(resp.images.into_iter().map(normalize).collect())
    }
}

fn normalize(image: BingImage) -> WallpaperItem {
    let author = image
        .copyright
        .split('(')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();
    let description = if image.title.is_empty() {
        image.copyright.clone()
    } else {
        image.title
    };

    WallpaperItem {
        id: format!("bing_{}", image.startdate),
        url: format!("{BING_BASE}{}", image.url),
        thumbnail_url: format!("{BING_BASE}{}", image.url.replace("1920x1080", "400x240")),
        download_url: format!("{BING_BASE}{}", image.url),
        author,
        author_url: image
            .copyrightlink
            .filter(|link| !link.is_empty())
            .unwrap_or_else(|| BING_BASE.to_string()),
        description,
        width: 1920,
        height: 1080,
        source: Source::Bing,
        color: None,
    }
}

// -- API response types --

#[derive(Debug, Deserialize)]
struct BingArchive {
    images: Vec<BingImage>,
}

#[derive(Debug, Deserialize)]
struct BingImage {
    startdate: String,
    url: String,
    #[serde(default)]
    copyright: String,
    #[serde(default)]
    copyrightlink: Option<String>,
    #[serde(default)]
    title: String,
}
