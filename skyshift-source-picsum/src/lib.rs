use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use skyshift_core::error::Result;
use skyshift_core::models::{SearchOptions, Source, WallpaperItem};
use skyshift_core::sources::{CatalogKind, WallpaperSource};

const API_BASE: &str = "https://picsum.photos";

const PREVIEW_SIZE: (u32, u32) = (1920, 1080);
const THUMB_SIZE: (u32, u32) = (400, 225);

pub fn create_source(client: reqwest::Client) -> Arc<dyn WallpaperSource> {
    Arc::new(PicsumClient::new(client))
}

/// Lorem Picsum photo list. Keywords are ignored; an exact `resolution` in
/// the options pins every item to that rendition size.
pub struct PicsumClient {
    client: reqwest::Client,
}

impl PicsumClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn build_request(&self, options: &SearchOptions) -> reqwest::RequestBuilder {
        self.client.get(format!("{API_BASE}/v2/list")).query(&[
            ("page", options.page()),
            ("limit", options.per_page()),
        ])
    }
}

#[async_trait]
impl WallpaperSource for PicsumClient {
    fn name(&self) -> &str {
        "Picsum"
    }

    fn source(&self) -> Source {
        Source::Picsum
    }

    fn kind(&self) -> CatalogKind {
        CatalogKind::Random
    }

    async fn search(&self, options: &SearchOptions) -> Result<Vec<WallpaperItem>> {
        let photos: Vec<PicsumPhoto> = self
            .build_request(options)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!(count = photos.len(), page = options.page(), "picsum results");

        let pinned = options.exact_size();
        Ok(photos
            .into_iter()
            .map(|photo| normalize(photo, pinned))
            .collect())
    }
}

fn image_url(id: &str, (w, h): (u32, u32)) -> String {
    format!("{API_BASE}/id/{id}/{w}/{h}")
}

fn normalize(photo: PicsumPhoto, pinned: Option<(u32, u32)>) -> WallpaperItem {
    let thumbnail_url = image_url(&photo.id, THUMB_SIZE);
    let description = format!("Photo by {}", photo.author);

    match pinned {
        Some((w, h)) => WallpaperItem {
            id: format!("picsum_{}_{w}x{h}", photo.id),
            url: image_url(&photo.id, (w, h)),
            thumbnail_url,
            download_url: image_url(&photo.id, (w, h)),
            author: photo.author,
            author_url: photo.url,
            description,
            width: w,
            height: h,
            source: Source::Picsum,
            color: None,
        },
        None => WallpaperItem {
            id: format!("picsum_{}", photo.id),
            url: image_url(&photo.id, PREVIEW_SIZE),
            thumbnail_url,
            download_url: photo.download_url,
            author: photo.author,
            author_url: photo.url,
            description,
            width: photo.width,
            height: photo.height,
            source: Source::Picsum,
            color: None,
        },
    }
}

// -- API response types --

#[derive(Debug, Deserialize)]
struct PicsumPhoto {
    id: String,
    author: String,
    width: u32,
    height: u32,
    url: String,
    download_url: String,
}
