use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use skyshift_core::error::Result;
use skyshift_core::models::{SearchOptions, Source, WallpaperItem};
use skyshift_core::sources::{ApiKeyProvider, CatalogKind, WallpaperSource};

const API_BASE: &str = "https://api.pexels.com/v1";

/// Pexels caps `per_page` at 80.
const MAX_PER_PAGE: u32 = 80;

pub fn create_source(
    client: reqwest::Client,
    keys: Arc<dyn ApiKeyProvider>,
) -> Arc<dyn WallpaperSource> {
    Arc::new(PexelsClient::new(client, keys))
}

pub struct PexelsClient {
    client: reqwest::Client,
    keys: Arc<dyn ApiKeyProvider>,
}

impl PexelsClient {
    pub fn new(client: reqwest::Client, keys: Arc<dyn ApiKeyProvider>) -> Self {
        Self { client, keys }
    }

    fn build_request(&self, api_key: &str, options: &SearchOptions) -> reqwest::RequestBuilder {
        let page = options.page().to_string();
        let per_page = options.per_page().min(MAX_PER_PAGE).to_string();

        let req = match options.query() {
            Some(query) => self.client.get(format!("{API_BASE}/search")).query(&[
                ("query", query),
                ("page", page.as_str()),
                ("per_page", per_page.as_str()),
                ("orientation", options.orientation().as_str()),
            ]),
            None => self
                .client
                .get(format!("{API_BASE}/curated"))
                .query(&[("page", &page), ("per_page", &per_page)]),
        };
        req.header("Authorization", api_key)
    }
}

#[async_trait]
impl WallpaperSource for PexelsClient {
    fn name(&self) -> &str {
        "Pexels"
    }

    fn source(&self) -> Source {
        Source::Pexels
    }

    fn kind(&self) -> CatalogKind {
        CatalogKind::Keyword
    }

    async fn search(&self, options: &SearchOptions) -> Result<Vec<WallpaperItem>> {
        let Some(api_key) = self.keys.api_key(Source::Pexels) else {
            debug!("pexels api key not configured");
            return Ok(Vec::new());
        };

        let resp: PexelsResponse = self
            .build_request(&api_key, options)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp.photos.into_iter().map(normalize).collect())
    }
}

fn normalize(photo: PexelsPhoto) -> WallpaperItem {
    WallpaperItem {
        id: photo.id.to_string(),
        url: photo.src.large,
        thumbnail_url: photo.src.medium,
        download_url: photo.src.original,
        author: photo.photographer,
        author_url: photo.photographer_url,
        description: photo.alt.unwrap_or_default(),
        width: photo.width,
        height: photo.height,
        source: Source::Pexels,
        color: photo.avg_color,
    }
}

// -- API response types --

#[derive(Debug, Deserialize)]
struct PexelsResponse {
    photos: Vec<PexelsPhoto>,
}

#[derive(Debug, Deserialize)]
struct PexelsPhoto {
    id: u64,
    width: u32,
    height: u32,
    photographer: String,
    photographer_url: String,
    avg_color: Option<String>,
    alt: Option<String>,
    src: PexelsSrc,
}

#[derive(Debug, Deserialize)]
struct PexelsSrc {
    original: String,
    large: String,
    medium: String,
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const MOCK_RESPONSE: &str = r##"{
        "total_results": 1,
        "page": 1,
        "per_page": 15,
        "photos": [
            {
                "id": 12345,
                "width": 6000,
                "height": 4000,
                "url": "https://www.pexels.com/photo/12345/",
                "photographer": "John Smith",
                "photographer_url": "https://www.pexels.com/@johnsmith",
                "photographer_id": 100,
                "avg_color": "#7E8A6C",
                "src": {
                    "original": "https://images.pexels.com/photos/12345/original.jpeg",
                    "large2x": "https://images.pexels.com/photos/12345/large2x.jpeg",
                    "large": "https://images.pexels.com/photos/12345/large.jpeg",
                    "medium": "https://images.pexels.com/photos/12345/medium.jpeg",
                    "small": "https://images.pexels.com/photos/12345/small.jpeg",
                    "portrait": "https://images.pexels.com/photos/12345/portrait.jpeg",
                    "landscape": "https://images.pexels.com/photos/12345/landscape.jpeg",
                    "tiny": "https://images.pexels.com/photos/12345/tiny.jpeg"
                },
                "liked": false,
                "alt": "Mountain landscape at dawn"
            }
        ],
        "next_page": "https://api.pexels.com/v1/search/?page=2&per_page=15&query=nature"
    }"##;

    fn client_with(keys: HashMap<Source, String>) -> PexelsClient {
        PexelsClient::new(reqwest::Client::new(), Arc::new(keys))
    }

    #[test]
    fn test_parse_and_normalize() {
        let resp: PexelsResponse = serde_json::from_str(MOCK_RESPONSE).unwrap();
        let items: Vec<WallpaperItem> = resp.photos.into_iter().map(normalize).collect();
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.id, "12345");
        assert_eq!(item.url, "https://images.pexels.com/photos/12345/large.jpeg");
        assert_eq!(item.thumbnail_url, "https://images.pexels.com/photos/12345/medium.jpeg");
        assert_eq!(item.download_url, "https://images.pexels.com/photos/12345/original.jpeg");
        assert_eq!(item.author, "John Smith");
        assert_eq!(item.author_url, "https://www.pexels.com/@johnsmith");
        assert_eq!(item.description, "Mountain landscape at dawn");
        assert_eq!(item.color.as_deref(), Some("#7E8A6C"));
        assert_eq!(item.source, Source::Pexels);
    }

    #[test]
    fn test_search_and_curated_requests() {
        let client = client_with(HashMap::new());

        let opts = SearchOptions::default().with_query("forest").with_page(3);
        let req = client.build_request("pk", &opts).build().unwrap();
        assert_eq!(req.url().path(), "/v1/search");
        let query = req.url().query().unwrap();
        assert!(query.contains("query=forest"));
        assert!(query.contains("page=3"));
        assert!(query.contains("per_page=20"));
        assert!(query.contains("orientation=landscape"));
        assert_eq!(req.headers().get("Authorization").unwrap(), "pk");

        let req = client
            .build_request("pk", &SearchOptions::default())
            .build()
            .unwrap();
        assert_eq!(req.url().path(), "/v1/curated");
        assert_eq!(req.url().query(), Some("page=1&per_page=20"));
    }

    #[tokio::test]
    async fn test_no_key_returns_empty_without_request() {
        let client = client_with(HashMap::new());
        assert!(client
            .search(&SearchOptions::default())
            .await
            .unwrap()
            .is_empty());
    }
}
