use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use skyshift_core::error::Result;
use skyshift_core::models::{SearchOptions, Source, WallpaperItem};
use skyshift_core::sources::{CatalogKind, WallpaperSource};

const API_BASE: &str = "https://wallhaven.cc/api/v1";

/// General, anime and people.
const CATEGORIES: &str = "111";
/// Safe for work only.
const PURITY: &str = "100";

pub fn create_source(client: reqwest::Client) -> Arc<dyn WallpaperSource> {
    Arc::new(WallhavenClient::new(client))
}

pub struct WallhavenClient {
    client: reqwest::Client,
}

impl WallhavenClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn build_request(&self, options: &SearchOptions) -> reqwest::RequestBuilder {
        let query = options.query();
        let sorting = if query.is_some() { "relevance" } else { "random" };

        let mut req = self.client.get(format!("{API_BASE}/search")).query(&[
            ("page", options.page().to_string().as_str()),
            ("categories", CATEGORIES),
            ("purity", PURITY),
            ("sorting", sorting),
            ("order", "desc"),
        ]);

        if let Some(q) = query {
            req = req.query(&[("q", q)]);
        }

        // an exact resolution wins over a minimum size
        if let Some(resolution) = options.resolution.as_deref().filter(|r| !r.is_empty()) {
            req = req.query(&[("resolutions", resolution)]);
        } else if let Some((w, h)) = options.min_size() {
            req = req.query(&[("atleast", format!("{w}x{h}"))]);
        }
        req
    }
}

#[async_trait]
impl WallpaperSource for WallhavenClient {
    fn name(&self) -> &str {
        "Wallhaven"
    }

    fn source(&self) -> Source {
        Source::Wallhaven
    }

    fn kind(&self) -> CatalogKind {
        CatalogKind::Keyword
    }

    async fn search(&self, options: &SearchOptions) -> Result<Vec<WallpaperItem>> {
        let resp: WallhavenResponse = self
            .build_request(options)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!(count = resp.data.len(), page = options.page(), "wallhaven results");
        Ok(resp.data.into_iter().map(normalize).collect())
    }
}

fn normalize(w: WallhavenWallpaper) -> WallpaperItem {
    let username = w.uploader.map(|u| u.username).filter(|u| !u.is_empty());
    WallpaperItem {
        id: format!("wallhaven_{}", w.id),
        url: w.thumbs.large,
        thumbnail_url: w.thumbs.small,
        download_url: w.path,
        author: username.clone().unwrap_or_else(|| "Wallhaven".into()),
        author_url: format!(
            "https://wallhaven.cc/user/{}",
            username.unwrap_or_default()
        ),
        description: w.category,
        width: w.dimension_x,
        height: w.dimension_y,
        source: Source::Wallhaven,
        color: w.colors.into_iter().next(),
    }
}

// -- API response types --

#[derive(Debug, Deserialize)]
struct WallhavenResponse {
    data: Vec<WallhavenWallpaper>,
}

#[derive(Debug, Deserialize)]
struct WallhavenWallpaper {
    id: String,
    path: String,
    dimension_x: u32,
    dimension_y: u32,
    #[serde(default)]
    category: String,
    #[serde(default)]
    colors: Vec<String>,
    thumbs: WallhavenThumbs,
    #[serde(default)]
    uploader: Option<WallhavenUploader>,
}

#[derive(Debug, Deserialize)]
struct WallhavenThumbs {
    large: String,
    small: String,
}

#[derive(Debug, Deserialize)]
struct WallhavenUploader {
    username: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOCK_RESPONSE: &str = r##"{
        "data": [
            {
                "id": "abc123",
                "url": "https://wallhaven.cc/w/abc123",
                "short_url": "https://whvn.cc/abc123",
                "views": 1000,
                "favorites": 50,
                "source": "",
                "purity": "sfw",
                "category": "general",
                "dimension_x": 3840,
                "dimension_y": 2160,
                "resolution": "3840x2160",
                "ratio": "1.78",
                "file_size": 5000000,
                "file_type": "image/jpeg",
                "created_at": "2024-01-01 00:00:00",
                "colors": ["#424153", "#000000"],
                "path": "https://w.wallhaven.cc/full/ab/wallhaven-abc123.jpg",
                "thumbs": {
                    "large": "https://th.wallhaven.cc/lg/ab/abc123.jpg",
                    "original": "https://th.wallhaven.cc/orig/ab/abc123.jpg",
                    "small": "https://th.wallhaven.cc/small/ab/abc123.jpg"
                },
                "uploader": {"username": "painter", "group": "User"}
            },
            {
                "id": "def456",
                "category": "anime",
                "dimension_x": 1920,
                "dimension_y": 1080,
                "colors": [],
                "path": "https://w.wallhaven.cc/full/de/wallhaven-def456.png",
                "thumbs": {
                    "large": "https://th.wallhaven.cc/lg/de/def456.jpg",
                    "original": "https://th.wallhaven.cc/orig/de/def456.jpg",
                    "small": "https://th.wallhaven.cc/small/de/def456.jpg"
                }
            }
        ],
        "meta": {
            "current_page": 1,
            "last_page": 1,
            "per_page": 24,
            "total": 2
        }
    }"##;

    fn client() -> WallhavenClient {
        WallhavenClient::new(reqwest::Client::new())
    }

    fn query_pairs(options: &SearchOptions) -> Vec<(String, String)> {
        let req = client().build_request(options).build().unwrap();
        req.url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    fn param(pairs: &[(String, String)], key: &str) -> Option<String> {
        pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    #[test]
    fn test_parse_and_normalize() {
        let resp: WallhavenResponse = serde_json::from_str(MOCK_RESPONSE).unwrap();
        let items: Vec<WallpaperItem> = resp.data.into_iter().map(normalize).collect();
        assert_eq!(items.len(), 2);

        let first = &items[0];
        assert_eq!(first.id, "wallhaven_abc123");
        assert_eq!(first.url, "https://th.wallhaven.cc/lg/ab/abc123.jpg");
        assert_eq!(first.thumbnail_url, "https://th.wallhaven.cc/small/ab/abc123.jpg");
        assert_eq!(first.download_url, "https://w.wallhaven.cc/full/ab/wallhaven-abc123.jpg");
        assert_eq!(first.author, "painter");
        assert_eq!(first.author_url, "https://wallhaven.cc/user/painter");
        assert_eq!(first.description, "general");
        assert_eq!((first.width, first.height), (3840, 2160));
        assert_eq!(first.color.as_deref(), Some("#424153"));
        assert_eq!(first.source, Source::Wallhaven);

        let anonymous = &items[1];
        assert_eq!(anonymous.author, "Wallhaven");
        assert_eq!(anonymous.author_url, "https://wallhaven.cc/user/");
        assert_eq!(anonymous.color, None);
    }

    #[test]
    fn test_browse_request_is_random() {
        let pairs = query_pairs(&SearchOptions::default().with_page(4));
        assert_eq!(param(&pairs, "page").as_deref(), Some("4"));
        assert_eq!(param(&pairs, "categories").as_deref(), Some("111"));
        assert_eq!(param(&pairs, "purity").as_deref(), Some("100"));
        assert_eq!(param(&pairs, "sorting").as_deref(), Some("random"));
        assert_eq!(param(&pairs, "order").as_deref(), Some("desc"));
        assert_eq!(param(&pairs, "q"), None);
        assert_eq!(param(&pairs, "atleast"), None);
    }

    #[test]
    fn test_keyword_request_with_size_filters() {
        let opts = SearchOptions::default()
            .with_query("space galaxy stars")
            .with_min_size(2560, 1440);
        let pairs = query_pairs(&opts);
        assert_eq!(param(&pairs, "sorting").as_deref(), Some("relevance"));
        assert_eq!(param(&pairs, "q").as_deref(), Some("space galaxy stars"));
        assert_eq!(param(&pairs, "atleast").as_deref(), Some("2560x1440"));

        let pairs = query_pairs(&opts.with_resolution(3840, 2160));
        assert_eq!(param(&pairs, "resolutions").as_deref(), Some("3840x2160"));
        assert_eq!(param(&pairs, "atleast"), None);
    }

    #[test]
    fn test_atleast_needs_both_dimensions() {
        let opts = SearchOptions {
            min_width: Some(1920),
            ..Default::default()
        };
        assert_eq!(param(&query_pairs(&opts), "atleast"), None);
    }
}
