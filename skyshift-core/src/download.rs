use std::path::{Path, PathBuf};

use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use tracing::{debug, info};
use url::Url;

use crate::config::NetworkConfig;
use crate::error::{Result, SkyshiftError};

/// Longest extension taken from a URL, dot included.
const MAX_EXTENSION_LEN: usize = 5;

/// Fetches images into a directory. Redirects are followed by hand so the
/// hop count can be capped and relative locations resolved.
pub struct Downloader {
    client: reqwest::Client,
    max_redirects: usize,
}

impl Downloader {
    pub fn new(network: &NetworkConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(network.timeout())
            .user_agent(&network.user_agent)
            .redirect(Policy::none())
            .build()?;
        Ok(Self {
            client,
            max_redirects: network.max_redirects,
        })
    }

    /// Download `url` into `target_dir` as `wallpaper_<unix millis><ext>`
    /// and return the written path.
    pub async fn download(&self, url: &str, target_dir: &Path) -> Result<PathBuf> {
        let original = Url::parse(url)?;
        let data = self.fetch(original.clone()).await?;

        let ext = extension_from_url(&original).unwrap_or_else(|| sniff_extension(&data).to_string());
        let file_name = format!("wallpaper_{}{ext}", chrono::Utc::now().timestamp_millis());

        tokio::fs::create_dir_all(target_dir).await?;
        let path = target_dir.join(file_name);
        tokio::fs::write(&path, &data).await?;

        info!(path = %path.display(), bytes = data.len(), "wallpaper downloaded");
        Ok(path)
    }

    async fn fetch(&self, mut current: Url) -> Result<bytes::Bytes> {
        let mut hops = 0usize;
        loop {
            let response = self.client.get(current.clone()).send().await?;
            let status = response.status();

            if status.is_redirection() {
                let Some(location) = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                else {
                    return Err(SkyshiftError::Download(format!(
                        "{status} without a Location header from {current}"
                    )));
                };
                if hops >= self.max_redirects {
                    return Err(SkyshiftError::TooManyRedirects {
                        url: current.to_string(),
                        limit: self.max_redirects,
                    });
                }
                let next = current.join(location)?;
                debug!(from = %current, to = %next, "following redirect");
                current = next;
                hops += 1;
                continue;
            }

            let response = response.error_for_status()?;
            return Ok(response.bytes().await?);
        }
    }
}

/// Extension of the URL path including the dot, when it has one short
/// enough to be a real image extension.
pub fn extension_from_url(url: &Url) -> Option<String> {
    let last = url.path_segments()?.next_back()?;
    let dot = last.rfind('.')?;
    if dot == 0 {
        return None;
    }
    let ext = &last[dot..];
    (ext.len() > 1 && ext.len() <= MAX_EXTENSION_LEN).then(|| ext.to_ascii_lowercase())
}

/// Guess the extension from the leading magic bytes.
pub fn sniff_extension(data: &[u8]) -> &'static str {
    if data.starts_with(&[0x89, b'P', b'N', b'G']) {
        ".png"
    } else if data.starts_with(&[0xff, 0xd8]) {
        ".jpg"
    } else if data.starts_with(b"GIF") {
        ".gif"
    } else if data.starts_with(b"RIFF") {
        ".webp"
    } else {
        ".jpg"
    }
}
