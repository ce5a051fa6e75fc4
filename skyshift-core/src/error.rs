use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SkyshiftError {
    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("store error: {0}")]
    Store(String),

    #[error("source error: {0}")]
    Source(String),

    #[error("download error: {0}")]
    Download(String),

    #[error("too many redirects fetching {url} (limit {limit})")]
    TooManyRedirects { url: String, limit: usize },

    #[error("backend error: {0}")]
    Backend(String),

    #[error("ipc error: {0}")]
    Ipc(String),

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("not an image file: {0}")]
    NotAnImage(PathBuf),

    #[error("not in the wallpapers directory: {0}")]
    OutsideLibrary(PathBuf),
}

pub type Result<T> = std::result::Result<T, SkyshiftError>;
