use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SkyshiftError};
use crate::models::{AutoChangeConfig, SearchOptions, Source, WallpaperItem};
use crate::paths::SkyshiftPaths;

/// One request per connection, sent as a single JSON line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum IpcRequest {
    Status,
    ChangeNow,
    GetConfig,
    SaveConfig {
        config: AutoChangeConfig,
    },
    Enable,
    Disable,
    Search {
        #[serde(default)]
        options: SearchOptions,
    },
    Popular,
    ForResolution {
        #[serde(default)]
        width: Option<u32>,
        #[serde(default)]
        height: Option<u32>,
        #[serde(default)]
        options: SearchOptions,
    },
    Category {
        name: String,
        #[serde(default)]
        page: Option<u32>,
    },
    Categories,
    Resolutions,
    Query {
        source: Source,
        #[serde(default)]
        options: SearchOptions,
    },
    Download {
        url: String,
        #[serde(default)]
        dir: Option<PathBuf>,
    },
    ApplyUrl {
        url: String,
    },
    FavoritesList,
    FavoritesAdd {
        item: WallpaperItem,
    },
    FavoritesRemove {
        id: String,
    },
    FavoritesCheck {
        id: String,
    },
    HistoryList,
    HistoryAdd {
        item: WallpaperItem,
    },
    HistoryClear,
    SetApiKey {
        source: Source,
        key: String,
    },
    HasApiKeys,
    Prune,
    LocalList,
    LocalSet {
        path: PathBuf,
    },
    LocalAdd {
        path: PathBuf,
    },
    /// A bare file name refers to the wallpapers directory.
    LocalRemove {
        path: PathBuf,
    },
    LocalRemoveAll,
    LocalNext,
    CurrentWallpaper,
    SlideshowStart {
        /// Milliseconds; the stored or default interval when omitted.
        #[serde(default)]
        interval: Option<u64>,
    },
    SlideshowStop,
    SlideshowStatus,
    Quit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IpcResponse {
    Ok {
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<serde_json::Value>,
    },
    Error {
        message: String,
    },
}

impl IpcResponse {
    pub fn ok() -> Self {
        Self::Ok { data: None }
    }

    pub fn ok_with_data(data: serde_json::Value) -> Self {
        Self::Ok { data: Some(data) }
    }

    /// Serialize `value` as the payload; a value that cannot be serialized
    /// becomes an error response.
    pub fn from_data<T: Serialize>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(data) => Self::ok_with_data(data),
            Err(e) => Self::error(format!("failed to encode response: {e}")),
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error {
            message: msg.into(),
        }
    }
}

/// Send a request to the daemon and receive a response.
pub async fn send_request(request: &IpcRequest) -> Result<IpcResponse> {
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::UnixStream;

    let socket_path = SkyshiftPaths::socket_path();
    let stream = UnixStream::connect(&socket_path)
        .await
        .map_err(|e| SkyshiftError::Ipc(format!("failed to connect to daemon: {e}")))?;

    let (reader, mut writer) = stream.into_split();

    let mut line = serde_json::to_string(request)?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.shutdown().await?;

    let mut buf_reader = BufReader::new(reader);
    let mut response_line = String::new();
    buf_reader.read_line(&mut response_line).await?;

    let response: IpcResponse = serde_json::from_str(response_line.trim())?;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialize() {
        let req = IpcRequest::Status;
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"command":"status"}"#);

        let req = IpcRequest::SetApiKey {
            source: Source::Pexels,
            key: "abc".into(),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains(r#""command":"set_api_key""#));
        assert!(json.contains(r#""source":"pexels""#));
    }

    #[test]
    fn test_request_deserialize() {
        let json = r#"{"command":"change_now"}"#;
        let req: IpcRequest = serde_json::from_str(json).unwrap();
        assert!(matches!(req, IpcRequest::ChangeNow));

        let json = r#"{"command":"search","options":{"query":"sea","perPage":5}}"#;
        let req: IpcRequest = serde_json::from_str(json).unwrap();
        let IpcRequest::Search { options } = req else {
            panic!("expected search");
        };
        assert_eq!(options.query(), Some("sea"));
        assert_eq!(options.per_page(), 5);

        // options may be omitted entirely
        let json = r#"{"command":"query","source":"bing"}"#;
        let req: IpcRequest = serde_json::from_str(json).unwrap();
        assert!(matches!(
            req,
            IpcRequest::Query {
                source: Source::Bing,
                ..
            }
        ));
    }

    #[test]
    fn test_local_requests_use_snake_case_tags() {
        let json = r#"{"command":"slideshow_start"}"#;
        let req: IpcRequest = serde_json::from_str(json).unwrap();
        assert!(matches!(req, IpcRequest::SlideshowStart { interval: None }));

        let req = IpcRequest::LocalRemove {
            path: "wallpaper_1.jpg".into(),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(
            json,
            r#"{"command":"local_remove","path":"wallpaper_1.jpg"}"#
        );
    }

    #[test]
    fn test_save_config_request_carries_store_shape() {
        let json = r#"{"command":"save_config","config":{"enabled":true,"interval":0,"intervalUnit":"minutes","intervalValue":30,"resolution":"4k","categories":["nature"]}}"#;
        let req: IpcRequest = serde_json::from_str(json).unwrap();
        let IpcRequest::SaveConfig { config } = req else {
            panic!("expected save_config");
        };
        assert_eq!(config.normalized().interval, 30 * 60_000);
    }

    #[test]
    fn test_response_serialize() {
        let resp = IpcResponse::ok();
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"status":"ok"}"#);

        let resp = IpcResponse::error("not found");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains(r#""status":"error""#));
        assert!(json.contains("not found"));
    }

    #[test]
    fn test_response_with_data() {
        let resp = IpcResponse::from_data(&vec!["Nature", "City"]);
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"status":"ok","data":["Nature","City"]}"#);
    }

    #[test]
    fn test_roundtrip_all_requests() {
        let requests = vec![
            IpcRequest::Status,
            IpcRequest::ChangeNow,
            IpcRequest::GetConfig,
            IpcRequest::SaveConfig {
                config: AutoChangeConfig::default(),
            },
            IpcRequest::Enable,
            IpcRequest::Disable,
            IpcRequest::Search {
                options: SearchOptions::default().with_query("forest"),
            },
            IpcRequest::Popular,
            IpcRequest::ForResolution {
                width: Some(2560),
                height: Some(1440),
                options: SearchOptions::default(),
            },
            IpcRequest::Category {
                name: "Space".into(),
                page: Some(2),
            },
            IpcRequest::Categories,
            IpcRequest::Resolutions,
            IpcRequest::Query {
                source: Source::Wallhaven,
                options: SearchOptions::default(),
            },
            IpcRequest::Download {
                url: "https://example.com/a.jpg".into(),
                dir: None,
            },
            IpcRequest::ApplyUrl {
                url: "https://example.com/a.jpg".into(),
            },
            IpcRequest::FavoritesList,
            IpcRequest::FavoritesRemove { id: "x".into() },
            IpcRequest::HistoryList,
            IpcRequest::HistoryClear,
            IpcRequest::HasApiKeys,
            IpcRequest::Prune,
            IpcRequest::FavoritesCheck { id: "x".into() },
            IpcRequest::LocalList,
            IpcRequest::LocalSet {
                path: "/tmp/a.jpg".into(),
            },
            IpcRequest::LocalAdd {
                path: "/tmp/a.jpg".into(),
            },
            IpcRequest::LocalRemove {
                path: "a.jpg".into(),
            },
            IpcRequest::LocalRemoveAll,
            IpcRequest::LocalNext,
            IpcRequest::CurrentWallpaper,
            IpcRequest::SlideshowStart { interval: None },
            IpcRequest::SlideshowStop,
            IpcRequest::SlideshowStatus,
            IpcRequest::Quit,
        ];

        for req in requests {
            let json = serde_json::to_string(&req).unwrap();
            let _parsed: IpcRequest = serde_json::from_str(&json).unwrap();
        }
    }
}
