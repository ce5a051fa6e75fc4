use serde::{Deserialize, Serialize};

/// Default page size when a caller does not ask for one.
pub const DEFAULT_PER_PAGE: u32 = 20;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Unsplash,
    Pexels,
    Picsum,
    Bing,
    Wallhaven,
}

impl Source {
    pub const ALL: &[Source] = &[
        Source::Unsplash,
        Source::Pexels,
        Source::Picsum,
        Source::Bing,
        Source::Wallhaven,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unsplash => "unsplash",
            Self::Pexels => "pexels",
            Self::Picsum => "picsum",
            Self::Bing => "bing",
            Self::Wallhaven => "wallhaven",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|src| src.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown source: {s}"))
    }
}

/// A catalog entry normalized from any provider.
///
/// Serialized with the camelCase field names used by the persisted
/// favorites/history documents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WallpaperItem {
    pub id: String,
    pub url: String,
    pub thumbnail_url: String,
    pub download_url: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub author_url: String,
    #[serde(default)]
    pub description: String,
    pub width: u32,
    pub height: u32,
    pub source: Source,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Landscape,
    Portrait,
    Squarish,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Landscape => "landscape",
            Self::Portrait => "portrait",
            Self::Squarish => "squarish",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Exact resolution as "WxH".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_height: Option<u32>,
}

impl SearchOptions {
    /// Trimmed query, `None` when absent or blank.
    pub fn query(&self) -> Option<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u32 {
        self.per_page.unwrap_or(DEFAULT_PER_PAGE).max(1)
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation.unwrap_or_default()
    }

    /// Minimum size filter, only when both dimensions are set.
    pub fn min_size(&self) -> Option<(u32, u32)> {
        match (self.min_width, self.min_height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        }
    }

    /// Parse `resolution` ("1920x1080") into a size pair.
    pub fn exact_size(&self) -> Option<(u32, u32)> {
        let (w, h) = self.resolution.as_deref()?.split_once('x')?;
        let w: u32 = w.trim().parse().ok()?;
        let h: u32 = h.trim().parse().ok()?;
        (w > 0 && h > 0).then_some((w, h))
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    pub fn with_min_size(mut self, width: u32, height: u32) -> Self {
        self.min_width = Some(width);
        self.min_height = Some(height);
        self
    }

    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.resolution = Some(format!("{width}x{height}"));
        self
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    Minutes,
    #[default]
    Hours,
    Days,
}

impl IntervalUnit {
    pub fn factor_ms(&self) -> u64 {
        match self {
            Self::Minutes => 60_000,
            Self::Hours => 3_600_000,
            Self::Days => 86_400_000,
        }
    }
}

impl std::str::FromStr for IntervalUnit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "minutes" | "minute" | "m" => Ok(Self::Minutes),
            "hours" | "hour" | "h" => Ok(Self::Hours),
            "days" | "day" | "d" => Ok(Self::Days),
            other => Err(format!("unknown interval unit: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ResolutionTier {
    #[serde(rename = "1080p")]
    FullHd,
    #[serde(rename = "2k")]
    Qhd,
    #[serde(rename = "4k")]
    Uhd,
    #[default]
    #[serde(rename = "auto")]
    Auto,
}

impl ResolutionTier {
    /// Minimum size a rotation candidate must have.
    pub fn floor(&self) -> (u32, u32) {
        match self {
            Self::FullHd | Self::Auto => (1920, 1080),
            Self::Qhd => (2560, 1440),
            Self::Uhd => (3840, 2160),
        }
    }
}

impl std::str::FromStr for ResolutionTier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1080p" => Ok(Self::FullHd),
            "2k" => Ok(Self::Qhd),
            "4k" => Ok(Self::Uhd),
            "auto" => Ok(Self::Auto),
            other => Err(format!("unknown resolution tier: {other}")),
        }
    }
}

fn default_interval_value() -> u64 {
    1
}

/// Persisted auto-rotation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AutoChangeConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Derived from `interval_value` and `interval_unit`, in milliseconds.
    #[serde(default)]
    pub interval: u64,
    #[serde(default)]
    pub interval_unit: IntervalUnit,
    #[serde(default = "default_interval_value")]
    pub interval_value: u64,
    #[serde(default)]
    pub resolution: ResolutionTier,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl Default for AutoChangeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: 3_600_000,
            interval_unit: IntervalUnit::Hours,
            interval_value: 1,
            resolution: ResolutionTier::Auto,
            categories: Vec::new(),
        }
    }
}

impl AutoChangeConfig {
    /// Interval in ms for the user-facing value/unit pair. A zero value
    /// counts as one.
    pub fn compute_interval(&self) -> u64 {
        self.interval_value
            .max(1)
            .saturating_mul(self.interval_unit.factor_ms())
    }

    /// Form written on save: interval recomputed, value at least one.
    pub fn normalized(mut self) -> Self {
        self.interval_value = self.interval_value.max(1);
        self.interval = self.compute_interval();
        self
    }

    /// Records written before `interval` existed carry 0 or nothing.
    pub fn with_backfilled_interval(mut self) -> Self {
        if self.interval == 0 {
            self.interval = self.compute_interval();
        }
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RotationStatus {
    pub enabled: bool,
    pub last_change_time: Option<i64>,
    pub last_wallpaper: Option<WallpaperItem>,
    pub next_change_in: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiKeyStatus {
    pub unsplash: bool,
    pub pexels: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_serializes_camel_case() {
        let item = WallpaperItem {
            id: "wallhaven_abc".into(),
            url: "https://example.com/l.jpg".into(),
            thumbnail_url: "https://example.com/s.jpg".into(),
            download_url: "https://example.com/full.jpg".into(),
            author: "someone".into(),
            author_url: "https://wallhaven.cc/user/someone".into(),
            description: "general".into(),
            width: 3840,
            height: 2160,
            source: Source::Wallhaven,
            color: None,
        };
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains(r#""thumbnailUrl":"https://example.com/s.jpg""#));
        assert!(json.contains(r#""downloadUrl""#));
        assert!(json.contains(r#""source":"wallhaven""#));
        assert!(!json.contains("color"));
    }

    #[test]
    fn test_item_tolerates_missing_optional_text() {
        let json = r##"{
            "id": "picsum_1",
            "url": "u",
            "thumbnailUrl": "t",
            "downloadUrl": "d",
            "width": 100,
            "height": 50,
            "source": "picsum",
            "color": "#112233"
        }"##;
        let item: WallpaperItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.author, "");
        assert_eq!(item.color.as_deref(), Some("#112233"));
    }

    #[test]
    fn test_source_from_str() {
        assert_eq!("Wallhaven".parse::<Source>(), Ok(Source::Wallhaven));
        assert_eq!("bing".parse::<Source>(), Ok(Source::Bing));
        assert!("flickr".parse::<Source>().is_err());
    }

    #[test]
    fn test_search_options_defaults() {
        let opts = SearchOptions::default();
        assert_eq!(opts.page(), 1);
        assert_eq!(opts.per_page(), DEFAULT_PER_PAGE);
        assert_eq!(opts.orientation(), Orientation::Landscape);
        assert_eq!(opts.query(), None);
        assert_eq!(opts.min_size(), None);

        let opts = SearchOptions::default().with_query("   ").with_page(0);
        assert_eq!(opts.query(), None);
        assert_eq!(opts.page(), 1);
    }

    #[test]
    fn test_search_options_sizes() {
        let opts = SearchOptions::default().with_resolution(2560, 1440);
        assert_eq!(opts.exact_size(), Some((2560, 1440)));

        let opts = SearchOptions {
            min_width: Some(1920),
            ..Default::default()
        };
        assert_eq!(opts.min_size(), None);
        assert_eq!(
            opts.with_min_size(1920, 1080).min_size(),
            Some((1920, 1080))
        );
    }

    #[test]
    fn test_interval_derivation() {
        for value in [1u64, 2, 7, 90] {
            for (unit, factor) in [
                (IntervalUnit::Minutes, 60_000u64),
                (IntervalUnit::Hours, 3_600_000),
                (IntervalUnit::Days, 86_400_000),
            ] {
                let config = AutoChangeConfig {
                    interval: 0,
                    interval_unit: unit,
                    interval_value: value,
                    ..Default::default()
                }
                .normalized();
                assert_eq!(config.interval, value * factor);
            }
        }
    }

    #[test]
    fn test_config_zero_value_counts_as_one() {
        let config = AutoChangeConfig {
            interval_value: 0,
            interval_unit: IntervalUnit::Minutes,
            ..Default::default()
        }
        .normalized();
        assert_eq!(config.interval_value, 1);
        assert_eq!(config.interval, 60_000);
    }

    #[test]
    fn test_legacy_config_backfill() {
        let json = r#"{"enabled":true,"intervalUnit":"days","intervalValue":2,"resolution":"4k","categories":["space"]}"#;
        let config: AutoChangeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.interval, 0);
        let config = config.with_backfilled_interval();
        assert_eq!(config.interval, 2 * 86_400_000);
        assert_eq!(config.resolution, ResolutionTier::Uhd);
        assert_eq!(config.resolution.floor(), (3840, 2160));
    }

    #[test]
    fn test_config_json_shape() {
        let json = serde_json::to_string(&AutoChangeConfig::default()).unwrap();
        assert_eq!(
            json,
            r#"{"enabled":false,"interval":3600000,"intervalUnit":"hours","intervalValue":1,"resolution":"auto","categories":[]}"#
        );
    }

    #[test]
    fn test_resolution_tier_floors() {
        assert_eq!(ResolutionTier::FullHd.floor(), (1920, 1080));
        assert_eq!(ResolutionTier::Qhd.floor(), (2560, 1440));
        assert_eq!(ResolutionTier::Auto.floor(), (1920, 1080));
        assert_eq!("2K".parse::<ResolutionTier>(), Ok(ResolutionTier::Qhd));
    }
}
