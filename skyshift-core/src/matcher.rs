//! Ranking of catalog items against a screen resolution.

use std::cmp::{Ordering, Reverse};

use serde::Serialize;

use crate::models::WallpaperItem;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct StandardResolution {
    pub label: &'static str,
    pub value: &'static str,
    pub width: u32,
    pub height: u32,
}

const fn res(label: &'static str, value: &'static str, width: u32, height: u32) -> StandardResolution {
    StandardResolution {
        label,
        value,
        width,
        height,
    }
}

/// Table order decides ties in [`best_standard_match`]; do not reorder.
pub const STANDARD_RESOLUTIONS: &[StandardResolution] = &[
    res("4K UHD (3840×2160)", "3840x2160", 3840, 2160),
    res("2K QHD (2560×1440)", "2560x1440", 2560, 1440),
    res("Full HD (1920×1080)", "1920x1080", 1920, 1080),
    res("HD+ (1600×900)", "1600x900", 1600, 900),
    res("HD (1366×768)", "1366x768", 1366, 768),
    res("WXGA+ (1440×900)", "1440x900", 1440, 900),
    res("WUXGA (1920×1200)", "1920x1200", 1920, 1200),
    res("Ultrawide (2560×1080)", "2560x1080", 2560, 1080),
    res("Ultrawide (3440×1440)", "3440x1440", 3440, 1440),
    res("5K (5120×2880)", "5120x2880", 5120, 2880),
];

/// Closest standard resolution by summed per-axis distance. The first
/// entry wins a tie.
pub fn best_standard_match(screen_w: u32, screen_h: u32) -> StandardResolution {
    let mut best = STANDARD_RESOLUTIONS[2];
    let mut min_diff = u64::MAX;
    for candidate in STANDARD_RESOLUTIONS {
        let diff = u64::from(candidate.width.abs_diff(screen_w))
            + u64::from(candidate.height.abs_diff(screen_h));
        if diff < min_diff {
            min_diff = diff;
            best = *candidate;
        }
    }
    best
}

/// Fitness of an image for a screen.
///
/// `fits` is false when the image is smaller than the screen on either
/// axis. Ordering puts every fitting image above every undersized one and
/// compares `value` within a band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitScore {
    pub fits: bool,
    pub value: f64,
}

impl Eq for FitScore {}

impl PartialOrd for FitScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FitScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fits
            .cmp(&other.fits)
            .then_with(|| self.value.total_cmp(&other.value))
    }
}

/// Undersized images score `area ratio * 50`. Images that cover the screen
/// score 60% on aspect ratio closeness and 40% on not being needlessly
/// large (1x to 2x the screen area is ideal).
pub fn score(item_w: u32, item_h: u32, screen_w: u32, screen_h: u32) -> FitScore {
    if screen_w == 0 || screen_h == 0 || item_h == 0 {
        return FitScore {
            fits: false,
            value: 0.0,
        };
    }
    let item_area = f64::from(item_w) * f64::from(item_h);
    let screen_area = f64::from(screen_w) * f64::from(screen_h);

    if item_w < screen_w || item_h < screen_h {
        return FitScore {
            fits: false,
            value: item_area / screen_area * 50.0,
        };
    }

    let screen_ratio = f64::from(screen_w) / f64::from(screen_h);
    let item_ratio = f64::from(item_w) / f64::from(item_h);
    let ratio_score = (100.0 - (screen_ratio - item_ratio).abs() * 100.0).max(0.0);

    let area_ratio = item_area / screen_area;
    let res_score = if area_ratio <= 2.0 {
        100.0
    } else {
        (100.0 - (area_ratio - 2.0) * 25.0).max(0.0)
    };

    FitScore {
        fits: true,
        value: ratio_score * 0.6 + res_score * 0.4,
    }
}

pub fn score_item(item: &WallpaperItem, screen_w: u32, screen_h: u32) -> FitScore {
    score(item.width, item.height, screen_w, screen_h)
}

/// Sort best-first. Stable: equal scores keep their input order.
pub fn rank(mut items: Vec<WallpaperItem>, screen_w: u32, screen_h: u32) -> Vec<WallpaperItem> {
    items.sort_by_cached_key(|item| Reverse(score_item(item, screen_w, screen_h)));
    items
}
