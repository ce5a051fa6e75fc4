use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{info, warn};

use crate::error::Result;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "webp"];

/// Keep the `max_count` newest images in `dir` (by mtime) and delete the
/// rest. `active` is never deleted even when it falls outside the window.
/// Files that are not images are left alone. Returns how many were removed.
pub fn prune_wallpapers(dir: &Path, max_count: usize, active: Option<&Path>) -> Result<usize> {
    let mut entries: Vec<(PathBuf, SystemTime)> = Vec::new();

    let read_dir = match std::fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };
    for entry in read_dir.flatten() {
        let path = entry.path();
        if !is_image(&path) {
            continue;
        }
        if let Ok(meta) = entry.metadata() {
            if meta.is_file() {
                let modified = meta.modified().unwrap_or(std::time::UNIX_EPOCH);
                entries.push((path, modified));
            }
        }
    }

    if entries.len() <= max_count {
        return Ok(0);
    }

    // newest first; name breaks mtime ties so the order is deterministic
    entries.sort_by(|(a_path, a_time), (b_path, b_time)| {
        b_time.cmp(a_time).then_with(|| b_path.cmp(a_path))
    });

    let mut removed = 0;
    for (path, _) in entries.into_iter().skip(max_count) {
        if active.is_some_and(|a| a == path) {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => warn!(path = %path.display(), "failed to remove old wallpaper: {e}"),
        }
    }

    if removed > 0 {
        info!(removed, kept = max_count, "old wallpapers pruned");
    }
    Ok(removed)
}

pub(crate) fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}
