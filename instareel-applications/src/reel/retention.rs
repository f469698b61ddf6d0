//! Retention sweep for generated reels

use crate::ApplicationResult;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

/// Delete `reel_*.mp4` files in `output_dir` at least `max_age` old.
///
/// Returns how many files were removed. Other files are never touched.
pub async fn sweep_expired_reels(output_dir: &Path, max_age: Duration) -> ApplicationResult<usize> {
    let mut entries = match tokio::fs::read_dir(output_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let now = SystemTime::now();
    let mut removed = 0;

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !(name.starts_with("reel_") && name.ends_with(".mp4")) {
            continue;
        }

        let modified = match entry.metadata().await.and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                warn!(file = %name, error = %e, "Skipping reel with unreadable metadata");
                continue;
            }
        };
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age < max_age {
            continue;
        }

        match tokio::fs::remove_file(entry.path()).await {
            Ok(()) => removed += 1,
            Err(e) => warn!(file = %name, error = %e, "Failed to delete expired reel"),
        }
    }

    if removed > 0 {
        info!(removed, dir = %output_dir.display(), "Swept expired reels");
    }
    Ok(removed)
}
