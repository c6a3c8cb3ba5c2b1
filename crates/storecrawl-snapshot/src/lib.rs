//! Per-storefront snapshot files.
//!
//! Each run replaces a store's current JSON array atomically from the
//! reader's point of view: the previous file is moved into the archive
//! directory first (named with a timestamp taken from the replaced file),
//! then the new list is written under the store slug. Nothing is ever
//! deleted, and an empty run leaves the previous snapshot in place.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use storecrawl_core::ProductRecord;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {count} records for {store}: {source}")]
    Serialize {
        store: String,
        count: usize,
        #[source]
        source: serde_json::Error,
    },
}

fn io_err(path: &Path, source: std::io::Error) -> SnapshotError {
    SnapshotError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Writes a storefront's record list as its current snapshot.
///
/// Returns `Ok(None)` without touching the filesystem when `records` is
/// empty — a failed run must never clobber a valid previous snapshot with
/// nothing. Otherwise the previous file (if any) is archived and the new
/// list written; the path of the new file is returned.
///
/// Callers treat `Err` as log-and-continue: a persistence failure for one
/// store is not fatal to the process.
///
/// # Errors
///
/// [`SnapshotError::Io`] on any filesystem failure,
/// [`SnapshotError::Serialize`] if the records cannot be encoded.
pub fn persist_snapshot(
    output_dir: &Path,
    archive_dir: &Path,
    store_slug: &str,
    records: &[ProductRecord],
) -> Result<Option<PathBuf>, SnapshotError> {
    if records.is_empty() {
        tracing::info!(
            store = %store_slug,
            "no records collected — keeping previous snapshot untouched"
        );
        return Ok(None);
    }

    fs::create_dir_all(output_dir).map_err(|e| io_err(output_dir, e))?;
    let current = output_dir.join(format!("{store_slug}.json"));

    if current.exists() {
        let archived = archive_previous(&current, archive_dir, store_slug)?;
        tracing::info!(
            store = %store_slug,
            archived = %archived.display(),
            "previous snapshot archived"
        );
    }

    let json = serde_json::to_vec_pretty(records).map_err(|e| SnapshotError::Serialize {
        store: store_slug.to_owned(),
        count: records.len(),
        source: e,
    })?;
    fs::write(&current, json).map_err(|e| io_err(&current, e))?;

    tracing::info!(
        store = %store_slug,
        records = records.len(),
        path = %current.display(),
        "snapshot written"
    );
    Ok(Some(current))
}

/// Moves the current snapshot into the archive directory under a
/// `_<YYYYMMDD_HHMMSS>` suffix derived from the replaced file's creation
/// time. A numeric suffix is added if two archives land on the same second.
fn archive_previous(
    current: &Path,
    archive_dir: &Path,
    store_slug: &str,
) -> Result<PathBuf, SnapshotError> {
    fs::create_dir_all(archive_dir).map_err(|e| io_err(archive_dir, e))?;

    let stamp = archive_stamp(current);
    let mut target = archive_dir.join(format!("{store_slug}_{stamp}.json"));
    let mut counter = 1u32;
    while target.exists() {
        target = archive_dir.join(format!("{store_slug}_{stamp}_{counter}.json"));
        counter += 1;
    }

    fs::rename(current, &target).map_err(|e| io_err(current, e))?;
    Ok(target)
}

/// Timestamp for the archive name, from the file's creation time where the
/// platform records one, its mtime otherwise, and the wall clock as a last
/// resort.
fn archive_stamp(path: &Path) -> String {
    let file_time = fs::metadata(path)
        .ok()
        .and_then(|m| m.created().or_else(|_| m.modified()).ok());
    let stamp: DateTime<Local> = file_time.map_or_else(Local::now, DateTime::from);
    stamp.format("%Y%m%d_%H%M%S").to_string()
}
