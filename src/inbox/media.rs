use crate::inbox::clock::Stamp;
use crate::inbox::journal::collapse_line_breaks;
use crate::inbox::paths::{InboxPaths, month_tag};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const PHOTO_EXTENSION: &str = "jpg";

#[derive(Debug, Clone)]
pub struct SavedMedia {
    pub path: PathBuf,
    /// Path relative to the output directory, as referenced from the log.
    pub relative: String,
    pub bytes: usize,
}

fn sanitize_unique_id(id: &str) -> String {
    id.trim()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

/// Stable name from the platform's unique file id, or one derived from the capture time.
pub fn media_file_name(unique_id: Option<&str>, stamp: &Stamp, extension: &str) -> String {
    let id = unique_id.map(sanitize_unique_id).unwrap_or_default();
    if id.trim_matches('_').is_empty() {
        format!("photo_{}.{extension}", stamp.local.format("%Y%m%d_%H%M%S"))
    } else {
        format!("{id}.{extension}")
    }
}

pub fn save_media(
    paths: &InboxPaths,
    stamp: &Stamp,
    unique_id: Option<&str>,
    bytes: &[u8],
) -> Result<SavedMedia> {
    let dir = paths.monthly_media_dir(&stamp.local);
    fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let file_name = media_file_name(unique_id, stamp, PHOTO_EXTENSION);
    let path = dir.join(&file_name);
    fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;

    Ok(SavedMedia {
        relative: format!("media/{}/{file_name}", month_tag(&stamp.local)),
        path,
        bytes: bytes.len(),
    })
}

/// Journal note referencing a saved photo, with the caption appended.
pub fn media_note(saved: &SavedMedia, caption: Option<&str>) -> String {
    let link = format!("![photo]({})", saved.relative);
    match caption.map(collapse_line_breaks).filter(|c| !c.is_empty()) {
        Some(caption) => format!("{link} {caption}"),
        None => link,
    }
}

/// Find a media file by name, searching the current month first and then every month.
pub fn find_media_file(paths: &InboxPaths, stamp: &Stamp, name: &str) -> Option<PathBuf> {
    let current = paths.monthly_media_dir(&stamp.local).join(name);
    if current.is_file() {
        return Some(current);
    }
    let mut months = fs::read_dir(&paths.media_root)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect::<Vec<_>>();
    // Newest month first; directories that are not `<year>.<month>` come last.
    months.sort_by_key(|dir| std::cmp::Reverse(month_dir_key(dir)));
    months
        .into_iter()
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

fn month_dir_key(dir: &Path) -> Option<(i32, u32)> {
    let (year, month) = dir.file_name()?.to_str()?.split_once('.')?;
    Some((year.parse().ok()?, month.parse().ok()?))
}

/// Delete the whole media tree. Returns false when there was nothing to delete.
pub fn remove_media_tree(media_root: &Path) -> Result<bool> {
    if !media_root.exists() {
        return Ok(false);
    }
    fs::remove_dir_all(media_root)
        .with_context(|| format!("failed to remove {}", media_root.display()))?;
    Ok(true)
}
