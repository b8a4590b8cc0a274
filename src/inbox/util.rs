use anyhow::Result;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn now_epoch_secs() -> Result<u64> {
    let since_epoch = SystemTime::now().duration_since(UNIX_EPOCH)?;
    Ok(since_epoch.as_secs())
}

/// Single-line log preview of a note: control characters dropped, at most
/// `limit` chars, `…` marking a cut.
pub fn truncate_with_ellipsis(note: &str, limit: usize) -> String {
    let mut chars = note.chars().filter(|ch| !ch.is_control());
    let mut preview: String = chars.by_ref().take(limit).collect();
    if chars.next().is_some() {
        preview.push('…');
    }
    preview
}
