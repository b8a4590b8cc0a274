use crate::error::InboxError;
use crate::inbox::paths::InboxPaths;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub const EMPTY_MARKER: &str = "(empty)";

/// Monthly log names in the output directory, oldest month first.
pub fn list_logs(paths: &InboxPaths) -> Result<Vec<String>> {
    if !paths.out_dir.exists() {
        return Ok(Vec::new());
    }
    let read_dir = fs::read_dir(&paths.out_dir)
        .with_context(|| format!("failed to read {}", paths.out_dir.display()))?;

    let mut names = Vec::new();
    for entry in read_dir {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(ToOwned::to_owned) else {
            continue;
        };
        if paths.is_monthly_log_name(&name) {
            names.push(name);
        }
    }

    // Chronological for parseable names; anything else trails alphabetically.
    names.sort_by(|a, b| {
        let ka = paths.monthly_log_key(a);
        let kb = paths.monthly_log_key(b);
        match (ka, kb) {
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    });
    Ok(names)
}

/// Trimmed file contents, or [`EMPTY_MARKER`] when there is nothing to show.
pub fn read_text(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(InboxError::NotFound(path.display().to_string()).into());
    }
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let text = String::from_utf8_lossy(&raw);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(EMPTY_MARKER.to_string());
    }
    Ok(trimmed.to_string())
}

/// Split on character boundaries into chunks of at most `max_chars` characters.
pub fn split_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0usize;
    for ch in text.chars() {
        if count == max_chars {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
        current.push(ch);
        count += 1;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
