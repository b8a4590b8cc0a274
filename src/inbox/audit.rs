use crate::inbox::paths::InboxPaths;
use crate::inbox::util::now_epoch_secs;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::io::Write;

#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub at_epoch_secs: u64,
    pub action: String,
    pub status: String,
    pub message: String,
}

pub fn append_event(paths: &InboxPaths, action: &str, status: &str, message: &str) -> Result<()> {
    fs::create_dir_all(&paths.logs_dir)
        .with_context(|| format!("failed to create {}", paths.logs_dir.display()))?;
    let event = AuditEvent {
        at_epoch_secs: now_epoch_secs()?,
        action: action.to_string(),
        status: status.to_string(),
        message: message.to_string(),
    };

    let line = format!("{}\n", serde_json::to_string(&event)?);
    let path = paths.logs_dir.join("audit.log");
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

/// Like [`append_event`], but a failure is only logged.
pub fn record(paths: &InboxPaths, action: &str, status: &str, message: &str) {
    if let Err(err) = append_event(paths, action, status, message) {
        tracing::warn!(action, error = %err, "audit write failed");
    }
}
