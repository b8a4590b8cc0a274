use anyhow::Result;

use crate::error::InboxError;
use crate::inbox::catalog::read_text;
use crate::inbox::config::load_config;

/// Contents of a log in the output dir; the current month's when `name` is absent.
pub fn run(name: Option<&str>) -> Result<String> {
    let cfg = load_config()?;
    let now = cfg.zone.now();
    let path = cfg
        .paths
        .user_file_or_current(name, &now.local)
        .ok_or_else(|| InboxError::Usage("read [NAME]".to_string()))?;
    read_text(&path)
}
