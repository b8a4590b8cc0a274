use anyhow::{Context, Result, anyhow};
use fs2::FileExt;
use std::env;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

use crate::inbox::config::{load_config, require_bot_token};
use crate::inbox::dispatch::CommandDispatcher;
use crate::telegram::gateway;

/// Exclusive lock held for the lifetime of the poller; released when dropped.
fn acquire_serve_lock(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    file.try_lock_exclusive().map_err(|_| {
        anyhow!(
            "another serve process holds {}; refusing to poll twice",
            path.display()
        )
    })?;
    file.set_len(0)?;
    writeln!(file, "{}", std::process::id())?;
    Ok(file)
}

pub fn run() -> Result<()> {
    let token = require_bot_token(&|var: &str| env::var(var).ok())?;
    let cfg = load_config()?;

    if cfg.is_fail_open() {
        warn!("ALLOWED_USER_ID is unset: every sender is accepted; send /id and configure it");
    }
    info!(
        out_file = %cfg.out_file.display(),
        timezone = %cfg.zone.describe(),
        "starting inbox bot"
    );

    let lock = acquire_serve_lock(&cfg.paths.serve_lock())?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let outcome = runtime.block_on(gateway::run(CommandDispatcher::new(cfg), token));

    let _ = FileExt::unlock(&lock);
    outcome
}
