use anyhow::Result;
use std::env;

use crate::commands::CommandReport;
use crate::inbox::config::{load_config, require_bot_token};

include!(concat!(env!("OUT_DIR"), "/env_key_allowlist.rs"));

const ENV_PREFIX: &str = "INBOX_";

fn unknown_env_keys(keys: impl Iterator<Item = String>) -> Vec<String> {
    let mut out = keys
        .filter(|key| key.starts_with(ENV_PREFIX))
        .filter(|key| !ENV_KEY_ALLOWLIST.contains(&key.as_str()))
        .collect::<Vec<_>>();
    out.sort();
    out
}

pub fn run() -> Result<CommandReport> {
    let cfg = load_config()?;
    let mut report = CommandReport::new("status");

    report.detail(format!("build={}", env!("BUILD_UUID")));
    report.detail(format!("out_file={}", cfg.out_file.display()));
    report.detail(format!("out_dir={}", cfg.paths.out_dir.display()));
    report.detail(format!("media_root={}", cfg.paths.media_root.display()));
    report.detail(format!("tmp_dir={}", cfg.paths.tmp_dir.display()));
    report.detail(format!("timezone={}", cfg.zone.describe()));
    report.detail(format!("session_gap_hours={}", cfg.session_gap_hours));
    report.detail(format!("read_chunk_chars={}", cfg.read_chunk_chars));
    match cfg.allowed_user_id {
        Some(id) => report.detail(format!("allowed_user_id={id}")),
        None if cfg.deny_when_unset => {
            report.detail("allowed_user_id=unset (deny-all until configured)")
        }
        None => report.detail("allowed_user_id=unset (warning: every sender is accepted)"),
    }

    let now = cfg.zone.now();
    let current = cfg.paths.monthly_log(&now.local);
    report.detail(format!(
        "current_log={} exists={}",
        current.display(),
        current.is_file()
    ));

    if require_bot_token(&|var: &str| env::var(var).ok()).is_err() {
        report.issue("BOT_TOKEN is not set; `serve` will refuse to start");
    }
    for key in unknown_env_keys(env::vars().map(|(k, _)| k)) {
        report.issue(format!("unknown env var {key} (typo?)"));
    }

    Ok(report)
}
