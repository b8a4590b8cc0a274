use crate::error::InboxError;
use crate::inbox::clock::Zone;
use crate::inbox::paths::{InboxPaths, resolve_paths};
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_OUT_FILE: &str = "/opt/telegram-inbox/inbox.md";
pub const DEFAULT_SESSION_GAP_HOURS: i64 = 12;
pub const MAX_SESSION_GAP_HOURS: i64 = 24 * 366;
pub const DEFAULT_READ_CHUNK_CHARS: usize = 3800;
const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

#[derive(Debug, Clone)]
pub struct InboxConfig {
    pub out_file: PathBuf,
    pub allowed_user_id: Option<u64>,
    pub deny_when_unset: bool,
    pub session_gap_hours: i64,
    pub read_chunk_chars: usize,
    pub zone: Zone,
    pub paths: InboxPaths,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct FileConfig {
    out_file: Option<String>,
    allowed_user_id: Option<u64>,
    deny_when_unset: Option<bool>,
    session_gap_hours: Option<i64>,
    read_chunk_chars: Option<usize>,
    timezone: Option<String>,
}

/// Environment lookup, swapped out in tests.
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn non_blank(env: EnvLookup<'_>, var: &str) -> Option<String> {
    env(var)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or_string(env: EnvLookup<'_>, var: &str, fallback: &str) -> String {
    non_blank(env, var).unwrap_or_else(|| fallback.to_string())
}

fn env_or_bool(env: EnvLookup<'_>, var: &str, fallback: bool) -> bool {
    match non_blank(env, var).as_deref() {
        Some("1" | "true" | "TRUE" | "yes" | "on") => true,
        Some("0" | "false" | "FALSE" | "no" | "off") => false,
        _ => fallback,
    }
}

fn env_or_i64(env: EnvLookup<'_>, var: &str, fallback: i64) -> i64 {
    non_blank(env, var)
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(fallback)
}

fn env_or_usize(env: EnvLookup<'_>, var: &str, fallback: usize) -> usize {
    non_blank(env, var)
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(fallback)
}

fn env_allowed_user_id(env: EnvLookup<'_>, fallback: Option<u64>) -> Result<Option<u64>> {
    match non_blank(env, "ALLOWED_USER_ID") {
        None => Ok(fallback),
        Some(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|_| anyhow!("invalid ALLOWED_USER_ID `{raw}`: expected a numeric user id")),
    }
}

fn validate(cfg: &InboxConfig) -> Result<()> {
    if cfg.out_file.as_os_str().is_empty() {
        return Err(anyhow!("invalid out file: cannot be empty"));
    }
    if !(1..=MAX_SESSION_GAP_HOURS).contains(&cfg.session_gap_hours) {
        return Err(anyhow!(
            "invalid session gap: require 1 <= hours <= {MAX_SESSION_GAP_HOURS}"
        ));
    }
    if cfg.read_chunk_chars == 0 || cfg.read_chunk_chars > TELEGRAM_MESSAGE_LIMIT {
        return Err(anyhow!(
            "invalid read chunk size: require 1 <= chunk <= {TELEGRAM_MESSAGE_LIMIT}"
        ));
    }
    Ok(())
}

/// `TZ` may hold a POSIX rule such as `CST-8`; only IANA names select a named zone.
fn zone_from_tz(tz: Option<&str>) -> Zone {
    match Zone::parse(tz) {
        Ok(zone) => zone,
        Err(err) => {
            warn!(error = %err, "TZ is not an IANA zone name, using the system local zone");
            Zone::System
        }
    }
}

fn resolve_config_path(env: EnvLookup<'_>) -> Option<PathBuf> {
    if let Some(custom) = non_blank(env, "INBOX_CONFIG_PATH") {
        return Some(PathBuf::from(custom));
    }
    let config_dir = dirs::config_dir()?;
    Some(config_dir.join("tg-inbox").join("config.toml"))
}

fn read_file_config(path: Option<&Path>) -> Result<FileConfig> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let raw = fs::read_to_string(path)
        .map_err(|err| InboxError::InvalidConfig(format!("{}: {err}", path.display())))?;
    let parsed: FileConfig = toml::from_str(&raw)
        .map_err(|err| InboxError::InvalidConfig(format!("{}: {err}", path.display())))?;
    Ok(parsed)
}

pub fn load_config() -> Result<InboxConfig> {
    let lookup = |var: &str| env::var(var).ok();
    load_config_with(&lookup)
}

pub fn load_config_with(env: EnvLookup<'_>) -> Result<InboxConfig> {
    let file_path = resolve_config_path(env);
    let file = read_file_config(file_path.as_deref())?;

    let out_file = env_or_string(
        env,
        "OUT_FILE",
        file.out_file.as_deref().unwrap_or(DEFAULT_OUT_FILE),
    );
    let allowed_user_id = env_allowed_user_id(env, file.allowed_user_id)?;
    let deny_when_unset = env_or_bool(
        env,
        "INBOX_DENY_WHEN_UNSET",
        file.deny_when_unset.unwrap_or(false),
    );
    let session_gap_hours = env_or_i64(
        env,
        "INBOX_SESSION_GAP_HOURS",
        file.session_gap_hours.unwrap_or(DEFAULT_SESSION_GAP_HOURS),
    );
    let read_chunk_chars = env_or_usize(
        env,
        "INBOX_READ_CHUNK_CHARS",
        file.read_chunk_chars.unwrap_or(DEFAULT_READ_CHUNK_CHARS),
    );
    let zone = match non_blank(env, "INBOX_TIMEZONE").or(file.timezone) {
        Some(name) => Zone::parse(Some(name.as_str()))?,
        None => zone_from_tz(non_blank(env, "TZ").as_deref()),
    };

    let out_file = PathBuf::from(out_file);
    let cfg = InboxConfig {
        paths: resolve_paths(&out_file),
        out_file,
        allowed_user_id,
        deny_when_unset,
        session_gap_hours,
        read_chunk_chars,
        zone,
    };
    validate(&cfg)?;
    Ok(cfg)
}

/// Token for the messaging gateway. Only `serve` needs it, and it is fatal there.
pub fn require_bot_token(env: EnvLookup<'_>) -> Result<String, InboxError> {
    non_blank(env, "BOT_TOKEN")
        .or_else(|| non_blank(env, "TELOXIDE_TOKEN"))
        .ok_or(InboxError::MissingToken)
}

impl InboxConfig {
    /// Whether `sender` may use gated commands and have messages recorded.
    pub fn is_allowed(&self, sender: Option<u64>) -> bool {
        match self.allowed_user_id {
            Some(allowed) => sender == Some(allowed),
            None => !self.deny_when_unset,
        }
    }

    pub fn is_fail_open(&self) -> bool {
        self.allowed_user_id.is_none() && !self.deny_when_unset
    }

    /// Config rooted at `out_file` with defaults everywhere else.
    #[cfg(test)]
    pub fn for_out_file(out_file: impl Into<PathBuf>, zone: Zone) -> Self {
        let out_file = out_file.into();
        Self {
            paths: resolve_paths(&out_file),
            out_file,
            allowed_user_id: None,
            deny_when_unset: false,
            session_gap_hours: DEFAULT_SESSION_GAP_HOURS,
            read_chunk_chars: DEFAULT_READ_CHUNK_CHARS,
            zone,
        }
    }
}
