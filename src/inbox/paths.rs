use chrono::{Datelike, NaiveDateTime};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct InboxPaths {
    pub out_dir: PathBuf,
    pub base_name: String,
    pub media_root: PathBuf,
    pub tmp_dir: PathBuf,
    pub logs_dir: PathBuf,
}

/// `<year>.<month>` without zero padding, shared by log files, media dirs and archives.
pub fn month_tag(at: &NaiveDateTime) -> String {
    format!("{}.{}", at.year(), at.month())
}

pub fn resolve_paths(out_file: &Path) -> InboxPaths {
    let out_dir = match out_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let base_name = out_file
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("inbox")
        .to_string();

    InboxPaths {
        media_root: out_dir.join("media"),
        tmp_dir: out_dir.join("tmp"),
        logs_dir: out_dir.join("logs"),
        out_dir,
        base_name,
    }
}

impl InboxPaths {
    pub fn monthly_log_name(&self, at: &NaiveDateTime) -> String {
        format!("{}_{}.md", self.base_name, month_tag(at))
    }

    pub fn monthly_log(&self, at: &NaiveDateTime) -> PathBuf {
        self.out_dir.join(self.monthly_log_name(at))
    }

    pub fn monthly_media_dir(&self, at: &NaiveDateTime) -> PathBuf {
        self.media_root.join(month_tag(at))
    }

    pub fn media_archive_name(&self, at: &NaiveDateTime) -> String {
        format!("media_{}.zip", month_tag(at))
    }

    pub fn serve_lock(&self) -> PathBuf {
        self.tmp_dir.join("serve.lock")
    }

    /// Resolve a user-supplied file name inside the output directory.
    ///
    /// Only the last path component is honored, so `../../etc/passwd` becomes
    /// `<out_dir>/passwd`. Returns `None` when nothing usable remains.
    pub fn user_file(&self, arg: &str) -> Option<PathBuf> {
        let name = sanitize_file_name(arg)?;
        Some(self.out_dir.join(name))
    }

    /// Like [`InboxPaths::user_file`], falling back to the current month's log.
    pub fn user_file_or_current(&self, arg: Option<&str>, at: &NaiveDateTime) -> Option<PathBuf> {
        match arg {
            Some(arg) => self.user_file(arg),
            None => Some(self.monthly_log(at)),
        }
    }

    pub fn is_monthly_log_name(&self, name: &str) -> bool {
        name.starts_with(&format!("{}_", self.base_name)) && name.ends_with(".md")
    }

    /// `(year, month)` encoded in a monthly log name, if it has the expected shape.
    pub fn monthly_log_key(&self, name: &str) -> Option<(i32, u32)> {
        let rest = name
            .strip_prefix(&format!("{}_", self.base_name))?
            .strip_suffix(".md")?;
        let (year, month) = rest.split_once('.')?;
        let year = year.parse::<i32>().ok()?;
        let month = month.parse::<u32>().ok()?;
        (1..=12).contains(&month).then_some((year, month))
    }
}

/// Last component of `arg`, splitting on both separators.
pub fn sanitize_file_name(arg: &str) -> Option<&str> {
    let name = arg.trim().rsplit(['/', '\\']).next()?.trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name)
}
