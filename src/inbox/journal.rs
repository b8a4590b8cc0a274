use crate::inbox::clock::Stamp;
use crate::inbox::paths::InboxPaths;
use crate::inbox::session::{find_last_header, header_line, should_start_new_section};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AppendOutcome {
    pub path: PathBuf,
    pub new_section: bool,
    pub bytes: usize,
}

/// Notes are single-line: every line break becomes a space.
pub fn collapse_line_breaks(text: &str) -> String {
    text.replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .trim()
        .to_string()
}

pub fn entry_line(stamp: &Stamp, note: &str) -> String {
    let at = stamp.local.format("%Y-%m-%d %H:%M:%S");
    if stamp.zone_label.is_empty() {
        format!("- [{at}] {note}\n")
    } else {
        format!("- [{at} {}] {note}\n", stamp.zone_label)
    }
}

/// Text appended for one note, plus whether it opens a new section.
pub fn render_block(
    stamp: &Stamp,
    note: &str,
    last_header: Option<&NaiveDateTime>,
    gap_hours: i64,
) -> (String, bool) {
    let note = collapse_line_breaks(note);
    let new_section = should_start_new_section(&stamp.local, last_header, gap_hours);
    let mut block = String::new();
    if new_section {
        block.push('\n');
        block.push_str(&header_line(&stamp.local));
        block.push('\n');
    }
    block.push_str(&entry_line(stamp, &note));
    (block, new_section)
}

pub fn append_note(path: &Path, stamp: &Stamp, note: &str, gap_hours: i64) -> Result<AppendOutcome> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let last_header = find_last_header(path);
    let (block, new_section) = render_block(stamp, note, last_header.as_ref(), gap_hours);

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    file.write_all(block.as_bytes())
        .with_context(|| format!("failed to append to {}", path.display()))?;

    Ok(AppendOutcome {
        path: path.to_path_buf(),
        new_section,
        bytes: block.len(),
    })
}

/// Append to the log of the month `stamp` falls in.
pub fn append_to_month(
    paths: &InboxPaths,
    stamp: &Stamp,
    note: &str,
    gap_hours: i64,
) -> Result<AppendOutcome> {
    append_note(&paths.monthly_log(&stamp.local), stamp, note, gap_hours)
}

#[cfg(test)]
mod tests {
    use super::{append_note, append_to_month, collapse_line_breaks, entry_line};
    use crate::inbox::clock::Stamp;
    use crate::inbox::paths::resolve_paths;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::tempdir;

    fn stamp(d: u32, h: u32, mi: u32, s: u32) -> Stamp {
        let local = NaiveDate::from_ymd_opt(2024, 3, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap();
        Stamp::new(local, "UTC")
    }

    fn header_count(content: &str) -> usize {
        content.lines().filter(|l| l.starts_with("## [")).count()
    }

    #[test]
    fn first_append_writes_header_and_entry() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("inbox_2024.3.md");
        let out = append_note(&path, &stamp(1, 9, 0, 30), "hello\nworld", 12).expect("append");
        assert!(out.new_section);

        let content = fs::read_to_string(&path).expect("read log");
        assert_eq!(
            content,
            "\n## [2024-03-01 09:00]\n- [2024-03-01 09:00:30 UTC] hello world\n"
        );
        assert_eq!(header_count(&content), 1);
    }

    #[test]
    fn appends_in_same_session_share_one_header() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("inbox_2024.3.md");
        for (h, mi) in [(9, 0), (9, 30), (14, 0), (20, 59)] {
            append_note(&path, &stamp(1, h, mi, 0), "note", 12).expect("append");
        }
        let content = fs::read_to_string(&path).expect("read log");
        assert_eq!(header_count(&content), 1);
        assert_eq!(content.lines().filter(|l| l.starts_with("- [")).count(), 4);
    }

    #[test]
    fn gap_over_twelve_hours_same_day_adds_header() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("inbox_2024.3.md");
        append_note(&path, &stamp(1, 9, 0, 0), "morning", 12).expect("append");
        let out = append_note(&path, &stamp(1, 21, 0, 1), "evening", 12).expect("append");
        assert!(out.new_section);

        let content = fs::read_to_string(&path).expect("read log");
        assert_eq!(header_count(&content), 2);
        assert!(content.ends_with("\n## [2024-03-01 21:00]\n- [2024-03-01 21:00:01 UTC] evening\n"));
    }

    #[test]
    fn eleven_hours_after_header_stays_in_section() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("inbox_2024.3.md");
        append_note(&path, &stamp(1, 9, 0, 0), "morning", 12).expect("append");
        let out = append_note(&path, &stamp(1, 20, 0, 1), "evening", 12).expect("append");
        assert!(!out.new_section);

        let content = fs::read_to_string(&path).expect("read log");
        assert_eq!(header_count(&content), 1);
        assert!(content.ends_with("- [2024-03-01 20:00:01 UTC] evening
"));
    }

    #[test]
    fn midnight_crossing_adds_header() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("inbox_2024.3.md");
        append_note(&path, &stamp(1, 23, 59, 0), "late", 12).expect("append");
        append_note(&path, &stamp(2, 0, 1, 0), "early", 12).expect("append");
        let content = fs::read_to_string(&path).expect("read log");
        assert_eq!(header_count(&content), 2);
        assert!(content.contains("## [2024-03-02 00:01]"));
    }

    #[test]
    fn month_file_is_created_with_parent_dir() {
        let tmp = tempdir().expect("tempdir");
        let paths = resolve_paths(&tmp.path().join("nested/inbox.md"));
        let out = append_to_month(&paths, &stamp(5, 10, 0, 0), "x", 12).expect("append");
        assert_eq!(out.path, tmp.path().join("nested/inbox_2024.3.md"));
        assert!(out.path.is_file());
    }

    #[test]
    fn write_failure_propagates() {
        let tmp = tempdir().expect("tempdir");
        // The target is a directory, so opening it for append fails.
        let path = tmp.path().join("inbox_2024.3.md");
        fs::create_dir_all(&path).expect("mkdir");
        assert!(append_note(&path, &stamp(1, 9, 0, 0), "x", 12).is_err());
    }

    #[test]
    fn line_breaks_collapse() {
        assert_eq!(collapse_line_breaks("a\r\nb\rc\nd\n"), "a b c d");
        assert_eq!(
            entry_line(&Stamp::new(stamp(1, 9, 5, 0).local, ""), "x"),
            "- [2024-03-01 09:05:00] x\n"
        );
    }
}
