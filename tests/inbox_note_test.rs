use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn inbox_cmd(root: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("tg-inbox");
    cmd.current_dir(root)
        .env("OUT_FILE", root.join("inbox.md"))
        .env("INBOX_CONFIG_PATH", root.join("absent.toml"))
        .env("INBOX_TIMEZONE", "UTC")
        .env_remove("ALLOWED_USER_ID");
    cmd
}

fn monthly_logs(root: &Path) -> Vec<String> {
    let mut names = fs::read_dir(root)
        .expect("read root")
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with("inbox_") && n.ends_with(".md"))
        .collect::<Vec<_>>();
    names.sort();
    names
}

#[test]
fn note_appends_header_and_entry() {
    let tmp = tempdir().expect("tempdir");

    inbox_cmd(tmp.path())
        .args(["note", "first", "thought"])
        .assert()
        .success()
        .stdout(predicate::str::contains("note: ok"));
    inbox_cmd(tmp.path())
        .args(["note", "second"])
        .assert()
        .success();

    let logs = monthly_logs(tmp.path());
    assert_eq!(logs.len(), 1);
    let content = fs::read_to_string(tmp.path().join(&logs[0])).expect("read log");
    // Both notes were written within seconds of each other; a date change between
    // them is the only way a second header could appear.
    let headers = content.lines().filter(|l| l.starts_with("## [")).count();
    assert!(headers == 1 || headers == 2, "unexpected headers in {content}");
    assert!(content.starts_with("\n## ["));
    assert!(content.contains(" UTC] first thought\n"));
    assert!(content.ends_with(" UTC] second\n"));
}

#[test]
fn ls_and_read_show_the_log() {
    let tmp = tempdir().expect("tempdir");

    inbox_cmd(tmp.path())
        .args(["ls"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ls: ok"));

    inbox_cmd(tmp.path())
        .args(["note", "hello"])
        .assert()
        .success();
    let logs = monthly_logs(tmp.path());

    inbox_cmd(tmp.path())
        .args(["ls"])
        .assert()
        .success()
        .stdout(predicate::str::contains(logs[0].as_str()));

    inbox_cmd(tmp.path())
        .args(["read"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("## ["))
        .stdout(predicate::str::contains("UTC] hello"));
}

#[test]
fn read_missing_file_fails() {
    let tmp = tempdir().expect("tempdir");
    inbox_cmd(tmp.path())
        .args(["read", "../../etc/passwd"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("file does not exist"));
}
