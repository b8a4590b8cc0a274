//! Routes inbound chat events to the journal, media store and catalog.
//!
//! The dispatcher never talks to the network. It turns one [`InboundEvent`]
//! into the replies the transport should send back; unauthorized events yield
//! no replies at all.

use crate::error::InboxError;
use crate::inbox::archive::{MediaArchive, build_media_archive};
use crate::inbox::audit;
use crate::inbox::catalog::{EMPTY_MARKER, list_logs, read_text, split_chunks};
use crate::inbox::clock::Stamp;
use crate::inbox::command::{Action, Command, GET_USAGE, GetTarget, HELP_TEXT, REMOVE_USAGE};
use crate::inbox::config::InboxConfig;
use crate::inbox::journal::append_to_month;
use crate::inbox::media::{find_media_file, media_note, remove_media_tree, save_media};
use crate::inbox::paths::sanitize_file_name;
use crate::inbox::util::truncate_with_ellipsis;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct PhotoPayload {
    pub unique_id: Option<String>,
    pub bytes: Vec<u8>,
    pub caption: Option<String>,
}

#[derive(Debug, Clone)]
pub enum InboundEvent {
    Text {
        sender: Option<u64>,
        text: String,
        at: Stamp,
    },
    Photo {
        sender: Option<u64>,
        photo: PhotoPayload,
        at: Stamp,
    },
    Command {
        sender: Option<u64>,
        command: Command,
        at: Stamp,
    },
}

impl InboundEvent {
    pub fn sender(&self) -> Option<u64> {
        match self {
            Self::Text { sender, .. }
            | Self::Photo { sender, .. }
            | Self::Command { sender, .. } => *sender,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Photo { .. } => "photo",
            Self::Command { .. } => "command",
        }
    }
}

#[derive(Debug)]
pub enum Reply {
    Text(String),
    Document { path: PathBuf, file_name: String },
    /// Temp zip; removed once the reply is dropped.
    Archive(MediaArchive),
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

fn failure_reply(err: &anyhow::Error) -> Reply {
    match err.downcast_ref::<InboxError>() {
        Some(inbox_err) => Reply::Text(inbox_err.user_message()),
        None => Reply::Text(format!("failed: {err}")),
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    cfg: InboxConfig,
}

impl CommandDispatcher {
    pub fn new(cfg: InboxConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &InboxConfig {
        &self.cfg
    }

    pub fn is_allowed(&self, sender: Option<u64>) -> bool {
        self.cfg.is_allowed(sender)
    }

    pub fn dispatch(&self, event: InboundEvent) -> Vec<Reply> {
        let sender = event.sender();
        let ungated = matches!(&event, InboundEvent::Command { command, .. } if !command.requires_auth());
        if !ungated && !self.is_allowed(sender) {
            debug!(?sender, kind = event.kind(), "ignoring event from unauthorized sender");
            return Vec::new();
        }

        let kind = event.kind();
        let outcome = match event {
            InboundEvent::Text { text, at, .. } => self.on_text(&text, &at),
            InboundEvent::Photo { photo, at, .. } => self.on_photo(&photo, &at),
            InboundEvent::Command { command, at, .. } => self.on_command(sender, &command, &at),
        };

        match outcome {
            Ok(replies) => replies,
            Err(err) => {
                if err.downcast_ref::<InboxError>().is_some() {
                    info!(kind, error = %err, "request rejected");
                } else {
                    warn!(kind, error = %format!("{err:#}"), "request failed");
                }
                vec![failure_reply(&err)]
            }
        }
    }

    fn on_text(&self, text: &str, at: &Stamp) -> Result<Vec<Reply>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let out = append_to_month(&self.cfg.paths, at, text, self.cfg.session_gap_hours)?;
        info!(
            file = %out.path.display(),
            new_section = out.new_section,
            preview = %truncate_with_ellipsis(text, 40),
            "note appended"
        );
        Ok(vec![Reply::text(format!("saved to {}", file_name_of(&out.path)))])
    }

    fn on_photo(&self, photo: &PhotoPayload, at: &Stamp) -> Result<Vec<Reply>> {
        let saved = save_media(&self.cfg.paths, at, photo.unique_id.as_deref(), &photo.bytes)?;
        let note = media_note(&saved, photo.caption.as_deref());
        let out = append_to_month(&self.cfg.paths, at, &note, self.cfg.session_gap_hours)?;
        info!(
            media = %saved.path.display(),
            bytes = saved.bytes,
            file = %out.path.display(),
            "photo saved"
        );
        Ok(vec![Reply::text(format!(
            "saved photo {} to {}",
            saved.relative,
            file_name_of(&out.path)
        ))])
    }

    fn on_command(&self, sender: Option<u64>, command: &Command, at: &Stamp) -> Result<Vec<Reply>> {
        debug!(name = %command.name, args = ?command.args, "command");
        match command.action()? {
            Action::Id => {
                let id = sender.map_or_else(|| "unknown".to_string(), |id| id.to_string());
                Ok(vec![Reply::text(format!("your user_id = {id}"))])
            }
            Action::Help => Ok(vec![Reply::text(HELP_TEXT)]),
            Action::Unknown(name) => {
                debug!(%name, "unknown command, replying with help");
                Ok(vec![Reply::text(HELP_TEXT)])
            }
            Action::Ls => self.list(),
            Action::Read(name) => self.read(name.as_deref(), at),
            Action::Get(target) => self.get(target, at),
            Action::RemoveMedia { confirmed } => self.remove_media(confirmed),
        }
    }

    fn list(&self) -> Result<Vec<Reply>> {
        let names = list_logs(&self.cfg.paths)?;
        if names.is_empty() {
            return Ok(vec![Reply::text(EMPTY_MARKER)]);
        }
        Ok(vec![Reply::text(names.join("\n"))])
    }

    fn resolve_user_file(&self, name: Option<&str>, at: &Stamp) -> Result<PathBuf> {
        self.cfg
            .paths
            .user_file_or_current(name, &at.local)
            .ok_or_else(|| InboxError::Usage("/read [name]".to_string()).into())
    }

    fn read(&self, name: Option<&str>, at: &Stamp) -> Result<Vec<Reply>> {
        let path = self.resolve_user_file(name, at)?;
        let text = read_text(&path)?;
        Ok(split_chunks(&text, self.cfg.read_chunk_chars)
            .into_iter()
            .map(Reply::Text)
            .collect())
    }

    fn document(path: PathBuf) -> Result<Vec<Reply>> {
        if !path.is_file() {
            return Err(InboxError::NotFound(path.display().to_string()).into());
        }
        let file_name = file_name_of(&path);
        Ok(vec![Reply::Document { path, file_name }])
    }

    fn get(&self, target: GetTarget, at: &Stamp) -> Result<Vec<Reply>> {
        let paths = &self.cfg.paths;
        match target {
            GetTarget::CurrentLog => Self::document(paths.monthly_log(&at.local)),
            GetTarget::File(name) => {
                let path = paths
                    .user_file(&name)
                    .ok_or_else(|| InboxError::Usage(GET_USAGE.to_string()))?;
                Self::document(path)
            }
            GetTarget::MediaFile(name) => {
                let name = sanitize_file_name(&name)
                    .ok_or_else(|| InboxError::Usage(GET_USAGE.to_string()))?;
                let path = find_media_file(paths, at, name)
                    .ok_or_else(|| InboxError::NotFound(name.to_string()))?;
                Self::document(path)
            }
            GetTarget::MediaArchive => {
                let archive = build_media_archive(
                    &paths.media_root,
                    &paths.tmp_dir,
                    &paths.media_archive_name(&at.local),
                )?;
                info!(entries = archive.entries, "media archive built");
                audit::record(
                    paths,
                    "export-media",
                    "ok",
                    &format!("entries={}", archive.entries),
                );
                Ok(vec![Reply::Archive(archive)])
            }
        }
    }

    fn remove_media(&self, confirmed: bool) -> Result<Vec<Reply>> {
        let root = &self.cfg.paths.media_root;
        if !confirmed {
            return Ok(vec![Reply::text(format!(
                "this deletes every saved photo; send `{REMOVE_USAGE}` to proceed"
            ))]);
        }
        if !remove_media_tree(root)? {
            return Ok(vec![Reply::text("media directory does not exist")]);
        }
        warn!(media_root = %root.display(), "media tree removed");
        audit::record(&self.cfg.paths, "remove-media", "ok", &root.display().to_string());
        Ok(vec![Reply::text("media removed")])
    }
}

#[cfg(test)]
mod tests {
    use super::{CommandDispatcher, InboundEvent, PhotoPayload, Reply};
    use crate::inbox::clock::{Stamp, Zone};
    use crate::inbox::command::parse;
    use crate::inbox::config::InboxConfig;
    use chrono::NaiveDate;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    const OWNER: u64 = 1001;

    fn at(d: u32, h: u32, mi: u32) -> Stamp {
        let local = NaiveDate::from_ymd_opt(2024, 3, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap();
        Stamp::new(local, "UTC")
    }

    fn dispatcher(root: &Path) -> CommandDispatcher {
        let mut cfg = InboxConfig::for_out_file(root.join("inbox.md"), Zone::System);
        cfg.allowed_user_id = Some(OWNER);
        CommandDispatcher::new(cfg)
    }

    fn text(sender: u64, body: &str, at: Stamp) -> InboundEvent {
        InboundEvent::Text {
            sender: Some(sender),
            text: body.to_string(),
            at,
        }
    }

    fn command(sender: u64, line: &str, at: Stamp) -> InboundEvent {
        InboundEvent::Command {
            sender: Some(sender),
            command: parse(line).expect("command"),
            at,
        }
    }

    fn texts(replies: &[Reply]) -> Vec<String> {
        replies
            .iter()
            .filter_map(|r| match r {
                Reply::Text(t) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn text_is_appended_and_acknowledged() {
        let tmp = tempdir().expect("tempdir");
        let d = dispatcher(tmp.path());
        let replies = d.dispatch(text(OWNER, "buy milk\nand eggs", at(1, 9, 0)));
        assert_eq!(texts(&replies), vec!["saved to inbox_2024.3.md"]);

        let content = fs::read_to_string(tmp.path().join("inbox_2024.3.md")).expect("log");
        assert!(content.contains("- [2024-03-01 09:00:00 UTC] buy milk and eggs\n"));
    }

    #[test]
    fn unauthorized_sender_gets_silence() {
        let tmp = tempdir().expect("tempdir");
        let d = dispatcher(tmp.path());
        assert!(d.dispatch(text(7, "spam", at(1, 9, 0))).is_empty());
        assert!(d.dispatch(command(7, "/ls", at(1, 9, 0))).is_empty());
        assert!(d.dispatch(command(7, "/unknown", at(1, 9, 0))).is_empty());
        assert!(!tmp.path().join("inbox_2024.3.md").exists());
    }

    #[test]
    fn id_answers_anyone() {
        let tmp = tempdir().expect("tempdir");
        let d = dispatcher(tmp.path());
        let replies = d.dispatch(command(7, "/id", at(1, 9, 0)));
        assert_eq!(texts(&replies), vec!["your user_id = 7"]);
    }

    #[test]
    fn photo_is_saved_and_referenced() {
        let tmp = tempdir().expect("tempdir");
        let d = dispatcher(tmp.path());
        let event = InboundEvent::Photo {
            sender: Some(OWNER),
            photo: PhotoPayload {
                unique_id: Some("AgADuid".to_string()),
                bytes: b"jpeg-bytes".to_vec(),
                caption: Some("receipt".to_string()),
            },
            at: at(2, 12, 30),
        };
        let replies = d.dispatch(event);
        assert_eq!(
            texts(&replies),
            vec!["saved photo media/2024.3/AgADuid.jpg to inbox_2024.3.md"]
        );
        assert!(tmp.path().join("media/2024.3/AgADuid.jpg").is_file());
        let content = fs::read_to_string(tmp.path().join("inbox_2024.3.md")).expect("log");
        assert!(content.contains("] ![photo](media/2024.3/AgADuid.jpg) receipt\n"));
    }

    #[test]
    fn ls_lists_logs_or_empty() {
        let tmp = tempdir().expect("tempdir");
        let d = dispatcher(tmp.path());
        assert_eq!(texts(&d.dispatch(command(OWNER, "/ls", at(1, 9, 0)))), vec!["(empty)"]);

        d.dispatch(text(OWNER, "a", at(1, 9, 0)));
        assert_eq!(
            texts(&d.dispatch(command(OWNER, "/ls", at(1, 9, 0)))),
            vec!["inbox_2024.3.md"]
        );
    }

    #[test]
    fn read_chunks_long_logs() {
        let tmp = tempdir().expect("tempdir");
        let mut d = dispatcher(tmp.path());
        d.cfg.read_chunk_chars = 50;
        d.dispatch(text(OWNER, &"x".repeat(120), at(1, 9, 0)));

        let replies = texts(&d.dispatch(command(OWNER, "/read", at(1, 10, 0))));
        assert!(replies.len() > 1);
        assert!(replies.iter().all(|chunk| chunk.chars().count() <= 50));
        assert!(replies[0].starts_with("## [2024-03-01 09:00]"));
    }

    #[test]
    fn read_missing_and_traversal() {
        let tmp = tempdir().expect("tempdir");
        let d = dispatcher(tmp.path());
        let replies = texts(&d.dispatch(command(OWNER, "/read ../../etc/passwd", at(1, 9, 0))));
        assert_eq!(replies, vec!["file does not exist"]);
    }

    #[test]
    fn get_current_log_sends_document() {
        let tmp = tempdir().expect("tempdir");
        let d = dispatcher(tmp.path());
        assert_eq!(
            texts(&d.dispatch(command(OWNER, "/get", at(1, 9, 0)))),
            vec!["file does not exist"]
        );

        d.dispatch(text(OWNER, "a", at(1, 9, 0)));
        let replies = d.dispatch(command(OWNER, "/get md", at(1, 9, 0)));
        match replies.as_slice() {
            [Reply::Document { path, file_name }] => {
                assert_eq!(file_name, "inbox_2024.3.md");
                assert_eq!(path, &tmp.path().join("inbox_2024.3.md"));
            }
            other => panic!("unexpected replies: {other:?}"),
        }
    }

    #[test]
    fn get_media_builds_temp_archive() {
        let tmp = tempdir().expect("tempdir");
        let d = dispatcher(tmp.path());
        assert_eq!(
            texts(&d.dispatch(command(OWNER, "/get media", at(1, 9, 0)))),
            vec!["nothing to archive"]
        );

        let month = tmp.path().join("media/2024.3");
        fs::create_dir_all(&month).expect("mkdir");
        fs::write(month.join("a.jpg"), b"a").expect("write");
        let mut replies = d.dispatch(command(OWNER, "/get media", at(1, 9, 0)));
        let Some(Reply::Archive(archive)) = replies.pop() else {
            panic!("expected archive reply");
        };
        assert_eq!(archive.file_name, "media_2024.3.zip");
        assert_eq!(archive.entries, 1);
        let path = archive.path().to_path_buf();
        assert!(path.is_file());
        drop(archive);
        assert!(!path.exists());
    }

    #[test]
    fn remove_media_requires_confirm() {
        let tmp = tempdir().expect("tempdir");
        let d = dispatcher(tmp.path());
        let month = tmp.path().join("media/2024.3");
        fs::create_dir_all(&month).expect("mkdir");
        fs::write(month.join("a.jpg"), b"a").expect("write");

        let warning = texts(&d.dispatch(command(OWNER, "/remove media", at(1, 9, 0))));
        assert!(warning[0].contains("/remove media confirm"));
        assert!(month.exists());

        let done = texts(&d.dispatch(command(OWNER, "/remove media confirm", at(1, 9, 0))));
        assert_eq!(done, vec!["media removed"]);
        assert!(!tmp.path().join("media").exists());
        assert!(tmp.path().join("logs/audit.log").is_file());

        let again = texts(&d.dispatch(command(OWNER, "/remove media confirm", at(1, 9, 0))));
        assert_eq!(again, vec!["media directory does not exist"]);
    }

    #[test]
    fn remove_other_target_shows_usage() {
        let tmp = tempdir().expect("tempdir");
        let d = dispatcher(tmp.path());
        let replies = texts(&d.dispatch(command(OWNER, "/remove", at(1, 9, 0))));
        assert_eq!(replies, vec!["usage: /remove media confirm"]);
    }
}
