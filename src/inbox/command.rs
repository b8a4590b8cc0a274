use crate::error::InboxError;

pub const REMOVE_USAGE: &str = "/remove media confirm";
pub const GET_USAGE: &str = "/get [md [name] | media [name] | name]";

pub const HELP_TEXT: &str = "\
Send text or photos and they are appended to this month's log.
/id - show your user id
/ls - list monthly logs
/read [name] - show a log (current month by default)
/get [md|media|name] [name] - download a log, a media zip or a file
/remove media confirm - delete all saved media";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GetTarget {
    CurrentLog,
    File(String),
    MediaArchive,
    MediaFile(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Id,
    Help,
    Ls,
    Read(Option<String>),
    Get(GetTarget),
    RemoveMedia { confirmed: bool },
    Unknown(String),
}

/// Parse `/name[@bot] args...`. Returns `None` for anything that is not a command.
pub fn parse(text: &str) -> Option<Command> {
    let mut parts = text.split_whitespace();
    let head = parts.next()?.strip_prefix('/')?;
    let name = head.split('@').next().unwrap_or_default();
    if name.is_empty() {
        return None;
    }
    Some(Command {
        name: name.to_ascii_lowercase(),
        args: parts.map(ToOwned::to_owned).collect(),
    })
}

impl Command {
    fn arg(&self, idx: usize) -> Option<&str> {
        self.args.get(idx).map(String::as_str)
    }

    pub fn action(&self) -> Result<Action, InboxError> {
        let action = match self.name.as_str() {
            "id" => Action::Id,
            "start" | "help" => Action::Help,
            "ls" => Action::Ls,
            "read" => Action::Read(self.arg(0).map(ToOwned::to_owned)),
            "get" => Action::Get(self.get_target()),
            "remove" => match self.arg(0) {
                Some("media") => Action::RemoveMedia {
                    confirmed: self.arg(1) == Some("confirm"),
                },
                _ => return Err(InboxError::Usage(REMOVE_USAGE.to_string())),
            },
            other => Action::Unknown(other.to_string()),
        };
        Ok(action)
    }

    fn get_target(&self) -> GetTarget {
        match (self.arg(0), self.arg(1)) {
            (None, _) | (Some("md"), None) => GetTarget::CurrentLog,
            (Some("md"), Some(name)) => GetTarget::File(name.to_string()),
            (Some("media"), None) => GetTarget::MediaArchive,
            (Some("media"), Some(name)) => GetTarget::MediaFile(name.to_string()),
            (Some(name), _) => GetTarget::File(name.to_string()),
        }
    }

    /// Gated commands require an authorized sender; `/id` never does.
    pub fn requires_auth(&self) -> bool {
        self.name != "id"
    }
}
