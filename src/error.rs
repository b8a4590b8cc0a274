use thiserror::Error;

/// Failures the bot answers with a specific message instead of a generic one.
#[derive(Debug, Error)]
pub enum InboxError {
    #[error("file does not exist: {0}")]
    NotFound(String),
    #[error("nothing to archive: {0}")]
    NothingToArchive(String),
    #[error("usage: {0}")]
    Usage(String),
    #[error("bot token missing: set BOT_TOKEN (or TELOXIDE_TOKEN)")]
    MissingToken,
    #[error("config file invalid or unreadable: {0}")]
    InvalidConfig(String),
    #[error("photo download failed: {0}")]
    Download(String),
}

impl InboxError {
    /// Text sent back to the chat for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound(_) => "file does not exist".to_string(),
            Self::NothingToArchive(_) => "nothing to archive".to_string(),
            Self::Usage(usage) => format!("usage: {usage}"),
            Self::Download(_) => "failed to download photo".to_string(),
            Self::MissingToken | Self::InvalidConfig(_) => format!("failed: {self}"),
        }
    }
}
