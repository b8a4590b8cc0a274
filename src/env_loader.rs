use std::env;
use std::path::PathBuf;

fn fallback_dotenv_path(inbox_home: Option<PathBuf>, config_dir: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(home) = inbox_home {
        return Some(home.join(".env"));
    }
    Some(config_dir?.join("tg-inbox/.env"))
}

pub fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let fallback = fallback_dotenv_path(
        env::var_os("INBOX_HOME").map(PathBuf::from),
        dirs::config_dir(),
    );

    let Some(path) = fallback else {
        return;
    };
    if path.is_file() {
        let _ = dotenvy::from_path(&path);
    }
}

#[cfg(test)]
mod tests {
    use super::fallback_dotenv_path;
    use std::path::PathBuf;

    #[test]
    fn inbox_home_takes_precedence() {
        let got = fallback_dotenv_path(
            Some(PathBuf::from("/srv/inbox")),
            Some(PathBuf::from("/home/alice/.config")),
        );
        assert_eq!(got, Some(PathBuf::from("/srv/inbox/.env")));
    }

    #[test]
    fn config_dir_used_when_inbox_home_unset() {
        let got = fallback_dotenv_path(None, Some(PathBuf::from("/home/alice/.config")));
        assert_eq!(got, Some(PathBuf::from("/home/alice/.config/tg-inbox/.env")));
    }

    #[test]
    fn nothing_to_fall_back_to() {
        assert_eq!(fallback_dotenv_path(None, None), None);
    }
}
