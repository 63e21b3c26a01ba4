//! Authentication from a token file maintained by another process.
//!
//! The file is re-read whenever its modification time differs from the one
//! observed at the last successful read.

use crate::authn::Authenticator;
use crate::error::{ApiError, Result};
use crate::token::Token;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Where token file metadata and content come from.
pub trait TokenSource: Send {
    /// Last modification time of the token.
    fn modified(&self) -> std::io::Result<SystemTime>;
    /// Current token content.
    fn read_to_string(&self) -> std::io::Result<String>;
    /// Human-readable location for error messages.
    fn describe(&self) -> String;
}

/// [`TokenSource`] reading a file on disk.
#[derive(Debug, Clone)]
pub struct FileTokenSource {
    path: PathBuf,
}

impl FileTokenSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenSource for FileTokenSource {
    fn modified(&self) -> std::io::Result<SystemTime> {
        std::fs::metadata(&self.path)?.modified()
    }

    fn read_to_string(&self) -> std::io::Result<String> {
        std::fs::read_to_string(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Re-reads the token whenever its source reports a new modification time.
pub struct TokenFileAuthenticator {
    source: Box<dyn TokenSource>,
    /// Modification time taken just before the last successful read
    last_mtime: Option<SystemTime>,
}

impl TokenFileAuthenticator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_source(FileTokenSource::new(path))
    }

    /// Authenticator reading from a custom [`TokenSource`].
    pub fn with_source(source: impl TokenSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            last_mtime: None,
        }
    }

    pub fn last_mtime(&self) -> Option<SystemTime> {
        self.last_mtime
    }
}

impl std::fmt::Debug for TokenFileAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenFileAuthenticator")
            .field("source", &self.source.describe())
            .field("last_mtime", &self.last_mtime)
            .finish()
    }
}

impl Authenticator for TokenFileAuthenticator {
    fn needs_refresh(&self) -> bool {
        // An unreadable mtime reports stale so that refresh surfaces the error.
        match (self.last_mtime, self.source.modified()) {
            (Some(last), Ok(current)) => current != last,
            _ => true,
        }
    }

    fn refresh(&mut self) -> Result<Token> {
        let location = self.source.describe();
        // mtime strictly before content; a concurrent write then shows up as
        // a change on the next check.
        let mtime = self.source.modified().map_err(|e| {
            ApiError::TokenFileError(format!("cannot stat {location}: {e}"))
        })?;
        let content = self.source.read_to_string().map_err(|e| {
            ApiError::TokenFileError(format!("cannot read {location}: {e}"))
        })?;
        let token = Token::from_json(&content).map_err(|e| {
            ApiError::TokenFileError(format!("invalid token in {location}: {e}"))
        })?;

        if self.last_mtime.is_some() {
            tracing::debug!(file = %location, "token file changed, token reloaded");
        }
        self.last_mtime = Some(mtime);
        Ok(token)
    }

    fn kind(&self) -> &'static str {
        "token-file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Source whose mtime moves forward every time the content is read.
    #[derive(Clone)]
    struct RacingSource {
        mtime: Arc<Mutex<SystemTime>>,
        content: String,
    }

    impl TokenSource for RacingSource {
        fn modified(&self) -> std::io::Result<SystemTime> {
            Ok(*self.mtime.lock().unwrap())
        }

        fn read_to_string(&self) -> std::io::Result<String> {
            let mut mtime = self.mtime.lock().unwrap();
            *mtime += Duration::from_secs(1);
            Ok(self.content.clone())
        }

        fn describe(&self) -> String {
            "racing".to_string()
        }
    }

    #[test]
    fn records_the_mtime_observed_before_reading() {
        let start = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        let source = RacingSource {
            mtime: Arc::new(Mutex::new(start)),
            content: r#"{"data":"alice"}"#.to_string(),
        };
        let mut authn = TokenFileAuthenticator::with_source(source.clone());

        assert!(authn.needs_refresh());
        authn.refresh().unwrap();
        assert_eq!(authn.last_mtime(), Some(start));
        // the write that raced the read is picked up on the next check
        assert!(authn.needs_refresh());
    }

    #[test]
    fn missing_file_is_a_token_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut authn = TokenFileAuthenticator::new(dir.path().join("absent.json"));
        assert!(authn.needs_refresh());
        assert!(matches!(
            authn.refresh(),
            Err(ApiError::TokenFileError(_))
        ));
        assert_eq!(authn.last_mtime(), None);
    }

    #[test]
    fn parse_failure_keeps_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, r#"{"data":"alice"}"#).unwrap();

        let mut authn = TokenFileAuthenticator::new(&path);
        authn.refresh().unwrap();
        let first = authn.last_mtime();
        assert!(first.is_some());

        std::fs::write(&path, "{ half written").unwrap();
        let file = std::fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(60))
            .unwrap();

        assert!(authn.needs_refresh());
        assert!(matches!(
            authn.refresh(),
            Err(ApiError::TokenFileError(_))
        ));
        assert_eq!(authn.last_mtime(), first);
    }
}
