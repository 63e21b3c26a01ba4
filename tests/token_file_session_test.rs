//! Token-file and static-token sessions
//!
//! No network is involved: the transport is never reached because these
//! tests only ask for tokens and credentials.

use std::fs::File;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use rbac_api::{ApiConfig, ApiError, Session, Token, TokenSource};

fn config() -> ApiConfig {
    ApiConfig::new("https://rbac.example.com", "acme")
}

fn set_mtime(path: &Path, mtime: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(mtime)
        .unwrap();
}

#[test]
fn token_file_is_reread_only_when_its_mtime_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("access-token");
    let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);

    std::fs::write(&path, r#"{"data":"host/app-1"}"#).unwrap();
    set_mtime(&path, t0);

    let session = Session::from_token_file(config(), &path).unwrap();
    assert_eq!(session.username(), None);
    assert_eq!(session.token().unwrap().data(), "host/app-1");
    assert_eq!(session.username().as_deref(), Some("host/app-1"));

    // same mtime: the new content is not picked up
    std::fs::write(&path, r#"{"data":"host/app-2"}"#).unwrap();
    set_mtime(&path, t0);
    assert_eq!(session.token().unwrap().data(), "host/app-1");

    set_mtime(&path, t0 + Duration::from_secs(30));
    assert_eq!(session.token().unwrap().data(), "host/app-2");
}

#[test]
fn unreadable_token_file_fails_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::from_token_file(config(), dir.path().join("missing")).unwrap();
    assert!(matches!(
        session.credentials(),
        Err(ApiError::TokenFileError(_))
    ));
}

/// In-memory token source counting content reads.
#[derive(Clone)]
struct CountingSource {
    mtime: Arc<Mutex<SystemTime>>,
    reads: Arc<AtomicUsize>,
}

impl TokenSource for CountingSource {
    fn modified(&self) -> std::io::Result<SystemTime> {
        Ok(*self.mtime.lock().unwrap())
    }

    fn read_to_string(&self) -> std::io::Result<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(r#"{"data":"svc"}"#.to_string())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[test]
fn touching_the_file_forces_exactly_one_refresh() {
    let source = CountingSource {
        mtime: Arc::new(Mutex::new(SystemTime::UNIX_EPOCH)),
        reads: Arc::new(AtomicUsize::new(0)),
    };
    let session = Session::builder(config())
        .token_source(source.clone())
        .unwrap();

    for _ in 0..3 {
        session.credentials().unwrap();
    }
    assert_eq!(source.reads.load(Ordering::SeqCst), 1);

    *source.mtime.lock().unwrap() += Duration::from_secs(1);
    for _ in 0..3 {
        session.credentials().unwrap();
    }
    assert_eq!(source.reads.load(Ordering::SeqCst), 2);
}

#[test]
fn static_token_session_rejects_refresh() {
    let token = Token::from_json(r#"{"data":"alice"}"#).unwrap();
    let session = Session::from_token(config(), token).unwrap();

    for _ in 0..3 {
        assert_eq!(session.credentials().unwrap().username.as_deref(), Some("alice"));
    }
    assert!(matches!(
        session.authenticate(),
        Err(ApiError::RefreshUnsupported(_))
    ));
}
