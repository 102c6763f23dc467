//! Persisted browser sessions
//!
//! Cookies captured after logging in are cached per environment so later runs can
//! skip the login form. Every cookie is stamped with an expiry when saved.

use crate::catalog::Environment;
use crate::{Result, VisionError};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const SESSION_TTL_HOURS: i64 = 12;

/// Cookie as written to the session cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default = "default_cookie_path")]
    pub path: String,
    /// Unix timestamp in seconds
    #[serde(default)]
    pub expires: f64,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
}

fn default_cookie_path() -> String {
    "/".to_string()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub cookies: Vec<StoredCookie>,
}

impl Session {
    pub fn new(cookies: Vec<StoredCookie>) -> Self {
        Self { cookies }
    }

    /// A session is usable while it has cookies and none of them has expired.
    pub fn is_valid_at(&self, now_secs: f64) -> bool {
        !self.cookies.is_empty() && self.cookies.iter().all(|c| c.expires > now_secs)
    }
}

/// Storage for authenticated sessions of one environment
pub trait SessionStore {
    /// Load a still-valid session, if any
    fn load(&self) -> Result<Option<Session>>;

    /// Persist a session, stamping every cookie to expire after `ttl`
    fn save(&self, session: &Session, ttl: Duration) -> Result<()>;
}

/// JSON cookie file at `{dir}/{environment}.json`
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>, environment: Environment) -> Self {
        let path = dir.into().join(format!("{}.json", environment.name()));
        Self { path }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)?;
        let cookies: Vec<StoredCookie> = serde_json::from_str(&content)
            .map_err(|e| VisionError::Session(format!("{}: {}", self.path.display(), e)))?;

        let session = Session::new(cookies);
        let now = Utc::now().timestamp() as f64;

        if session.is_valid_at(now) {
            Ok(Some(session))
        } else {
            tracing::info!("Session cache {} has expired", self.path.display());
            Ok(None)
        }
    }

    fn save(&self, session: &Session, ttl: Duration) -> Result<()> {
        let expires = (Utc::now() + ttl).timestamp() as f64;

        let cookies: Vec<StoredCookie> = session
            .cookies
            .iter()
            .cloned()
            .map(|cookie| StoredCookie { expires, ..cookie })
            .collect();

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&cookies)
            .map_err(|e| VisionError::Session(e.to_string()))?;
        std::fs::write(&self.path, json)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn cookie(name: &str, expires: f64) -> StoredCookie {
        StoredCookie {
            name: name.to_string(),
            value: "token".to_string(),
            domain: "localhost".to_string(),
            path: "/".to_string(),
            expires,
            http_only: true,
            secure: false,
        }
    }

    #[test]
    fn test_missing_file_loads_nothing() {
        let temp = tempdir().unwrap();
        let store = FileSessionStore::new(temp.path(), Environment::Localhost);
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_save_then_load() {
        let temp = tempdir().unwrap();
        let store = FileSessionStore::new(temp.path().join("cookies"), Environment::Staging);
        assert!(store.path().ends_with("cookies/staging.json"));

        let session = Session::new(vec![cookie("_session_id", 0.0)]);
        store.save(&session, Duration::hours(SESSION_TTL_HOURS)).unwrap();

        let loaded = store.load().unwrap().expect("session should be valid");
        assert_eq!(loaded.cookies.len(), 1);
        assert_eq!(loaded.cookies[0].name, "_session_id");

        let now = Utc::now().timestamp() as f64;
        let remaining = loaded.cookies[0].expires - now;
        assert!(remaining > 11.0 * 3600.0 && remaining <= 12.0 * 3600.0);
    }

    #[test]
    fn test_expired_session_is_ignored() {
        let temp = tempdir().unwrap();
        let store = FileSessionStore::new(temp.path(), Environment::Production);

        store
            .save(&Session::new(vec![cookie("_session_id", 0.0)]), Duration::hours(-1))
            .unwrap();

        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_reads_browser_cookie_json() {
        let temp = tempdir().unwrap();
        let store = FileSessionStore::new(temp.path(), Environment::Localhost);
        let expires = Utc::now().timestamp() + 3600;

        let json = format!(
            r#"[{{"name":"remember","value":"1","domain":"localhost","path":"/","expires":{},"size":9,"httpOnly":false,"secure":false,"session":false}}]"#,
            expires
        );
        std::fs::write(store.path(), json).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.cookies[0].name, "remember");
        assert!(!loaded.cookies[0].http_only);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let temp = tempdir().unwrap();
        let store = FileSessionStore::new(temp.path(), Environment::Localhost);
        std::fs::write(store.path(), "not json").unwrap();

        assert!(matches!(store.load(), Err(VisionError::Session(_))));
    }
}
