//! Account registration, login and session tokens.

use crate::error::{ClusterError, Result};
use dashmap::DashMap;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Account created when the credential file does not contain it.
pub const DEFAULT_USER: &str = "default";
const DEFAULT_PASSWORD: &str = "default";

/// Hex-encoded SHA-256 of a password.
pub fn digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// File-backed map of username to password digest.
pub struct CredentialStore {
    path: Option<PathBuf>,
    users: Mutex<BTreeMap<String, String>>,
}

impl CredentialStore {
    /// In-memory store holding only the default account.
    pub fn in_memory() -> Self {
        let mut users = BTreeMap::new();
        users.insert(DEFAULT_USER.to_string(), digest(DEFAULT_PASSWORD));
        Self {
            path: None,
            users: Mutex::new(users),
        }
    }

    /// Loads the store, creating the file with the default account when needed.
    pub fn open(path: &Path) -> Result<Self> {
        let mut users: BTreeMap<String, String> = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|e| store_error(path, e))?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw).map_err(|e| store_error(path, e))?
            }
        } else {
            BTreeMap::new()
        };

        let seeded = !users.contains_key(DEFAULT_USER);
        if seeded {
            users.insert(DEFAULT_USER.to_string(), digest(DEFAULT_PASSWORD));
        }

        let store = Self {
            path: Some(path.to_path_buf()),
            users: Mutex::new(users),
        };
        if seeded {
            store.persist(&store.users.lock())?;
            tracing::info!(path = %path.display(), "Seeded default account");
        }
        Ok(store)
    }

    pub fn register(&self, username: &str, password: &str) -> Result<()> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(ClusterError::invalid_data(
                "REGISTER",
                "username and password must not be empty",
            ));
        }

        let mut users = self.users.lock();
        if users.contains_key(username) {
            return Err(ClusterError::UserExists(username.to_string()));
        }
        users.insert(username.to_string(), digest(password));
        if let Err(e) = self.persist(&users) {
            users.remove(username);
            return Err(e);
        }
        Ok(())
    }

    pub fn verify(&self, username: &str, password: &str) -> bool {
        self.users
            .lock()
            .get(username.trim())
            .is_some_and(|stored| *stored == digest(password))
    }

    pub fn contains(&self, username: &str) -> bool {
        self.users.lock().contains_key(username.trim())
    }

    fn persist(&self, users: &BTreeMap<String, String>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| store_error(path, e))?;
        }
        let json = serde_json::to_string_pretty(users).map_err(|e| store_error(path, e))?;
        std::fs::write(path, json).map_err(|e| store_error(path, e))
    }
}

fn store_error(path: &Path, err: impl std::fmt::Display) -> ClusterError {
    ClusterError::CredentialStore {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

struct Session {
    username: String,
    last_seen: Instant,
}

/// Session tokens handed out at login. A token expires after `ttl` without use.
pub struct Sessions {
    tokens: DashMap<String, Session>,
    ttl: Duration,
}

impl Sessions {
    pub fn new(ttl: Duration) -> Self {
        Self {
            tokens: DashMap::new(),
            ttl,
        }
    }

    /// Issues a fresh token for `username`.
    pub fn open(&self, username: &str) -> String {
        let token = Uuid::new_v4().to_string();
        self.tokens.insert(
            token.clone(),
            Session {
                username: username.trim().to_string(),
                last_seen: Instant::now(),
            },
        );
        token
    }

    /// The token's user, refreshing its idle timer. Expired tokens are dropped.
    pub fn user(&self, token: &str) -> Option<String> {
        let mut session = self.tokens.get_mut(token)?;
        if session.last_seen.elapsed() > self.ttl {
            drop(session);
            self.tokens.remove(token);
            return None;
        }
        session.last_seen = Instant::now();
        Some(session.username.clone())
    }

    /// Drops tokens idle for longer than the TTL, returning how many were removed.
    pub fn remove_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.tokens.retain(|_, session| {
            let idle = now.duration_since(session.last_seen);
            if idle > self.ttl {
                tracing::debug!(username = %session.username, idle_secs = idle.as_secs(), "Session expired");
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Periodically drops idle sessions.
pub async fn cleanup_task(sessions: std::sync::Arc<Sessions>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        let removed = sessions.remove_expired();
        if removed > 0 {
            tracing::info!(removed, remaining = sessions.len(), "Cleaned up idle sessions");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_sha256_hex() {
        assert_eq!(
            digest("default"),
            "37a8eec1ce19687d132fe29051dca629d164e2c4958ba141d5f4133a33f0688f"
        );
    }

    #[test]
    fn test_open_seeds_default_account() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");

        let store = CredentialStore::open(&path).unwrap();
        assert!(store.verify("default", "default"));
        assert!(path.exists());
    }

    #[test]
    fn test_register_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("users.json");

        let store = CredentialStore::open(&path).unwrap();
        store.register("maria", "s3cret").unwrap();
        assert!(matches!(
            store.register("maria", "other"),
            Err(ClusterError::UserExists(_))
        ));

        let reopened = CredentialStore::open(&path).unwrap();
        assert!(reopened.verify("maria", "s3cret"));
        assert!(!reopened.verify("maria", "wrong"));

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("s3cret"));
    }

    #[test]
    fn test_register_rejects_empty() {
        let store = CredentialStore::in_memory();
        assert!(store.register("  ", "pw").is_err());
        assert!(store.register("nikos", "").is_err());
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, "[1, 2").unwrap();

        assert!(matches!(
            CredentialStore::open(&path),
            Err(ClusterError::CredentialStore { .. })
        ));
    }

    #[test]
    fn test_sessions() {
        let sessions = Sessions::new(Duration::from_secs(60));
        let token = sessions.open("default");
        assert_eq!(sessions.user(&token).as_deref(), Some("default"));
        assert!(sessions.user("bogus").is_none());
        assert_ne!(sessions.open("default"), token);
        assert_eq!(sessions.len(), 2);
    }

    #[test]
    fn test_idle_sessions_expire() {
        let sessions = Sessions::new(Duration::from_millis(1));
        let swept = sessions.open("eleni");
        let looked_up = sessions.open("nikos");
        std::thread::sleep(Duration::from_millis(10));

        assert_eq!(sessions.user(&looked_up), None);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions.remove_expired(), 1);
        assert!(sessions.is_empty());
        assert_eq!(sessions.user(&swept), None);
    }
}
