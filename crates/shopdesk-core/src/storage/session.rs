//! Persisted session state
//!
//! The session is a small key/value store holding the bearer token, the
//! signed-in user and the token expiry. It is read on every API call and
//! written by login, logout and unauthorized-response handling.

use super::Result;
use crate::api::models::User;
use crate::error::StorageError;
use crate::utils::error_helpers::convert_io_error;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const TOKEN_KEY: &str = "authToken";
pub const USER_KEY: &str = "userData";
pub const EXPIRY_KEY: &str = "tokenExpiry";
pub const SESSION_FILE_NAME: &str = "session.json";

/// Backing store for session keys.
pub trait SessionStorage: Send + Sync + fmt::Debug {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Process-local storage, used by tests and short-lived embeddings.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries.lock().map_err(|_| StorageError::Session {
            message: "session store lock poisoned".to_string(),
        })
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.entries()?.clear();
        Ok(())
    }
}

/// JSON object on disk, rewritten on every change.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// `session.json` inside the given configuration directory
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(SESSION_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|e| convert_io_error(e, &self.path))?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|e| StorageError::Session {
            message: format!("Corrupted session file {}: {}", self.path.display(), e),
        })
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| convert_io_error(e, parent))?;
        }
        let content = serde_json::to_string_pretty(map).map_err(|e| StorageError::Session {
            message: format!("Failed to serialize session: {}", e),
        })?;
        write_private(&self.path, &content).map_err(|e| convert_io_error(e, &self.path))
    }

    fn with_map<T>(&self, f: impl FnOnce(&mut BTreeMap<String, String>) -> T) -> Result<T> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Session {
            message: "session file lock poisoned".to_string(),
        })?;
        let mut map = self.read_map()?;
        let out = f(&mut map);
        self.write_map(&map)?;
        Ok(out)
    }
}

/// The session file holds a bearer token: owner read/write only.
fn write_private(path: &Path, content: &str) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    // files created by older versions keep their mode on open
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(content.as_bytes())
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Session {
            message: "session file lock poisoned".to_string(),
        })?;
        Ok(self.read_map()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.with_map(|map| {
            map.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.with_map(|map| {
            map.remove(key);
        })
    }

    fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Session {
            message: "session file lock poisoned".to_string(),
        })?;
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| convert_io_error(e, &self.path))?;
        }
        Ok(())
    }
}

/// Outcome of reading the persisted session at startup.
#[derive(Debug, Clone, PartialEq)]
pub enum RestoredSession {
    Active { user: User },
    Missing,
    Expired,
    Corrupted,
}

/// Typed view over a [`SessionStorage`], shared by the API client and the auth context.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn SessionStorage>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("store", &self.store)
            .finish()
    }
}

impl Session {
    pub fn new(store: Arc<dyn SessionStorage>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileStorage::new(path)))
    }

    /// Bearer token, if any. Read failures are logged and treated as "no token".
    pub fn token(&self) -> Option<String> {
        match self.store.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                log::warn!("Failed to read session token: {}", e);
                None
            }
        }
    }

    pub fn user(&self) -> Result<Option<User>> {
        match self.store.get(USER_KEY)? {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| StorageError::Session {
                    message: format!("Invalid user data: {}", e),
                }),
        }
    }

    pub fn expiry(&self) -> Result<Option<DateTime<Utc>>> {
        match self.store.get(EXPIRY_KEY)? {
            None => Ok(None),
            Some(raw) => DateTime::parse_from_rfc3339(&raw)
                .map(|dt| Some(dt.with_timezone(&Utc)))
                .map_err(|e| StorageError::Session {
                    message: format!("Invalid token expiry '{}': {}", raw, e),
                }),
        }
    }

    /// Store a freshly issued session.
    pub fn persist(&self, token: &str, user: &User, expires_at: DateTime<Utc>) -> Result<()> {
        let user_json = serde_json::to_string(user).map_err(|e| StorageError::Session {
            message: format!("Failed to serialize user: {}", e),
        })?;
        self.store.set(TOKEN_KEY, token)?;
        self.store.set(USER_KEY, &user_json)?;
        self.store.set(EXPIRY_KEY, &expires_at.to_rfc3339())?;
        log::info!("Session stored for {}", user.email);
        Ok(())
    }

    /// Remove all session keys.
    pub fn clear(&self) -> Result<()> {
        self.store.clear()?;
        log::info!("Session cleared");
        Ok(())
    }

    /// Read the stored session, clearing it when it is corrupted or expired.
    /// A session without an expiry key does not expire.
    pub fn restore(&self, now: DateTime<Utc>) -> RestoredSession {
        let outcome = match (self.token(), self.user(), self.expiry()) {
            (Some(_), Ok(Some(user)), Ok(expiry)) => match expiry {
                Some(at) if at <= now => RestoredSession::Expired,
                _ => RestoredSession::Active { user },
            },
            (_, Err(e), _) | (_, _, Err(e)) => {
                log::warn!("Discarding stored session: {}", e);
                RestoredSession::Corrupted
            }
            _ => RestoredSession::Missing,
        };

        if matches!(
            outcome,
            RestoredSession::Expired | RestoredSession::Corrupted
        ) {
            if let Err(e) = self.clear() {
                log::warn!("Failed to clear stale session: {}", e);
            }
        }
        outcome
    }
}
