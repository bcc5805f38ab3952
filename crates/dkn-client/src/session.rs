//! Session storage
//!
//! The session is a bearer token plus the cached user that came with it.
//! They are set and cleared together; a stored user without a token is
//! never trusted.
//!
//! ```text
//! ~/.dkn/
//! ├── config.toml
//! └── session.json      {"token": "...", "user": {...}}
//! ```

use crate::error::SessionError;
use dkn_access::{CurrentUser, User};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::warn;

/// Session file name inside the session directory
pub const SESSION_FILE: &str = "session.json";

/// Persisted session contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token
    #[serde(default)]
    pub token: Option<String>,
    /// Cached user
    #[serde(default)]
    pub user: Option<User>,
}

impl Session {
    /// Token, treating an empty string as absent
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Durable store for the current session
pub trait SessionStore: Send + Sync + fmt::Debug {
    /// Stored bearer token
    fn token(&self) -> Option<String>;

    /// Cached user
    fn user(&self) -> Option<User>;

    /// Store a new token and user
    ///
    /// # Errors
    /// - `SessionError` if the session cannot be persisted
    fn set(&self, token: &str, user: &User) -> Result<(), SessionError>;

    /// Refresh the cached user, keeping the token
    ///
    /// # Errors
    /// - `SessionError` if the session cannot be persisted
    fn set_user(&self, user: &User) -> Result<(), SessionError>;

    /// Remove token and user
    ///
    /// # Errors
    /// - `SessionError` if the stored session cannot be removed
    fn clear(&self) -> Result<(), SessionError>;
}

impl CurrentUser for dyn SessionStore {
    fn current_user(&self) -> Option<User> {
        self.user()
    }
}

/// In-process session store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: RwLock<Session>,
}

impl MemorySessionStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create store holding a session
    #[must_use]
    pub fn with_session(token: impl Into<String>, user: User) -> Self {
        Self {
            inner: RwLock::new(Session {
                token: Some(token.into()),
                user: Some(user),
            }),
        }
    }

    /// Snapshot of the stored session
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.inner.read().clone()
    }
}

impl SessionStore for MemorySessionStore {
    fn token(&self) -> Option<String> {
        self.inner.read().token().map(str::to_string)
    }

    fn user(&self) -> Option<User> {
        self.inner.read().user.clone()
    }

    fn set(&self, token: &str, user: &User) -> Result<(), SessionError> {
        *self.inner.write() = Session {
            token: Some(token.to_string()),
            user: Some(user.clone()),
        };
        Ok(())
    }

    fn set_user(&self, user: &User) -> Result<(), SessionError> {
        self.inner.write().user = Some(user.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.inner.write() = Session::default();
        Ok(())
    }
}

impl CurrentUser for MemorySessionStore {
    fn current_user(&self) -> Option<User> {
        self.user()
    }
}

/// Session persisted as JSON in a directory.
///
/// Writes go to a uniquely named temp file in the same directory that is
/// then renamed over `session.json`. A missing
/// or unreadable file loads as an empty session.
#[derive(Debug)]
pub struct FileSessionStore {
    dir: PathBuf,
    cache: RwLock<Session>,
}

impl FileSessionStore {
    /// Open the store in `dir`; the directory is created on first write
    #[must_use]
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let cache = load_session(&dir.join(SESSION_FILE));
        Self {
            dir,
            cache: RwLock::new(cache),
        }
    }

    /// Session directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Session file path
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    fn persist(&self, session: &Session) -> Result<(), SessionError> {
        if !self.dir.exists() {
            std::fs::create_dir_all(&self.dir).map_err(|source| SessionError::CreateDir {
                path: self.dir.clone(),
                source,
            })?;
        }

        let json = serde_json::to_vec_pretty(session)?;
        let path = self.path();
        let write_err = |source| SessionError::Write {
            path: path.clone(),
            source,
        };

        // Unique temp name per writer; concurrent processes never share one
        let mut temp = NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        temp.write_all(&json).map_err(write_err)?;
        temp.persist(&path).map_err(|err| write_err(err.error))?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn token(&self) -> Option<String> {
        self.cache.read().token().map(str::to_string)
    }

    fn user(&self) -> Option<User> {
        self.cache.read().user.clone()
    }

    fn set(&self, token: &str, user: &User) -> Result<(), SessionError> {
        let session = Session {
            token: Some(token.to_string()),
            user: Some(user.clone()),
        };
        let mut cache = self.cache.write();
        self.persist(&session)?;
        *cache = session;
        Ok(())
    }

    fn set_user(&self, user: &User) -> Result<(), SessionError> {
        let mut cache = self.cache.write();
        let session = Session {
            token: cache.token.clone(),
            user: Some(user.clone()),
        };
        self.persist(&session)?;
        *cache = session;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        let mut cache = self.cache.write();
        *cache = Session::default();

        let path = self.path();
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SessionError::Write { path, source }),
        }
    }
}

impl CurrentUser for FileSessionStore {
    fn current_user(&self) -> Option<User> {
        self.user()
    }
}

fn load_session(path: &Path) -> Session {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %err, "unreadable session file, starting signed out");
            }
            return Session::default();
        }
    };

    serde_json::from_str(&content).unwrap_or_else(|err| {
        warn!(path = %path.display(), error = %err, "corrupt session file, starting signed out");
        Session::default()
    })
}
