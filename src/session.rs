//! Session context: a single bearer token persisted in a well-known file.
//!
//! Token presence is the entire authentication signal (no expiry check, no
//! refresh). Consumers subscribe to change notifications instead of
//! re-reading the store after every action.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use crate::error::{Error, Result};

type Observer = Box<dyn Fn(bool) + Send + Sync>;

/// Default token location: `$ENTRYPASS_TOKEN_FILE`, else
/// `$HOME/.entrypass/token`, else `./.entrypass-token`.
pub fn default_token_path() -> PathBuf {
    if let Ok(path) = std::env::var("ENTRYPASS_TOKEN_FILE") {
        return PathBuf::from(path);
    }
    if let Ok(home) = std::env::var("HOME") {
        return Path::new(&home).join(".entrypass").join("token");
    }
    PathBuf::from(".entrypass-token")
}

/// Observable bearer-token store.
pub struct Session {
    path: PathBuf,
    token: RwLock<Option<String>>,
    observers: Mutex<Vec<Observer>>,
}

impl Session {
    /// Open the session, loading any previously stored token.
    pub fn open(path: PathBuf) -> Session {
        let token = std::fs::read_to_string(&path)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Session {
            path,
            token: RwLock::new(token),
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Current bearer token, if any.
    pub fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    /// Whether a token is present.
    pub fn is_authenticated(&self) -> bool {
        self.token.read().map(|t| t.is_some()).unwrap_or(false)
    }

    /// Store a new token and notify observers.
    pub fn set_token(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::SessionError(format!("Failed to create token dir: {}", e)))?;
        }
        std::fs::write(&self.path, token)
            .map_err(|e| Error::SessionError(format!("Failed to write token: {}", e)))?;
        if let Ok(mut guard) = self.token.write() {
            *guard = Some(token.to_string());
        }
        self.notify(true);
        Ok(())
    }

    /// Drop the stored token and notify observers. Missing file is not an
    /// error; logout is idempotent.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::SessionError(format!("Failed to remove token: {}", e))),
        }
        if let Ok(mut guard) = self.token.write() {
            *guard = None;
        }
        self.notify(false);
        Ok(())
    }

    /// Register a callback invoked with the new authentication state on
    /// every login/logout.
    pub fn on_change<F>(&self, cb: F)
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        if let Ok(mut obs) = self.observers.lock() {
            obs.push(Box::new(cb));
        }
    }

    fn notify(&self, authenticated: bool) {
        if let Ok(obs) = self.observers.lock() {
            for cb in obs.iter() {
                cb(authenticated);
            }
        }
    }
}
