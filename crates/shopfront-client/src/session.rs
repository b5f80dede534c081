//! # Session Persistence
//!
//! Where the login session ([`UserAuth`]) survives restarts.
//!
//! ```text
//! AuthStore ──set_token/set_user/logout──► SessionStore
//!                                            ├── FileSessionStore   user_data.json
//!                                            └── MemorySessionStore (tests, ephemeral)
//! ```

use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use shopfront_core::UserAuth;
use tracing::debug;

use crate::error::{ClientError, ClientResult};

/// Load/save of the persisted session.
pub trait SessionStore: Send + Sync {
    /// Returns the stored session, or an empty one when nothing is stored.
    fn load(&self) -> ClientResult<UserAuth>;

    fn save(&self, auth: &UserAuth) -> ClientResult<()>;
}

// =============================================================================
// File Store
// =============================================================================

/// Session kept as pretty JSON on disk.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSessionStore { path: path.into() }
    }

    /// `user_data.json` in the platform data directory.
    pub fn default_location() -> ClientResult<Self> {
        directories::ProjectDirs::from("com", "shopfront", "client")
            .map(|dirs| Self::new(dirs.data_dir().join("user_data.json")))
            .ok_or_else(|| ClientError::SessionFailed("No data directory available".into()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> ClientResult<UserAuth> {
        if !self.path.exists() {
            return Ok(UserAuth::default());
        }

        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| ClientError::SessionFailed(e.to_string()))?;
        if contents.trim().is_empty() {
            return Ok(UserAuth::default());
        }

        serde_json::from_str(&contents).map_err(|e| ClientError::SessionFailed(e.to_string()))
    }

    fn save(&self, auth: &UserAuth) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClientError::SessionFailed(e.to_string()))?;
        }

        let contents = serde_json::to_string_pretty(auth)
            .map_err(|e| ClientError::SessionFailed(e.to_string()))?;
        std::fs::write(&self.path, contents)
            .map_err(|e| ClientError::SessionFailed(e.to_string()))?;

        debug!(path = ?self.path, "Session saved");
        Ok(())
    }
}

// =============================================================================
// Memory Store
// =============================================================================

/// Session held in memory only.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    auth: RwLock<UserAuth>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_auth(auth: UserAuth) -> Self {
        MemorySessionStore {
            auth: RwLock::new(auth),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> ClientResult<UserAuth> {
        Ok(self.auth.read().clone())
    }

    fn save(&self, auth: &UserAuth) -> ClientResult<()> {
        *self.auth.write() = auth.clone();
        Ok(())
    }
}
