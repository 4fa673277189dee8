//! Versioned access to a stored config.
//!
//! A [`Snapshot`] pairs a config with the [`VersionToken`] it was read at.
//! Committing with a stale token fails with [`SnapshotError::Conflict`], so
//! two writers that read the same version cannot both win.

use crate::object::ConfigObject;
use std::fmt;
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

/// Opaque version of a stored config, such as an HTTP ETag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub version: VersionToken,
    pub config: ConfigObject,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("No snapshot exists")]
    NotExists,

    #[error("Snapshot store unavailable: {message}")]
    Unavailable { message: String },

    #[error("Commit at version {expected} conflicts with current version {current}")]
    Conflict {
        expected: VersionToken,
        current: VersionToken,
    },
}

pub trait SnapshotStore {
    /// The current config and its version.
    fn snapshot(&self) -> Result<Snapshot, SnapshotError>;

    /// Replaces the stored config if it is still at `version`, returning the
    /// new version.
    fn commit(&self, version: &VersionToken, config: ConfigObject)
    -> Result<VersionToken, SnapshotError>;
}

#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    state: Mutex<Option<Stored>>,
}

#[derive(Debug)]
struct Stored {
    counter: u64,
    config: ConfigObject,
}

impl Stored {
    fn version(&self) -> VersionToken {
        VersionToken(self.counter.to_string())
    }
}

impl MemorySnapshotStore {
    /// An empty store; [`SnapshotStore::snapshot`] fails until [`Self::init`].
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ConfigObject) -> Self {
        Self {
            state: Mutex::new(Some(Stored { counter: 1, config })),
        }
    }

    /// Stores `config` unconditionally and returns its version.
    pub fn init(&self, config: ConfigObject) -> Result<VersionToken, SnapshotError> {
        let mut state = self.lock()?;
        let counter = state.as_ref().map_or(1, |s| s.counter + 1);
        let stored = state.insert(Stored { counter, config });
        Ok(stored.version())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<Stored>>, SnapshotError> {
        self.state.lock().map_err(|e| SnapshotError::Unavailable {
            message: e.to_string(),
        })
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn snapshot(&self) -> Result<Snapshot, SnapshotError> {
        let state = self.lock()?;
        let stored = state.as_ref().ok_or(SnapshotError::NotExists)?;
        Ok(Snapshot {
            version: stored.version(),
            config: stored.config.clone(),
        })
    }

    fn commit(
        &self,
        version: &VersionToken,
        config: ConfigObject,
    ) -> Result<VersionToken, SnapshotError> {
        let mut state = self.lock()?;
        let stored = state.as_mut().ok_or(SnapshotError::NotExists)?;
        let current = stored.version();
        if &current != version {
            warn!(expected = %version, %current, "snapshot commit conflict");
            return Err(SnapshotError::Conflict {
                expected: version.clone(),
                current,
            });
        }
        stored.counter += 1;
        stored.config = config;
        let next = stored.version();
        debug!(version = %next, "committed snapshot");
        Ok(next)
    }
}
