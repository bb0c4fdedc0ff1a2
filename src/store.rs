//! State persistence behind a small key-value style interface.
//!
//! [`FileStore`] keeps one JSON snapshot per storage key and replaces it with
//! a [`tempfile::NamedTempFile`] written in the same directory and then
//! renamed over the old file, so a crash mid-write leaves the previous
//! snapshot intact.
//!
//! Saving is best-effort: [`save_best_effort`] logs and swallows failures.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::state::AppState;

/// Storage key used when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "contractAppState";

/// Durable home for the session state.
pub trait StateStore {
    fn save(&self, state: &AppState) -> Result<()>;

    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<AppState>>;
}

/// Save, logging instead of failing.
pub fn save_best_effort(store: &dyn StateStore, state: &AppState) {
    if let Err(e) = store.save(state) {
        warn!(error = %e, "could not persist state");
    }
}

/// Load, treating unreadable or corrupt snapshots as absent.
pub fn load_best_effort(store: &dyn StateStore) -> Option<AppState> {
    match store.load() {
        Ok(state) => state,
        Err(e) => {
            warn!(error = %e, "could not load persisted state");
            None
        }
    }
}

/// JSON snapshots under a directory, one file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    key: String,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            key: key.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.key))
    }
}

impl StateStore for FileStore {
    fn save(&self, state: &AppState) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create state dir {}", self.dir.display()))?;
        let json = serde_json::to_vec(state).context("failed to serialize state")?;
        atomic_write(&self.path(), &json)?;
        debug!(path = %self.path().display(), bytes = json.len(), "state saved");
        Ok(())
    }

    fn load(&self) -> Result<Option<AppState>> {
        let path = self.path();
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()));
            }
        };
        let state = serde_json::from_slice(&bytes)
            .with_context(|| format!("corrupt state snapshot {}", path.display()))?;
        Ok(Some(state))
    }
}

/// Volatile store for tests and headless use.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn save(&self, state: &AppState) -> Result<()> {
        let json = serde_json::to_string(state).context("failed to serialize state")?;
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        *slot = Some(json);
        Ok(())
    }

    fn load(&self) -> Result<Option<AppState>> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        slot.as_deref()
            .map(serde_json::from_str)
            .transpose()
            .context("corrupt in-memory snapshot")
    }
}

/// Atomically write `content` to `path` (temp file in the same directory, then rename).
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("no parent directory for {}", path.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temp file in {}", parent.display()))?;

    tmp.write_all(content)
        .with_context(|| format!("failed to write temp file for {}", path.display()))?;
    tmp.flush()
        .with_context(|| format!("failed to flush temp file for {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("failed to replace {}", path.display()))?;

    Ok(())
}
