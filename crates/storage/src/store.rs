use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::state::State;

/// Scope name used when no username is given.
pub const DEFAULT_SCOPE: &str = "default";

/// Errors surfaced by state stores.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Snapshot persistence boundary.
///
/// `load` returns the full snapshot for a scope (an empty default when none
/// was ever saved), already upgraded; `save` fully overwrites it. Callers
/// bracket each logical operation as load → mutate → save; concurrent
/// writers to the same scope are last-write-wins.
pub trait StateStore: Send + Sync {
    /// Loads the snapshot for the given user scope.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the snapshot cannot be read or decoded.
    fn load(&self, user: Option<&str>) -> Result<State, StoreError>;

    /// Overwrites the persisted snapshot for the given user scope.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the snapshot cannot be encoded or written.
    fn save(&self, state: &State, user: Option<&str>) -> Result<(), StoreError>;
}

fn scope_name(user: Option<&str>) -> String {
    match user {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => DEFAULT_SCOPE.to_string(),
    }
}

//
// ─── IN-MEMORY STORE ───────────────────────────────────────────────────────────
//

/// Simple in-memory store for tests and prototyping.
///
/// Counts save calls so tests can assert write batching and idempotency.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    snapshots: Arc<Mutex<HashMap<String, State>>>,
    saves: Arc<AtomicUsize>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of save calls observed, across all scopes.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl StateStore for InMemoryStore {
    fn load(&self, user: Option<&str>) -> Result<State, StoreError> {
        let guard = self
            .snapshots
            .lock()
            .map_err(|e| StoreError::Io(e.to_string()))?;
        let mut state = guard.get(&scope_name(user)).cloned().unwrap_or_default();
        state.upgrade();
        Ok(state)
    }

    fn save(&self, state: &State, user: Option<&str>) -> Result<(), StoreError> {
        let mut guard = self
            .snapshots
            .lock()
            .map_err(|e| StoreError::Io(e.to_string()))?;
        guard.insert(scope_name(user), state.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

//
// ─── JSON FILE STORE ───────────────────────────────────────────────────────────
//

/// One pretty-printed JSON snapshot file per scope under a base directory.
///
/// A missing file loads as the default (empty) state; usernames are folded
/// to filesystem-safe characters when choosing the file name.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, user: Option<&str>) -> PathBuf {
        let scope: String = scope_name(user)
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{scope}.json"))
    }
}

impl StateStore for JsonFileStore {
    fn load(&self, user: Option<&str>) -> Result<State, StoreError> {
        let path = self.path_for(user);
        if !path.exists() {
            return Ok(State::default());
        }
        let raw = fs::read_to_string(&path).map_err(|e| StoreError::Io(e.to_string()))?;
        let mut state: State =
            serde_json::from_str(&raw).map_err(|e| StoreError::Serialization(e.to_string()))?;
        state.upgrade();
        Ok(state)
    }

    fn save(&self, state: &State, user: Option<&str>) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::Io(e.to_string()))?;
        let encoded = serde_json::to_string_pretty(state)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        fs::write(self.path_for(user), encoded).map_err(|e| StoreError::Io(e.to_string()))
    }
}
