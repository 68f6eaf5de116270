use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use analytics_core::model::{ChunkKey, ChunkRecord, FileId, resolved_filename};

/// Full persisted snapshot for one user scope.
///
/// Both containers default to empty, so snapshots written before either
/// field existed deserialize cleanly and operations never need presence
/// checks. `IndexMap` keeps ledger iteration in insertion order, which the
/// insight sorts rely on for stable tie-breaking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Registry of file identifier → original filename.
    #[serde(default)]
    pub file_mapping: IndexMap<FileId, String>,
    /// The chunk performance ledger.
    #[serde(default)]
    pub chunk_performance: IndexMap<ChunkKey, ChunkRecord>,
}

impl State {
    /// One-shot upgrade pass for legacy snapshots, run by stores at load time.
    ///
    /// Scrubs the historical `unknown_file` placeholder (and empty strings)
    /// down to a true absence, in both the ledger and the registry, so
    /// downstream fallback logic never mistakes a sentinel for a resolved
    /// filename.
    pub fn upgrade(&mut self) {
        for record in self.chunk_performance.values_mut() {
            record.filename = record
                .filename
                .take()
                .filter(|name| resolved_filename(Some(name)).is_some());
        }
        self.file_mapping
            .retain(|_, name| resolved_filename(Some(name)).is_some());
    }
}
