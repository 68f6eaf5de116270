use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::model::ids::{ChunkKey, FileBucket};
use crate::model::metrics::{ChunkMetrics, accuracy};

/// Aggregated quiz performance for all chunks belonging to one file.
///
/// Built incrementally with `absorb`, then sealed with `finish`, which
/// computes the derived accuracy and most-recent-attempt fields.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRollup {
    pub file: FileBucket,
    /// Resolved display filename; absent means "unlabeled", never an error.
    pub filename: Option<String>,
    pub chunks: IndexMap<ChunkKey, ChunkMetrics>,
    pub total_attempts: u32,
    pub total_correct: u32,
    pub total_incorrect: u32,
    pub chunks_with_data: u32,
    pub accuracy: f64,
    pub last_attempt: Option<DateTime<Utc>>,
}

impl FileRollup {
    #[must_use]
    pub fn new(file: FileBucket, filename: Option<String>) -> Self {
        Self {
            file,
            filename,
            chunks: IndexMap::new(),
            total_attempts: 0,
            total_correct: 0,
            total_incorrect: 0,
            chunks_with_data: 0,
            accuracy: 0.0,
            last_attempt: None,
        }
    }

    /// Folds one chunk's metrics into the rollup totals.
    pub fn absorb(&mut self, key: ChunkKey, metrics: ChunkMetrics) {
        self.total_attempts = self.total_attempts.saturating_add(metrics.attempts);
        self.total_correct = self.total_correct.saturating_add(metrics.correct);
        self.total_incorrect = self.total_incorrect.saturating_add(metrics.incorrect);
        if metrics.attempts > 0 {
            self.chunks_with_data = self.chunks_with_data.saturating_add(1);
        }
        self.chunks.insert(key, metrics);
    }

    /// Computes the derived fields once every chunk has been absorbed.
    pub fn finish(&mut self) {
        self.accuracy = accuracy(self.total_correct, self.total_attempts);
        self.last_attempt = self
            .chunks
            .values()
            .filter_map(|m| m.last_attempt)
            .max();
    }
}
