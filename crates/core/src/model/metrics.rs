use chrono::{DateTime, Utc};

use crate::model::chunk::ChunkRecord;
use crate::model::ids::ChunkKey;

/// Percentage of correct answers. Zero attempts short-circuit to `0.0`
/// rather than dividing.
#[must_use]
pub fn accuracy(correct: u32, attempts: u32) -> f64 {
    if attempts == 0 {
        return 0.0;
    }
    f64::from(correct) / f64::from(attempts) * 100.0
}

//
// ─── CHUNK METRICS ─────────────────────────────────────────────────────────────
//

/// Read-side projection of a `ChunkRecord`.
///
/// The zeroed default is what callers get for keys the ledger has never seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkMetrics {
    pub correct: u32,
    pub incorrect: u32,
    pub attempts: u32,
    pub accuracy: f64,
    pub source_reference: String,
    pub filename: Option<String>,
    pub last_attempt: Option<DateTime<Utc>>,
}

impl ChunkMetrics {
    #[must_use]
    pub fn from_record(record: &ChunkRecord) -> Self {
        Self {
            correct: record.correct,
            incorrect: record.incorrect,
            attempts: record.attempts,
            accuracy: record.accuracy(),
            source_reference: record.source_reference.clone(),
            filename: record.filename.clone(),
            last_attempt: record.last_attempt,
        }
    }
}

//
// ─── AREA REPORT ───────────────────────────────────────────────────────────────
//

/// One row in a weak-area or strong-area listing.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaReport {
    pub key: ChunkKey,
    pub source_reference: String,
    pub accuracy: f64,
    pub correct: u32,
    pub incorrect: u32,
    pub attempts: u32,
    pub last_attempt: Option<DateTime<Utc>>,
}

impl AreaReport {
    #[must_use]
    pub fn from_metrics(key: ChunkKey, metrics: &ChunkMetrics) -> Self {
        Self {
            key,
            source_reference: metrics.source_reference.clone(),
            accuracy: metrics.accuracy,
            correct: metrics.correct,
            incorrect: metrics.incorrect,
            attempts: metrics.attempts,
            last_attempt: metrics.last_attempt,
        }
    }
}

//
// ─── PERFORMANCE SUMMARY ───────────────────────────────────────────────────────
//

/// Grand totals across every chunk in the ledger.
///
/// `overall_accuracy` is computed over the grand totals, not as an average of
/// per-chunk accuracies. All-zero when the ledger is empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceSummary {
    pub total_chunks: usize,
    pub total_attempts: u32,
    pub total_correct: u32,
    pub total_incorrect: u32,
    pub overall_accuracy: f64,
    pub chunks_with_data: usize,
}

impl PerformanceSummary {
    /// Folds chunk metrics into grand totals.
    #[must_use]
    pub fn from_metrics<'a, I>(metrics: I) -> Self
    where
        I: IntoIterator<Item = &'a ChunkMetrics>,
    {
        let mut summary = Self::default();
        for m in metrics {
            summary.total_chunks += 1;
            summary.total_attempts = summary.total_attempts.saturating_add(m.attempts);
            summary.total_correct = summary.total_correct.saturating_add(m.correct);
            summary.total_incorrect = summary.total_incorrect.saturating_add(m.incorrect);
            if m.attempts > 0 {
                summary.chunks_with_data += 1;
            }
        }
        summary.overall_accuracy = accuracy(summary.total_correct, summary.total_attempts);
        summary
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
