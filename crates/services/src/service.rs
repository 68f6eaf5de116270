use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::info;

use analytics_core::model::{ChunkKey, ChunkMetrics, ChunkRecord};
use analytics_core::time::Clock;
use storage::StateStore;

use crate::error::AnalyticsError;

/// Tracks a learner's quiz performance per content chunk and derives
/// per-file and overall views from it.
///
/// Every operation is one load → mutate → save bracket against the state
/// store, addressed by an optional username (`None` = the default scope).
/// There is no locking or versioning: concurrent writers to the same scope
/// are last-write-wins, by design.
pub struct AnalyticsService {
    pub(crate) store: Arc<dyn StateStore>,
    pub(crate) clock: Clock,
}

impl AnalyticsService {
    #[must_use]
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            clock: Clock::default(),
        }
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Current time according to the service's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Records one quiz answer against a chunk.
    ///
    /// Creates the ledger record on first use (seeding the source reference
    /// and filename from the call); on later calls the filename is only
    /// backfilled, never replaced. Increments `attempts` and exactly one of
    /// `correct`/`incorrect`, stamps the attempt time, and appends the
    /// question to the bounded history when `question_text` is non-empty.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Store` if the snapshot cannot be loaded or
    /// saved.
    pub fn record_answer(
        &self,
        user: Option<&str>,
        key: &ChunkKey,
        source_reference: &str,
        is_correct: bool,
        question_text: &str,
        filename: Option<&str>,
    ) -> Result<(), AnalyticsError> {
        let mut state = self.store.load(user)?;
        let now = self.clock.now();

        let record = state
            .chunk_performance
            .entry(key.clone())
            .or_insert_with(|| ChunkRecord::new(source_reference, filename));
        record.fill_filename(filename);
        record.record(is_correct, now);
        if !question_text.is_empty() {
            record.push_question(question_text, is_correct, now);
        }

        self.store.save(&state, user)?;
        info!(
            "recorded quiz answer for {key}: {}",
            if is_correct { "correct" } else { "incorrect" }
        );
        Ok(())
    }

    /// Performance metrics for one chunk; zeroed metrics when the key has
    /// never been seen.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Store` if the snapshot cannot be loaded.
    pub fn chunk_metrics(
        &self,
        user: Option<&str>,
        key: &ChunkKey,
    ) -> Result<ChunkMetrics, AnalyticsError> {
        let state = self.store.load(user)?;
        Ok(state
            .chunk_performance
            .get(key)
            .map(ChunkMetrics::from_record)
            .unwrap_or_default())
    }

    /// Performance metrics for every chunk in the ledger, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Store` if the snapshot cannot be loaded.
    pub fn all_metrics(
        &self,
        user: Option<&str>,
    ) -> Result<IndexMap<ChunkKey, ChunkMetrics>, AnalyticsError> {
        let state = self.store.load(user)?;
        Ok(state
            .chunk_performance
            .iter()
            .map(|(key, record)| (key.clone(), ChunkMetrics::from_record(record)))
            .collect())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use analytics_core::model::QUESTION_HISTORY_LIMIT;
    use analytics_core::time::{fixed_clock, fixed_now};
    use storage::InMemoryStore;

    fn service() -> (AnalyticsService, InMemoryStore) {
        let store = InMemoryStore::new();
        let service =
            AnalyticsService::new(Arc::new(store.clone())).with_clock(fixed_clock());
        (service, store)
    }

    #[test]
    fn answers_accumulate_with_attempt_invariant() {
        let (service, _) = service();
        let key = ChunkKey::new("abc12345_chunk_1");

        for i in 0..5 {
            service
                .record_answer(None, &key, "Chunk 1 - Intro", i < 3, "", None)
                .unwrap();
        }

        let metrics = service.chunk_metrics(None, &key).unwrap();
        assert_eq!(metrics.attempts, 5);
        assert_eq!(metrics.correct, 3);
        assert_eq!(metrics.incorrect, 2);
        assert_eq!(metrics.accuracy, 60.0);
        assert_eq!(metrics.source_reference, "Chunk 1 - Intro");
        assert_eq!(metrics.last_attempt, Some(fixed_now()));
    }

    #[test]
    fn accuracy_is_percentage_of_attempts() {
        let (service, _) = service();
        let key = ChunkKey::new("abc12345_chunk_2");

        for i in 0..4 {
            service
                .record_answer(None, &key, "ref", i < 3, "", None)
                .unwrap();
        }

        assert_eq!(service.chunk_metrics(None, &key).unwrap().accuracy, 75.0);
    }

    #[test]
    fn unknown_key_yields_zeroed_metrics() {
        let (service, store) = service();
        let metrics = service
            .chunk_metrics(None, &ChunkKey::new("never_seen"))
            .unwrap();
        assert_eq!(metrics, ChunkMetrics::default());
        assert_eq!(metrics.accuracy, 0.0);
        // A read never persists anything.
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn question_history_is_bounded_to_most_recent() {
        let (service, _) = service();
        let key = ChunkKey::new("abc12345_chunk_3");

        for i in 0..15 {
            service
                .record_answer(None, &key, "ref", true, &format!("question {i}"), None)
                .unwrap();
        }

        let state = service.store.load(None).unwrap();
        let record = &state.chunk_performance[&key];
        assert_eq!(record.questions.len(), QUESTION_HISTORY_LIMIT);
        assert_eq!(record.questions[0].question, "question 5");
        assert_eq!(record.questions[9].question, "question 14");
    }

    #[test]
    fn empty_question_text_is_not_recorded() {
        let (service, _) = service();
        let key = ChunkKey::new("abc12345_chunk_4");
        service
            .record_answer(None, &key, "ref", true, "", None)
            .unwrap();

        let state = service.store.load(None).unwrap();
        assert!(state.chunk_performance[&key].questions.is_empty());
    }

    #[test]
    fn filename_backfills_on_later_answers_but_never_overwrites() {
        let (service, _) = service();
        let key = ChunkKey::new("abc12345_chunk_5");

        service
            .record_answer(None, &key, "ref", true, "", None)
            .unwrap();
        service
            .record_answer(None, &key, "ref", false, "", Some("doc.pdf"))
            .unwrap();
        service
            .record_answer(None, &key, "ref", true, "", Some("other.pdf"))
            .unwrap();

        let metrics = service.chunk_metrics(None, &key).unwrap();
        assert_eq!(metrics.filename.as_deref(), Some("doc.pdf"));
    }

    #[test]
    fn every_answer_persists_the_snapshot() {
        let (service, store) = service();
        let key = ChunkKey::new("abc12345_chunk_6");
        service
            .record_answer(None, &key, "ref", true, "", None)
            .unwrap();
        service
            .record_answer(None, &key, "ref", false, "", None)
            .unwrap();
        assert_eq!(store.save_count(), 2);
    }

    #[test]
    fn all_metrics_projects_every_ledger_entry() {
        let (service, _) = service();
        service
            .record_answer(None, &ChunkKey::new("a_chunk_1"), "A", true, "", None)
            .unwrap();
        service
            .record_answer(None, &ChunkKey::new("b_chunk_1"), "B", false, "", None)
            .unwrap();

        let all = service.all_metrics(None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[&ChunkKey::new("a_chunk_1")].accuracy, 100.0);
        assert_eq!(all[&ChunkKey::new("b_chunk_1")].accuracy, 0.0);
    }

    #[test]
    fn ledgers_are_scoped_per_user() {
        let (service, _) = service();
        let key = ChunkKey::new("abc12345_chunk_7");

        service
            .record_answer(Some("alice"), &key, "ref", true, "", None)
            .unwrap();

        assert_eq!(
            service.chunk_metrics(Some("alice"), &key).unwrap().attempts,
            1
        );
        assert_eq!(service.chunk_metrics(None, &key).unwrap().attempts, 0);
        assert_eq!(
            service.chunk_metrics(Some("bob"), &key).unwrap().attempts,
            0
        );
    }
}
