use indexmap::IndexMap;
use indexmap::map::Entry;
use tracing::info;

use analytics_core::model::{
    ChunkKey, ChunkMetrics, FileBucket, FileRollup, resolved_filename,
};

use crate::error::AnalyticsError;
use crate::service::AnalyticsService;

impl AnalyticsService {
    /// Groups chunk metrics into per-file rollups.
    ///
    /// Filenames may be missing from old data for several independent
    /// reasons (never registered, record predates the filename field,
    /// registry entry predates a later-known filename), so each rollup's
    /// filename is resolved from the metrics' own filename first, then from
    /// a registry lookup. A filename discovered in chunk data that the
    /// registry lacks is written back, which is how historical data
    /// self-heals through normal read traffic.
    ///
    /// Runs the registry backfill first, and batches any write-back
    /// registrations into a single save at the end.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Store` if the snapshot cannot be loaded or
    /// saved.
    pub fn group_by_file(
        &self,
        user: Option<&str>,
        all_metrics: &IndexMap<ChunkKey, ChunkMetrics>,
    ) -> Result<IndexMap<FileBucket, FileRollup>, AnalyticsError> {
        self.backfill_file_mapping(user)?;

        let mut state = self.store.load(user)?;
        let mut dirty = false;
        let mut rollups: IndexMap<FileBucket, FileRollup> = IndexMap::new();

        for (key, metrics) in all_metrics {
            let bucket = key.file_bucket();

            let rollup = match rollups.entry(bucket.clone()) {
                Entry::Vacant(slot) => {
                    let filename = resolved_filename(metrics.filename.as_deref())
                        .map(str::to_string)
                        .or_else(|| {
                            bucket
                                .file_id()
                                .and_then(|id| state.file_mapping.get(id).cloned())
                        });
                    slot.insert(FileRollup::new(bucket.clone(), filename))
                }
                Entry::Occupied(slot) => {
                    let rollup = slot.into_mut();
                    if rollup.filename.is_none() {
                        if let Some(filename) = resolved_filename(metrics.filename.as_deref()) {
                            rollup.filename = Some(filename.to_string());
                            // The ledger knew a filename the registry did not.
                            if let FileBucket::File(file_id) = &bucket {
                                if !state.file_mapping.contains_key(file_id) {
                                    state
                                        .file_mapping
                                        .insert(file_id.clone(), filename.to_string());
                                    dirty = true;
                                    info!(
                                        "registered file from chunk data: {filename} -> {file_id}"
                                    );
                                }
                            }
                        } else if let Some(mapped) = bucket
                            .file_id()
                            .and_then(|id| state.file_mapping.get(id))
                        {
                            rollup.filename = Some(mapped.clone());
                        }
                    }
                    rollup
                }
            };

            rollup.absorb(key.clone(), metrics.clone());
        }

        for rollup in rollups.values_mut() {
            rollup.finish();
        }

        if dirty {
            self.store.save(&state, user)?;
        }
        Ok(rollups)
    }

    /// Convenience: project the whole ledger and group it by file.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Store` if the snapshot cannot be loaded or
    /// saved.
    pub fn file_rollups(
        &self,
        user: Option<&str>,
    ) -> Result<IndexMap<FileBucket, FileRollup>, AnalyticsError> {
        let all = self.all_metrics(user)?;
        self.group_by_file(user, &all)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use analytics_core::model::{ChunkNumber, FileId};
    use analytics_core::time::fixed_clock;
    use std::sync::Arc;
    use storage::{InMemoryStore, StateStore};

    fn service() -> (AnalyticsService, InMemoryStore) {
        let store = InMemoryStore::new();
        let service =
            AnalyticsService::new(Arc::new(store.clone())).with_clock(fixed_clock());
        (service, store)
    }

    fn answer(
        service: &AnalyticsService,
        key: &ChunkKey,
        correct: bool,
        filename: Option<&str>,
    ) {
        service
            .record_answer(None, key, "ref", correct, "", filename)
            .unwrap();
    }

    #[test]
    fn rollups_partition_the_ledger() {
        let (service, _) = service();
        let doc = FileId::from_filename("doc.pdf");
        let other = FileId::from_filename("other.pdf");

        answer(&service, &ChunkKey::indexed(&doc, ChunkNumber::Numbered(1)), true, None);
        answer(&service, &ChunkKey::indexed(&doc, ChunkNumber::Numbered(2)), false, None);
        answer(&service, &ChunkKey::indexed(&other, ChunkNumber::Numbered(1)), true, None);
        answer(&service, &ChunkKey::new("legacy_slug_key"), false, None);

        let rollups = service.file_rollups(None).unwrap();
        assert_eq!(rollups.len(), 3);

        let total_attempts: u32 = rollups.values().map(|r| r.total_attempts).sum();
        assert_eq!(total_attempts, 4);
        let total_chunks: usize = rollups.values().map(|r| r.chunks.len()).sum();
        assert_eq!(total_chunks, 4);

        let doc_rollup = &rollups[&FileBucket::File(doc)];
        assert_eq!(doc_rollup.chunks.len(), 2);
        assert_eq!(doc_rollup.total_attempts, 2);
        assert_eq!(doc_rollup.accuracy, 50.0);

        let unknown = &rollups[&FileBucket::Unknown];
        assert_eq!(unknown.chunks.len(), 1);
        assert!(unknown.chunks.contains_key(&ChunkKey::new("legacy_slug_key")));
    }

    #[test]
    fn filename_resolves_from_chunk_data_first() {
        let (service, _) = service();
        let doc = FileId::from_filename("doc.pdf");
        answer(
            &service,
            &ChunkKey::indexed(&doc, ChunkNumber::Numbered(1)),
            true,
            Some("doc.pdf"),
        );

        let rollups = service.file_rollups(None).unwrap();
        let rollup = &rollups[&FileBucket::File(doc)];
        assert_eq!(rollup.filename.as_deref(), Some("doc.pdf"));
    }

    #[test]
    fn filename_falls_back_to_the_registry() {
        let (service, _) = service();
        let doc = service.register_file(None, "doc.pdf").unwrap();
        // Record carries no filename of its own.
        answer(&service, &ChunkKey::indexed(&doc, ChunkNumber::Numbered(1)), true, None);

        let rollups = service.file_rollups(None).unwrap();
        let rollup = &rollups[&FileBucket::File(doc)];
        assert_eq!(rollup.filename.as_deref(), Some("doc.pdf"));
    }

    #[test]
    fn grouping_converges_registry_from_ledger_filenames() {
        let (service, store) = service();
        let doc = FileId::from_filename("doc.pdf");
        answer(
            &service,
            &ChunkKey::indexed(&doc, ChunkNumber::Numbered(1)),
            true,
            Some("doc.pdf"),
        );

        // No registration ever happened, yet one grouping pass is enough for
        // the registry to learn the filename.
        assert!(store.load(None).unwrap().file_mapping.is_empty());
        service.file_rollups(None).unwrap();

        let state = store.load(None).unwrap();
        assert_eq!(state.file_mapping[&doc], "doc.pdf");
    }

    #[test]
    fn later_chunk_fills_a_rollup_seeded_without_filename() {
        let (service, _) = service();
        let doc = FileId::from_filename("doc.pdf");
        // First chunk has no filename; the second one does.
        answer(&service, &ChunkKey::indexed(&doc, ChunkNumber::Numbered(1)), true, None);
        answer(
            &service,
            &ChunkKey::indexed(&doc, ChunkNumber::Numbered(2)),
            false,
            Some("doc.pdf"),
        );

        let rollups = service.file_rollups(None).unwrap();
        let rollup = &rollups[&FileBucket::File(doc)];
        assert_eq!(rollup.filename.as_deref(), Some("doc.pdf"));
    }

    #[test]
    fn write_back_registers_filenames_seen_only_in_metrics() {
        let (service, store) = service();
        let doc = FileId::from_filename("doc.pdf");

        // Metrics supplied by the caller, not read back from the ledger, so
        // the backfill pass has nothing to work with.
        let mut all = IndexMap::new();
        all.insert(
            ChunkKey::indexed(&doc, ChunkNumber::Numbered(1)),
            ChunkMetrics::default(),
        );
        all.insert(
            ChunkKey::indexed(&doc, ChunkNumber::Numbered(2)),
            ChunkMetrics {
                filename: Some("doc.pdf".to_string()),
                ..ChunkMetrics::default()
            },
        );

        let rollups = service.group_by_file(None, &all).unwrap();
        assert_eq!(
            rollups[&FileBucket::File(doc.clone())].filename.as_deref(),
            Some("doc.pdf")
        );

        // The discovery was written back into the registry, in one save.
        let state = store.load(None).unwrap();
        assert_eq!(state.file_mapping[&doc], "doc.pdf");
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn unlabeled_rollups_stay_unlabeled() {
        let (service, _) = service();
        answer(&service, &ChunkKey::new("mystery_chunk_9"), true, None);

        let rollups = service.file_rollups(None).unwrap();
        let rollup = &rollups[&FileBucket::File(FileId::new("mystery"))];
        assert_eq!(rollup.filename, None);
    }

    #[test]
    fn empty_ledger_groups_to_nothing() {
        let (service, _) = service();
        assert!(service.file_rollups(None).unwrap().is_empty());
    }
}
