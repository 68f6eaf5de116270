use tracing::info;

use analytics_core::model::{FileBucket, FileId, resolved_filename};

use crate::error::AnalyticsError;
use crate::service::AnalyticsService;

impl AnalyticsService {
    /// Registers a file, mapping its derived identifier to the filename.
    ///
    /// Idempotent: re-registering the same filename returns the same
    /// identifier without a second persisted write or event.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Store` if the snapshot cannot be loaded or
    /// saved.
    pub fn register_file(
        &self,
        user: Option<&str>,
        filename: &str,
    ) -> Result<FileId, AnalyticsError> {
        let file_id = FileId::from_filename(filename);
        let mut state = self.store.load(user)?;

        if !state.file_mapping.contains_key(&file_id) {
            state
                .file_mapping
                .insert(file_id.clone(), filename.to_string());
            self.store.save(&state, user)?;
            info!("registered file: {filename} -> {file_id}");
        }

        Ok(file_id)
    }

    /// Recovers registry entries from ledger records written before file
    /// registration existed.
    ///
    /// Scans every chunk record; any whose key carries a file identifier and
    /// whose filename is known registers that identifier if it is missing.
    /// Saves once at the end, and only when something was added. Returns the
    /// number of entries backfilled.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Store` if the snapshot cannot be loaded or
    /// saved.
    pub fn backfill_file_mapping(&self, user: Option<&str>) -> Result<usize, AnalyticsError> {
        let mut state = self.store.load(user)?;

        let mut backfilled = 0_usize;
        for (key, record) in &state.chunk_performance {
            let Some(filename) = resolved_filename(record.filename.as_deref()) else {
                continue;
            };
            let FileBucket::File(file_id) = key.file_bucket() else {
                continue;
            };
            if state.file_mapping.contains_key(&file_id) {
                continue;
            }
            info!("backfilled file mapping: {filename} -> {file_id}");
            state.file_mapping.insert(file_id, filename.to_string());
            backfilled += 1;
        }

        if backfilled > 0 {
            self.store.save(&state, user)?;
        }
        Ok(backfilled)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
