//! Shared error types for the services crate.

use thiserror::Error;

use storage::StoreError;

/// Errors emitted by `AnalyticsService`.
///
/// The analytics logic itself degrades gracefully (zeroed metrics, absent
/// filenames, synthetic buckets); the only failure surface is the state
/// store, whose errors propagate unchanged.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnalyticsError {
    #[error(transparent)]
    Store(#[from] StoreError),
}
