use analytics_core::model::{AreaReport, PerformanceSummary};

use crate::error::AnalyticsError;
use crate::service::AnalyticsService;

/// Accuracy below this marks a weak area.
pub const WEAK_ACCURACY_THRESHOLD: f64 = 60.0;

/// Accuracy at or above this marks a strong area.
pub const STRONG_ACCURACY_THRESHOLD: f64 = 80.0;

/// Chunks with fewer attempts than this are too noisy to classify.
pub const MIN_ATTEMPTS_FOR_INSIGHT: u32 = 2;

impl AnalyticsService {
    /// Weak areas under the default threshold, worst first.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Store` if the snapshot cannot be loaded.
    pub fn weak_areas(&self, user: Option<&str>) -> Result<Vec<AreaReport>, AnalyticsError> {
        self.weak_areas_with(user, WEAK_ACCURACY_THRESHOLD, MIN_ATTEMPTS_FOR_INSIGHT)
    }

    /// Chunks with at least `min_attempts` attempts and accuracy strictly
    /// below `threshold`, sorted ascending by accuracy (worst first). The
    /// sort is stable: ties keep ledger insertion order.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Store` if the snapshot cannot be loaded.
    pub fn weak_areas_with(
        &self,
        user: Option<&str>,
        threshold: f64,
        min_attempts: u32,
    ) -> Result<Vec<AreaReport>, AnalyticsError> {
        let all = self.all_metrics(user)?;
        let mut areas: Vec<AreaReport> = all
            .iter()
            .filter(|(_, m)| m.attempts >= min_attempts && m.accuracy < threshold)
            .map(|(key, m)| AreaReport::from_metrics(key.clone(), m))
            .collect();
        areas.sort_by(|a, b| a.accuracy.total_cmp(&b.accuracy));
        Ok(areas)
    }

    /// Strong areas over the default threshold, best first.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Store` if the snapshot cannot be loaded.
    pub fn strong_areas(&self, user: Option<&str>) -> Result<Vec<AreaReport>, AnalyticsError> {
        self.strong_areas_with(user, STRONG_ACCURACY_THRESHOLD, MIN_ATTEMPTS_FOR_INSIGHT)
    }

    /// Chunks with at least `min_attempts` attempts and accuracy at or above
    /// `threshold`, sorted descending by accuracy (best first), stable.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Store` if the snapshot cannot be loaded.
    pub fn strong_areas_with(
        &self,
        user: Option<&str>,
        threshold: f64,
        min_attempts: u32,
    ) -> Result<Vec<AreaReport>, AnalyticsError> {
        let all = self.all_metrics(user)?;
        let mut areas: Vec<AreaReport> = all
            .iter()
            .filter(|(_, m)| m.attempts >= min_attempts && m.accuracy >= threshold)
            .map(|(key, m)| AreaReport::from_metrics(key.clone(), m))
            .collect();
        areas.sort_by(|a, b| b.accuracy.total_cmp(&a.accuracy));
        Ok(areas)
    }

    /// Grand totals across the whole ledger; all-zero when it is empty.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Store` if the snapshot cannot be loaded.
    pub fn performance_summary(
        &self,
        user: Option<&str>,
    ) -> Result<PerformanceSummary, AnalyticsError> {
        let all = self.all_metrics(user)?;
        Ok(PerformanceSummary::from_metrics(all.values()))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
