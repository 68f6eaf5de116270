#![forbid(unsafe_code)]

mod aggregator;
mod insights;
mod registry;
mod service;

pub mod error;

pub use analytics_core::Clock;
pub use error::AnalyticsError;
pub use insights::{
    MIN_ATTEMPTS_FOR_INSIGHT, STRONG_ACCURACY_THRESHOLD, WEAK_ACCURACY_THRESHOLD,
};
pub use service::AnalyticsService;
