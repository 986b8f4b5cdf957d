//! Core engine: rate limiting, resilient calls, progress, collection and
//! run orchestration.
//!
//! One [`RateLimiter`] may be shared across runs; each run gets its own
//! [`ProgressTracker`] and cancellation token via [`RequestExecutor`].

pub mod analysis;
pub mod collector;
pub mod executor;
pub mod limiter;
pub mod progress;

pub use analysis::{
    AnalysisError, AnalysisOptions, AnalysisReport, Analyzer, FailedPlayer, FailurePolicy,
    ReportMeta,
};
pub use collector::Collector;
pub use executor::{Outcome, RequestError, RequestExecutor, RetryPolicy};
pub use limiter::{RateLimiter, RateWindow};
pub use progress::{ProgressSnapshot, ProgressTracker};
