//! Category-grouped detection.
//!
//! The [`CorrelationEngine`] scores one template, the [`CategoryMatcher`]
//! keeps the best template of a category and applies the threshold, and the
//! [`BatchDetector`] runs every category against every probe of a batch.

pub mod attempt;
pub mod batch;
pub mod category;
pub mod result;

pub use attempt::{CorrelationEngine, MatchAttempt, SkipReason};
pub use batch::{ensure_batch_size, BatchDetector, DetectConfig, DEFAULT_THRESHOLD};
pub use category::CategoryMatcher;
pub use result::{BoundingRegion, CategoryDecision, DetectionResult, TemplateMatch};
