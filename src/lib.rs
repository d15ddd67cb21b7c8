//! Equipmatch decides which equipment categories are visible in a photograph.
//!
//! A [`TemplateLibrary`] holds grayscale reference images grouped into
//! categories by name prefix (`aed_front` belongs to `aed`). For every probe
//! image the [`BatchDetector`] scores each template with zero-mean normalized
//! cross-correlation, keeps the best template per category, and reports a
//! [`CategoryDecision`] with a bounding region for detected categories. The
//! optional [`Annotator`] (feature `annotate`) draws those regions.
//!
//! Parallel scans are available with the `rayon` feature and structured
//! spans with the `tracing` feature.

#[cfg(feature = "annotate")]
pub mod annotate;
pub mod detect;
pub mod image;
pub mod kernel;
pub mod library;
pub mod template;
mod trace;
pub mod util;

#[cfg(feature = "annotate")]
pub use annotate::{AnnotateStyle, Annotator};
pub use detect::{
    ensure_batch_size, BatchDetector, BoundingRegion, CategoryDecision, CategoryMatcher,
    CorrelationEngine, DetectConfig, DetectionResult, MatchAttempt, SkipReason, TemplateMatch,
    DEFAULT_THRESHOLD,
};
pub use crate::image::{ImageView, OwnedImage, ProbeImage};
pub use library::{LoadReport, SharedLibrary, TemplateLibrary};
pub use template::{category_of, ReferenceImage};
pub use util::{EquipMatchError, EquipMatchResult};
