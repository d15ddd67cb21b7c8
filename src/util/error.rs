//! Error types for equipmatch.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias for equipmatch operations.
pub type EquipMatchResult<T> = std::result::Result<T, EquipMatchError>;

/// Errors that can occur while building buffers, loading a template library,
/// or running a detection batch.
///
/// Per-template and per-category failures are not represented here: the
/// correlation engine folds them into [`crate::SkipReason`] values instead.
#[derive(Debug, Error)]
pub enum EquipMatchError {
    /// Width or height is zero, or the pixel count overflows.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Stride is smaller than the row width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// Backing buffer is shorter than the view requires.
    #[error("buffer too small: needed {needed} elements, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Template does not fit inside the image in at least one dimension.
    #[error(
        "template {tpl_width}x{tpl_height} does not fit image {img_width}x{img_height}"
    )]
    TemplateLargerThanImage {
        tpl_width: usize,
        tpl_height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// The template has no intensity variation, so correlation is undefined.
    #[error("degenerate template: {reason}")]
    DegenerateTemplate { reason: &'static str },
    /// Detection threshold is outside `[-1, 1]` or not finite.
    #[error("invalid threshold {value}: expected a value in [-1, 1]")]
    InvalidThreshold { value: f64 },
    /// Template directory exists but could not be read.
    #[error("failed to read template directory {}: {source}", path.display())]
    LibraryDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// An image file could not be opened or decoded.
    #[error("image i/o error: {reason}")]
    ImageIo { reason: String },
    /// A batch holds more probe images than the caller allows.
    #[error("batch of {len} images exceeds the limit of {max}")]
    BatchTooLarge { len: usize, max: usize },
    /// The batch was cancelled between two probe images.
    #[error("detection cancelled after {completed} images")]
    Cancelled { completed: usize },
}
