//! Correlation kernels for template-versus-probe scans.
//!
//! A kernel is prepared once per probe and template, then supplies two
//! primitives for one placement of the template: the window intensity sums and
//! the cross term `sum(t' * I)`. The scan drivers in this module turn those
//! into ZNCC scores and locate the global maximum of the score surface.

use crate::image::integral::WindowSums;
use crate::image::{ImageView, IntegralImage};
use crate::template::TemplatePlan;
use crate::util::{EquipMatchError, EquipMatchResult};
use std::sync::OnceLock;

pub mod fft;
pub mod integral;
#[cfg(feature = "rayon")]
pub mod rayon;
pub mod scalar;

pub use fft::{ProbeSpectrum, ZnccFft, FFT_MIN_AREA};
pub use integral::ZnccIntegral;
pub use scalar::ZnccScalar;

/// Largest mean difference at which a flat window matches a flat template.
const FLAT_MEAN_TOLERANCE: f64 = 0.5;

/// Scan configuration shared by all kernels.
#[derive(Clone, Copy, Debug)]
pub struct ScanParams {
    /// Windows whose sum of squared deviations is at or below this value are
    /// treated as flat and score 0.
    pub min_var_i: f64,
}

impl Default for ScanParams {
    fn default() -> Self {
        Self { min_var_i: 1e-6 }
    }
}

/// Best placement of a template on a probe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak {
    /// Column of the template's top-left corner.
    pub x: usize,
    /// Row of the template's top-left corner.
    pub y: usize,
    /// ZNCC score in `[-1, 1]`.
    pub score: f64,
}

impl Peak {
    /// Replaces `self` with `other` only when `other` scores strictly higher,
    /// so the first maximum in scan order is kept.
    #[inline]
    pub(crate) fn keep_first_max(best: &mut Option<Peak>, other: Peak) {
        match best {
            Some(current) if other.score <= current.score => {}
            _ => *best = Some(other),
        }
    }
}

/// A probe prepared for scanning: the grayscale view, its integral image and
/// a lazily computed spectrum.
///
/// Built once per probe and shared read-only by every template scan. The
/// spectrum is only computed when an FFT scan first asks for it.
pub struct PreparedProbe<'a> {
    image: ImageView<'a, u8>,
    integral: IntegralImage,
    spectrum: OnceLock<ProbeSpectrum>,
}

impl<'a> PreparedProbe<'a> {
    pub fn new(image: ImageView<'a, u8>) -> Self {
        let integral = IntegralImage::from_view(image);
        Self {
            image,
            integral,
            spectrum: OnceLock::new(),
        }
    }

    pub fn image(&self) -> ImageView<'a, u8> {
        self.image
    }

    pub fn integral(&self) -> &IntegralImage {
        &self.integral
    }

    /// Forward transform of the probe, computed on first use.
    pub fn spectrum(&self) -> &ProbeSpectrum {
        self.spectrum.get_or_init(|| ProbeSpectrum::new(self.image))
    }

    pub fn width(&self) -> usize {
        self.image.width()
    }

    pub fn height(&self) -> usize {
        self.image.height()
    }
}

/// Kernel primitives evaluated at one template placement.
///
/// Callers guarantee that the template placed at `(x, y)` lies inside the
/// probe.
pub trait Kernel: Sized {
    /// Builds the per-probe, per-template state used by a scan.
    fn prepare(probe: &PreparedProbe<'_>, plan: &TemplatePlan) -> Self;

    /// Intensity sum and sum of squares of the probe window.
    fn window_sums(
        &self,
        probe: &PreparedProbe<'_>,
        x: usize,
        y: usize,
        w: usize,
        h: usize,
    ) -> WindowSums;

    /// Correlation numerator `sum((t - mean_t) * (I - mean_I))`.
    fn cross_term(
        &self,
        probe: &PreparedProbe<'_>,
        plan: &TemplatePlan,
        x: usize,
        y: usize,
    ) -> f64;
}

/// Largest valid top-left coordinates, or an error if the template does not
/// fit.
pub(crate) fn placement_range(
    probe: &PreparedProbe<'_>,
    plan: &TemplatePlan,
) -> EquipMatchResult<(usize, usize)> {
    if !probe.image().fits(plan.width(), plan.height()) {
        return Err(EquipMatchError::TemplateLargerThanImage {
            tpl_width: plan.width(),
            tpl_height: plan.height(),
            img_width: probe.width(),
            img_height: probe.height(),
        });
    }
    Ok((probe.width() - plan.width(), probe.height() - plan.height()))
}

/// Scores one placement, preparing the kernel for this call only.
///
/// Returns `None` only for a flat template at a window that is not flat with
/// the same intensity; a flat window under a textured template scores 0.
pub fn score_at<K: Kernel>(
    probe: &PreparedProbe<'_>,
    plan: &TemplatePlan,
    x: usize,
    y: usize,
    params: ScanParams,
) -> Option<f64> {
    let kernel = K::prepare(probe, plan);
    score_with(&kernel, probe, plan, x, y, params)
}

/// Scores one placement with an already prepared kernel.
pub(crate) fn score_with<K: Kernel>(
    kernel: &K,
    probe: &PreparedProbe<'_>,
    plan: &TemplatePlan,
    x: usize,
    y: usize,
    params: ScanParams,
) -> Option<f64> {
    let n = plan.count();
    let sums = kernel.window_sums(probe, x, y, plan.width(), plan.height());
    let spread = sums.centered_sum_sq(n);

    if plan.is_flat() {
        let same_level = (sums.mean(n) - plan.mean()).abs() <= FLAT_MEAN_TOLERANCE;
        return (spread <= params.min_var_i && same_level).then_some(1.0);
    }
    if spread <= params.min_var_i {
        return Some(0.0);
    }

    let dot = kernel.cross_term(probe, plan, x, y);
    let score = dot / (plan.centered_sum_sq() * spread).sqrt();
    if score.is_finite() {
        Some(score.clamp(-1.0, 1.0))
    } else {
        Some(0.0)
    }
}

/// Best placement within a single row of top-left positions.
pub(crate) fn best_in_row<K: Kernel>(
    kernel: &K,
    probe: &PreparedProbe<'_>,
    plan: &TemplatePlan,
    y: usize,
    max_x: usize,
    params: ScanParams,
) -> Option<Peak> {
    let mut best = None;
    for x in 0..=max_x {
        if let Some(score) = score_with(kernel, probe, plan, x, y, params) {
            Peak::keep_first_max(&mut best, Peak { x, y, score });
        }
    }
    best
}

pub(crate) fn no_flat_match() -> EquipMatchError {
    EquipMatchError::DegenerateTemplate {
        reason: "flat template and no flat window of the same intensity",
    }
}

/// Full score surface of one template over one probe, in row-major order of
/// top-left placements.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreMap {
    width: usize,
    height: usize,
    scores: Vec<Option<f64>>,
}

impl ScoreMap {
    /// Number of placements per row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of placement rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Score of the placement at `(x, y)`; `None` outside the map or where a
    /// flat template does not match.
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.scores[y * self.width + x]
    }

    pub fn scores(&self) -> &[Option<f64>] {
        &self.scores
    }
}

/// Scores every placement.
pub fn score_map<K: Kernel>(
    probe: &PreparedProbe<'_>,
    plan: &TemplatePlan,
    params: ScanParams,
) -> EquipMatchResult<ScoreMap> {
    let (max_x, max_y) = placement_range(probe, plan)?;
    let kernel = K::prepare(probe, plan);
    let mut scores = Vec::with_capacity((max_x + 1) * (max_y + 1));
    for y in 0..=max_y {
        for x in 0..=max_x {
            scores.push(score_with(&kernel, probe, plan, x, y, params));
        }
    }
    Ok(ScoreMap {
        width: max_x + 1,
        height: max_y + 1,
        scores,
    })
}

/// Scans every placement and returns the global maximum.
///
/// Ties resolve to the first maximum in row-major order.
pub fn scan_best<K: Kernel>(
    probe: &PreparedProbe<'_>,
    plan: &TemplatePlan,
    params: ScanParams,
) -> EquipMatchResult<Peak> {
    let (max_x, max_y) = placement_range(probe, plan)?;
    let kernel = K::prepare(probe, plan);

    if plan.is_flat() {
        // Only an exact flat match can score, so stop at the first one.
        for y in 0..=max_y {
            for x in 0..=max_x {
                if let Some(score) = score_with(&kernel, probe, plan, x, y, params) {
                    return Ok(Peak { x, y, score });
                }
            }
        }
        return Err(no_flat_match());
    }

    let mut best = None;
    for y in 0..=max_y {
        if let Some(peak) = best_in_row(&kernel, probe, plan, y, max_x, params) {
            Peak::keep_first_max(&mut best, peak);
        }
    }
    best.ok_or_else(no_flat_match)
}
