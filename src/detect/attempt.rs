//! Single template-versus-probe scoring.

use crate::kernel::{
    scan_best, Kernel, Peak, PreparedProbe, ScanParams, ZnccFft, ZnccIntegral, FFT_MIN_AREA,
};
use crate::template::ReferenceImage;
use crate::trace::trace_warn;
use crate::util::EquipMatchError;
use crate::ImageView;
use std::fmt;

/// Why a template produced no score against a probe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The template is taller or wider than the probe.
    TemplateTooLarge {
        tpl_width: usize,
        tpl_height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// The correlation is undefined for this template.
    Degenerate(&'static str),
    /// Any other failure while scoring.
    Fault(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::TemplateTooLarge {
                tpl_width,
                tpl_height,
                img_width,
                img_height,
            } => write!(
                f,
                "template {tpl_width}x{tpl_height} larger than probe {img_width}x{img_height}"
            ),
            SkipReason::Degenerate(reason) => write!(f, "degenerate template: {reason}"),
            SkipReason::Fault(reason) => write!(f, "scoring fault: {reason}"),
        }
    }
}

impl From<EquipMatchError> for SkipReason {
    fn from(err: EquipMatchError) -> Self {
        match err {
            EquipMatchError::TemplateLargerThanImage {
                tpl_width,
                tpl_height,
                img_width,
                img_height,
            } => SkipReason::TemplateTooLarge {
                tpl_width,
                tpl_height,
                img_width,
                img_height,
            },
            EquipMatchError::DegenerateTemplate { reason } => SkipReason::Degenerate(reason),
            other => SkipReason::Fault(other.to_string()),
        }
    }
}

/// Outcome of scoring one reference image against one probe.
#[derive(Clone, Debug, PartialEq)]
pub enum MatchAttempt {
    /// Global maximum of the correlation surface and its top-left location.
    Scored { score: f64, x: usize, y: usize },
    /// Not scored; never takes part in a category comparison.
    Skipped(SkipReason),
}

impl MatchAttempt {
    /// Returns the score when the attempt was scored.
    pub fn score(&self) -> Option<f64> {
        match self {
            MatchAttempt::Scored { score, .. } => Some(*score),
            MatchAttempt::Skipped(_) => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, MatchAttempt::Skipped(_))
    }
}

impl From<Peak> for MatchAttempt {
    fn from(peak: Peak) -> Self {
        MatchAttempt::Scored {
            score: peak.score,
            x: peak.x,
            y: peak.y,
        }
    }
}

/// Normalized cross-correlation scan of one template over one probe.
#[derive(Clone, Copy, Debug, Default)]
pub struct CorrelationEngine {
    params: ScanParams,
    parallel: bool,
}

impl CorrelationEngine {
    pub fn new(params: ScanParams) -> Self {
        Self {
            params,
            parallel: false,
        }
    }

    /// Enables the row-parallel scan (requires the `rayon` feature).
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn params(&self) -> ScanParams {
        self.params
    }

    /// Scores `template` against a grayscale probe view.
    ///
    /// Prepares the probe statistics for this call only; batch callers should
    /// prepare once and use [`CorrelationEngine::score_prepared`].
    pub fn score(&self, probe_gray: ImageView<'_, u8>, template: &ReferenceImage) -> MatchAttempt {
        let probe = PreparedProbe::new(probe_gray);
        self.score_prepared(&probe, template)
    }

    /// Scores `template` against a prepared probe.
    ///
    /// Oversized and degenerate templates come back as
    /// [`MatchAttempt::Skipped`]; this never fails.
    pub fn score_prepared(
        &self,
        probe: &PreparedProbe<'_>,
        template: &ReferenceImage,
    ) -> MatchAttempt {
        let plan = template.plan();
        if !probe.image().fits(plan.width(), plan.height()) {
            return MatchAttempt::Skipped(SkipReason::TemplateTooLarge {
                tpl_width: plan.width(),
                tpl_height: plan.height(),
                img_width: probe.width(),
                img_height: probe.height(),
            });
        }

        match self.scan(probe, template) {
            Ok(peak) => peak.into(),
            Err(err) => {
                let reason = SkipReason::from(err);
                let detail = reason.to_string();
                trace_warn!(
                    "template_skipped",
                    template = template.name(),
                    reason = detail.as_str(),
                );
                MatchAttempt::Skipped(reason)
            }
        }
    }

    /// Picks the FFT kernel for large templates and the direct kernel
    /// otherwise.
    fn scan(
        &self,
        probe: &PreparedProbe<'_>,
        template: &ReferenceImage,
    ) -> crate::EquipMatchResult<Peak> {
        if template.plan().count() >= FFT_MIN_AREA {
            self.scan_with::<ZnccFft>(probe, template)
        } else {
            self.scan_with::<ZnccIntegral>(probe, template)
        }
    }

    #[cfg(feature = "rayon")]
    fn scan_with<K: Kernel + Sync>(
        &self,
        probe: &PreparedProbe<'_>,
        template: &ReferenceImage,
    ) -> crate::EquipMatchResult<Peak> {
        if self.parallel {
            crate::kernel::rayon::scan_best_par::<K>(probe, template.plan(), self.params)
        } else {
            scan_best::<K>(probe, template.plan(), self.params)
        }
    }

    #[cfg(not(feature = "rayon"))]
    fn scan_with<K: Kernel + Sync>(
        &self,
        probe: &PreparedProbe<'_>,
        template: &ReferenceImage,
    ) -> crate::EquipMatchResult<Peak> {
        scan_best::<K>(probe, template.plan(), self.params)
    }
}
