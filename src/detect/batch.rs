//! Batch orchestration: every probe against every category of a library.

use crate::detect::attempt::CorrelationEngine;
use crate::detect::category::CategoryMatcher;
use crate::detect::result::{CategoryDecision, DetectionResult};
use crate::image::ProbeImage;
use crate::kernel::{PreparedProbe, ScanParams};
use crate::library::TemplateLibrary;
use crate::trace::{trace_event, trace_span};
use crate::util::{EquipMatchError, EquipMatchResult};
use std::sync::atomic::{AtomicBool, Ordering};

/// Default detection threshold.
pub const DEFAULT_THRESHOLD: f64 = 0.6;

/// Detection configuration supplied by the caller.
#[derive(Clone, Copy, Debug)]
pub struct DetectConfig {
    /// A category is detected when its best score is at least this value.
    pub threshold: f64,
    /// Process probes, categories and scan rows on the rayon pool.
    /// Ignored without the `rayon` feature.
    pub parallel: bool,
    /// Flat-window floor passed to the kernels.
    pub min_var_i: f64,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            parallel: false,
            min_var_i: ScanParams::default().min_var_i,
        }
    }
}

impl DetectConfig {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_min_var_i(mut self, min_var_i: f64) -> Self {
        self.min_var_i = min_var_i;
        self
    }

    /// Checks that the threshold is a finite value in `[-1, 1]`.
    ///
    /// Detection itself never validates; this is for configuration layers.
    pub fn validate(&self) -> EquipMatchResult<()> {
        if !self.threshold.is_finite() || !(-1.0..=1.0).contains(&self.threshold) {
            return Err(EquipMatchError::InvalidThreshold {
                value: self.threshold,
            });
        }
        Ok(())
    }
}

/// Rejects batches larger than `max` images.
pub fn ensure_batch_size(len: usize, max: usize) -> EquipMatchResult<()> {
    if len > max {
        return Err(EquipMatchError::BatchTooLarge { len, max });
    }
    Ok(())
}

/// Runs category matching for a batch of probes against a template library.
#[derive(Clone, Copy, Debug)]
pub struct BatchDetector {
    config: DetectConfig,
    matcher: CategoryMatcher,
}

impl Default for BatchDetector {
    fn default() -> Self {
        Self::new(DetectConfig::default())
    }
}

impl BatchDetector {
    pub fn new(config: DetectConfig) -> Self {
        let engine = CorrelationEngine::new(ScanParams {
            min_var_i: config.min_var_i,
        })
        .with_parallel(config.parallel);
        Self {
            config,
            matcher: CategoryMatcher::new(engine),
        }
    }

    pub fn config(&self) -> &DetectConfig {
        &self.config
    }

    /// Detects every library category in every probe.
    ///
    /// Returns one result per probe in input order. An empty library yields
    /// empty results rather than an error.
    pub fn detect(
        &self,
        probes: &[ProbeImage],
        library: &TemplateLibrary,
    ) -> Vec<DetectionResult> {
        let _span = trace_span!(
            "detect",
            probes = probes.len(),
            categories = library.num_categories(),
        )
        .entered();
        self.map_probes(probes, library)
    }

    /// Detects every library category in a single probe.
    pub fn detect_one(&self, probe: &ProbeImage, library: &TemplateLibrary) -> DetectionResult {
        let _span = trace_span!("detect_probe", width = probe.width(), height = probe.height())
            .entered();
        let prepared = PreparedProbe::new(probe.gray());
        let decisions = self.decide_categories(&prepared, library);
        let result = DetectionResult::from_decisions(decisions);
        trace_event!(
            "probe_result",
            categories = result.len(),
            detected = result.detected().count(),
        );
        result
    }

    /// Like [`BatchDetector::detect`], but checks `cancel` before each probe.
    ///
    /// Probes run sequentially. When the flag is set the batch stops and
    /// reports how many probes had completed.
    pub fn detect_cancellable(
        &self,
        probes: &[ProbeImage],
        library: &TemplateLibrary,
        cancel: &AtomicBool,
    ) -> EquipMatchResult<Vec<DetectionResult>> {
        let mut results = Vec::with_capacity(probes.len());
        for probe in probes {
            if cancel.load(Ordering::Relaxed) {
                return Err(EquipMatchError::Cancelled {
                    completed: results.len(),
                });
            }
            results.push(self.detect_one(probe, library));
        }
        Ok(results)
    }

    #[cfg(feature = "rayon")]
    fn map_probes(
        &self,
        probes: &[ProbeImage],
        library: &TemplateLibrary,
    ) -> Vec<DetectionResult> {
        use rayon::prelude::*;
        if self.config.parallel {
            probes
                .par_iter()
                .map(|probe| self.detect_one(probe, library))
                .collect()
        } else {
            probes
                .iter()
                .map(|probe| self.detect_one(probe, library))
                .collect()
        }
    }

    #[cfg(not(feature = "rayon"))]
    fn map_probes(
        &self,
        probes: &[ProbeImage],
        library: &TemplateLibrary,
    ) -> Vec<DetectionResult> {
        probes
            .iter()
            .map(|probe| self.detect_one(probe, library))
            .collect()
    }

    #[cfg(feature = "rayon")]
    fn decide_categories(
        &self,
        probe: &PreparedProbe<'_>,
        library: &TemplateLibrary,
    ) -> Vec<CategoryDecision> {
        use rayon::prelude::*;
        let threshold = self.config.threshold;
        if self.config.parallel {
            let groups: Vec<_> = library.iter().collect();
            groups
                .par_iter()
                .map(|(category, templates)| {
                    self.matcher
                        .best_match_prepared(probe, category, templates, threshold)
                })
                .collect()
        } else {
            library
                .iter()
                .map(|(category, templates)| {
                    self.matcher
                        .best_match_prepared(probe, category, templates, threshold)
                })
                .collect()
        }
    }

    #[cfg(not(feature = "rayon"))]
    fn decide_categories(
        &self,
        probe: &PreparedProbe<'_>,
        library: &TemplateLibrary,
    ) -> Vec<CategoryDecision> {
        let threshold = self.config.threshold;
        library
            .iter()
            .map(|(category, templates)| {
                self.matcher
                    .best_match_prepared(probe, category, templates, threshold)
            })
            .collect()
    }
}
