//! Best-of-group selection across the templates of one category.

use crate::detect::attempt::{CorrelationEngine, MatchAttempt};
use crate::detect::result::{CategoryDecision, TemplateMatch};
use crate::kernel::PreparedProbe;
use crate::template::ReferenceImage;
use crate::trace::trace_event;
use crate::ImageView;

/// Picks the highest-scoring template of a category and applies the
/// threshold.
#[derive(Clone, Copy, Debug, Default)]
pub struct CategoryMatcher {
    engine: CorrelationEngine,
}

impl CategoryMatcher {
    pub fn new(engine: CorrelationEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &CorrelationEngine {
        &self.engine
    }

    /// Scores every template against a grayscale probe view.
    pub fn best_match(
        &self,
        probe_gray: ImageView<'_, u8>,
        category: &str,
        templates: &[ReferenceImage],
        threshold: f64,
    ) -> CategoryDecision {
        let probe = PreparedProbe::new(probe_gray);
        self.best_match_prepared(&probe, category, templates, threshold)
    }

    /// Scores every template against a prepared probe.
    ///
    /// Skipped attempts are excluded. Among scored attempts the strictly
    /// greatest wins, so on exact ties the earliest template in `templates`
    /// is kept. The verdict is `score >= threshold`.
    pub fn best_match_prepared(
        &self,
        probe: &PreparedProbe<'_>,
        category: &str,
        templates: &[ReferenceImage],
        threshold: f64,
    ) -> CategoryDecision {
        let mut best: Option<TemplateMatch> = None;
        let mut skipped = 0usize;

        for template in templates {
            match self.engine.score_prepared(probe, template) {
                MatchAttempt::Scored { score, x, y } => {
                    if best.as_ref().is_some_and(|b| score <= b.score) {
                        continue;
                    }
                    best = Some(TemplateMatch {
                        template: template.name().to_string(),
                        score,
                        x,
                        y,
                        width: template.width(),
                        height: template.height(),
                    });
                }
                MatchAttempt::Skipped(_) => skipped += 1,
            }
        }

        let detected = best.as_ref().is_some_and(|b| b.score >= threshold);
        trace_event!(
            "category_decision",
            category = category,
            detected = detected,
            score = best.as_ref().map_or(f64::NAN, |b| b.score),
            skipped = skipped,
        );

        CategoryDecision::new(
            category.to_string(),
            best,
            detected,
            templates.len(),
            skipped,
        )
    }
}
