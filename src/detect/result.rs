//! Immutable per-probe detection results.

use std::collections::BTreeMap;

/// Axis-aligned rectangle in probe pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BoundingRegion {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl BoundingRegion {
    /// Exclusive right edge.
    pub fn right(&self) -> usize {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> usize {
        self.y + self.height
    }
}

/// The winning template of a category and where it matched.
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateMatch {
    /// Name of the reference image that scored best.
    pub template: String,
    /// ZNCC score in `[-1, 1]`.
    pub score: f64,
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl TemplateMatch {
    /// Template footprint anchored at the match location.
    pub fn region(&self) -> BoundingRegion {
        BoundingRegion {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

/// Verdict for one category on one probe.
///
/// `best` is `None` when every template in the category was skipped; that
/// state is distinct from any real score, including `-1.0`. Decisions are
/// read-only once built.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryDecision {
    category: String,
    best: Option<TemplateMatch>,
    detected: bool,
    attempts: usize,
    skipped: usize,
}

impl CategoryDecision {
    pub(crate) fn new(
        category: String,
        best: Option<TemplateMatch>,
        detected: bool,
        attempts: usize,
        skipped: usize,
    ) -> Self {
        Self {
            category,
            best,
            detected,
            attempts,
            skipped,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Winning template match, or `None` for "no valid attempt".
    pub fn best(&self) -> Option<&TemplateMatch> {
        self.best.as_ref()
    }

    /// Verdict: best score at or above the threshold.
    pub fn detected(&self) -> bool {
        self.detected
    }

    /// Number of templates considered.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Number of templates that produced no score.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Best score, or `None` for "no valid attempt".
    pub fn score(&self) -> Option<f64> {
        self.best.as_ref().map(|m| m.score)
    }

    /// Name of the winning template.
    pub fn template(&self) -> Option<&str> {
        self.best.as_ref().map(|m| m.template.as_str())
    }

    /// Returns `true` when no template could be scored.
    pub fn no_valid_attempt(&self) -> bool {
        self.best.is_none()
    }

    /// Bounding region of the winning match, only for detected categories.
    pub fn region(&self) -> Option<BoundingRegion> {
        if !self.detected {
            return None;
        }
        self.best.as_ref().map(TemplateMatch::region)
    }
}

/// Category decisions for one probe, keyed and ordered by category name.
///
/// Bounding regions are derived from the decisions on demand, so they always
/// agree with the verdicts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectionResult {
    decisions: BTreeMap<String, CategoryDecision>,
}

impl DetectionResult {
    /// Assembles a result keyed by category name.
    pub fn from_decisions(decisions: impl IntoIterator<Item = CategoryDecision>) -> Self {
        let decisions = decisions
            .into_iter()
            .map(|d| (d.category.clone(), d))
            .collect();
        Self { decisions }
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    /// Category names in order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.decisions.keys().map(String::as_str)
    }

    pub fn decision(&self, category: &str) -> Option<&CategoryDecision> {
        self.decisions.get(category)
    }

    /// All decisions in category order.
    pub fn decisions(&self) -> impl Iterator<Item = &CategoryDecision> {
        self.decisions.values()
    }

    /// Decisions whose verdict is true.
    pub fn detected(&self) -> impl Iterator<Item = &CategoryDecision> {
        self.decisions.values().filter(|d| d.detected)
    }

    /// Bounding region of a detected category.
    pub fn region(&self, category: &str) -> Option<BoundingRegion> {
        self.decisions.get(category)?.region()
    }

    /// Bounding regions of detected categories, in category order.
    pub fn regions(&self) -> impl Iterator<Item = (&str, BoundingRegion)> {
        self.decisions
            .iter()
            .filter_map(|(name, d)| d.region().map(|r| (name.as_str(), r)))
    }
}

#[cfg(test)]
mod tests {
    use super::{CategoryDecision, DetectionResult, TemplateMatch};

    fn decision(category: &str, score: Option<f64>, detected: bool) -> CategoryDecision {
        CategoryDecision {
            category: category.to_string(),
            best: score.map(|score| TemplateMatch {
                template: format!("{category}_1"),
                score,
                x: 3,
                y: 4,
                width: 5,
                height: 6,
            }),
            detected,
            attempts: 1,
            skipped: usize::from(score.is_none()),
        }
    }

    #[test]
    fn regions_exist_only_for_detected_categories() {
        let result = DetectionResult::from_decisions([
            decision("oxygen", Some(0.2), false),
            decision("aed", Some(0.9), true),
            decision("splint", None, false),
        ]);
        assert_eq!(result.categories().collect::<Vec<_>>(), ["aed", "oxygen", "splint"]);
        assert_eq!(result.regions().count(), 1);
        let region = result.region("aed").unwrap();
        assert_eq!((region.x, region.y, region.right(), region.bottom()), (3, 4, 8, 10));
        assert!(result.region("oxygen").is_none());
        assert!(result.decision("splint").unwrap().no_valid_attempt());
    }

    #[test]
    fn result_regions_agree_with_decision_regions() {
        let result = DetectionResult::from_decisions([
            decision("aed", Some(0.95), true),
            decision("bag", Some(0.95), false),
            decision("kit", None, false),
        ]);
        for d in result.decisions() {
            assert_eq!(result.region(d.category()), d.region());
        }
        let regions: Vec<_> = result.regions().map(|(name, _)| name).collect();
        assert_eq!(regions, ["aed"]);
        assert!(result.decision("bag").unwrap().best().is_some());
        assert!(result.region("bag").is_none());
    }
}
