use ab_analysis_core::{CleaningSummary, QualityReport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::aggregators::ConversionMetrics;
use crate::bayesian::BayesianSummary;
use crate::impact::ImpactRange;
use crate::power::{DetectableEffectResult, SampleSizeResult};
use crate::proportion_test::TestResult;
use crate::segment::SegmentResult;
use crate::srm::SrmResult;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Ship,
    DoNotShip,
    /// Not significant; collect more data if the business value is material.
    Inconclusive,
    /// Allocation looks broken; fix instrumentation before trusting any result.
    Investigate,
}

impl Recommendation {
    /// Decision rule: a sample ratio mismatch overrides everything, then
    /// significance at the test's alpha and the sign of the lift decide.
    pub fn decide(result: &TestResult, srm: &SrmResult) -> (Self, String) {
        if srm.srm_detected {
            return (
                Recommendation::Investigate,
                format!(
                    "Sample ratio mismatch detected (p = {:.4} < {}); resolve assignment or logging issues before acting on the result.",
                    srm.p_value, srm.threshold
                ),
            );
        }

        if !result.is_significant() {
            return (
                Recommendation::Inconclusive,
                format!(
                    "Observed lift of {:.4}% is statistically inconclusive at alpha = {} (p = {:.4}). Gather additional sample if business value remains material.",
                    result.absolute_lift * 100.0,
                    result.alpha,
                    result.p_value
                ),
            );
        }

        if result.absolute_lift > 0.0 {
            (
                Recommendation::Ship,
                format!(
                    "Treatment improves conversion by {:.4}% (p = {:.4}, CI [{:.4}%, {:.4}%]); roll out the treatment.",
                    result.absolute_lift * 100.0,
                    result.p_value,
                    result.ci_low * 100.0,
                    result.ci_high * 100.0
                ),
            )
        } else {
            (
                Recommendation::DoNotShip,
                format!(
                    "Treatment changes conversion by {:.4}% (p = {:.4}); keep the control experience.",
                    result.absolute_lift * 100.0,
                    result.p_value
                ),
            )
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Recommendation::Ship => "ship",
            Recommendation::DoNotShip => "do_not_ship",
            Recommendation::Inconclusive => "inconclusive",
            Recommendation::Investigate => "investigate",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionReport {
    pub generated_at: DateTime<Utc>,
    pub quality: Option<QualityReport>,
    pub cleaning: Option<CleaningSummary>,
    pub conversion_by_variant: Vec<ConversionMetrics>,
    pub conversion_by_segment: Vec<ConversionMetrics>,
    pub test: TestResult,
    pub srm: SrmResult,
    pub sample_size: Option<SampleSizeResult>,
    pub detectable_effect: Option<DetectableEffectResult>,
    /// Power of the observed sample against the planned effect.
    pub achieved_power: Option<f64>,
    pub bayesian: Option<BayesianSummary>,
    pub segments: Option<SegmentResult>,
    pub impact: Vec<ImpactRange>,
    pub recommendation: Recommendation,
    pub rationale: String,
}

impl DecisionReport {
    /// Starts a report from the two results the recommendation depends on.
    pub fn new(test: TestResult, srm: SrmResult) -> Self {
        let (recommendation, rationale) = Recommendation::decide(&test, &srm);
        Self {
            generated_at: Utc::now(),
            quality: None,
            cleaning: None,
            conversion_by_variant: Vec::new(),
            conversion_by_segment: Vec::new(),
            test,
            srm,
            sample_size: None,
            detectable_effect: None,
            achieved_power: None,
            bayesian: None,
            segments: None,
            impact: Vec::new(),
            recommendation,
            rationale,
        }
    }

    pub fn with_quality(mut self, quality: QualityReport, cleaning: CleaningSummary) -> Self {
        self.quality = Some(quality);
        self.cleaning = Some(cleaning);
        self
    }

    pub fn with_conversions(
        mut self,
        by_variant: Vec<ConversionMetrics>,
        by_segment: Vec<ConversionMetrics>,
    ) -> Self {
        self.conversion_by_variant = by_variant;
        self.conversion_by_segment = by_segment;
        self
    }

    pub fn with_power(
        mut self,
        sample_size: Option<SampleSizeResult>,
        detectable_effect: Option<DetectableEffectResult>,
        achieved_power: Option<f64>,
    ) -> Self {
        self.sample_size = sample_size;
        self.detectable_effect = detectable_effect;
        self.achieved_power = achieved_power;
        self
    }

    pub fn with_bayesian(mut self, summary: BayesianSummary) -> Self {
        self.bayesian = Some(summary);
        self
    }

    pub fn with_segments(mut self, segments: SegmentResult) -> Self {
        self.segments = Some(segments);
        self
    }

    pub fn with_impact(mut self, impact: Vec<ImpactRange>) -> Self {
        self.impact = impact;
        self
    }

    pub fn to_json(&self) -> ab_analysis_core::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
