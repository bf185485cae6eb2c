//! Per-segment significance testing with multiple comparison correction.
//!
//! Segments are processed in sorted label order. A segment that cannot be
//! tested (an empty arm, or a degenerate statistic) is excluded and recorded
//! with its reason; the remaining segments are still analyzed and corrected.

use ab_analysis_core::{
    ensure_open_unit, Alternative, AnalysisError, ExperimentRecord, ProportionEstimate, Result,
    Variant,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::correction::CorrectionMethod;
use crate::proportion_test::{ProportionTest, TestResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SegmentRow {
    pub segment: String,
    pub n_total: u64,
    pub result: TestResult,
    pub p_value: f64,
    pub adjusted_p_value: f64,
    pub corrected_significant: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExcludedSegment {
    pub segment: String,
    pub n_total: u64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SegmentResult {
    pub method: CorrectionMethod,
    pub alpha: f64,
    /// Cutoff on raw p-values shared by every row.
    pub adjusted_alpha: f64,
    pub n_tests: usize,
    pub rows: Vec<SegmentRow>,
    pub excluded: Vec<ExcludedSegment>,
    pub unlabeled_records: usize,
}

impl SegmentResult {
    pub fn row(&self, segment: &str) -> Option<&SegmentRow> {
        self.rows.iter().find(|r| r.segment == segment)
    }

    pub fn significant_segments(&self) -> Vec<&str> {
        self.rows
            .iter()
            .filter(|r| r.corrected_significant)
            .map(|r| r.segment.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentAnalyzer {
    alpha: f64,
    alternative: Alternative,
    correction: CorrectionMethod,
}

impl Default for SegmentAnalyzer {
    fn default() -> Self {
        Self::new(0.05)
    }
}

impl SegmentAnalyzer {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            alternative: Alternative::TwoSided,
            correction: CorrectionMethod::Bonferroni,
        }
    }

    pub fn with_alternative(mut self, alternative: Alternative) -> Self {
        self.alternative = alternative;
        self
    }

    pub fn with_correction(mut self, correction: CorrectionMethod) -> Self {
        self.correction = correction;
        self
    }

    /// Partitions by the record's own `segment` label.
    pub fn analyze_by_segment(&self, records: &[ExperimentRecord]) -> Result<SegmentResult> {
        self.analyze(records, ExperimentRecord::segment)
    }

    pub fn analyze<F>(&self, records: &[ExperimentRecord], segment_key: F) -> Result<SegmentResult>
    where
        F: Fn(&ExperimentRecord) -> Option<&str>,
    {
        ensure_open_unit("alpha", self.alpha)?;

        let mut partitions: BTreeMap<String, (u64, u64, u64, u64)> = BTreeMap::new();
        let mut unlabeled_records = 0usize;

        for record in records {
            let Some(label) = segment_key(record) else {
                unlabeled_records += 1;
                continue;
            };
            let counts = partitions.entry(label.to_string()).or_default();
            let conversion = u64::from(record.outcome);
            match record.variant {
                Variant::Control => {
                    counts.0 += 1;
                    counts.1 += conversion;
                }
                Variant::Treatment => {
                    counts.2 += 1;
                    counts.3 += conversion;
                }
            }
        }

        let mut tested: Vec<(String, u64, TestResult)> = Vec::new();
        let mut excluded = Vec::new();

        for (segment, (n_control, x_control, n_treatment, x_treatment)) in partitions {
            let n_total = n_control + n_treatment;
            match self.test_partition(n_control, x_control, n_treatment, x_treatment) {
                Ok(result) => tested.push((segment, n_total, result)),
                Err(err) => {
                    tracing::warn!(segment = %segment, error = %err, "Excluding segment from analysis");
                    excluded.push(ExcludedSegment {
                        segment,
                        n_total,
                        reason: err.to_string(),
                    });
                }
            }
        }

        if tested.is_empty() {
            return Err(AnalysisError::insufficient_data(format!(
                "no testable segments ({} excluded)",
                excluded.len()
            )));
        }

        let p_values: Vec<f64> = tested.iter().map(|(_, _, r)| r.p_value).collect();
        let correction = self.correction.apply(&p_values, self.alpha)?;

        let rows = tested
            .into_iter()
            .zip(&correction.results)
            .map(|((segment, n_total, result), corrected)| SegmentRow {
                segment,
                n_total,
                p_value: result.p_value,
                adjusted_p_value: corrected.adjusted_p_value,
                corrected_significant: corrected.significant,
                result,
            })
            .collect();

        tracing::debug!(
            n_tests = correction.n_tests,
            adjusted_alpha = correction.adjusted_alpha,
            method = %self.correction,
            "Segment analysis corrected"
        );

        Ok(SegmentResult {
            method: self.correction,
            alpha: self.alpha,
            adjusted_alpha: correction.adjusted_alpha,
            n_tests: correction.n_tests,
            rows,
            excluded,
            unlabeled_records,
        })
    }

    fn test_partition(
        &self,
        n_control: u64,
        x_control: u64,
        n_treatment: u64,
        x_treatment: u64,
    ) -> Result<TestResult> {
        if n_control == 0 {
            return Err(AnalysisError::insufficient_data("segment has no control observations"));
        }
        if n_treatment == 0 {
            return Err(AnalysisError::insufficient_data(
                "segment has no treatment observations",
            ));
        }
        let control = ProportionEstimate::new(x_control, n_control)?;
        let treatment = ProportionEstimate::new(x_treatment, n_treatment)?;
        ProportionTest::run(&control, &treatment, self.alpha, self.alternative)
    }
}
