use ab_analysis_core::{ensure_open_unit, AnalysisError, ExperimentRecord, Result, Variant};
use serde::{Deserialize, Serialize};

use crate::statistical::chi_square_sf;

/// Conventional p-value below which the allocation is treated as broken.
pub const DEFAULT_SRM_THRESHOLD: f64 = 0.01;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SrmResult {
    pub control_count: u64,
    pub treatment_count: u64,
    pub expected_control: f64,
    pub expected_treatment: f64,
    pub chi2: f64,
    pub p_value: f64,
    pub threshold: f64,
    pub srm_detected: bool,
}

/// Sample ratio mismatch check: chi-square goodness of fit with one degree of freedom.
///
/// A detected mismatch is a data-quality flag. It is logged and reported but
/// never stops the analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRatioCheck {
    expected_ratio: (f64, f64),
    threshold: f64,
}

impl Default for SampleRatioCheck {
    fn default() -> Self {
        Self {
            expected_ratio: (0.5, 0.5),
            threshold: DEFAULT_SRM_THRESHOLD,
        }
    }
}

impl SampleRatioCheck {
    pub fn new(expected_ratio: (f64, f64)) -> Result<Self> {
        let (control, treatment) = expected_ratio;
        if !(control > 0.0 && treatment > 0.0) {
            return Err(AnalysisError::domain(format!(
                "expected ratio components must be positive, got ({control}, {treatment})"
            )));
        }
        if ((control + treatment) - 1.0).abs() > 1e-9 {
            return Err(AnalysisError::domain(format!(
                "expected ratio must sum to 1, got {}",
                control + treatment
            )));
        }
        Ok(Self {
            expected_ratio,
            ..Self::default()
        })
    }

    pub fn with_threshold(mut self, threshold: f64) -> Result<Self> {
        ensure_open_unit("srm threshold", threshold)?;
        self.threshold = threshold;
        Ok(self)
    }

    pub fn check(&self, control_count: u64, treatment_count: u64) -> Result<SrmResult> {
        let total = (control_count + treatment_count) as f64;
        if total == 0.0 {
            return Err(AnalysisError::insufficient_data(
                "sample ratio check requires at least one unit",
            ));
        }

        let expected_control = self.expected_ratio.0 * total;
        let expected_treatment = self.expected_ratio.1 * total;

        let chi2 = (control_count as f64 - expected_control).powi(2) / expected_control
            + (treatment_count as f64 - expected_treatment).powi(2) / expected_treatment;
        let p_value = chi_square_sf(chi2, 1.0)?;
        let srm_detected = p_value < self.threshold;

        if srm_detected {
            tracing::warn!(
                control_count,
                treatment_count,
                chi2,
                p_value,
                "Sample ratio mismatch detected"
            );
        }

        Ok(SrmResult {
            control_count,
            treatment_count,
            expected_control,
            expected_treatment,
            chi2,
            p_value,
            threshold: self.threshold,
            srm_detected,
        })
    }

    pub fn check_records(&self, records: &[ExperimentRecord]) -> Result<SrmResult> {
        let control = records
            .iter()
            .filter(|r| r.variant == Variant::Control)
            .count() as u64;
        let treatment = records.len() as u64 - control;
        self.check(control, treatment)
    }
}
