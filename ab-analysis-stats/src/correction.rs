//! Family-wise error control across simultaneous comparisons.
//!
//! Both procedures report an `adjusted_alpha` that works as a cutoff on the
//! raw p-values: `p_value < adjusted_alpha` holds exactly for the tests
//! flagged significant. For Bonferroni that is `alpha / n`. For Holm it is the
//! step-down threshold at the first rank that was not rejected.

use ab_analysis_core::{ensure_open_unit, ensure_probability, AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionMethod {
    #[default]
    Bonferroni,
    Holm,
}

impl CorrectionMethod {
    pub fn apply(&self, p_values: &[f64], alpha: f64) -> Result<CorrectionResult> {
        match self {
            CorrectionMethod::Bonferroni => Bonferroni.adjust(p_values, alpha),
            CorrectionMethod::Holm => Holm.adjust(p_values, alpha),
        }
    }
}

impl fmt::Display for CorrectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrectionMethod::Bonferroni => f.write_str("bonferroni"),
            CorrectionMethod::Holm => f.write_str("holm"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CorrectedPValue {
    pub p_value: f64,
    pub adjusted_p_value: f64,
    pub significant: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CorrectionResult {
    pub method: CorrectionMethod,
    pub original_alpha: f64,
    pub n_tests: usize,
    pub adjusted_alpha: f64,
    /// One entry per input p-value, in input order.
    pub results: Vec<CorrectedPValue>,
}

impl CorrectionResult {
    pub fn significant_count(&self) -> usize {
        self.results.iter().filter(|r| r.significant).count()
    }

    pub fn adjusted_p_values(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.adjusted_p_value).collect()
    }
}

pub trait PValueCorrection {
    fn method(&self) -> CorrectionMethod;

    fn adjust(&self, p_values: &[f64], alpha: f64) -> Result<CorrectionResult>;
}

fn check_inputs(p_values: &[f64], alpha: f64) -> Result<()> {
    ensure_open_unit("alpha", alpha)?;
    if p_values.is_empty() {
        return Err(AnalysisError::insufficient_data(
            "multiple comparison correction needs at least one p-value",
        ));
    }
    for &p in p_values {
        ensure_probability("p-value", p)?;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Bonferroni;

impl PValueCorrection for Bonferroni {
    fn method(&self) -> CorrectionMethod {
        CorrectionMethod::Bonferroni
    }

    fn adjust(&self, p_values: &[f64], alpha: f64) -> Result<CorrectionResult> {
        check_inputs(p_values, alpha)?;

        let n_tests = p_values.len();
        let adjusted_alpha = alpha / n_tests as f64;

        let results = p_values
            .iter()
            .map(|&p| CorrectedPValue {
                p_value: p,
                adjusted_p_value: (p * n_tests as f64).min(1.0),
                significant: p < adjusted_alpha,
            })
            .collect();

        Ok(CorrectionResult {
            method: self.method(),
            original_alpha: alpha,
            n_tests,
            adjusted_alpha,
            results,
        })
    }
}

/// Holm step-down procedure.
///
/// Adjusted p-values carry a running maximum over the ascending ranks, so a
/// larger raw p-value never receives a smaller adjustment than a smaller one.
#[derive(Debug, Clone, Copy, Default)]
pub struct Holm;

impl PValueCorrection for Holm {
    fn method(&self) -> CorrectionMethod {
        CorrectionMethod::Holm
    }

    fn adjust(&self, p_values: &[f64], alpha: f64) -> Result<CorrectionResult> {
        check_inputs(p_values, alpha)?;

        let n_tests = p_values.len();
        let mut order: Vec<usize> = (0..n_tests).collect();
        order.sort_by(|&a, &b| p_values[a].total_cmp(&p_values[b]));

        let mut adjusted = vec![0.0; n_tests];
        let mut running_max = 0.0_f64;
        for (rank, &idx) in order.iter().enumerate() {
            let step = ((n_tests - rank) as f64 * p_values[idx]).min(1.0);
            running_max = running_max.max(step);
            adjusted[idx] = running_max;
        }

        let results: Vec<CorrectedPValue> = p_values
            .iter()
            .zip(&adjusted)
            .map(|(&p, &adj)| CorrectedPValue {
                p_value: p,
                adjusted_p_value: adj,
                significant: adj < alpha,
            })
            .collect();

        let rejected = results.iter().filter(|r| r.significant).count();
        let adjusted_alpha = alpha / (n_tests - rejected).max(1) as f64;

        Ok(CorrectionResult {
            method: self.method(),
            original_alpha: alpha,
            n_tests,
            adjusted_alpha,
            results,
        })
    }
}

pub fn bonferroni_correction(p_values: &[f64], alpha: f64) -> Result<CorrectionResult> {
    Bonferroni.adjust(p_values, alpha)
}

pub fn holm_correction(p_values: &[f64], alpha: f64) -> Result<CorrectionResult> {
    Holm.adjust(p_values, alpha)
}
