//! Cohen's h effect size for two proportions.
//!
//! Sign convention: `cohens_h(p1, p2)` is positive when `p1 > p2`. Every
//! caller in this crate passes `(treatment_rate, control_rate)`, so a positive
//! h means the treatment converts better.

use ab_analysis_core::{ensure_probability, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// h = 2 * (asin(sqrt(p1)) - asin(sqrt(p2))).
pub fn cohens_h(p1: f64, p2: f64) -> Result<f64> {
    ensure_probability("p1", p1)?;
    ensure_probability("p2", p2)?;
    Ok(2.0 * (p1.sqrt().asin() - p2.sqrt().asin()))
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EffectMagnitude {
    Negligible,
    Small,
    Medium,
    Large,
}

impl EffectMagnitude {
    /// Conventional thresholds on |h|: 0.2, 0.5 and 0.8.
    pub fn interpret(h: f64) -> Self {
        let h_abs = h.abs();
        if h_abs < 0.2 {
            EffectMagnitude::Negligible
        } else if h_abs < 0.5 {
            EffectMagnitude::Small
        } else if h_abs < 0.8 {
            EffectMagnitude::Medium
        } else {
            EffectMagnitude::Large
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EffectMagnitude::Negligible => "negligible",
            EffectMagnitude::Small => "small",
            EffectMagnitude::Medium => "medium",
            EffectMagnitude::Large => "large",
        }
    }
}

impl fmt::Display for EffectMagnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EffectSize {
    pub cohens_h: f64,
    pub magnitude: EffectMagnitude,
}

impl EffectSize {
    pub fn between(p1: f64, p2: f64) -> Result<Self> {
        let h = cohens_h(p1, p2)?;
        Ok(Self {
            cohens_h: h,
            magnitude: EffectMagnitude::interpret(h),
        })
    }
}
