//! Sample size and minimum detectable effect for a two-proportion test.
//!
//! Both directions share one formula:
//!
//! ```text
//! n = ((z_{1-alpha/2} * SE_null + z_power * SE_alt) / mde)^2
//! SE_null = sqrt(2 * p_bar * (1 - p_bar)),  p_bar = (p1 + p2) / 2
//! SE_alt  = sqrt(p1 * (1 - p1) + p2 * (1 - p2))
//! ```
//!
//! with `p1 = baseline_rate` and `p2 = baseline_rate + mde`. The detectable
//! effect has no closed form and is found by bisection on `n(mde)`, which is
//! decreasing in `mde`.

use ab_analysis_core::{ensure_open_unit, AnalysisError, Result};
use serde::{Deserialize, Serialize};
use statrs::distribution::ContinuousCDF;

use crate::root_finding::MonotoneBisection;
use crate::statistical::{normal_quantile, standard_normal, z_critical};

/// Smallest effect the detectable-effect search considers.
pub const MDE_SEARCH_MIN: f64 = 0.0001;
/// Largest effect the detectable-effect search considers.
pub const MDE_SEARCH_MAX: f64 = 0.10;

const RATE_MARGIN: f64 = 1e-9;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "solve_for", rename_all = "snake_case")]
pub enum PowerSpec {
    SampleSize {
        baseline_rate: f64,
        mde: f64,
        alpha: f64,
        power: f64,
    },
    DetectableEffect {
        baseline_rate: f64,
        n_per_group: u64,
        alpha: f64,
        power: f64,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SampleSizeResult {
    pub baseline_rate: f64,
    pub mde: f64,
    pub alpha: f64,
    pub power: f64,
    pub required_n_per_group: u64,
    pub required_n_total: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DetectableEffectResult {
    pub baseline_rate: f64,
    pub n_per_group: u64,
    pub alpha: f64,
    pub power: f64,
    pub detectable_mde: f64,
    /// Detectable effect as a fraction of the baseline rate.
    pub detectable_mde_relative: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum PowerOutcome {
    SampleSize(SampleSizeResult),
    DetectableEffect(DetectableEffectResult),
}

struct Quantiles {
    z_alpha: f64,
    z_power: f64,
}

impl Quantiles {
    fn new(alpha: f64, power: f64) -> Result<Self> {
        ensure_open_unit("alpha", alpha)?;
        ensure_open_unit("power", power)?;
        Ok(Self {
            z_alpha: z_critical(alpha)?,
            z_power: normal_quantile(power)?,
        })
    }
}

fn standard_errors(baseline_rate: f64, mde: f64) -> (f64, f64) {
    let p1 = baseline_rate;
    let p2 = baseline_rate + mde;
    let p_bar = (p1 + p2) / 2.0;
    let se_null = (2.0 * p_bar * (1.0 - p_bar)).sqrt();
    let se_alt = (p1 * (1.0 - p1) + p2 * (1.0 - p2)).sqrt();
    (se_null, se_alt)
}

fn n_for_effect(baseline_rate: f64, mde: f64, q: &Quantiles) -> f64 {
    let (se_null, se_alt) = standard_errors(baseline_rate, mde);
    ((q.z_alpha * se_null + q.z_power * se_alt) / mde).powi(2)
}

fn check_effect(baseline_rate: f64, mde: f64) -> Result<()> {
    ensure_open_unit("baseline_rate", baseline_rate)?;
    if mde == 0.0 || !mde.is_finite() {
        return Err(AnalysisError::domain(format!(
            "mde must be a non-zero finite number, got {mde}"
        )));
    }
    ensure_open_unit("baseline_rate + mde", baseline_rate + mde)
}

pub struct PowerAnalyzer;

impl PowerAnalyzer {
    /// Unrounded per-group sample size.
    pub fn sample_size_exact(baseline_rate: f64, mde: f64, alpha: f64, power: f64) -> Result<f64> {
        check_effect(baseline_rate, mde)?;
        let q = Quantiles::new(alpha, power)?;
        Ok(n_for_effect(baseline_rate, mde, &q))
    }

    pub fn required_sample_size(
        baseline_rate: f64,
        mde: f64,
        alpha: f64,
        power: f64,
    ) -> Result<SampleSizeResult> {
        let n = Self::sample_size_exact(baseline_rate, mde, alpha, power)?.ceil() as u64;

        tracing::debug!(baseline_rate, mde, alpha, power, n_per_group = n, "Required sample size");

        Ok(SampleSizeResult {
            baseline_rate,
            mde,
            alpha,
            power,
            required_n_per_group: n,
            required_n_total: n * 2,
        })
    }

    /// Smallest absolute effect detectable with `n_per_group` users per arm.
    ///
    /// Searches `mde` in `[MDE_SEARCH_MIN, MDE_SEARCH_MAX]`; the upper bound is
    /// pulled below `1 - baseline_rate` so the treatment rate stays a valid
    /// probability.
    pub fn detectable_effect(
        baseline_rate: f64,
        n_per_group: u64,
        alpha: f64,
        power: f64,
    ) -> Result<DetectableEffectResult> {
        ensure_open_unit("baseline_rate", baseline_rate)?;
        if n_per_group == 0 {
            return Err(AnalysisError::domain("n_per_group must be positive"));
        }
        let q = Quantiles::new(alpha, power)?;

        let hi = MDE_SEARCH_MAX.min(1.0 - baseline_rate - RATE_MARGIN);
        if hi <= MDE_SEARCH_MIN {
            return Err(AnalysisError::domain(format!(
                "baseline_rate {baseline_rate} leaves no room for an effect of at least {MDE_SEARCH_MIN}"
            )));
        }

        let mde = MonotoneBisection::new(MDE_SEARCH_MIN, hi)
            .solve(|m| n_for_effect(baseline_rate, m, &q), n_per_group as f64)
            .map_err(|err| {
                AnalysisError::domain(format!(
                    "n_per_group {n_per_group} has no detectable effect in the search range: {err}"
                ))
            })?;

        tracing::debug!(baseline_rate, n_per_group, detectable_mde = mde, "Detectable effect");

        Ok(DetectableEffectResult {
            baseline_rate,
            n_per_group,
            alpha,
            power,
            detectable_mde: mde,
            detectable_mde_relative: mde / baseline_rate,
        })
    }

    /// Power reached by `n_per_group` users per arm against a true effect of `mde`.
    pub fn achieved_power(baseline_rate: f64, mde: f64, n_per_group: u64, alpha: f64) -> Result<f64> {
        check_effect(baseline_rate, mde)?;
        if n_per_group == 0 {
            return Err(AnalysisError::domain("n_per_group must be positive"));
        }
        let z_alpha = z_critical(alpha)?;
        let (se_null, se_alt) = standard_errors(baseline_rate, mde);
        let z = (mde.abs() * (n_per_group as f64).sqrt() - z_alpha * se_null) / se_alt;
        Ok(standard_normal()?.cdf(z))
    }

    pub fn solve(spec: &PowerSpec) -> Result<PowerOutcome> {
        match *spec {
            PowerSpec::SampleSize {
                baseline_rate,
                mde,
                alpha,
                power,
            } => Self::required_sample_size(baseline_rate, mde, alpha, power)
                .map(PowerOutcome::SampleSize),
            PowerSpec::DetectableEffect {
                baseline_rate,
                n_per_group,
                alpha,
                power,
            } => Self::detectable_effect(baseline_rate, n_per_group, alpha, power)
                .map(PowerOutcome::DetectableEffect),
        }
    }
}
