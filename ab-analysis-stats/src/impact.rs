//! Revenue projection of an observed lift.

use ab_analysis_core::{AnalysisError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::proportion_test::TestResult;

const MONTHS_PER_YEAR: i64 = 12;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    pub name: String,
    pub monthly_visitors: u64,
    pub revenue_per_conversion: Decimal,
    /// Share of traffic that would receive the treatment, in `[0, 1]`.
    pub rollout_percentage: f64,
}

impl Scenario {
    pub fn new(
        name: impl Into<String>,
        monthly_visitors: u64,
        revenue_per_conversion: Decimal,
        rollout_percentage: f64,
    ) -> Self {
        Self {
            name: name.into(),
            monthly_visitors,
            revenue_per_conversion,
            rollout_percentage,
        }
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.rollout_percentage) {
            return Err(AnalysisError::domain(format!(
                "scenario {:?}: rollout_percentage must be in [0, 1], got {}",
                self.name, self.rollout_percentage
            )));
        }
        if self.revenue_per_conversion.is_sign_negative() {
            return Err(AnalysisError::domain(format!(
                "scenario {:?}: revenue_per_conversion must not be negative",
                self.name
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImpactEstimate {
    pub scenario: String,
    pub absolute_lift: f64,
    pub additional_conversions: f64,
    pub monthly_revenue_impact: Decimal,
    pub yearly_revenue_impact: Decimal,
}

/// Impact at the lower bound, point estimate and upper bound of the lift interval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImpactRange {
    pub scenario: String,
    pub pessimistic: ImpactEstimate,
    pub expected: ImpactEstimate,
    pub optimistic: ImpactEstimate,
}

/// monthly = visitors * rollout * lift * revenue_per_conversion; yearly = 12 * monthly.
///
/// Both amounts are rounded to cents from the unrounded monthly value.
pub fn estimate_impact(absolute_lift: f64, scenario: &Scenario) -> Result<ImpactEstimate> {
    scenario.validate()?;
    if !absolute_lift.is_finite() {
        return Err(AnalysisError::domain(format!(
            "absolute lift must be finite, got {absolute_lift}"
        )));
    }

    let effective_visitors = scenario.monthly_visitors as f64 * scenario.rollout_percentage;
    let additional_conversions = effective_visitors * absolute_lift;
    let conversions = Decimal::try_from(additional_conversions)
        .map_err(|e| AnalysisError::domain(format!("scenario {:?}: {e}", scenario.name)))?;

    let monthly = conversions * scenario.revenue_per_conversion;
    let yearly = (monthly * Decimal::from(MONTHS_PER_YEAR)).round_dp(2);
    let monthly = monthly.round_dp(2);

    Ok(ImpactEstimate {
        scenario: scenario.name.clone(),
        absolute_lift,
        additional_conversions,
        monthly_revenue_impact: monthly,
        yearly_revenue_impact: yearly,
    })
}

#[derive(Debug, Clone, Default)]
pub struct BusinessImpactProjector {
    scenarios: Vec<Scenario>,
}

impl BusinessImpactProjector {
    pub fn new(scenarios: Vec<Scenario>) -> Self {
        Self { scenarios }
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn estimate(&self, absolute_lift: f64) -> Result<Vec<ImpactEstimate>> {
        self.scenarios
            .iter()
            .map(|s| estimate_impact(absolute_lift, s))
            .collect()
    }

    pub fn project(&self, result: &TestResult) -> Result<Vec<ImpactRange>> {
        self.scenarios
            .iter()
            .map(|s| {
                Ok(ImpactRange {
                    scenario: s.name.clone(),
                    pessimistic: estimate_impact(result.ci_low, s)?,
                    expected: estimate_impact(result.absolute_lift, s)?,
                    optimistic: estimate_impact(result.ci_high, s)?,
                })
            })
            .collect()
    }
}
