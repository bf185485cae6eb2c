use serde::{Deserialize, Serialize};

use super::record::ExperimentRecord;
use super::variant::Variant;
use crate::error::{AnalysisError, Result};

/// Successes out of trials for one group.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "ProportionCounts")]
pub struct ProportionEstimate {
    successes: u64,
    trials: u64,
}

#[derive(Deserialize)]
struct ProportionCounts {
    successes: u64,
    trials: u64,
}

impl TryFrom<ProportionCounts> for ProportionEstimate {
    type Error = AnalysisError;

    fn try_from(counts: ProportionCounts) -> Result<Self> {
        Self::new(counts.successes, counts.trials)
    }
}

impl ProportionEstimate {
    pub fn new(successes: u64, trials: u64) -> Result<Self> {
        if trials == 0 {
            return Err(AnalysisError::insufficient_data(
                "proportion requires at least one trial",
            ));
        }
        if successes > trials {
            return Err(AnalysisError::domain(format!(
                "successes ({successes}) exceed trials ({trials})"
            )));
        }
        Ok(Self { successes, trials })
    }

    /// Counts the records belonging to `variant`; fails when that variant has no records.
    pub fn from_records(records: &[ExperimentRecord], variant: Variant) -> Result<Self> {
        let (successes, trials) = records
            .iter()
            .filter(|r| r.variant == variant)
            .fold((0u64, 0u64), |(s, t), r| (s + u64::from(r.outcome), t + 1));

        if trials == 0 {
            return Err(AnalysisError::insufficient_data(format!(
                "{variant} group has zero trials"
            )));
        }
        Self::new(successes, trials)
    }

    pub fn successes(&self) -> u64 {
        self.successes
    }

    pub fn trials(&self) -> u64 {
        self.trials
    }

    pub fn failures(&self) -> u64 {
        self.trials - self.successes
    }

    pub fn rate(&self) -> f64 {
        self.successes as f64 / self.trials as f64
    }
}
