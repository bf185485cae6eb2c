use ab_analysis_core::{ExperimentRecord, Variant};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversionMetrics {
    pub segment: Option<String>,
    pub variant: Variant,
    pub users: usize,
    pub observations: usize,
    pub conversions: u64,
    pub conversion_rate: f64,
}

#[derive(Default)]
struct Tally<'a> {
    users: HashSet<&'a str>,
    observations: usize,
    conversions: u64,
}

pub struct ConversionAggregator;

impl ConversionAggregator {
    pub fn by_variant(records: &[ExperimentRecord]) -> Vec<ConversionMetrics> {
        Self::tally(records, |_| None)
    }

    /// Rows for every (segment, variant) pair; records without a segment form the `None` group.
    pub fn by_segment_and_variant(records: &[ExperimentRecord]) -> Vec<ConversionMetrics> {
        Self::tally(records, |r| r.segment.clone())
    }

    fn tally<F>(records: &[ExperimentRecord], key: F) -> Vec<ConversionMetrics>
    where
        F: Fn(&ExperimentRecord) -> Option<String>,
    {
        let mut groups: BTreeMap<(Option<String>, Variant), Tally<'_>> = BTreeMap::new();

        for record in records {
            let tally = groups.entry((key(record), record.variant)).or_default();
            tally.users.insert(record.user_id.as_str());
            tally.observations += 1;
            tally.conversions += u64::from(record.outcome);
        }

        groups
            .into_iter()
            .map(|((segment, variant), tally)| ConversionMetrics {
                segment,
                variant,
                users: tally.users.len(),
                observations: tally.observations,
                conversions: tally.conversions,
                conversion_rate: tally.conversions as f64 / tally.observations as f64,
            })
            .collect()
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Percentile with linear interpolation between closest ranks.
///
/// `sorted_values` must be sorted ascending; `percentile` is in `[0, 100]`.
pub fn percentile(sorted_values: &[f64], percentile: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }
    let rank = (percentile / 100.0).clamp(0.0, 1.0) * (sorted_values.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    sorted_values[lower] + (sorted_values[upper] - sorted_values[lower]) * weight
}
