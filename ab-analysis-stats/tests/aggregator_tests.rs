use ab_analysis_core::{ExperimentRecord, Variant};
use ab_analysis_stats::aggregators::{mean, percentile, ConversionAggregator};
use approx::assert_relative_eq;
use pretty_assertions::assert_eq;

fn records() -> Vec<ExperimentRecord> {
    vec![
        ExperimentRecord::new("1", Variant::Control, true).with_segment("US"),
        ExperimentRecord::new("2", Variant::Control, false).with_segment("US"),
        ExperimentRecord::new("3", Variant::Control, false).with_segment("UK"),
        ExperimentRecord::new("4", Variant::Treatment, true).with_segment("US"),
        ExperimentRecord::new("5", Variant::Treatment, true).with_segment("UK"),
        ExperimentRecord::new("6", Variant::Treatment, false),
    ]
}

#[test]
fn test_by_variant() {
    let metrics = ConversionAggregator::by_variant(&records());

    assert_eq!(metrics.len(), 2);
    assert_eq!(metrics[0].variant, Variant::Control);
    assert_eq!(metrics[0].segment, None);
    assert_eq!(metrics[0].users, 3);
    assert_eq!(metrics[0].conversions, 1);
    assert_relative_eq!(metrics[0].conversion_rate, 1.0 / 3.0, epsilon = 1e-12);
    assert_eq!(metrics[1].variant, Variant::Treatment);
    assert_relative_eq!(metrics[1].conversion_rate, 2.0 / 3.0, epsilon = 1e-12);
}

#[test]
fn test_by_segment_and_variant() {
    let metrics = ConversionAggregator::by_segment_and_variant(&records());
    let keys: Vec<(Option<&str>, Variant)> = metrics
        .iter()
        .map(|m| (m.segment.as_deref(), m.variant))
        .collect();

    assert_eq!(
        keys,
        vec![
            (None, Variant::Treatment),
            (Some("UK"), Variant::Control),
            (Some("UK"), Variant::Treatment),
            (Some("US"), Variant::Control),
            (Some("US"), Variant::Treatment),
        ]
    );
    assert_eq!(metrics[3].observations, 2);
    assert_relative_eq!(metrics[3].conversion_rate, 0.5, epsilon = 1e-12);
}

#[test]
fn test_users_count_distinct_ids() {
    let records = vec![
        ExperimentRecord::new("1", Variant::Control, true),
        ExperimentRecord::new("1", Variant::Control, false),
    ];
    let metrics = ConversionAggregator::by_variant(&records);

    assert_eq!(metrics[0].users, 1);
    assert_eq!(metrics[0].observations, 2);
}

#[test]
fn test_empty_input() {
    assert!(ConversionAggregator::by_variant(&[]).is_empty());
}

#[test]
fn test_mean_and_percentile() {
    let sorted = [0.1, 0.2, 0.3, 0.4, 0.5];
    assert_relative_eq!(mean(&sorted), 0.3, epsilon = 1e-12);
    assert_relative_eq!(percentile(&sorted, 50.0), 0.3, epsilon = 1e-12);
    assert_relative_eq!(percentile(&sorted, 25.0), 0.2, epsilon = 1e-12);
}
