use ab_analysis_core::{Alternative, AnalysisError, ProportionEstimate};
use ab_analysis_stats::impact::{estimate_impact, BusinessImpactProjector, Scenario};
use ab_analysis_stats::proportion_test::ProportionTest;
use rstest::rstest;
use rust_decimal::Decimal;

fn base_scenario() -> Scenario {
    Scenario::new("base", 1000, Decimal::new(5000, 2), 1.0)
}

#[test]
fn test_reference_projection() {
    let estimate = estimate_impact(0.01, &base_scenario()).unwrap();

    assert_eq!(estimate.scenario, "base");
    assert!((estimate.additional_conversions - 10.0).abs() < 1e-9);
    assert_eq!(estimate.monthly_revenue_impact, Decimal::new(50000, 2));
    assert_eq!(estimate.yearly_revenue_impact, Decimal::new(600000, 2));
    assert_eq!(estimate.monthly_revenue_impact.to_string(), "500.00");
}

#[test]
fn test_yearly_rounds_unrounded_monthly() {
    // 10 conversions at 0.0127 is 0.127 a month: 0.13 rounded, 1.524 a year.
    let scenario = Scenario::new("cents", 1000, Decimal::new(127, 4), 1.0);
    let estimate = estimate_impact(0.01, &scenario).unwrap();

    assert_eq!(estimate.monthly_revenue_impact, Decimal::new(13, 2));
    assert_eq!(estimate.yearly_revenue_impact, Decimal::new(152, 2));
    assert_ne!(
        estimate.yearly_revenue_impact,
        estimate.monthly_revenue_impact * Decimal::from(12)
    );
}

#[test]
fn test_amounts_rounded_to_cents() {
    let scenario = Scenario::new("partial", 123_457, Decimal::new(1999, 2), 0.35);
    let estimate = estimate_impact(0.0073, &scenario).unwrap();

    assert!(estimate.monthly_revenue_impact.scale() <= 2);
    assert!(estimate.yearly_revenue_impact.scale() <= 2);
}

#[test]
fn test_rollout_scales_impact() {
    let half = Scenario::new("half", 1000, Decimal::new(5000, 2), 0.5);
    let estimate = estimate_impact(0.01, &half).unwrap();
    assert_eq!(estimate.monthly_revenue_impact, Decimal::from(250));
}

#[test]
fn test_negative_lift_projects_loss() {
    let estimate = estimate_impact(-0.01, &base_scenario()).unwrap();
    assert_eq!(estimate.monthly_revenue_impact, Decimal::from(-500));
}

#[test]
fn test_zero_rollout() {
    let none = Scenario::new("none", 1000, Decimal::new(5000, 2), 0.0);
    let estimate = estimate_impact(0.01, &none).unwrap();
    assert!(estimate.monthly_revenue_impact.is_zero());
}

#[rstest]
#[case(1.5)]
#[case(-0.1)]
fn test_invalid_rollout(#[case] rollout: f64) {
    let scenario = Scenario::new("bad", 1000, Decimal::new(5000, 2), rollout);
    assert!(matches!(
        estimate_impact(0.01, &scenario),
        Err(AnalysisError::Domain(_))
    ));
}

#[test]
fn test_negative_revenue_rejected() {
    let scenario = Scenario::new("refund", 1000, Decimal::new(-5000, 2), 1.0);
    assert!(matches!(
        estimate_impact(0.01, &scenario),
        Err(AnalysisError::Domain(_))
    ));
}

#[test]
fn test_non_finite_lift_rejected() {
    assert!(matches!(
        estimate_impact(f64::NAN, &base_scenario()),
        Err(AnalysisError::Domain(_))
    ));
}

#[test]
fn test_projector_ranges_follow_interval() {
    let result = ProportionTest::run(
        &ProportionEstimate::new(120, 1000).unwrap(),
        &ProportionEstimate::new(130, 1000).unwrap(),
        0.05,
        Alternative::TwoSided,
    )
    .unwrap();
    let projector = BusinessImpactProjector::new(vec![
        base_scenario(),
        Scenario::new("large", 1_000_000, Decimal::new(2500, 2), 0.8),
    ]);

    let ranges = projector.project(&result).unwrap();
    assert_eq!(ranges.len(), 2);
    for range in &ranges {
        assert!(range.pessimistic.monthly_revenue_impact < range.expected.monthly_revenue_impact);
        assert!(range.expected.monthly_revenue_impact < range.optimistic.monthly_revenue_impact);
        assert!(range.pessimistic.monthly_revenue_impact.is_sign_negative());
    }
    assert_eq!(ranges[0].expected.monthly_revenue_impact, Decimal::from(500));
}

#[test]
fn test_projector_estimate_per_scenario() {
    let projector = BusinessImpactProjector::new(vec![base_scenario()]);
    let estimates = projector.estimate(0.02).unwrap();

    assert_eq!(projector.scenarios().len(), 1);
    assert_eq!(estimates[0].monthly_revenue_impact, Decimal::from(1000));
}

#[test]
fn test_scenario_from_json() {
    let scenario: Scenario = serde_json::from_str(
        r#"{"name":"base","monthly_visitors":1000,"revenue_per_conversion":"50.00","rollout_percentage":1.0}"#,
    )
    .unwrap();
    assert_eq!(scenario, base_scenario());
}
