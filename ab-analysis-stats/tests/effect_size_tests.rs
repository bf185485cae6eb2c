use ab_analysis_core::AnalysisError;
use ab_analysis_stats::effect_size::{cohens_h, EffectMagnitude, EffectSize};
use proptest::prelude::*;
use rstest::rstest;

#[test]
fn test_identical_proportions() {
    assert_eq!(cohens_h(0.5, 0.5).unwrap(), 0.0);
}

#[test]
fn test_positive_when_first_is_greater() {
    assert!(cohens_h(0.6, 0.4).unwrap() > 0.0);
    assert!(cohens_h(0.4, 0.6).unwrap() < 0.0);
}

#[test]
fn test_extremes() {
    let h = cohens_h(1.0, 0.0).unwrap();
    assert!((h - std::f64::consts::PI).abs() < 1e-12);
}

#[rstest]
#[case(-0.01, 0.5)]
#[case(0.5, 1.01)]
#[case(f64::NAN, 0.5)]
fn test_out_of_range_is_domain_error(#[case] p1: f64, #[case] p2: f64) {
    assert!(matches!(cohens_h(p1, p2), Err(AnalysisError::Domain(_))));
}

#[rstest]
#[case(0.0, EffectMagnitude::Negligible)]
#[case(0.05, EffectMagnitude::Negligible)]
#[case(0.1999, EffectMagnitude::Negligible)]
#[case(0.2, EffectMagnitude::Small)]
#[case(-0.3, EffectMagnitude::Small)]
#[case(0.5, EffectMagnitude::Medium)]
#[case(0.79, EffectMagnitude::Medium)]
#[case(0.8, EffectMagnitude::Large)]
#[case(-0.9, EffectMagnitude::Large)]
fn test_interpretation_thresholds(#[case] h: f64, #[case] expected: EffectMagnitude) {
    assert_eq!(EffectMagnitude::interpret(h), expected);
}

#[test]
fn test_magnitude_labels() {
    assert_eq!(EffectMagnitude::Negligible.to_string(), "negligible");
    assert_eq!(EffectMagnitude::Large.as_str(), "large");
}

#[test]
fn test_effect_size_between() {
    let effect = EffectSize::between(0.13, 0.12).unwrap();
    assert!(effect.cohens_h > 0.0);
    assert_eq!(effect.magnitude, EffectMagnitude::Negligible);
}

proptest! {
    #[test]
    fn prop_cohens_h_is_antisymmetric(p1 in 0.0f64..=1.0, p2 in 0.0f64..=1.0) {
        let forward = cohens_h(p1, p2).unwrap();
        let backward = cohens_h(p2, p1).unwrap();
        prop_assert!((forward + backward).abs() < 1e-12);
    }

    #[test]
    fn prop_cohens_h_is_zero_on_diagonal(p in 0.0f64..=1.0) {
        prop_assert_eq!(cohens_h(p, p).unwrap(), 0.0);
    }
}
