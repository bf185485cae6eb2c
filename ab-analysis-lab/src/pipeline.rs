//! End-to-end analysis: raw event logs in, decision report out.

use ab_analysis_core::{clean, validate, CleaningSummary, CountryRecord, RawEvent};
use ab_analysis_stats::{
    BayesianEngine, BayesianInput, BusinessImpactProjector, ConversionAggregator,
    DecisionReport, PosteriorSample, PowerAnalyzer, ProportionTest, SampleRatioCheck,
    SegmentAnalyzer,
};
use anyhow::{Context as _, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

use crate::config::AnalysisConfig;

pub struct AnalysisOutput {
    pub report: DecisionReport,
    pub posterior: PosteriorSample,
}

/// Reads a JSON array of rows from `path`.
pub fn load_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read input from {:?}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse JSON rows from {:?}", path))
}

pub fn run(
    events: &[RawEvent],
    countries: &[CountryRecord],
    config: &AnalysisConfig,
) -> Result<AnalysisOutput> {
    let settings = &config.experiment;

    tracing::info!(events = events.len(), countries = countries.len(), "Validating input");
    let quality = validate(events, countries).context("Input failed validation")?;
    if quality.duplicate_users > 0 || quality.mismatch_rows > 0 {
        tracing::warn!(
            duplicate_users = quality.duplicate_users,
            mismatch_rows = quality.mismatch_rows,
            "Input contains rows that will be removed"
        );
    }

    let records = clean(events, countries);
    let cleaning = CleaningSummary::new(events.len(), records.len());
    tracing::info!(
        clean_records = cleaning.clean_records,
        removed = cleaning.removed_records,
        "Cleaned experiment records"
    );

    let by_variant = ConversionAggregator::by_variant(&records);
    let by_segment = ConversionAggregator::by_segment_and_variant(&records);

    tracing::info!("Running frequentist test");
    let test = ProportionTest::from_records(&records, settings.alpha, settings.alternative)
        .context("Overall proportion test failed")?;

    let srm = SampleRatioCheck::default()
        .with_threshold(settings.srm_threshold)
        .and_then(|check| check.check_records(&records))
        .context("Sample ratio check failed")?;

    let baseline = settings.baseline_rate.unwrap_or(test.control_rate);
    let sample_size =
        PowerAnalyzer::required_sample_size(baseline, settings.mde, settings.alpha, settings.power)
            .map_err(|err| tracing::warn!(error = %err, "Skipping sample size calculation"))
            .ok();
    let n_smaller_arm = test.control.trials().min(test.treatment.trials());
    let detectable_effect =
        PowerAnalyzer::detectable_effect(baseline, n_smaller_arm, settings.alpha, settings.power)
            .map_err(|err| tracing::warn!(error = %err, "Skipping detectable effect calculation"))
            .ok();
    let achieved_power =
        PowerAnalyzer::achieved_power(baseline, settings.mde, n_smaller_arm, settings.alpha)
            .map_err(|err| tracing::warn!(error = %err, "Skipping achieved power calculation"))
            .ok();

    tracing::info!(n_samples = config.bayesian.n_samples, "Simulating posteriors");
    let bayesian = BayesianEngine::run(
        &BayesianInput::new(
            test.control.trials(),
            test.control.successes(),
            test.treatment.trials(),
            test.treatment.successes(),
        )
        .with_prior(config.bayesian.prior_alpha, config.bayesian.prior_beta)
        .with_samples(config.bayesian.n_samples)
        .with_seed(config.bayesian.seed),
    )
    .context("Posterior simulation failed")?;

    tracing::info!("Analyzing segments");
    let segments = SegmentAnalyzer::new(settings.alpha)
        .with_alternative(settings.alternative)
        .with_correction(settings.correction)
        .analyze_by_segment(&records)
        .map_err(|err| tracing::warn!(error = %err, "Skipping segment analysis"))
        .ok();

    let impact = BusinessImpactProjector::new(config.scenarios())
        .project(&test)
        .context("Impact projection failed")?;

    let mut report = DecisionReport::new(test, srm)
        .with_quality(quality, cleaning)
        .with_conversions(by_variant, by_segment)
        .with_power(sample_size, detectable_effect, achieved_power)
        .with_bayesian(bayesian.summary)
        .with_impact(impact);
    if let Some(segments) = segments {
        report = report.with_segments(segments);
    }

    tracing::info!(
        recommendation = %report.recommendation,
        p_value = report.test.p_value,
        "Analysis complete"
    );

    Ok(AnalysisOutput {
        report,
        posterior: bayesian.samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ab_analysis_stats::Recommendation;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn event(id: u64, group: &str, converted: i64, minute: u32) -> serde_json::Value {
        let page = if group == "control" { "old_page" } else { "new_page" };
        json!({
            "user_id": id,
            "timestamp": format!("2017-01-21 22:{:02}:00.000000", minute % 60),
            "group": group,
            "landing_page": page,
            "converted": converted,
        })
    }

    fn dataset() -> (Vec<RawEvent>, Vec<CountryRecord>) {
        let mut events = Vec::new();
        let mut countries = Vec::new();
        let countries_cycle = ["US", "UK", "CA"];
        for i in 0..900u64 {
            let (group, converted) = if i % 2 == 0 {
                ("control", i64::from(i % 10 == 0))
            } else {
                ("treatment", i64::from(matches!(i % 10, 1 | 3)))
            };
            events.push(event(i, group, converted, i as u32));
            countries.push(json!({
                "user_id": i,
                "country": countries_cycle[(i % 3) as usize],
            }));
        }
        // Misaligned row and a duplicate user.
        events.push(json!({
            "user_id": 10_000,
            "timestamp": "2017-01-21 23:00:00.000000",
            "group": "control",
            "landing_page": "new_page",
            "converted": 1,
        }));
        events.push(event(0, "control", 1, 59));

        (
            serde_json::from_value(serde_json::Value::Array(events)).unwrap(),
            serde_json::from_value(serde_json::Value::Array(countries)).unwrap(),
        )
    }

    fn small_config() -> AnalysisConfig {
        let mut config = AnalysisConfig::default();
        config.bayesian.n_samples = 2_000;
        config
    }

    #[test]
    fn test_full_run() {
        let (events, countries) = dataset();
        let output = run(&events, &countries, &small_config()).unwrap();
        let report = &output.report;

        let quality = report.quality.as_ref().unwrap();
        assert_eq!(quality.row_count_events, 902);
        assert_eq!(quality.duplicate_users, 1);
        assert_eq!(quality.mismatch_rows, 1);

        let cleaning = report.cleaning.as_ref().unwrap();
        assert_eq!(cleaning.clean_records, 900);

        assert_eq!(report.test.control.trials(), 450);
        assert_eq!(report.test.treatment.trials(), 450);
        assert!(!report.srm.srm_detected);
        assert_eq!(report.conversion_by_variant.len(), 2);

        let segments = report.segments.as_ref().unwrap();
        let names: Vec<&str> = segments.rows.iter().map(|r| r.segment.as_str()).collect();
        assert_eq!(names, vec!["CA", "UK", "US"]);

        assert!(report.sample_size.is_some());
        assert!(report.detectable_effect.is_some());
        let expected_power =
            PowerAnalyzer::achieved_power(report.test.control_rate, 0.01, 450, 0.05).unwrap();
        assert_eq!(report.achieved_power, Some(expected_power));
        assert_eq!(report.impact.len(), 2);
        assert_eq!(output.posterior.len(), 2_000);
    }

    #[test]
    fn test_treatment_winner_ships() {
        let (events, countries) = dataset();
        let report = run(&events, &countries, &small_config()).unwrap().report;

        // Treatment converts at 40% against 20% for control.
        assert!(report.test.absolute_lift > 0.0);
        assert!(report.test.is_significant());
        assert_eq!(report.recommendation, Recommendation::Ship);
    }

    #[test]
    fn test_seed_controls_posterior() {
        let (events, countries) = dataset();
        let config = small_config();

        let first = run(&events, &countries, &config).unwrap();
        let second = run(&events, &countries, &config).unwrap();
        assert_eq!(first.posterior, second.posterior);
        assert_eq!(first.report.bayesian, second.report.bayesian);
    }

    #[test]
    fn test_invalid_group_fails_validation() {
        let events: Vec<RawEvent> = serde_json::from_value(json!([{
            "user_id": 1,
            "timestamp": "2017-01-21 22:11:48.556739",
            "group": "holdout",
            "landing_page": "old_page",
            "converted": 0,
        }]))
        .unwrap();

        assert!(run(&events, &[], &small_config()).is_err());
    }

    #[test]
    fn test_load_rows_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("countries.json");
        fs::write(&path, r#"[{"user_id": "7", "country": "UK"}]"#).unwrap();

        let rows: Vec<CountryRecord> = load_rows(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].country, "UK");
    }

    #[test]
    fn test_load_rows_reports_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        fs::write(&path, "not json").unwrap();

        let err = load_rows::<RawEvent>(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse JSON rows"));
    }
}
