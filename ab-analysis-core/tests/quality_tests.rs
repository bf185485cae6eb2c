use ab_analysis_core::*;
use pretty_assertions::assert_eq;

fn event(user: &str, ts: &str, group: &str, page: &str, converted: i64) -> RawEvent {
    RawEvent {
        user_id: UserId::new(user),
        timestamp: ts.to_string(),
        group: group.to_string(),
        landing_page: page.to_string(),
        converted,
    }
}

fn country(user: &str, country: &str) -> CountryRecord {
    CountryRecord {
        user_id: UserId::new(user),
        country: country.to_string(),
    }
}

fn sample_events() -> Vec<RawEvent> {
    vec![
        event("1", "2017-01-21 22:11:48.556739", "control", "old_page", 0),
        event("2", "2017-01-12 08:01:45.159739", "control", "new_page", 0),
        event("3", "2017-01-11 16:55:06.154213", "treatment", "new_page", 0),
        event("3", "2017-01-14 10:02:01.000000", "treatment", "new_page", 1),
        event("4", "2017-01-08 18:28:03.143765", "treatment", "old_page", 0),
    ]
}

fn sample_countries() -> Vec<CountryRecord> {
    vec![country("1", "US"), country("3", "UK"), country("9", "CA")]
}

// ===== Validation Tests =====

#[test]
fn test_validate_counts() {
    let report = validate(&sample_events(), &sample_countries()).unwrap();

    assert_eq!(report.row_count_events, 5);
    assert_eq!(report.row_count_countries, 3);
    assert_eq!(report.duplicate_users, 1);
    assert_eq!(report.mismatch_rows, 2);
    assert_eq!(report.users_missing_country, 2);
    assert_eq!(report.country_users_missing_events, 1);
    assert!(report.errors.is_empty());
}

#[test]
fn test_validate_rejects_invalid_values() {
    let events = vec![
        event("1", "2017-01-21 22:11:48", "holdout", "old_page", 0),
        event("2", "2017-01-21 22:11:48", "control", "beta_page", 2),
    ];

    let err = validate(&events, &[]).unwrap_err();
    match err {
        AnalysisError::Validation(msg) => {
            assert!(msg.contains("holdout"));
            assert!(msg.contains("beta_page"));
            assert!(msg.contains("converted"));
        }
        other => panic!("Expected Validation error, got {other:?}"),
    }
}

// ===== Cleaning Tests =====

#[test]
fn test_clean_drops_mismatches_and_duplicates() {
    let records = clean(&sample_events(), &sample_countries());

    assert_eq!(records.len(), 2);
    let variants: Vec<Variant> = records.iter().map(|r| r.variant).collect();
    assert!(variants.contains(&Variant::Control));
    assert!(variants.contains(&Variant::Treatment));
}

#[test]
fn test_clean_keeps_latest_event_per_user() {
    let records = clean(&sample_events(), &sample_countries());

    let user3 = records
        .iter()
        .find(|r| r.user_id.as_str() == "3")
        .expect("user 3 survives cleaning");
    assert!(user3.outcome, "latest event for user 3 converted");
    assert_eq!(user3.segment(), Some("UK"));
}

#[test]
fn test_clean_orders_by_timestamp() {
    let records = clean(&sample_events(), &sample_countries());
    let ids: Vec<&str> = records.iter().map(|r| r.user_id.as_str()).collect();
    assert_eq!(ids, vec!["3", "1"]);
}

#[test]
fn test_clean_left_join_leaves_missing_country_empty() {
    let events = vec![event("5", "2017-01-02 00:00:00", "control", "old_page", 1)];
    let records = clean(&events, &sample_countries());

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].segment(), None);
}

#[test]
fn test_clean_unparseable_timestamp_sorts_last() {
    let events = vec![
        event("1", "not-a-date", "control", "old_page", 0),
        event("1", "2017-01-02 00:00:00", "control", "old_page", 1),
    ];
    let records = clean(&events, &[]);

    assert_eq!(records.len(), 1);
    assert!(!records[0].outcome);
    assert!(records[0].timestamp.is_none());
}

#[test]
fn test_raw_event_accepts_numeric_user_id() {
    let json = r#"{"user_id": 851104, "timestamp": "2017-01-21 22:11:48.556739",
                   "group": "control", "landing_page": "old_page", "converted": 0}"#;
    let event: RawEvent = serde_json::from_str(json).unwrap();
    assert_eq!(event.user_id.as_str(), "851104");
}

// ===== Cleaning Summary =====

#[test]
fn test_cleaning_summary() {
    let summary = CleaningSummary::new(200, 150);
    assert_eq!(summary.removed_records, 50);
    assert!((summary.pct_removed - 25.0).abs() < 1e-12);

    let empty = CleaningSummary::new(0, 0);
    assert_eq!(empty.pct_removed, 0.0);
}
