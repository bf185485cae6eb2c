//! Raw event validation and cleaning.
//!
//! Turns the assignment log and the per-user country table into
//! analysis-ready [`ExperimentRecord`]s: one record per user, with the
//! group/landing-page pairing verified and the country attached as segment.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::domain::{ExperimentRecord, LandingPage, UserId, Variant};
use crate::error::{AnalysisError, Result};

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

// ===== Input Rows =====

/// One row of the raw assignment/outcome log, before any validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawEvent {
    #[serde(deserialize_with = "user_id_from_any")]
    pub user_id: UserId,
    pub timestamp: String,
    pub group: String,
    pub landing_page: String,
    pub converted: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountryRecord {
    #[serde(deserialize_with = "user_id_from_any")]
    pub user_id: UserId,
    pub country: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AnyId {
    Number(u64),
    Text(String),
}

fn user_id_from_any<'de, D>(deserializer: D) -> std::result::Result<UserId, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match AnyId::deserialize(deserializer)? {
        AnyId::Number(n) => UserId::from(n),
        AnyId::Text(s) => UserId::from(s),
    })
}

impl RawEvent {
    fn variant(&self) -> Option<Variant> {
        self.group.parse().ok()
    }

    fn page(&self) -> Option<LandingPage> {
        self.landing_page.parse().ok()
    }

    /// True when the group and the landing page the user actually saw agree.
    pub fn is_consistent(&self) -> bool {
        match (self.variant(), self.page()) {
            (Some(variant), Some(page)) => variant.expected_page() == page,
            _ => false,
        }
    }

    fn is_mismatch(&self) -> bool {
        match self.variant() {
            Some(variant) => self.landing_page != variant.expected_page().as_str(),
            None => false,
        }
    }
}

// ===== Quality Report =====

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QualityReport {
    pub row_count_events: usize,
    pub row_count_countries: usize,
    pub duplicate_users: usize,
    pub mismatch_rows: usize,
    pub users_missing_country: usize,
    pub country_users_missing_events: usize,
    pub errors: Vec<String>,
}

/// Checks value constraints on both inputs.
///
/// Counts duplicates, group/page mismatches and join gaps for the report.
/// Fails with [`AnalysisError::Validation`] listing every invalid group,
/// landing page and conversion value found.
pub fn validate(events: &[RawEvent], countries: &[CountryRecord]) -> Result<QualityReport> {
    let mut errors = Vec::new();

    let invalid_groups: BTreeSet<&str> = events
        .iter()
        .filter(|e| e.variant().is_none())
        .map(|e| e.group.as_str())
        .collect();
    if !invalid_groups.is_empty() {
        errors.push(format!("invalid group values: {invalid_groups:?}"));
    }

    let invalid_pages: BTreeSet<&str> = events
        .iter()
        .filter(|e| e.page().is_none())
        .map(|e| e.landing_page.as_str())
        .collect();
    if !invalid_pages.is_empty() {
        errors.push(format!("invalid landing_page values: {invalid_pages:?}"));
    }

    let invalid_conversions: BTreeSet<i64> = events
        .iter()
        .filter(|e| !matches!(e.converted, 0 | 1))
        .map(|e| e.converted)
        .collect();
    if !invalid_conversions.is_empty() {
        errors.push(format!("invalid converted values: {invalid_conversions:?}"));
    }

    let mut seen = HashSet::new();
    let duplicate_users = events
        .iter()
        .filter(|e| !seen.insert(e.user_id.as_str()))
        .count();

    let mismatch_rows = events.iter().filter(|e| e.is_mismatch()).count();

    let event_users: HashSet<&str> = events.iter().map(|e| e.user_id.as_str()).collect();
    let country_users: HashSet<&str> = countries.iter().map(|c| c.user_id.as_str()).collect();

    let report = QualityReport {
        row_count_events: events.len(),
        row_count_countries: countries.len(),
        duplicate_users,
        mismatch_rows,
        users_missing_country: event_users.difference(&country_users).count(),
        country_users_missing_events: country_users.difference(&event_users).count(),
        errors,
    };

    if !report.errors.is_empty() {
        return Err(AnalysisError::Validation(report.errors.join("; ")));
    }

    tracing::debug!(
        rows = report.row_count_events,
        duplicates = report.duplicate_users,
        mismatches = report.mismatch_rows,
        "Raw events validated"
    );

    Ok(report)
}

// ===== Cleaning =====

/// Parses the log's timestamp formats; anything unparseable becomes `None`.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}

/// Produces one record per user.
///
/// Rows whose group and landing page disagree are dropped. The remaining rows
/// are ordered by timestamp (missing timestamps last) and only the latest row
/// per user is kept. Countries are left-joined as the record segment.
pub fn clean(events: &[RawEvent], countries: &[CountryRecord]) -> Vec<ExperimentRecord> {
    let mut valid: Vec<(Option<NaiveDateTime>, &RawEvent)> = events
        .iter()
        .filter(|e| e.is_consistent() && matches!(e.converted, 0 | 1))
        .map(|e| (parse_timestamp(&e.timestamp), e))
        .collect();

    // Stable: equal timestamps keep their input order.
    valid.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    let mut latest: HashMap<&str, usize> = HashMap::with_capacity(valid.len());
    for (idx, (_, event)) in valid.iter().enumerate() {
        latest.insert(event.user_id.as_str(), idx);
    }

    let mut country_by_user: HashMap<&str, &str> = HashMap::with_capacity(countries.len());
    for row in countries {
        country_by_user
            .entry(row.user_id.as_str())
            .or_insert(row.country.as_str());
    }

    let records: Vec<ExperimentRecord> = valid
        .iter()
        .enumerate()
        .filter(|(idx, (_, event))| latest.get(event.user_id.as_str()) == Some(idx))
        .filter_map(|(_, (timestamp, event))| {
            let variant = event.variant()?;
            Some(ExperimentRecord {
                user_id: event.user_id.clone(),
                variant,
                outcome: event.converted == 1,
                segment: country_by_user
                    .get(event.user_id.as_str())
                    .map(|c| c.to_string()),
                timestamp: *timestamp,
            })
        })
        .collect();

    tracing::info!(
        original = events.len(),
        cleaned = records.len(),
        "Experiment data cleaned"
    );

    records
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CleaningSummary {
    pub original_records: usize,
    pub clean_records: usize,
    pub removed_records: usize,
    pub pct_removed: f64,
}

impl CleaningSummary {
    pub fn new(original_records: usize, clean_records: usize) -> Self {
        let removed_records = original_records.saturating_sub(clean_records);
        let pct_removed = if original_records == 0 {
            0.0
        } else {
            removed_records as f64 / original_records as f64 * 100.0
        };

        Self {
            original_records,
            clean_records,
            removed_records,
            pct_removed,
        }
    }
}
