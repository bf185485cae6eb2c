use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::ids::UserId;
use super::variant::Variant;

/// One analysis-ready observation: a single user, their variant and whether they converted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperimentRecord {
    pub user_id: UserId,
    pub variant: Variant,
    pub outcome: bool,
    #[serde(default)]
    pub segment: Option<String>,
    #[serde(default)]
    pub timestamp: Option<NaiveDateTime>,
}

impl ExperimentRecord {
    pub fn new(user_id: impl Into<UserId>, variant: Variant, outcome: bool) -> Self {
        Self {
            user_id: user_id.into(),
            variant,
            outcome,
            segment: None,
            timestamp: None,
        }
    }

    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.segment = Some(segment.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: NaiveDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn segment(&self) -> Option<&str> {
        self.segment.as_deref()
    }
}
