use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AnalysisError;

// ===== Variant =====

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Control,
    Treatment,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Control => "control",
            Variant::Treatment => "treatment",
        }
    }

    /// The landing page a correctly assigned user of this variant sees.
    pub fn expected_page(&self) -> LandingPage {
        match self {
            Variant::Control => LandingPage::OldPage,
            Variant::Treatment => LandingPage::NewPage,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "control" => Ok(Variant::Control),
            "treatment" => Ok(Variant::Treatment),
            other => Err(AnalysisError::Validation(format!(
                "invalid group value: {other:?}"
            ))),
        }
    }
}

// ===== Landing Page =====

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LandingPage {
    OldPage,
    NewPage,
}

impl LandingPage {
    pub fn as_str(&self) -> &'static str {
        match self {
            LandingPage::OldPage => "old_page",
            LandingPage::NewPage => "new_page",
        }
    }
}

impl FromStr for LandingPage {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "old_page" => Ok(LandingPage::OldPage),
            "new_page" => Ok(LandingPage::NewPage),
            other => Err(AnalysisError::Validation(format!(
                "invalid landing_page value: {other:?}"
            ))),
        }
    }
}

// ===== Alternative Hypothesis =====

/// Direction of the alternative hypothesis, always phrased as treatment versus control.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Alternative {
    #[default]
    TwoSided,
    /// Treatment converts better than control.
    #[serde(alias = "larger")]
    Greater,
    /// Treatment converts worse than control.
    #[serde(alias = "smaller")]
    Less,
}

impl Alternative {
    pub fn as_str(&self) -> &'static str {
        match self {
            Alternative::TwoSided => "two-sided",
            Alternative::Greater => "greater",
            Alternative::Less => "less",
        }
    }
}

impl fmt::Display for Alternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
