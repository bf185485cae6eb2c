use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// A parameter lies outside its valid mathematical range.
    #[error("Domain error: {0}")]
    Domain(String),

    /// A group or partition has too few observations to compute a statistic.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// The inputs are valid but the requested quantity is undefined.
    #[error("Degenerate result: {0}")]
    DegenerateResult(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AnalysisError {
    pub fn domain(msg: impl Into<String>) -> Self {
        AnalysisError::Domain(msg.into())
    }

    pub fn insufficient_data(msg: impl Into<String>) -> Self {
        AnalysisError::InsufficientData(msg.into())
    }

    pub fn degenerate(msg: impl Into<String>) -> Self {
        AnalysisError::DegenerateResult(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        AnalysisError::Serialization(err.to_string())
    }
}

/// Fails with [`AnalysisError::Domain`] unless `value` is a probability in `[0, 1]`.
pub fn ensure_probability(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(AnalysisError::domain(format!(
            "{name} must be in [0, 1], got {value}"
        )));
    }
    Ok(())
}

/// Fails with [`AnalysisError::Domain`] unless `value` lies strictly inside `(0, 1)`.
pub fn ensure_open_unit(name: &str, value: f64) -> Result<()> {
    if !(value > 0.0 && value < 1.0) {
        return Err(AnalysisError::domain(format!(
            "{name} must be in (0, 1), got {value}"
        )));
    }
    Ok(())
}
