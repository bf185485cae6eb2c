use ab_analysis_core::{ensure_open_unit, AnalysisError, Result};
use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};

/// Standard normal distribution N(0, 1).
pub fn standard_normal() -> Result<Normal> {
    Normal::new(0.0, 1.0).map_err(|e| AnalysisError::domain(e.to_string()))
}

/// Quantile of the standard normal: z such that P(Z < z) = p.
pub fn normal_quantile(p: f64) -> Result<f64> {
    ensure_open_unit("quantile probability", p)?;
    Ok(standard_normal()?.inverse_cdf(p))
}

/// Two-sided critical value z_{1 - alpha/2}.
pub fn z_critical(alpha: f64) -> Result<f64> {
    ensure_open_unit("alpha", alpha)?;
    normal_quantile(1.0 - alpha / 2.0)
}

/// Upper-tail probability of a chi-square statistic.
pub fn chi_square_sf(statistic: f64, degrees_of_freedom: f64) -> Result<f64> {
    let dist = ChiSquared::new(degrees_of_freedom)
        .map_err(|e| AnalysisError::domain(e.to_string()))?;
    Ok(dist.sf(statistic))
}
