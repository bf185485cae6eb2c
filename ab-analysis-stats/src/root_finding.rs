//! Bisection on monotone functions.

use ab_analysis_core::AnalysisError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RootFindingError {
    #[error("invalid bracket [{lo}, {hi}]")]
    InvalidBracket { lo: f64, hi: f64 },

    #[error("root not bracketed in [{lo}, {hi}]: residuals {residual_lo} and {residual_hi} share a sign")]
    NotBracketed {
        lo: f64,
        hi: f64,
        residual_lo: f64,
        residual_hi: f64,
    },
}

impl From<RootFindingError> for AnalysisError {
    fn from(err: RootFindingError) -> Self {
        AnalysisError::Domain(err.to_string())
    }
}

/// Solves `f(x) = target` for a function that is monotone on `[lo, hi]`.
///
/// The direction (increasing or decreasing) is read off the endpoint residuals.
/// A fixed number of halvings is performed and the midpoint of the final
/// bracket is returned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonotoneBisection {
    lo: f64,
    hi: f64,
    iterations: usize,
}

impl MonotoneBisection {
    pub const DEFAULT_ITERATIONS: usize = 100;

    pub fn new(lo: f64, hi: f64) -> Self {
        Self {
            lo,
            hi,
            iterations: Self::DEFAULT_ITERATIONS,
        }
    }

    pub fn solve<F>(&self, f: F, target: f64) -> Result<f64, RootFindingError>
    where
        F: Fn(f64) -> f64,
    {
        let (mut lo, mut hi) = (self.lo, self.hi);
        if !(lo.is_finite() && hi.is_finite() && lo < hi) {
            return Err(RootFindingError::InvalidBracket { lo, hi });
        }

        let residual_lo = f(lo) - target;
        let residual_hi = f(hi) - target;

        if residual_lo == 0.0 {
            return Ok(lo);
        }
        if residual_hi == 0.0 {
            return Ok(hi);
        }
        if residual_lo.is_nan()
            || residual_hi.is_nan()
            || residual_lo.signum() == residual_hi.signum()
        {
            return Err(RootFindingError::NotBracketed {
                lo,
                hi,
                residual_lo,
                residual_hi,
            });
        }

        let increasing = residual_lo < 0.0;
        for _ in 0..self.iterations {
            let mid = (lo + hi) / 2.0;
            let below_root = (f(mid) - target < 0.0) == increasing;
            if below_root {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        Ok((lo + hi) / 2.0)
    }
}
