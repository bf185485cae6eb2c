//! Beta-Binomial posterior simulation.
//!
//! Each arm gets a Beta(prior_alpha, prior_beta) prior and the conjugate
//! posterior Beta(prior_alpha + conversions, prior_beta + failures). Draws
//! come from a generator seeded per call, so identical inputs give identical
//! draws. Comparisons pair the i-th control draw with the i-th treatment draw.

use ab_analysis_core::{AnalysisError, Result};
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use statrs::distribution::Beta;

use crate::aggregators::{mean, percentile};

pub const DEFAULT_POSTERIOR_SAMPLES: usize = 100_000;
pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BayesianInput {
    pub n_control: u64,
    pub conv_control: u64,
    pub n_treatment: u64,
    pub conv_treatment: u64,
    pub prior_alpha: f64,
    pub prior_beta: f64,
    pub n_samples: usize,
    pub seed: u64,
}

impl BayesianInput {
    pub fn new(n_control: u64, conv_control: u64, n_treatment: u64, conv_treatment: u64) -> Self {
        Self {
            n_control,
            conv_control,
            n_treatment,
            conv_treatment,
            prior_alpha: 1.0,
            prior_beta: 1.0,
            n_samples: DEFAULT_POSTERIOR_SAMPLES,
            seed: DEFAULT_SEED,
        }
    }

    pub fn with_prior(mut self, prior_alpha: f64, prior_beta: f64) -> Self {
        self.prior_alpha = prior_alpha;
        self.prior_beta = prior_beta;
        self
    }

    pub fn with_samples(mut self, n_samples: usize) -> Self {
        self.n_samples = n_samples;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.conv_control > self.n_control {
            return Err(AnalysisError::domain(format!(
                "control conversions ({}) exceed trials ({})",
                self.conv_control, self.n_control
            )));
        }
        if self.conv_treatment > self.n_treatment {
            return Err(AnalysisError::domain(format!(
                "treatment conversions ({}) exceed trials ({})",
                self.conv_treatment, self.n_treatment
            )));
        }
        if !(self.prior_alpha > 0.0 && self.prior_beta > 0.0) {
            return Err(AnalysisError::domain(format!(
                "prior parameters must be positive, got ({}, {})",
                self.prior_alpha, self.prior_beta
            )));
        }
        if self.n_samples == 0 {
            return Err(AnalysisError::domain("n_samples must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BayesianSummary {
    pub prob_treatment_better: f64,
    pub prob_control_better: f64,
    pub expected_diff_mean: f64,
    pub credible_interval_low: f64,
    pub credible_interval_high: f64,
    pub expected_loss_if_choose_treatment: f64,
    pub expected_loss_if_choose_control: f64,
    pub control_posterior_mean: f64,
    pub treatment_posterior_mean: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PosteriorSample {
    pub control: Vec<f64>,
    pub treatment: Vec<f64>,
}

impl PosteriorSample {
    pub fn len(&self) -> usize {
        self.control.len()
    }

    pub fn is_empty(&self) -> bool {
        self.control.is_empty()
    }

    /// Paired differences, treatment minus control.
    pub fn differences(&self) -> Vec<f64> {
        self.treatment
            .iter()
            .zip(&self.control)
            .map(|(t, c)| t - c)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BayesianResult {
    pub summary: BayesianSummary,
    pub samples: PosteriorSample,
}

pub struct BayesianEngine;

impl BayesianEngine {
    pub fn run(input: &BayesianInput) -> Result<BayesianResult> {
        input.validate()?;

        let control_posterior = Self::posterior(
            input.prior_alpha,
            input.prior_beta,
            input.conv_control,
            input.n_control,
        )?;
        let treatment_posterior = Self::posterior(
            input.prior_alpha,
            input.prior_beta,
            input.conv_treatment,
            input.n_treatment,
        )?;

        let mut rng = StdRng::seed_from_u64(input.seed);
        let control: Vec<f64> = (0..input.n_samples)
            .map(|_| control_posterior.sample(&mut rng))
            .collect();
        let treatment: Vec<f64> = (0..input.n_samples)
            .map(|_| treatment_posterior.sample(&mut rng))
            .collect();

        let samples = PosteriorSample { control, treatment };
        let summary = Self::summarize(&samples);

        tracing::debug!(
            prob_treatment_better = summary.prob_treatment_better,
            expected_diff = summary.expected_diff_mean,
            n_samples = input.n_samples,
            seed = input.seed,
            "Posterior simulation complete"
        );

        Ok(BayesianResult { summary, samples })
    }

    fn posterior(prior_alpha: f64, prior_beta: f64, conversions: u64, trials: u64) -> Result<Beta> {
        let shape_a = prior_alpha + conversions as f64;
        let shape_b = prior_beta + (trials - conversions) as f64;
        Beta::new(shape_a, shape_b).map_err(|e| AnalysisError::domain(e.to_string()))
    }

    fn summarize(samples: &PosteriorSample) -> BayesianSummary {
        let n = samples.len() as f64;
        let mut diffs = samples.differences();

        let treatment_wins = diffs.iter().filter(|&&d| d > 0.0).count() as f64;
        let prob_treatment_better = treatment_wins / n;

        let expected_loss_if_choose_treatment =
            diffs.iter().map(|&d| (-d).max(0.0)).sum::<f64>() / n;
        let expected_loss_if_choose_control = diffs.iter().map(|&d| d.max(0.0)).sum::<f64>() / n;
        let expected_diff_mean = mean(&diffs);

        diffs.sort_by(|a, b| a.total_cmp(b));

        BayesianSummary {
            prob_treatment_better,
            prob_control_better: 1.0 - prob_treatment_better,
            expected_diff_mean,
            credible_interval_low: percentile(&diffs, 2.5),
            credible_interval_high: percentile(&diffs, 97.5),
            expected_loss_if_choose_treatment,
            expected_loss_if_choose_control,
            control_posterior_mean: mean(&samples.control),
            treatment_posterior_mean: mean(&samples.treatment),
        }
    }
}
