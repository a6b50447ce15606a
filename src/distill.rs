//! Vote distillation.
//!
//! Collapses a row of annotator vote counts into a soft training label.
//!
//! ## Algorithm
//!
//! 1. Zero every count at or below the outlier threshold (single votes are noise)
//! 2. Greedily take the top-voted categories, all ties of a pass at once, until
//!    they cover the coverage target or the category cap is reached
//! 3. A special category (unknown / not-a-face) ends the selection; it is
//!    dropped again if a real emotion was already taken
//! 4. Reject the label if it explains too little of the vote or uses too many
//!    categories, otherwise normalize it
//!
//! Rejected rows get the fixed "unknown" distribution.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::LabelDistribution;

/// Thresholds of the distillation policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DistillConfig {
    /// Counts at or below this value are treated as outliers and zeroed.
    pub outlier_max_votes: f64,
    /// Selection stops once this fraction of the remaining total is covered.
    pub coverage_target: f64,
    /// Maximum number of categories a label may be built from.
    pub max_categories: usize,
    /// A label must explain strictly more than this fraction of the total.
    pub acceptance_ratio: f64,
}

impl Default for DistillConfig {
    fn default() -> Self {
        Self {
            outlier_max_votes: 1.0,
            coverage_target: 0.75,
            max_categories: 3,
            acceptance_ratio: 0.5,
        }
    }
}

impl DistillConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.outlier_max_votes.is_finite() && self.outlier_max_votes >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "outlier_max_votes must be a non-negative number, got {}",
                self.outlier_max_votes
            )));
        }
        for (name, value) in [
            ("coverage_target", self.coverage_target),
            ("acceptance_ratio", self.acceptance_ratio),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be in (0, 1], got {value}"
                )));
            }
        }
        if self.max_categories == 0 {
            return Err(Error::InvalidConfig(
                "max_categories must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Why a row was given the unknown distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FallbackReason {
    /// Nothing is left after outlier suppression.
    DegenerateVotes,
    /// The selected categories explain too small a share of the votes.
    InsufficientCoverage,
    /// A tie pass pushed the selection over the category cap.
    TooManyCategories,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Label built from these category indices, ascending.
    Accepted { categories: Vec<usize> },
    Fallback(FallbackReason),
}

/// A distilled label together with how it was decided.
#[derive(Debug, Clone, PartialEq)]
pub struct Distillation {
    pub distribution: LabelDistribution,
    pub outcome: Outcome,
}

impl Distillation {
    pub fn is_fallback(&self) -> bool {
        matches!(self.outcome, Outcome::Fallback(_))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Distiller {
    config: DistillConfig,
}

impl Distiller {
    pub fn new(config: DistillConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DistillConfig {
        &self.config
    }

    /// Distill one row of vote counts. The input is left untouched.
    pub fn distill(&self, votes: &[f64]) -> Result<LabelDistribution> {
        Ok(self.distill_with_outcome(votes)?.distribution)
    }

    pub fn distill_with_outcome(&self, votes: &[f64]) -> Result<Distillation> {
        let size = votes.len();
        if size < 2 {
            return Err(Error::InvalidSchema(format!(
                "vote row needs at least 2 categories, got {size}"
            )));
        }
        if let Some((i, v)) = votes
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(Error::InvalidSchema(format!(
                "vote count at index {i} must be a non-negative number, got {v}"
            )));
        }
        let special_threshold = size - 2;
        let fallback = |reason: FallbackReason| {
            debug!(?reason, "vote row falls back to unknown");
            Distillation {
                distribution: LabelDistribution::unknown(size),
                outcome: Outcome::Fallback(reason),
            }
        };

        let mut remaining: Vec<f64> = votes
            .iter()
            .map(|&v| {
                if v < self.config.outlier_max_votes + f64::EPSILON {
                    0.0
                } else {
                    v
                }
            })
            .collect();
        let total: f64 = remaining.iter().sum();
        if total <= 0.0 {
            return Ok(fallback(FallbackReason::DegenerateVotes));
        }

        let mut accumulated = vec![0.0; size];
        let mut selected_sum = 0.0;
        let mut selected_count = 0usize;
        let mut valid = true;

        while selected_sum < self.config.coverage_target * total
            && selected_count < self.config.max_categories
            && valid
        {
            let max_val = remaining.iter().copied().fold(0.0, f64::max);
            if max_val <= 0.0 {
                break;
            }

            // All ties of this pass are taken before the loop condition is rechecked,
            // so a single pass can overshoot the category cap.
            for i in 0..size {
                if remaining[i] != max_val {
                    continue;
                }
                accumulated[i] = max_val;
                remaining[i] = 0.0;
                selected_sum += max_val;
                selected_count += 1;

                if i >= special_threshold {
                    valid = false;
                    let accumulated_sum: f64 = accumulated.iter().sum();
                    if accumulated_sum > max_val {
                        // A real emotion was taken first; the special category gets no share.
                        accumulated[i] = 0.0;
                        selected_count -= 1;
                    }
                    break;
                }
            }
        }

        let accumulated_sum: f64 = accumulated.iter().sum();
        if selected_count > self.config.max_categories {
            return Ok(fallback(FallbackReason::TooManyCategories));
        }
        if accumulated_sum <= self.config.acceptance_ratio * total {
            return Ok(fallback(FallbackReason::InsufficientCoverage));
        }

        let categories = (0..size).filter(|&i| accumulated[i] > 0.0).collect();
        let probs = accumulated.iter().map(|&v| v / accumulated_sum).collect();
        Ok(Distillation {
            distribution: LabelDistribution::new(probs),
            outcome: Outcome::Accepted { categories },
        })
    }
}

/// Distill `votes` with the default policy, checking it has `size` categories.
pub fn distill(votes: &[f64], size: usize) -> Result<LabelDistribution> {
    if votes.len() != size {
        return Err(Error::InvalidSchema(format!(
            "expected {size} vote counts, got {}",
            votes.len()
        )));
    }
    Distiller::default().distill(votes)
}
