//! Heart-risk screening: form-field validation, the weighted score, and
//! tier classification.

use serde::{Deserialize, Serialize};
use shared::domain::{ApoeStatus, FamilyHistory, RiskTier, Variant9p21};
use thiserror::Error;

pub const GENETIC_SCORE_MAX: u8 = 100;

const FAMILY_HISTORY_WEIGHT: f64 = 10.0;
const GENETIC_SCORE_WEIGHT: f64 = 0.5;
const APOE_WEIGHT: f64 = 7.5;
const VARIANT_9P21_WEIGHT: f64 = 15.0;

const SCORE_CEILING: f64 = 100.0;
const MODERATE_THRESHOLD: f64 = 30.0;
const HIGH_THRESHOLD: f64 = 60.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScreeningError {
    #[error("genetic risk score must be a whole number between 0 and 100")]
    GeneticScoreNotANumber,
    #[error("genetic risk score {0} is outside the valid range 0-100")]
    GeneticScoreOutOfRange(i64),
}

/// Parses the genetic-score form field. An empty field means the score was
/// not provided and counts as 0; anything else must be a whole number in
/// [0, 100].
pub fn parse_genetic_score(raw: &str) -> Result<u8, ScreeningError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    let value: i64 = trimmed
        .parse()
        .map_err(|_| ScreeningError::GeneticScoreNotANumber)?;
    if !(0..=i64::from(GENETIC_SCORE_MAX)).contains(&value) {
        return Err(ScreeningError::GeneticScoreOutOfRange(value));
    }
    Ok(value as u8)
}

/// Advisory check backing the field's invalid styling. Never blocks typing
/// and never gates prediction; that is `parse_genetic_score`'s job.
pub fn genetic_score_field_is_valid(raw: &str) -> bool {
    parse_genetic_score(raw).is_ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskInputs {
    pub family_history: FamilyHistory,
    pub genetic_score: u8,
    pub apoe: ApoeStatus,
    pub variant_9p21: Variant9p21,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    score: f64,
    tier: RiskTier,
}

impl RiskAssessment {
    /// Weighted score, clamped to [0, 100].
    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn tier(&self) -> RiskTier {
        self.tier
    }

    /// Fill fraction for the results meter.
    pub fn meter_fraction(&self) -> f32 {
        (self.score / SCORE_CEILING) as f32
    }
}

/// Fixed linear weighted sum over the four inputs. All terms are
/// non-negative, so only the upper bound needs clamping.
pub fn calculate_risk(inputs: &RiskInputs) -> RiskAssessment {
    let raw = f64::from(inputs.family_history.ordinal()) * FAMILY_HISTORY_WEIGHT
        + f64::from(inputs.genetic_score) * GENETIC_SCORE_WEIGHT
        + f64::from(inputs.apoe.ordinal()) * APOE_WEIGHT
        + f64::from(inputs.variant_9p21.ordinal()) * VARIANT_9P21_WEIGHT;
    let score = raw.min(SCORE_CEILING);
    RiskAssessment {
        score,
        tier: tier_for_score(score),
    }
}

/// Lower tiers are half-open; 60.0 and above closes into High.
pub fn tier_for_score(score: f64) -> RiskTier {
    if score < MODERATE_THRESHOLD {
        RiskTier::Low
    } else if score < HIGH_THRESHOLD {
        RiskTier::Moderate
    } else {
        RiskTier::High
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
