//! Summary statistics and risk-derivation policies.
//!
//! The scoring service owns the ML classification; everything here is the
//! local bookkeeping layer: confidence-weighted voting, threshold banding,
//! speed bucketing, and assembly of the session-terminal summary.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::{Attempt, Classification};
use crate::traits::ScoreOutcome;

/// Response-time bucket boundaries, in seconds.
pub const SLOW_OVER_SECS: f64 = 3.0;
pub const FAST_UNDER_SECS: f64 = 1.5;

/// How the summary classification is derived for a given test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RiskPolicy {
    /// Use the classification the scoring service returned for the batch.
    Scorer,
    /// Average the per-attempt incorrect-probabilities and band them
    /// (spelling).
    AverageIncorrectProbability { emerging: f64, strong: f64 },
    /// Band the service confidence into indicator labels (letter confusion).
    ConfidenceBands { emerging: f64, strong: f64 },
    /// Confidence-weighted vote across per-attempt classifications.
    WeightedVote,
}

/// Majority response-speed bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeedCategory {
    Fast,
    Moderate,
    Slow,
}

impl std::fmt::Display for SpeedCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpeedCategory::Fast => write!(f, "Fast"),
            SpeedCategory::Moderate => write!(f, "Moderate"),
            SpeedCategory::Slow => write!(f, "Slow"),
        }
    }
}

/// Session-terminal aggregate. Computed once; a new summary requires a full
/// session reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub total_attempts: usize,
    pub total_correct: usize,
    pub average_time_secs: f64,
    pub classification: Classification,
    #[serde(default)]
    pub speed_category: Option<String>,
    #[serde(default)]
    pub risk_count: Option<u32>,
    pub assessment_quality: String,
}

/// Combine multiple classifications by confidence-weighted vote.
///
/// The aggregate label is the one whose confidences sum highest; the
/// aggregate confidence is that sum divided by the total confidence across
/// all labels. Returns `None` for an empty slice.
pub fn weighted_vote(votes: &[Classification]) -> Option<Classification> {
    if votes.is_empty() {
        return None;
    }

    let mut sums: HashMap<&str, f64> = HashMap::new();
    let mut total = 0.0;
    for vote in votes {
        *sums.entry(vote.label.as_str()).or_insert(0.0) += vote.confidence;
        total += vote.confidence;
    }

    let (label, winning_sum) = sums
        .into_iter()
        .max_by(|a, b| a.1.total_cmp(&b.1))?;

    let confidence = if total > 0.0 { winning_sum / total } else { 0.0 };
    Some(Classification::new(label, confidence))
}

/// Bucket each response time and return the majority bucket. A tie falls
/// back to `Moderate`.
pub fn speed_category(times: &[f64]) -> SpeedCategory {
    let mut slow = 0usize;
    let mut fast = 0usize;
    let mut moderate = 0usize;
    for &t in times {
        if t > SLOW_OVER_SECS {
            slow += 1;
        } else if t < FAST_UNDER_SECS {
            fast += 1;
        } else {
            moderate += 1;
        }
    }

    if slow > fast && slow > moderate {
        SpeedCategory::Slow
    } else if fast > slow && fast > moderate {
        SpeedCategory::Fast
    } else {
        SpeedCategory::Moderate
    }
}

/// Band an averaged incorrect-probability into risk labels (spelling).
pub fn risk_from_incorrect_probabilities(
    probs: &[f64],
    emerging: f64,
    strong: f64,
) -> (&'static str, f64) {
    if probs.is_empty() {
        return ("No attempts made", 0.0);
    }
    let avg = probs.iter().sum::<f64>() / probs.len() as f64;
    let label = if avg >= strong {
        "Strong indicators"
    } else if avg >= emerging {
        "Emerging indicators"
    } else {
        "Minimal indicators"
    };
    (label, avg)
}

/// Band a single service confidence into indicator labels (letter
/// confusion).
pub fn indicator_band(confidence: f64, emerging: f64, strong: f64) -> &'static str {
    if confidence >= strong {
        "Strong Indicators"
    } else if confidence >= emerging {
        "Emerging Indicators"
    } else {
        "Minimal Indicators"
    }
}

/// Reliability wording by attempt count.
pub fn assessment_quality(total_attempts: usize) -> &'static str {
    match total_attempts {
        0..=2 => "Insufficient attempts",
        3 => "Minimal (fast screening)",
        4 => "Moderate (balanced reliability)",
        _ => "Ideal (optimal for ML pattern detection)",
    }
}

/// Build the session summary from the recorded attempts, the configured
/// risk policy, and (for batch-scored tests) the service outcome.
pub fn summarize(
    attempts: &[Attempt],
    policy: &RiskPolicy,
    batch: Option<&ScoreOutcome>,
) -> Summary {
    let total_attempts = attempts.len();
    let counted_correct = attempts
        .iter()
        .filter(|a| a.is_correct == Some(true))
        .count();
    let times: Vec<f64> = attempts.iter().map(|a| a.response_time_secs).collect();
    let mean_time = if times.is_empty() {
        0.0
    } else {
        times.iter().sum::<f64>() / times.len() as f64
    };

    let votes: Vec<Classification> = attempts
        .iter()
        .filter_map(|a| a.classification.clone())
        .collect();

    let classification = match policy {
        RiskPolicy::Scorer => batch
            .map(|o| o.classification.clone())
            .or_else(|| weighted_vote(&votes))
            .unwrap_or_else(|| Classification::new("Inconclusive", 0.0)),
        RiskPolicy::AverageIncorrectProbability { emerging, strong } => {
            let probs: Vec<f64> = votes.iter().map(|c| c.confidence).collect();
            let (label, avg) = risk_from_incorrect_probabilities(&probs, *emerging, *strong);
            Classification::new(label, avg)
        }
        RiskPolicy::ConfidenceBands { emerging, strong } => {
            let base = batch
                .map(|o| o.classification.clone())
                .or_else(|| weighted_vote(&votes))
                .unwrap_or_else(|| Classification::new("Inconclusive", 0.0));
            Classification::new(
                indicator_band(base.confidence, *emerging, *strong),
                base.confidence,
            )
        }
        RiskPolicy::WeightedVote => weighted_vote(&votes)
            .or_else(|| batch.map(|o| o.classification.clone()))
            .unwrap_or_else(|| Classification::new("Inconclusive", 0.0)),
    };

    let speed = batch.and_then(|o| o.speed_category.clone()).or_else(|| {
        if times.is_empty() {
            None
        } else {
            Some(speed_category(&times).to_string())
        }
    });

    Summary {
        total_attempts,
        total_correct: batch
            .and_then(|o| o.total_correct)
            .map(|c| c as usize)
            .unwrap_or(counted_correct),
        average_time_secs: batch.and_then(|o| o.average_time).unwrap_or(mean_time),
        classification,
        speed_category: speed,
        risk_count: batch.and_then(|o| o.risk_count),
        assessment_quality: batch
            .and_then(|o| o.assessment_quality.clone())
            .unwrap_or_else(|| assessment_quality(total_attempts).to_string()),
    }
}
