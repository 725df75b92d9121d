//! Confidence scoring.
//!
//! A transparent additive model: a per-category base rate plus independent
//! evidence bonuses, clamped to [`MAX_CONFIDENCE`]. Every factor is kept in
//! a [`ConfidenceBreakdown`] so callers can show why a place scored as it did.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::{Category, Cluster, TemporalPattern};

/// Upper bound on any automatic or user-driven confidence.
pub const MAX_CONFIDENCE: f32 = 0.95;

const COUNT_BONUS_DIVISOR: f32 = 50.0;
const MAX_COUNT_BONUS: f32 = 0.25;
const CONSISTENCY_WEIGHT: f32 = 0.10;

/// Individual contributions to a confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceBreakdown {
    pub base: f32,
    pub count_bonus: f32,
    pub accuracy_bonus: f32,
    pub timespan_bonus: f32,
    pub consistency_bonus: f32,
    /// Sum of all factors, clamped to [0, MAX_CONFIDENCE]
    pub total: f32,
}

impl ConfidenceBreakdown {
    /// Sum of the factors before clamping.
    pub fn unclamped(&self) -> f32 {
        self.base
            + self.count_bonus
            + self.accuracy_bonus
            + self.timespan_bonus
            + self.consistency_bonus
    }
}

/// Score a categorized cluster.
pub fn score(category: Category, cluster: &Cluster, pattern: &TemporalPattern) -> f32 {
    score_breakdown(category, cluster, pattern).total
}

/// Score a categorized cluster and keep the contributing factors.
pub fn score_breakdown(
    category: Category,
    cluster: &Cluster,
    pattern: &TemporalPattern,
) -> ConfidenceBreakdown {
    let mut breakdown = ConfidenceBreakdown {
        base: category.base_confidence(),
        count_bonus: count_bonus(cluster.len()),
        accuracy_bonus: cluster.mean_accuracy().map(accuracy_bonus).unwrap_or(0.0),
        timespan_bonus: timespan_bonus(cluster.observed_span()),
        consistency_bonus: pattern.consistency.clamp(0.0, 1.0) * CONSISTENCY_WEIGHT,
        total: 0.0,
    };
    breakdown.total = breakdown.unclamped().clamp(0.0, MAX_CONFIDENCE);
    breakdown
}

fn count_bonus(sample_count: usize) -> f32 {
    (sample_count as f32 / COUNT_BONUS_DIVISOR).min(MAX_COUNT_BONUS)
}

fn accuracy_bonus(mean_accuracy_m: f32) -> f32 {
    if mean_accuracy_m <= 10.0 {
        0.15
    } else if mean_accuracy_m <= 25.0 {
        0.10
    } else if mean_accuracy_m <= 50.0 {
        0.05
    } else {
        0.0
    }
}

fn timespan_bonus(span: Duration) -> f32 {
    if span >= Duration::days(7) {
        0.10
    } else if span >= Duration::days(1) {
        0.05
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_bonus_saturates() {
        assert_eq!(count_bonus(0), 0.0);
        assert!((count_bonus(10) - 0.2).abs() < 1e-6);
        assert_eq!(count_bonus(12), 0.24);
        assert_eq!(count_bonus(13), MAX_COUNT_BONUS);
        assert_eq!(count_bonus(1000), MAX_COUNT_BONUS);
    }

    #[test]
    fn test_accuracy_tiers() {
        assert_eq!(accuracy_bonus(5.0), 0.15);
        assert_eq!(accuracy_bonus(10.0), 0.15);
        assert_eq!(accuracy_bonus(25.0), 0.10);
        assert_eq!(accuracy_bonus(50.0), 0.05);
        assert_eq!(accuracy_bonus(50.1), 0.0);
    }

    #[test]
    fn test_timespan_tiers() {
        assert_eq!(timespan_bonus(Duration::hours(23)), 0.0);
        assert_eq!(timespan_bonus(Duration::days(1)), 0.05);
        assert_eq!(timespan_bonus(Duration::days(7)), 0.10);
    }
}
