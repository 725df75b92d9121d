//! Feedback and evidence-driven updates to existing places.
//!
//! Two kinds of input change a place after it was first inferred:
//!
//! - **User feedback** ([`apply_feedback`]): confirmations raise confidence,
//!   corrections replace the category and lock it against automatic
//!   re-categorization.
//! - **New evidence** ([`rescore_with_evidence`]): more samples at the same
//!   place. The place is re-scored from the enlarged sample set, and the new
//!   verdict only replaces the old one if it is strictly more confident.
//!
//! Neither path ever fails the caller.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize};

use crate::confidence::MAX_CONFIDENCE;
use crate::{Category, PlaceCandidate, PlaceConfig, SamplePoint};

/// Confidence added by one confirmation.
pub const CONFIRM_BOOST: f32 = 0.10;

/// Confidence assigned by a user correction.
pub const USER_CORRECTION_CONFIDENCE: f32 = 0.90;

/// What the user said about a place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "category", rename_all = "snake_case")]
pub enum Correction {
    /// The inferred category is right.
    ConfirmCategory,
    /// The place is actually of the given category.
    CorrectCategory(Category),
    /// Allow automatic re-categorization again after a correction.
    ResetAutomatic,
    /// A feedback kind this version does not understand. Ignored.
    #[serde(other)]
    Unrecognized,
}

/// A single piece of user feedback about one place.
///
/// A correction that does not parse (unknown kind, unknown category,
/// unexpected payload) deserializes as [`Correction::Unrecognized`] so a
/// bad event never fails the whole batch of feedback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    #[serde(deserialize_with = "correction_or_unrecognized")]
    pub correction: Correction,
    pub timestamp: DateTime<Utc>,
}

impl FeedbackEvent {
    pub fn new(correction: Correction, timestamp: DateTime<Utc>) -> Self {
        Self {
            correction,
            timestamp,
        }
    }

    pub fn confirm(timestamp: DateTime<Utc>) -> Self {
        Self::new(Correction::ConfirmCategory, timestamp)
    }

    pub fn correct(category: Category, timestamp: DateTime<Utc>) -> Self {
        Self::new(Correction::CorrectCategory(category), timestamp)
    }

    pub fn reset(timestamp: DateTime<Utc>) -> Self {
        Self::new(Correction::ResetAutomatic, timestamp)
    }
}

fn correction_or_unrecognized<'de, D>(deserializer: D) -> Result<Correction, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match Correction::deserialize(&value) {
        Ok(correction) => Ok(correction),
        Err(err) => {
            warn!("[Feedback] Unrecognized correction {}: {}", value, err);
            Ok(Correction::Unrecognized)
        }
    }
}

/// Apply one feedback event to a place.
///
/// # Example
/// ```
/// # use chrono::{TimeZone, Utc};
/// # use placematch::*;
/// # let t = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
/// # let points: Vec<SamplePoint> = (0..10)
/// #     .map(|i| SamplePoint::new(37.7849, -122.4094, t + chrono::Duration::minutes(i), 10.0))
/// #     .collect();
/// # let place = PlaceCandidate::from_points(points, &PlaceConfig::default()).unwrap();
/// let corrected = apply_feedback(&place, &FeedbackEvent::correct(Category::Shopping, t));
/// assert_eq!(corrected.category, Category::Shopping);
/// assert_eq!(corrected.confidence, 0.90);
/// assert!(corrected.user_corrected);
/// ```
pub fn apply_feedback(prior: &PlaceCandidate, feedback: &FeedbackEvent) -> PlaceCandidate {
    let mut updated = prior.clone();
    match feedback.correction {
        Correction::ConfirmCategory => {
            updated.confidence = (prior.confidence + CONFIRM_BOOST).min(MAX_CONFIDENCE);
            debug!(
                "[Feedback] Confirmed {} ({:.2} -> {:.2})",
                prior.category, prior.confidence, updated.confidence
            );
        }
        Correction::CorrectCategory(category) => {
            updated.category = category;
            updated.confidence = USER_CORRECTION_CONFIDENCE;
            updated.user_corrected = true;
            debug!("[Feedback] Corrected {} -> {}", prior.category, category);
        }
        Correction::ResetAutomatic => {
            updated.user_corrected = false;
            debug!("[Feedback] Reset automatic categorization for {}", prior.category);
        }
        Correction::Unrecognized => {
            warn!("[Feedback] Ignoring unrecognized feedback at {}", feedback.timestamp);
        }
    }
    updated
}

/// Apply several feedback events in timestamp order.
pub fn apply_feedback_events(prior: &PlaceCandidate, events: &[FeedbackEvent]) -> PlaceCandidate {
    let mut ordered: Vec<&FeedbackEvent> = events.iter().collect();
    ordered.sort_by_key(|e| e.timestamp);
    ordered
        .into_iter()
        .fold(prior.clone(), |place, event| apply_feedback(&place, event))
}

/// Merge new samples into an existing place and re-score it.
///
/// The enlarged sample set always becomes the place's evidence. The verdict
/// (category, confidence, breakdown) is replaced only when the place is not
/// user-corrected and the re-scored confidence is strictly higher, so added
/// data never lowers confidence on its own.
///
/// Cost is O(n log n) in the place's whole history, not just the new
/// samples, since the full evidence is re-sorted and re-scored.
pub fn rescore_with_evidence(
    prior: &PlaceCandidate,
    new_points: &[SamplePoint],
    config: &PlaceConfig,
) -> PlaceCandidate {
    let mut points: Vec<SamplePoint> = Vec::with_capacity(prior.points.len() + new_points.len());
    points.extend_from_slice(&prior.points);
    points.extend_from_slice(new_points);
    points.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then(a.latitude.total_cmp(&b.latitude))
            .then(a.longitude.total_cmp(&b.longitude))
    });
    points.dedup();

    let Some(fresh) = PlaceCandidate::from_points(points, config) else {
        return prior.clone();
    };

    if !prior.user_corrected && fresh.confidence > prior.confidence {
        debug!(
            "[Feedback] Re-scored {} ({:.2}) -> {} ({:.2}) with {} samples",
            prior.category, prior.confidence, fresh.category, fresh.confidence, fresh.sample_count
        );
        return fresh;
    }

    PlaceCandidate {
        category: prior.category,
        confidence: prior.confidence,
        breakdown: prior.breakdown,
        user_corrected: prior.user_corrected,
        ..fresh
    }
}
