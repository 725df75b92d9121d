//! Sample quality filtering.
//!
//! Removes samples that cannot describe where the user actually was before
//! they reach clustering. Stages run in a fixed order, each on the output
//! of the previous one:
//!
//! 1. Accuracy: invalid coordinates and samples with a worse accuracy
//!    radius than `max_accuracy_m`
//! 2. Speed: samples implying a movement faster than `max_speed_kmh` from
//!    the previous retained sample
//! 3. Age: samples older than `max_age_hours` before the reference instant
//! 4. Jitter: stationary samples that neither moved `min_movement_m` nor
//!    waited `min_time_between_updates_s` since the last kept sample
//!
//! The output is sorted by timestamp, and filtering its own output again
//! drops nothing.

use chrono::{DateTime, Duration, Utc};
use log::debug;

use crate::geo_utils::sample_distance;
use crate::{PlaceConfig, SamplePoint};

/// Filter a batch of samples, using the newest sample as the age reference.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use placematch::{filter_samples, PlaceConfig, SamplePoint};
///
/// let t = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
/// let points = vec![
///     SamplePoint::new(37.7749, -122.4194, t, 10.0),
///     SamplePoint::new(37.7749, -122.4194, t, 500.0), // too inaccurate
/// ];
/// let kept = filter_samples(&points, &PlaceConfig::default());
/// assert_eq!(kept.len(), 1);
/// ```
pub fn filter_samples(points: &[SamplePoint], config: &PlaceConfig) -> Vec<SamplePoint> {
    match points.iter().map(|p| p.timestamp).max() {
        Some(reference) => filter_samples_with_reference(points, config, reference),
        None => Vec::new(),
    }
}

/// Filter a batch of samples with an explicit age reference instant.
///
/// The batch coordinator uses this so every chunk ages against the newest
/// sample of the whole run rather than of the chunk.
pub fn filter_samples_with_reference(
    points: &[SamplePoint],
    config: &PlaceConfig,
    reference: DateTime<Utc>,
) -> Vec<SamplePoint> {
    if points.is_empty() {
        return Vec::new();
    }

    let mut sorted = points.to_vec();
    sorted.sort_by_key(|p| p.timestamp);

    let input = sorted.len();
    let accurate = accuracy_stage(sorted, config);
    let after_accuracy = accurate.len();
    let plausible = speed_stage(accurate, config);
    let after_speed = plausible.len();
    let recent = age_stage(plausible, config, reference);
    let after_age = recent.len();
    let kept = jitter_stage(recent, config);

    debug!(
        "[Filter] {} samples -> accuracy {} -> speed {} -> age {} -> jitter {}",
        input,
        after_accuracy,
        after_speed,
        after_age,
        kept.len()
    );

    kept
}

fn accuracy_stage(points: Vec<SamplePoint>, config: &PlaceConfig) -> Vec<SamplePoint> {
    points
        .into_iter()
        .filter(|p| p.is_valid() && p.accuracy_meters <= config.max_accuracy_m)
        .collect()
}

fn speed_stage(points: Vec<SamplePoint>, config: &PlaceConfig) -> Vec<SamplePoint> {
    let mut kept: Vec<SamplePoint> = Vec::with_capacity(points.len());
    for point in points {
        if let Some(prev) = kept.last() {
            if implied_speed_kmh(prev, &point) > config.max_speed_kmh {
                continue;
            }
        }
        kept.push(point);
    }
    kept
}

fn age_stage(
    points: Vec<SamplePoint>,
    config: &PlaceConfig,
    reference: DateTime<Utc>,
) -> Vec<SamplePoint> {
    let cutoff = reference - Duration::hours(i64::from(config.max_age_hours));
    points
        .into_iter()
        .filter(|p| p.timestamp >= cutoff)
        .collect()
}

fn jitter_stage(points: Vec<SamplePoint>, config: &PlaceConfig) -> Vec<SamplePoint> {
    let min_interval = Duration::seconds(i64::from(config.min_time_between_updates_s));
    let mut kept: Vec<SamplePoint> = Vec::with_capacity(points.len());
    for point in points {
        if let Some(last) = kept.last() {
            let moved = sample_distance(last, &point) >= config.min_movement_m;
            let waited = point.timestamp - last.timestamp >= min_interval;
            if !moved && !waited {
                continue;
            }
        }
        kept.push(point);
    }
    kept
}

/// Speed in km/h needed to travel from `from` to `to` in the elapsed time.
///
/// Two samples at the same instant imply infinite speed unless they are at
/// the same position.
fn implied_speed_kmh(from: &SamplePoint, to: &SamplePoint) -> f64 {
    let distance = sample_distance(from, to);
    let elapsed_s = (to.timestamp - from.timestamp).num_milliseconds() as f64 / 1000.0;
    if elapsed_s > 0.0 {
        distance / elapsed_s * 3.6
    } else if distance > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}
