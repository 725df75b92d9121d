//! Temporal pattern extraction.
//!
//! Summarises when a cluster is visited: hour-of-day and day-of-week
//! histograms in local time, dwell sessions, visit rate and an
//! entropy-based consistency score.

use std::ops::RangeInclusive;

use chrono::{DateTime, Datelike, Duration, FixedOffset, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::{Cluster, PlaceConfig, SamplePoint};

pub const HOURS_PER_DAY: usize = 24;
pub const DAYS_PER_WEEK: usize = 7;

const MS_PER_DAY: f64 = 86_400_000.0;

/// When and how a place is visited. Derived from one cluster.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalPattern {
    /// Sample count per local hour (0-23)
    pub hour_histogram: [u32; HOURS_PER_DAY],
    /// Sample count per local weekday, Monday first
    pub weekday_histogram: [u32; DAYS_PER_WEEK],
    /// Mean wall-clock span of a dwell session
    pub avg_dwell_ms: u64,
    pub visits_per_week: f32,
    /// 1 - normalized hour entropy, within [0, 1]
    pub consistency: f32,
    /// Number of dwell sessions
    pub session_count: u32,
    /// Observed span in days, at least 1
    pub span_days: f32,
}

impl TemporalPattern {
    /// Total number of samples in the pattern.
    pub fn total(&self) -> u32 {
        self.hour_histogram.iter().sum()
    }

    /// Share of samples whose local hour falls in any of `windows`.
    ///
    /// Windows are inclusive hour ranges and must not overlap.
    pub fn hour_ratio(&self, windows: &[RangeInclusive<usize>]) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let in_windows: u32 = windows
            .iter()
            .flat_map(|w| w.clone())
            .filter_map(|h| self.hour_histogram.get(h))
            .sum();
        f64::from(in_windows) / f64::from(total)
    }

    /// Share of samples recorded Monday to Friday.
    pub fn weekday_fraction(&self) -> f64 {
        let total: u32 = self.weekday_histogram.iter().sum();
        if total == 0 {
            return 0.0;
        }
        let weekdays: u32 = self.weekday_histogram[..5].iter().sum();
        f64::from(weekdays) / f64::from(total)
    }

    pub fn avg_dwell_minutes(&self) -> f64 {
        self.avg_dwell_ms as f64 / 60_000.0
    }

    pub fn avg_dwell_hours(&self) -> f64 {
        self.avg_dwell_ms as f64 / 3_600_000.0
    }
}

/// Extract the temporal pattern of a cluster using the configured
/// session break and local time offset.
pub fn extract_pattern(cluster: &Cluster, config: &PlaceConfig) -> TemporalPattern {
    extract_pattern_with(
        cluster.points(),
        config.session_break(),
        config.local_offset(),
    )
}

/// Extract a temporal pattern from timestamp-ordered samples.
pub fn extract_pattern_with(
    points: &[SamplePoint],
    session_break: Duration,
    offset: FixedOffset,
) -> TemporalPattern {
    let mut hour_histogram = [0u32; HOURS_PER_DAY];
    let mut weekday_histogram = [0u32; DAYS_PER_WEEK];

    for point in points {
        let local = point.timestamp.with_timezone(&offset);
        hour_histogram[local.hour() as usize] += 1;
        weekday_histogram[local.weekday().num_days_from_monday() as usize] += 1;
    }

    let sessions = dwell_sessions(points, session_break);
    let avg_dwell_ms = if sessions.is_empty() {
        0
    } else {
        let total_ms: i64 = sessions
            .iter()
            .map(|(start, end)| (*end - *start).num_milliseconds())
            .sum();
        (total_ms.max(0) as u64) / sessions.len() as u64
    };

    let span_ms = match (points.first(), points.last()) {
        (Some(first), Some(last)) => (last.timestamp - first.timestamp).num_milliseconds(),
        _ => 0,
    };
    let span_days = (span_ms as f64 / MS_PER_DAY).max(1.0);

    let visits_per_week = if points.len() <= 1 {
        0.0
    } else {
        sessions.len() as f64 / (span_days / 7.0)
    };

    TemporalPattern {
        hour_histogram,
        weekday_histogram,
        avg_dwell_ms,
        visits_per_week: visits_per_week as f32,
        consistency: hour_consistency(&hour_histogram),
        session_count: sessions.len() as u32,
        span_days: span_days as f32,
    }
}

/// Split timestamp-ordered samples into dwell sessions.
///
/// A session continues while the gap to the previous sample is at most
/// `session_break`. Returns the (first, last) timestamp of each session.
pub fn dwell_sessions(
    points: &[SamplePoint],
    session_break: Duration,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let mut sessions: Vec<(DateTime<Utc>, DateTime<Utc>)> = Vec::new();
    for point in points {
        if let Some((_, end)) = sessions.last_mut() {
            if point.timestamp - *end <= session_break {
                *end = point.timestamp;
                continue;
            }
        }
        sessions.push((point.timestamp, point.timestamp));
    }
    sessions
}

/// Consistency of a histogram: one minus its Shannon entropy normalized by
/// the maximum entropy over the histogram's bucket count.
///
/// An empty histogram or a single occupied bucket is maximally consistent.
pub fn hour_consistency(histogram: &[u32]) -> f32 {
    let total: u32 = histogram.iter().sum();
    if total == 0 || histogram.len() < 2 {
        return 1.0;
    }

    let total = f64::from(total);
    let entropy: f64 = histogram
        .iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = f64::from(count) / total;
            -p * p.ln()
        })
        .sum();
    let max_entropy = (histogram.len() as f64).ln();

    (1.0 - entropy / max_entropy).clamp(0.0, 1.0) as f32
}
