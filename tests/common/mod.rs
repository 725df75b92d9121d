//! Shared routine builders for integration tests.
//!
//! All routines start on Monday 2024-01-01 and use UTC hours.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use placematch::SamplePoint;

pub const HOME: (f64, f64) = (37.7749, -122.4194);
pub const WORK: (f64, f64) = (37.7849, -122.4094);
pub const GYM: (f64, f64) = (37.7649, -122.4294);
pub const RESTAURANT: (f64, f64) = (37.7949, -122.4194);
pub const SHOP: (f64, f64) = (37.7749, -122.4394);

/// Midnight of Monday 2024-01-01.
pub fn day_start(day: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(day)
}

pub fn at(day: i64, hour: i64, minute: i64) -> DateTime<Utc> {
    day_start(day) + Duration::hours(hour) + Duration::minutes(minute)
}

pub fn sample(place: (f64, f64), ts: DateTime<Utc>, accuracy: f32) -> SamplePoint {
    SamplePoint::new(place.0, place.1, ts, accuracy)
}

/// Nights `from..to`, hourly 22:00-05:00 at home, 15m accuracy.
pub fn home_nights(from: i64, to: i64) -> Vec<SamplePoint> {
    (from..to)
        .flat_map(|day| (0..8).map(move |h| sample(HOME, at(day, 22 + h, 0), 15.0)))
        .collect()
}

/// Weekdays of `weeks` weeks, hourly 09:00-17:00 at the office, 25m accuracy.
pub fn office_days(weeks: i64) -> Vec<SamplePoint> {
    (0..weeks * 7)
        .filter(|day| day % 7 < 5)
        .flat_map(|day| (9..=17).map(move |h| sample(WORK, at(day, h, 0), 25.0)))
        .collect()
}

/// Monday, Wednesday and Friday of `weeks` weeks, 18:00-19:30 every 15 minutes.
pub fn gym_evenings(weeks: i64) -> Vec<SamplePoint> {
    (0..weeks * 7)
        .filter(|day| matches!(day % 7, 0 | 2 | 4))
        .flat_map(|day| (0..7).map(move |i| sample(GYM, at(day, 18, i * 15), 10.0)))
        .collect()
}

/// Weekdays of `weeks` weeks, 12:00-13:00 every 10 minutes.
pub fn weekday_lunches(weeks: i64) -> Vec<SamplePoint> {
    (0..weeks * 7)
        .filter(|day| day % 7 < 5)
        .flat_map(|day| (0..7).map(move |i| sample(RESTAURANT, at(day, 12, i * 10), 10.0)))
        .collect()
}

/// Saturday 2024-01-06, 15:00-15:40 every 5 minutes.
pub fn saturday_errand() -> Vec<SamplePoint> {
    (0..9).map(|i| sample(SHOP, at(5, 15, i * 5), 10.0)).collect()
}
