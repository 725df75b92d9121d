//! Synthetic location sample generator for stress testing and benchmarking.
//!
//! Generates a user's daily routine (home nights, office days, gym
//! evenings, ...) as noisy GPS samples, with the visited places as ground
//! truth for validating inference.
//!
//! Feature-gated behind `synthetic`, not included in production builds.
//!
//! # Example
//!
//! ```rust
//! use placematch::synthetic::SyntheticRoutine;
//!
//! let routine = SyntheticRoutine::commuter();
//! let dataset = routine.generate();
//! assert_eq!(dataset.expected_places.len(), 3);
//! assert!(!dataset.samples.is_empty());
//! ```

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

use crate::geo_utils::{meters_to_deg_lat, meters_to_degrees};
use crate::{Category, GpsPoint, SamplePoint};

// ============================================================================
// Types
// ============================================================================

/// Which days a visit happens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitDays {
    Daily,
    Weekdays,
    Weekends,
    /// Specific weekdays, Monday = 0
    Days(&'static [u32]),
}

impl VisitDays {
    fn includes(&self, weekday_from_monday: u32) -> bool {
        match self {
            VisitDays::Daily => true,
            VisitDays::Weekdays => weekday_from_monday < 5,
            VisitDays::Weekends => weekday_from_monday >= 5,
            VisitDays::Days(days) => days.contains(&weekday_from_monday),
        }
    }
}

/// A recurring stay at one place.
#[derive(Debug, Clone)]
pub struct VisitPlan {
    /// Ground-truth category of the place.
    pub category: Category,
    /// Offset of the place from the routine origin, (east, north) in meters.
    pub offset_meters: (f64, f64),
    /// Local start time in minutes after midnight (UTC).
    pub start_minute: u32,
    /// Length of the stay in minutes. May cross midnight.
    pub duration_minutes: u32,
    pub days: VisitDays,
}

/// An expected place for ground truth validation.
#[derive(Debug, Clone)]
pub struct ExpectedPlace {
    pub category: Category,
    pub center: GpsPoint,
    /// Number of samples generated at this place.
    pub sample_count: usize,
}

/// A complete synthetic dataset with ground truth.
pub struct SyntheticDataset {
    /// Generated samples, ordered by timestamp.
    pub samples: Vec<SamplePoint>,
    /// Ground truth places.
    pub expected_places: Vec<ExpectedPlace>,
}

/// Scenario configuration for generating synthetic routines.
#[derive(Debug, Clone)]
pub struct SyntheticRoutine {
    /// Origin point that visit offsets are relative to.
    pub origin: GpsPoint,
    /// Midnight of the first simulated day.
    pub start: DateTime<Utc>,
    pub days: u32,
    pub visits: Vec<VisitPlan>,
    /// Interval between samples during a stay.
    pub sample_interval_minutes: u32,
    /// GPS noise standard deviation in meters.
    pub gps_noise_sigma_meters: f64,
    /// Reported accuracy of every sample.
    pub accuracy_meters: f32,
    /// Random samples scattered in the area around the origin, per day.
    pub transit_samples_per_day: u32,
    /// RNG seed for deterministic reproduction.
    pub seed: u64,
}

// ============================================================================
// Generation
// ============================================================================

fn offset_point(origin: &GpsPoint, east_m: f64, north_m: f64) -> GpsPoint {
    let latitude = origin.latitude + meters_to_deg_lat(north_m);
    GpsPoint::new(latitude, origin.longitude + meters_to_degrees(east_m, latitude))
}

/// Gaussian noise via Box-Muller.
fn gaussian_pair(rng: &mut StdRng) -> (f64, f64) {
    let u1: f64 = rng.gen_range(1e-10..1.0);
    let u2: f64 = rng.gen_range(0.0..1.0);
    let r = (-2.0 * u1.ln()).sqrt();
    (r * (2.0 * PI * u2).cos(), r * (2.0 * PI * u2).sin())
}

impl SyntheticRoutine {
    /// Generate the dataset.
    pub fn generate(&self) -> SyntheticDataset {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let interval = i64::from(self.sample_interval_minutes.max(1));

        let mut samples: Vec<SamplePoint> = Vec::new();
        let mut expected_places: Vec<ExpectedPlace> = self
            .visits
            .iter()
            .map(|visit| ExpectedPlace {
                category: visit.category,
                center: offset_point(&self.origin, visit.offset_meters.0, visit.offset_meters.1),
                sample_count: 0,
            })
            .collect();

        for day in 0..i64::from(self.days) {
            let midnight = self.start + Duration::days(day);
            let weekday = midnight.weekday().num_days_from_monday();

            for (visit, expected) in self.visits.iter().zip(expected_places.iter_mut()) {
                if !visit.days.includes(weekday) {
                    continue;
                }
                let arrival = midnight + Duration::minutes(i64::from(visit.start_minute));
                let steps = i64::from(visit.duration_minutes) / interval;
                for step in 0..=steps {
                    let (nx, ny) = gaussian_pair(&mut rng);
                    let position = offset_point(
                        &expected.center,
                        nx * self.gps_noise_sigma_meters,
                        ny * self.gps_noise_sigma_meters,
                    );
                    samples.push(SamplePoint::new(
                        position.latitude,
                        position.longitude,
                        arrival + Duration::minutes(step * interval),
                        self.accuracy_meters,
                    ));
                    expected.sample_count += 1;
                }
            }

            for _ in 0..self.transit_samples_per_day {
                let east = rng.gen_range(-20_000.0..20_000.0);
                let north = rng.gen_range(-20_000.0..20_000.0);
                let position = offset_point(&self.origin, east, north);
                let minute = rng.gen_range(0..24 * 60);
                samples.push(SamplePoint::new(
                    position.latitude,
                    position.longitude,
                    midnight + Duration::minutes(minute),
                    self.accuracy_meters * 2.0,
                ));
            }
        }

        samples.sort_by_key(|p| p.timestamp);

        SyntheticDataset {
            samples,
            expected_places,
        }
    }
}

// ============================================================================
// Presets
// ============================================================================

/// San Francisco city center.
pub const SAN_FRANCISCO: GpsPoint = GpsPoint {
    latitude: 37.7749,
    longitude: -122.4194,
};

impl SyntheticRoutine {
    /// Four weeks of home nights, weekday office hours and three gym
    /// evenings a week.
    pub fn commuter() -> Self {
        Self {
            origin: SAN_FRANCISCO,
            // Monday 2024-01-01 00:00 UTC
            start: Utc
                .timestamp_opt(1_704_067_200, 0)
                .single()
                .unwrap_or_default(),
            days: 28,
            visits: vec![
                VisitPlan {
                    category: Category::Home,
                    offset_meters: (0.0, 0.0),
                    start_minute: 21 * 60 + 30,
                    duration_minutes: 9 * 60,
                    days: VisitDays::Daily,
                },
                VisitPlan {
                    category: Category::Work,
                    offset_meters: (1_500.0, 1_100.0),
                    start_minute: 9 * 60,
                    duration_minutes: 8 * 60,
                    days: VisitDays::Weekdays,
                },
                VisitPlan {
                    category: Category::Gym,
                    offset_meters: (-2_000.0, 800.0),
                    start_minute: 18 * 60,
                    duration_minutes: 90,
                    days: VisitDays::Days(&[0, 2, 4]),
                },
            ],
            sample_interval_minutes: 15,
            gps_noise_sigma_meters: 8.0,
            accuracy_meters: 15.0,
            transit_samples_per_day: 20,
            seed: 42,
        }
    }

    /// A long history for scaling benchmarks.
    pub fn with_days(days: u32) -> Self {
        Self {
            days,
            ..Self::commuter()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
