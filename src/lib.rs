//! # Place Matcher
//!
//! Unsupervised significant-place inference from noisy GPS samples.
//!
//! This library provides:
//! - Sample quality filtering (accuracy, impossible speed, age, stationary jitter)
//! - Density-based spatial clustering (DBSCAN over Haversine distance)
//! - Temporal pattern extraction (hour/weekday histograms, dwell, visit rate)
//! - Rule-based place categorization (home, work, gym, restaurant, shopping)
//! - Explainable confidence scoring
//! - Feedback-driven re-scoring and batch coordination with bounded memory
//!
//! ## Features
//!
//! - **`parallel`** - Process independent chunks concurrently with rayon
//! - **`synthetic`** - Seeded synthetic routine generator for tests and benchmarks
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{Duration, TimeZone, Utc};
//! use placematch::{run, Category, PlaceConfig, SamplePoint};
//!
//! let start = Utc.with_ymd_and_hms(2024, 1, 1, 22, 0, 0).unwrap();
//! let points: Vec<SamplePoint> = (0..14)
//!     .flat_map(|day| {
//!         (0..8).map(move |hour| {
//!             let ts = start + Duration::days(day) + Duration::hours(hour);
//!             SamplePoint::new(37.7749, -122.4194, ts, 15.0)
//!         })
//!     })
//!     .collect();
//!
//! let places = run(&points, &PlaceConfig::default(), &[]).unwrap();
//! assert_eq!(places.len(), 1);
//! assert_eq!(places[0].category, Category::Home);
//! ```

use chrono::{DateTime, Duration, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{ParseCategoryError, PlaceError, Result};

// Union-Find data structure for merging candidates
pub mod union_find;
pub use union_find::UnionFind;

// Geographic utilities (distance, centroid, degree conversion)
pub mod geo_utils;

// Sample quality filtering
pub mod filter;
pub use filter::{filter_samples, filter_samples_with_reference};

// Density-based spatial clustering
pub mod clustering;
pub use clustering::{cluster_samples, Cluster};

// Temporal pattern extraction
pub mod patterns;
pub use patterns::{extract_pattern, TemporalPattern};

// Ordered rule categorization
pub mod categorize;
pub use categorize::{categorize, matching_categories};

// Confidence scoring
pub mod confidence;
pub use confidence::{score, score_breakdown, ConfidenceBreakdown, MAX_CONFIDENCE};

// Feedback and evidence-driven updates
pub mod feedback;
pub use feedback::{
    apply_feedback, apply_feedback_events, rescore_with_evidence, Correction, FeedbackEvent,
};

// Batch coordinator
pub mod engine;
pub use engine::{
    run, run_with_progress, AtomicProgressTracker, BatchOutcome, BatchPhase,
    BatchProgressCallback, BatchStats, CancellationToken, NoopProgress, RunStatus,
};

// Synthetic routine generator for stress testing
#[cfg(feature = "synthetic")]
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// A geographic coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use placematch::GpsPoint;
/// let point = GpsPoint::new(37.7749, -122.4194); // San Francisco
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// A single raw location sample as delivered by the host's location source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplePoint {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
    /// Reported horizontal accuracy radius in meters
    pub accuracy_meters: f32,
    /// Reported ground speed in m/s, if the source provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_mps: Option<f32>,
}

impl SamplePoint {
    /// Create a sample without a reported speed.
    pub fn new(
        latitude: f64,
        longitude: f64,
        timestamp: DateTime<Utc>,
        accuracy_meters: f32,
    ) -> Self {
        Self {
            latitude,
            longitude,
            timestamp,
            accuracy_meters,
            speed_mps: None,
        }
    }

    /// Attach a reported speed.
    pub fn with_speed(mut self, speed_mps: f32) -> Self {
        self.speed_mps = Some(speed_mps);
        self
    }

    /// The coordinate of this sample.
    pub fn position(&self) -> GpsPoint {
        GpsPoint::new(self.latitude, self.longitude)
    }

    /// Check that the coordinates are in range and the accuracy is usable.
    pub fn is_valid(&self) -> bool {
        self.position().is_valid()
            && self.accuracy_meters.is_finite()
            && self.accuracy_meters >= 0.0
    }
}

/// Semantic category of an inferred place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Home,
    Work,
    Gym,
    Restaurant,
    Shopping,
    Unknown,
}

impl Category {
    /// All categories in rule-evaluation order.
    pub const ALL: [Category; 6] = [
        Category::Home,
        Category::Work,
        Category::Gym,
        Category::Restaurant,
        Category::Shopping,
        Category::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Home => "home",
            Category::Work => "work",
            Category::Gym => "gym",
            Category::Restaurant => "restaurant",
            Category::Shopping => "shopping",
            Category::Unknown => "unknown",
        }
    }

    /// Prior confidence for a place of this category before any evidence bonus.
    pub fn base_confidence(&self) -> f32 {
        match self {
            Category::Home => 0.70,
            Category::Work => 0.60,
            Category::Gym => 0.50,
            Category::Restaurant => 0.40,
            Category::Shopping => 0.40,
            Category::Unknown => 0.20,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = ParseCategoryError;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "home" => Ok(Category::Home),
            "work" => Ok(Category::Work),
            "gym" => Ok(Category::Gym),
            "restaurant" => Ok(Category::Restaurant),
            "shopping" => Ok(Category::Shopping),
            "unknown" => Ok(Category::Unknown),
            _ => Err(ParseCategoryError(s.to_string())),
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Unknown
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for one pipeline invocation.
///
/// Supplied by the caller per run and never mutated by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaceConfig {
    /// DBSCAN neighbourhood radius, also used to merge nearby candidates.
    /// Default: 100.0 meters
    pub distance_threshold_m: f64,

    /// Minimum neighbourhood size for a DBSCAN core point.
    /// Default: 5
    pub min_points: u32,

    /// Samples with a worse reported accuracy are dropped.
    /// Default: 100.0 meters
    pub max_accuracy_m: f32,

    /// Samples implying a faster movement from the previous kept sample are dropped.
    /// Default: 200.0 km/h
    pub max_speed_kmh: f64,

    /// Samples older than this relative to the newest sample are dropped.
    /// Default: 720 hours (30 days)
    pub max_age_hours: u32,

    /// Minimum movement for a sample to count as a new position.
    /// Default: 10.0 meters
    pub min_movement_m: f64,

    /// Minimum elapsed time for a stationary sample to be kept.
    /// Default: 60 seconds
    pub min_time_between_updates_s: u32,

    /// Gap between consecutive samples that ends a dwell session.
    /// Default: 120 minutes
    pub session_break_minutes: u32,

    /// Offset from UTC used to bucket samples by local hour and weekday.
    /// Default: 0
    pub utc_offset_minutes: i32,

    /// Minimum share of samples between 22:00 and 06:59 for Home.
    /// Default: 0.6
    pub home_night_ratio: f64,
    /// Default: 6.0 hours
    pub home_min_dwell_hours: f64,
    /// Default: 5.0
    pub home_min_visits_per_week: f64,

    /// Minimum share of samples between 09:00 and 17:59 for Work.
    /// Default: 0.6
    pub work_hours_ratio: f64,
    /// Minimum share of samples on Monday-Friday for Work.
    /// Default: 0.7
    pub work_min_weekday_fraction: f64,
    /// Default: 4.0 hours
    pub work_min_dwell_hours: f64,

    /// Minimum share of samples in the morning (06-09) and evening (17-20) windows.
    /// Default: 0.5
    pub gym_activity_threshold: f64,
    /// Default: 30 minutes
    pub gym_min_dwell_minutes: f64,
    /// Default: 240 minutes
    pub gym_max_dwell_minutes: f64,
    /// Default: 1.0
    pub gym_min_visits_per_week: f64,

    /// Minimum share of samples in the lunch (11-14) and dinner (18-21) windows.
    /// Default: 0.5
    pub restaurant_meal_threshold: f64,
    /// Default: 20 minutes
    pub restaurant_min_minutes: f64,
    /// Default: 150 minutes
    pub restaurant_max_minutes: f64,

    /// Default: 10 minutes
    pub shopping_min_minutes: f64,
    /// Default: 120 minutes
    pub shopping_max_minutes: f64,

    /// Number of samples processed per chunk by the batch coordinator.
    /// Default: 2000
    pub batch_size: u32,
}

impl Default for PlaceConfig {
    fn default() -> Self {
        Self {
            distance_threshold_m: 100.0,
            min_points: 5,
            max_accuracy_m: 100.0,
            max_speed_kmh: 200.0,
            max_age_hours: 720,
            min_movement_m: 10.0,
            min_time_between_updates_s: 60,
            session_break_minutes: 120,
            utc_offset_minutes: 0,
            home_night_ratio: 0.6,
            home_min_dwell_hours: 6.0,
            home_min_visits_per_week: 5.0,
            work_hours_ratio: 0.6,
            work_min_weekday_fraction: 0.7,
            work_min_dwell_hours: 4.0,
            gym_activity_threshold: 0.5,
            gym_min_dwell_minutes: 30.0,
            gym_max_dwell_minutes: 240.0,
            gym_min_visits_per_week: 1.0,
            restaurant_meal_threshold: 0.5,
            restaurant_min_minutes: 20.0,
            restaurant_max_minutes: 150.0,
            shopping_min_minutes: 10.0,
            shopping_max_minutes: 120.0,
            batch_size: 2000,
        }
    }
}

impl PlaceConfig {
    /// Parse a JSON configuration (camelCase keys, missing keys take defaults)
    /// and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PlaceConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject thresholds the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !self.distance_threshold_m.is_finite() || self.distance_threshold_m <= 0.0 {
            return Err(PlaceError::invalid_config(
                "distance_threshold_m",
                format!("must be positive, got {}", self.distance_threshold_m),
            ));
        }
        if self.min_points < 1 {
            return Err(PlaceError::invalid_config("min_points", "must be at least 1"));
        }
        if self.batch_size < 1 {
            return Err(PlaceError::invalid_config("batch_size", "must be at least 1"));
        }
        if !(self.max_accuracy_m > 0.0) {
            return Err(PlaceError::invalid_config(
                "max_accuracy_m",
                format!("must be positive, got {}", self.max_accuracy_m),
            ));
        }
        if !(self.max_speed_kmh > 0.0) {
            return Err(PlaceError::invalid_config(
                "max_speed_kmh",
                format!("must be positive, got {}", self.max_speed_kmh),
            ));
        }
        if !(self.min_movement_m >= 0.0) {
            return Err(PlaceError::invalid_config(
                "min_movement_m",
                format!("must not be negative, got {}", self.min_movement_m),
            ));
        }
        if self.session_break_minutes < 1 {
            return Err(PlaceError::invalid_config(
                "session_break_minutes",
                "must be at least 1",
            ));
        }
        if self.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(PlaceError::invalid_config(
                "utc_offset_minutes",
                format!("must be within one day, got {}", self.utc_offset_minutes),
            ));
        }

        check_ratio("home_night_ratio", self.home_night_ratio)?;
        check_ratio("work_hours_ratio", self.work_hours_ratio)?;
        check_ratio("work_min_weekday_fraction", self.work_min_weekday_fraction)?;
        check_ratio("gym_activity_threshold", self.gym_activity_threshold)?;
        check_ratio("restaurant_meal_threshold", self.restaurant_meal_threshold)?;

        check_window(
            "gym_min_dwell_minutes",
            self.gym_min_dwell_minutes,
            self.gym_max_dwell_minutes,
        )?;
        check_window(
            "restaurant_min_minutes",
            self.restaurant_min_minutes,
            self.restaurant_max_minutes,
        )?;
        check_window(
            "shopping_min_minutes",
            self.shopping_min_minutes,
            self.shopping_max_minutes,
        )?;
        Ok(())
    }

    /// Gap that separates two dwell sessions.
    pub fn session_break(&self) -> Duration {
        Duration::minutes(i64::from(self.session_break_minutes))
    }

    /// Fixed offset used for local hour/weekday bucketing.
    pub fn local_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }
}

fn check_ratio(field: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(PlaceError::invalid_config(
            field,
            format!("must be within [0, 1], got {}", value),
        ))
    }
}

fn check_window(field: &'static str, min: f64, max: f64) -> Result<()> {
    if min.is_finite() && max.is_finite() && min >= 0.0 && min <= max {
        Ok(())
    } else {
        Err(PlaceError::invalid_config(
            field,
            format!("window [{}, {}] is not a valid range", min, max),
        ))
    }
}

// ============================================================================
// Pipeline Output
// ============================================================================

/// An inferred significant place: the pipeline's output unit.
///
/// Carries the evidence it was derived from so a later run can merge new
/// samples into it and re-score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceCandidate {
    pub category: Category,
    /// Confidence in the category, within [0, 0.95]
    pub confidence: f32,
    pub centroid: GpsPoint,
    pub sample_count: u32,
    pub pattern: TemporalPattern,
    /// Factors of the most recent automatic score
    pub breakdown: ConfidenceBreakdown,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    /// Set by a user correction; automatic re-categorization is skipped while set
    #[serde(default)]
    pub user_corrected: bool,
    /// Samples backing this place, ordered by timestamp.
    ///
    /// Every sample ever merged into the place is kept, so this grows with
    /// the place's history and each evidence merge re-sorts all of it.
    /// Hosts that persist places for long periods should prune old samples
    /// (e.g. to the age window) before passing them back as priors.
    #[serde(default)]
    pub points: Vec<SamplePoint>,
}

impl PlaceCandidate {
    /// Run pattern extraction, categorization and scoring over a cluster.
    ///
    /// Returns `None` for an empty cluster.
    pub fn from_cluster(cluster: &Cluster, config: &PlaceConfig) -> Option<Self> {
        let first_seen = cluster.first_seen()?;
        let last_seen = cluster.last_seen()?;

        let pattern = extract_pattern(cluster, config);
        let category = categorize(&pattern, config);
        let breakdown = score_breakdown(category, cluster, &pattern);

        Some(Self {
            category,
            confidence: breakdown.total,
            centroid: cluster.centroid(),
            sample_count: cluster.len() as u32,
            pattern,
            breakdown,
            first_seen,
            last_seen,
            user_corrected: false,
            points: cluster.points().to_vec(),
        })
    }

    /// Build a candidate directly from a set of samples.
    pub fn from_points(points: Vec<SamplePoint>, config: &PlaceConfig) -> Option<Self> {
        Self::from_cluster(&Cluster::new(points), config)
    }

    /// Time between the first and last sample of this place.
    pub fn observed_span(&self) -> Duration {
        self.last_seen - self.first_seen
    }
}
