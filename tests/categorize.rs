//! Tests for rule-based categorization

mod common;

use common::*;
use placematch::{
    categorize, extract_pattern, matching_categories, Category, Cluster, ParseCategoryError,
    PlaceConfig, SamplePoint, TemporalPattern,
};

const HOUR_MS: u64 = 3_600_000;
const MINUTE_MS: u64 = 60_000;

fn pattern_for(points: Vec<SamplePoint>) -> TemporalPattern {
    extract_pattern(&Cluster::new(points), &PlaceConfig::default())
}

/// Pattern with all samples in the given (hour, count) buckets on weekdays.
fn synthetic_pattern(
    hours: &[(usize, u32)],
    dwell_ms: u64,
    visits_per_week: f32,
) -> TemporalPattern {
    let mut pattern = TemporalPattern {
        avg_dwell_ms: dwell_ms,
        visits_per_week,
        ..TemporalPattern::default()
    };
    for &(hour, count) in hours {
        pattern.hour_histogram[hour] += count;
        pattern.weekday_histogram[0] += count;
    }
    pattern
}

#[test]
fn test_routines_categorized() {
    let config = PlaceConfig::default();
    assert_eq!(categorize(&pattern_for(home_nights(0, 14)), &config), Category::Home);
    assert_eq!(categorize(&pattern_for(office_days(4)), &config), Category::Work);
    assert_eq!(categorize(&pattern_for(gym_evenings(4)), &config), Category::Gym);
    assert_eq!(categorize(&pattern_for(weekday_lunches(2)), &config), Category::Restaurant);
    assert_eq!(categorize(&pattern_for(saturday_errand()), &config), Category::Shopping);
}

#[test]
fn test_nothing_matches() {
    let config = PlaceConfig::default();
    assert_eq!(categorize(&TemporalPattern::default(), &config), Category::Unknown);
    assert!(matching_categories(&TemporalPattern::default(), &config).is_empty());
}

#[test]
fn test_home_needs_regular_visits() {
    let config = PlaceConfig::default();
    let frequent = synthetic_pattern(&[(23, 10), (2, 10)], 7 * HOUR_MS, 6.0);
    let rare = synthetic_pattern(&[(23, 10), (2, 10)], 7 * HOUR_MS, 2.0);

    assert_eq!(categorize(&frequent, &config), Category::Home);
    assert_eq!(categorize(&rare, &config), Category::Unknown);
}

#[test]
fn test_work_needs_weekdays() {
    let config = PlaceConfig::default();
    let mut weekend = synthetic_pattern(&[(10, 10), (15, 10)], 8 * HOUR_MS, 1.0);
    weekend.weekday_histogram = [0, 0, 0, 0, 0, 10, 10];

    assert_eq!(categorize(&weekend, &config), Category::Unknown);
}

#[test]
fn test_earlier_rule_wins() {
    let config = PlaceConfig::default();

    // 09:00 and 17:00 are both office and gym hours; a 4h stay satisfies both
    let office_or_gym = synthetic_pattern(&[(9, 10), (17, 10)], 4 * HOUR_MS, 3.0);
    assert_eq!(
        matching_categories(&office_or_gym, &config),
        vec![Category::Work, Category::Gym]
    );
    assert_eq!(categorize(&office_or_gym, &config), Category::Work);

    // One-hour evening stays fit gym, dinner and shopping
    let evening = synthetic_pattern(&[(18, 10), (19, 10)], 60 * MINUTE_MS, 3.0);
    assert_eq!(
        matching_categories(&evening, &config),
        vec![Category::Gym, Category::Restaurant, Category::Shopping]
    );
    assert_eq!(categorize(&evening, &config), Category::Gym);
}

#[test]
fn test_thresholds_come_from_config() {
    let home = synthetic_pattern(&[(23, 10), (2, 10)], 7 * HOUR_MS, 6.0);
    let strict = PlaceConfig {
        home_min_dwell_hours: 8.0,
        ..PlaceConfig::default()
    };
    assert_eq!(categorize(&home, &PlaceConfig::default()), Category::Home);
    assert_eq!(categorize(&home, &strict), Category::Unknown);
}

#[test]
fn test_category_strings() {
    for category in Category::ALL {
        assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        assert_eq!(category.to_string(), category.as_str());
    }
    assert_eq!("GYM".parse::<Category>(), Ok(Category::Gym));
    assert_eq!("unknown".parse::<Category>(), Ok(Category::Unknown));
    assert_eq!(
        "library".parse::<Category>(),
        Err(ParseCategoryError("library".to_string()))
    );
    assert!("hmoe".parse::<Category>().is_err());
    assert_eq!(Category::default(), Category::Unknown);
}
