//! Tests for sample quality filtering

mod common;

use chrono::Duration;
use common::*;
use placematch::{filter_samples, filter_samples_with_reference, PlaceConfig, SamplePoint};

#[test]
fn test_empty_input() {
    assert!(filter_samples(&[], &PlaceConfig::default()).is_empty());
}

#[test]
fn test_accuracy_threshold_is_inclusive() {
    let config = PlaceConfig::default();
    let points = vec![
        sample(HOME, at(0, 12, 0), 100.0),
        sample(HOME, at(0, 12, 5), 100.5),
        sample(HOME, at(0, 12, 10), 20.0),
    ];
    let kept = filter_samples(&points, &config);
    assert_eq!(kept.len(), 2);
    assert!(kept.iter().all(|p| p.accuracy_meters <= 100.0));
}

#[test]
fn test_invalid_coordinates_dropped() {
    let config = PlaceConfig::default();
    let points = vec![
        SamplePoint::new(91.0, 0.0, at(0, 12, 0), 5.0),
        SamplePoint::new(f64::NAN, 0.0, at(0, 12, 5), 5.0),
        sample(HOME, at(0, 12, 10), 5.0),
    ];
    assert_eq!(filter_samples(&points, &config).len(), 1);
}

#[test]
fn test_impossible_jump_dropped() {
    let config = PlaceConfig::default();
    let points = vec![
        sample(HOME, at(0, 12, 0), 10.0),
        // ~5.5 km north one minute later: ~330 km/h
        SamplePoint::new(HOME.0 + 0.05, HOME.1, at(0, 12, 1), 10.0),
        sample(HOME, at(0, 12, 2), 10.0),
    ];
    let kept = filter_samples(&points, &config);
    assert_eq!(kept.len(), 2);
    assert!(kept.iter().all(|p| p.latitude == HOME.0));
}

#[test]
fn test_walking_pace_kept() {
    let config = PlaceConfig::default();
    // 100m every two minutes
    let points: Vec<SamplePoint> = (0..10)
        .map(|i| {
            SamplePoint::new(HOME.0 + i as f64 * 0.0009, HOME.1, at(0, 12, i * 2), 10.0)
        })
        .collect();
    assert_eq!(filter_samples(&points, &config).len(), 10);
}

#[test]
fn test_age_relative_to_newest_sample() {
    let config = PlaceConfig::default(); // 30 days
    let points = vec![
        sample(HOME, at(0, 12, 0), 10.0),
        sample(HOME, at(2, 12, 0), 10.0),
        sample(HOME, at(31, 12, 0), 10.0),
    ];
    let kept = filter_samples(&points, &config);
    assert_eq!(kept.len(), 2);
    assert_eq!(kept[0].timestamp, at(2, 12, 0));
}

#[test]
fn test_explicit_reference_instant() {
    let config = PlaceConfig {
        max_age_hours: 24,
        ..PlaceConfig::default()
    };
    let points = vec![sample(HOME, at(0, 12, 0), 10.0), sample(HOME, at(1, 6, 0), 10.0)];
    let kept = filter_samples_with_reference(&points, &config, at(2, 0, 0));
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].timestamp, at(1, 6, 0));
}

#[test]
fn test_stationary_jitter() {
    let config = PlaceConfig::default(); // 10m, 60s
    let points = vec![
        sample(HOME, at(0, 12, 0), 10.0),
        // 30 seconds later, ~2m away: jitter
        SamplePoint::new(HOME.0 + 0.00002, HOME.1, at(0, 12, 0) + Duration::seconds(30), 10.0),
        // 90 seconds after the first kept sample: kept
        sample(HOME, at(0, 12, 0) + Duration::seconds(90), 10.0),
        // 10 seconds later but ~55m away: kept
        SamplePoint::new(HOME.0 + 0.0005, HOME.1, at(0, 12, 0) + Duration::seconds(100), 10.0),
    ];
    let kept = filter_samples(&points, &config);
    assert_eq!(kept.len(), 3);
}

#[test]
fn test_output_sorted() {
    let config = PlaceConfig::default();
    let mut points = home_nights(0, 3);
    points.reverse();
    let kept = filter_samples(&points, &config);
    assert_eq!(kept.len(), 24);
    assert!(kept.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[test]
fn test_filter_is_idempotent() {
    let config = PlaceConfig::default();
    let mut points = home_nights(0, 5);
    points.extend(office_days(1));
    points.push(sample(WORK, at(2, 12, 30), 250.0));
    points.push(sample(WORK, at(3, 12, 0) + Duration::seconds(20), 10.0));
    points.push(SamplePoint::new(40.0, -74.0, at(3, 12, 30), 10.0));

    let once = filter_samples(&points, &config);
    let twice = filter_samples(&once, &config);
    assert!(once.len() < points.len());
    assert_eq!(once, twice);
}
