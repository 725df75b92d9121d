//! Tests for confidence scoring

mod common;

use common::*;
use placematch::{
    extract_pattern, score, score_breakdown, Category, Cluster, PlaceConfig, SamplePoint,
    MAX_CONFIDENCE,
};

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-5
}

#[test]
fn test_strong_evidence_is_capped() {
    let cluster = Cluster::new(home_nights(0, 28));
    let pattern = extract_pattern(&cluster, &PlaceConfig::default());
    let breakdown = score_breakdown(Category::Home, &cluster, &pattern);

    assert!(breakdown.unclamped() > MAX_CONFIDENCE);
    assert_eq!(breakdown.total, MAX_CONFIDENCE);
    assert_eq!(score(Category::Home, &cluster, &pattern), MAX_CONFIDENCE);
}

#[test]
fn test_breakdown_factors() {
    // 5 inaccurate samples within a quarter hour
    let points: Vec<SamplePoint> = (0..5).map(|i| sample(SHOP, at(0, 15, i * 3), 80.0)).collect();
    let cluster = Cluster::new(points);
    let pattern = extract_pattern(&cluster, &PlaceConfig::default());
    let breakdown = score_breakdown(Category::Unknown, &cluster, &pattern);

    assert!(approx_eq(breakdown.base, 0.20));
    assert!(approx_eq(breakdown.count_bonus, 0.10));
    assert_eq!(breakdown.accuracy_bonus, 0.0);
    assert_eq!(breakdown.timespan_bonus, 0.0);
    // Every sample in one hour: fully consistent
    assert!(approx_eq(breakdown.consistency_bonus, 0.10));
    assert!(approx_eq(breakdown.total, 0.40));
}

#[test]
fn test_more_evidence_scores_higher() {
    let config = PlaceConfig::default();
    let week = Cluster::new(office_days(1));
    let month = Cluster::new(office_days(4));

    let short = score(Category::Work, &week, &extract_pattern(&week, &config));
    let long = score(Category::Work, &month, &extract_pattern(&month, &config));
    assert!(long >= short);
}

#[test]
fn test_category_base_rates_ordered() {
    assert!(Category::Home.base_confidence() > Category::Work.base_confidence());
    assert!(Category::Work.base_confidence() > Category::Gym.base_confidence());
    assert!(Category::Gym.base_confidence() > Category::Restaurant.base_confidence());
    assert!(Category::Shopping.base_confidence() > Category::Unknown.base_confidence());
}

#[test]
fn test_score_always_in_range() {
    let config = PlaceConfig::default();
    let routines = [
        home_nights(0, 3),
        office_days(4),
        gym_evenings(1),
        weekday_lunches(2),
        saturday_errand(),
    ];
    for points in routines {
        let cluster = Cluster::new(points);
        let pattern = extract_pattern(&cluster, &config);
        for category in Category::ALL {
            let s = score(category, &cluster, &pattern);
            assert!((0.0..=MAX_CONFIDENCE).contains(&s), "{} scored {}", category, s);
        }
    }
}
