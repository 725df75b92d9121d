//! Tests for geo_utils module

use chrono::{TimeZone, Utc};
use placematch::geo_utils::*;
use placematch::{GpsPoint, SamplePoint};

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

#[test]
fn test_haversine_distance_same_point() {
    let p = GpsPoint::new(51.5074, -0.1278);
    assert_eq!(haversine_distance(&p, &p), 0.0);
}

#[test]
fn test_haversine_distance_known_value() {
    // London to Paris is approximately 344 km
    let london = GpsPoint::new(51.5074, -0.1278);
    let paris = GpsPoint::new(48.8566, 2.3522);
    let dist = haversine_distance(&london, &paris);
    assert!(approx_eq(dist, 343_560.0, 5000.0)); // Within 5km
}

#[test]
fn test_haversine_distance_symmetric() {
    let a = GpsPoint::new(37.7749, -122.4194);
    let b = GpsPoint::new(37.7849, -122.4094);
    assert_eq!(haversine_distance(&a, &b), haversine_distance(&b, &a));
}

#[test]
fn test_sample_distance_ignores_time() {
    let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let t2 = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let a = SamplePoint::new(0.0, 0.0, t1, 5.0);
    let b = SamplePoint::new(0.001, 0.0, t2, 50.0);
    // 0.001 degrees of latitude is ~111m
    assert!(approx_eq(sample_distance(&a, &b), 111.2, 0.5));
}

#[test]
fn test_compute_centroid() {
    let points = vec![GpsPoint::new(51.50, -0.10), GpsPoint::new(51.52, -0.12)];
    let center = compute_centroid(&points);
    assert!(approx_eq(center.latitude, 51.51, 0.001));
    assert!(approx_eq(center.longitude, -0.11, 0.001));
}

#[test]
fn test_compute_centroid_empty() {
    let center = compute_centroid(&[]);
    assert_eq!(center.latitude, 0.0);
    assert_eq!(center.longitude, 0.0);
}

#[test]
fn test_meters_to_degrees() {
    assert!(approx_eq(meters_to_deg_lat(METERS_PER_DEGREE_LAT), 1.0, 1e-12));
    // At the equator a degree of longitude is as long as a degree of latitude
    assert!(approx_eq(meters_to_degrees(1000.0, 0.0), meters_to_deg_lat(1000.0), 1e-9));
    // At 60 degrees it is half as long
    assert!(approx_eq(meters_to_degrees(1000.0, 60.0), 2.0 * meters_to_deg_lat(1000.0), 1e-6));
}

#[test]
fn test_meters_to_degrees_saturates_at_pole() {
    assert_eq!(meters_to_degrees(1000.0, 90.0), 360.0);
}

#[test]
fn test_compute_centroid_across_antimeridian() {
    let points = vec![GpsPoint::new(0.0, 179.9), GpsPoint::new(0.0, -179.9)];
    let center = compute_centroid(&points);
    assert!(approx_eq(center.longitude.abs(), 180.0, 1e-9));

    let points = vec![
        GpsPoint::new(0.0, 179.8),
        GpsPoint::new(0.0, 179.9),
        GpsPoint::new(0.0, -179.9),
    ];
    let center = compute_centroid(&points);
    assert!(approx_eq(center.longitude, 179.9 + 0.1 / 3.0, 1e-9));
}

#[test]
fn test_haversine_distance_across_antimeridian() {
    let east = GpsPoint::new(0.0, 179.9999);
    let west = GpsPoint::new(0.0, -179.9999);
    assert!(haversine_distance(&east, &west) < 25.0);
}
