//! Geographic utilities: great-circle distance, centroids and
//! meter/degree conversion.

use crate::{GpsPoint, SamplePoint};

/// Mean Earth radius used by the Haversine formula.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Meters per degree of latitude (approximately constant).
pub const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

/// Great-circle distance between two points in meters.
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    let lat1 = p1.latitude.to_radians();
    let lat2 = p2.latitude.to_radians();
    let dlat = (p2.latitude - p1.latitude).to_radians();
    let dlng = (p2.longitude - p1.longitude).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Haversine distance between two samples.
pub fn sample_distance(a: &SamplePoint, b: &SamplePoint) -> f64 {
    haversine_distance(&a.position(), &b.position())
}

/// Arithmetic mean of a set of coordinates. Returns (0, 0) for empty input.
///
/// Points spread across the ±180° meridian are averaged on the short side
/// and the result is normalized back into [-180, 180].
pub fn compute_centroid(points: &[GpsPoint]) -> GpsPoint {
    if points.is_empty() {
        return GpsPoint::new(0.0, 0.0);
    }
    let n = points.len() as f64;
    let (min_lng, max_lng) = points.iter().fold((f64::MAX, f64::MIN), |(lo, hi), p| {
        (lo.min(p.longitude), hi.max(p.longitude))
    });
    let wraps = max_lng - min_lng > 180.0;

    let (lat_sum, lng_sum) = points.iter().fold((0.0, 0.0), |(lat, lng), p| {
        let longitude = if wraps && p.longitude < 0.0 {
            p.longitude + 360.0
        } else {
            p.longitude
        };
        (lat + p.latitude, lng + longitude)
    });

    let mut longitude = lng_sum / n;
    if longitude > 180.0 {
        longitude -= 360.0;
    }
    GpsPoint::new(lat_sum / n, longitude)
}

/// Convert meters to degrees of latitude.
pub fn meters_to_deg_lat(meters: f64) -> f64 {
    meters / METERS_PER_DEGREE_LAT
}

/// Convert meters to degrees of longitude at the given latitude.
///
/// Near the poles the conversion saturates at a full turn.
pub fn meters_to_degrees(meters: f64, latitude: f64) -> f64 {
    let meters_per_deg_lng = METERS_PER_DEGREE_LAT * latitude.to_radians().cos();
    if meters_per_deg_lng.abs() < 1e-6 {
        return 360.0;
    }
    (meters / meters_per_deg_lng).min(360.0)
}
