//! # Density-Based Spatial Clustering
//!
//! Groups filtered samples into places with DBSCAN over Haversine distance.
//!
//! ## Algorithm
//! 1. Visit samples in timestamp order
//! 2. A sample with at least `min_points` samples within `eps_m` (itself
//!    included) is a core point and seeds a new cluster
//! 3. The cluster grows breadth-first: every neighbour joins, and the
//!    neighbourhoods of neighbours that are core points are queued
//! 4. Samples reachable from no core point are noise
//!
//! A border sample reachable from two clusters belongs to whichever cluster
//! reached it first. This depends on visiting order and is kept as-is.
//!
//! Neighbourhood queries go through an R-tree, so a pass is roughly
//! O(n log n) for well-spread data instead of O(n²).

mod rtree;

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::geo_utils::compute_centroid;
use crate::{GpsPoint, SamplePoint};

pub use rtree::{build_rtree, IndexedSample, NeighborIndex};

/// A timestamp-ordered group of mutually density-reachable samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    points: Vec<SamplePoint>,
}

impl Cluster {
    /// Create a cluster, ordering the samples by timestamp.
    pub fn new(mut points: Vec<SamplePoint>) -> Self {
        points.sort_by_key(|p| p.timestamp);
        Self { points }
    }

    pub fn points(&self) -> &[SamplePoint] {
        &self.points
    }

    pub fn into_points(self) -> Vec<SamplePoint> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Mean position of the samples.
    pub fn centroid(&self) -> GpsPoint {
        let positions: Vec<GpsPoint> = self.points.iter().map(|p| p.position()).collect();
        compute_centroid(&positions)
    }

    /// Mean reported accuracy radius, `None` for an empty cluster.
    pub fn mean_accuracy(&self) -> Option<f32> {
        if self.points.is_empty() {
            return None;
        }
        let sum: f64 = self
            .points
            .iter()
            .map(|p| f64::from(p.accuracy_meters))
            .sum();
        Some((sum / self.points.len() as f64) as f32)
    }

    pub fn first_seen(&self) -> Option<DateTime<Utc>> {
        self.points.first().map(|p| p.timestamp)
    }

    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.points.last().map(|p| p.timestamp)
    }

    /// Time between the first and last sample.
    pub fn observed_span(&self) -> Duration {
        match (self.first_seen(), self.last_seen()) {
            (Some(first), Some(last)) => last - first,
            _ => Duration::zero(),
        }
    }
}

/// Cluster samples with DBSCAN.
///
/// Samples are visited in stable timestamp order, so the same input always
/// yields the same clusters. Noise samples are dropped. Invalid parameters
/// (`eps_m <= 0`, `min_points < 1`) are rejected by config validation and
/// yield no clusters here.
///
/// # Example
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use placematch::{cluster_samples, SamplePoint};
///
/// let t = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
/// let mut points: Vec<SamplePoint> = (0..10)
///     .map(|i| {
///         let lat = 37.7749 + i as f64 * 0.00001;
///         SamplePoint::new(lat, -122.4194, t + Duration::minutes(i), 10.0)
///     })
///     .collect();
/// points.push(SamplePoint::new(37.8200, -122.4194, t, 10.0)); // ~5km away
///
/// let clusters = cluster_samples(&points, 100.0, 5);
/// assert_eq!(clusters.len(), 1);
/// assert_eq!(clusters[0].len(), 10);
/// ```
pub fn cluster_samples(points: &[SamplePoint], eps_m: f64, min_points: u32) -> Vec<Cluster> {
    let min_points = min_points as usize;
    if !(eps_m > 0.0) || min_points < 1 || points.len() < min_points {
        return Vec::new();
    }

    let mut sorted = points.to_vec();
    sorted.sort_by_key(|p| p.timestamp);

    let labels = dbscan_labels(&sorted, eps_m, min_points);
    let cluster_count = labels.iter().flatten().map(|&c| c + 1).max().unwrap_or(0);

    let mut members: Vec<Vec<SamplePoint>> = vec![Vec::new(); cluster_count];
    let mut noise = 0usize;
    for (point, label) in sorted.iter().zip(&labels) {
        match label {
            Some(cluster_id) => members[*cluster_id].push(*point),
            None => noise += 1,
        }
    }

    // A late cluster can lose border samples to an earlier one and end up
    // below min_points; it is not a place.
    let clusters: Vec<Cluster> = members
        .into_iter()
        .filter(|m| m.len() >= min_points)
        .map(Cluster::new)
        .collect();

    debug!(
        "[Cluster] {} samples -> {} clusters, {} noise (eps={:.0}m, min_points={})",
        sorted.len(),
        clusters.len(),
        noise,
        eps_m,
        min_points
    );

    clusters
}

/// DBSCAN cluster label per sample (`None` = noise).
fn dbscan_labels(points: &[SamplePoint], eps_m: f64, min_points: usize) -> Vec<Option<usize>> {
    let index = NeighborIndex::new(points, eps_m);
    let mut visited = vec![false; points.len()];
    let mut labels: Vec<Option<usize>> = vec![None; points.len()];
    let mut next_cluster = 0usize;

    for i in 0..points.len() {
        if visited[i] {
            continue;
        }
        visited[i] = true;

        let neighbors = index.neighbors(i);
        if neighbors.len() < min_points {
            // Noise for now; a later cluster may still claim it as a border point
            continue;
        }

        let cluster_id = next_cluster;
        next_cluster += 1;
        labels[i] = Some(cluster_id);

        let mut frontier: VecDeque<usize> = VecDeque::new();
        for n in neighbors {
            if labels[n].is_none() {
                labels[n] = Some(cluster_id);
                frontier.push_back(n);
            }
        }

        while let Some(j) = frontier.pop_front() {
            if visited[j] {
                continue;
            }
            visited[j] = true;

            let expansion = index.neighbors(j);
            if expansion.len() >= min_points {
                for n in expansion {
                    if labels[n].is_none() {
                        labels[n] = Some(cluster_id);
                        frontier.push_back(n);
                    }
                }
            }
        }
    }

    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(lat: f64, lng: f64, minute: i64) -> SamplePoint {
        let t = Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap() + Duration::minutes(minute);
        SamplePoint::new(lat, lng, t, 10.0)
    }

    #[test]
    fn test_labels_mark_noise() {
        let mut points: Vec<SamplePoint> = (0..5).map(|i| sample(10.0, 10.0, i)).collect();
        points.push(sample(11.0, 11.0, 10));

        let labels = dbscan_labels(&points, 50.0, 3);
        assert!(labels[..5].iter().all(|l| *l == Some(0)));
        assert_eq!(labels[5], None);
    }

    #[test]
    fn test_border_point_goes_to_first_cluster() {
        // Core samples at 0m and 150m, a non-core border sample at 75m
        // reachable from both. Each core has three followers 60m further out.
        let mut points = vec![sample(0.0, 0.0, 0)];
        points.extend((1..4).map(|i| sample(0.0, -0.000_54, i)));
        points.push(sample(0.0, 0.000_675, 4));
        points.push(sample(0.0, 0.001_35, 5));
        points.extend((6..9).map(|i| sample(0.0, 0.001_89, i)));

        let labels = dbscan_labels(&points, 80.0, 4);
        assert!(labels[..4].iter().all(|l| *l == Some(0)));
        assert_eq!(labels[4], Some(0));
        assert!(labels[5..].iter().all(|l| *l == Some(1)));
    }
}
