//! R-tree indexed samples for DBSCAN neighbourhood queries.

use rstar::{RTree, RTreeObject, AABB};

use crate::geo_utils::{meters_to_deg_lat, meters_to_degrees, sample_distance};
use crate::SamplePoint;

/// Degree envelopes are padded so the meter/degree approximation never
/// excludes a point that is within `eps` by Haversine distance.
const ENVELOPE_PADDING: f64 = 1.1;

/// A sample position with its index for R-tree queries
#[derive(Debug, Clone, Copy)]
pub struct IndexedSample {
    pub idx: usize,
    pub lat: f64,
    pub lng: f64,
}

impl RTreeObject for IndexedSample {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lat, self.lng])
    }
}

/// Build R-tree from samples for efficient spatial queries
pub fn build_rtree(points: &[SamplePoint]) -> RTree<IndexedSample> {
    let indexed: Vec<IndexedSample> = points
        .iter()
        .enumerate()
        .map(|(i, p)| IndexedSample {
            idx: i,
            lat: p.latitude,
            lng: p.longitude,
        })
        .collect();
    RTree::bulk_load(indexed)
}

/// Neighbourhood lookup over a fixed slice of samples.
pub struct NeighborIndex<'a> {
    points: &'a [SamplePoint],
    tree: RTree<IndexedSample>,
    eps_m: f64,
}

impl<'a> NeighborIndex<'a> {
    pub fn new(points: &'a [SamplePoint], eps_m: f64) -> Self {
        Self {
            points,
            tree: build_rtree(points),
            eps_m,
        }
    }

    /// Indices of all samples within `eps_m` of sample `idx`, including
    /// `idx` itself, in ascending index order.
    ///
    /// A search box that crosses the ±180° meridian is split so samples on
    /// the far side are found too.
    pub fn neighbors(&self, idx: usize) -> Vec<usize> {
        let center = &self.points[idx];
        let dlat = meters_to_deg_lat(self.eps_m) * ENVELOPE_PADDING;
        let dlng = meters_to_degrees(self.eps_m, center.latitude) * ENVELOPE_PADDING;
        let (min_lat, max_lat) = (center.latitude - dlat, center.latitude + dlat);
        let (west, east) = (center.longitude - dlng, center.longitude + dlng);

        let mut boxes = vec![AABB::from_corners([min_lat, west], [max_lat, east])];
        if west < -180.0 {
            boxes.push(AABB::from_corners([min_lat, west + 360.0], [max_lat, 180.0]));
        }
        if east > 180.0 {
            boxes.push(AABB::from_corners([min_lat, -180.0], [max_lat, east - 360.0]));
        }

        let mut found: Vec<usize> = boxes
            .iter()
            .flat_map(|search| self.tree.locate_in_envelope_intersecting(search))
            .filter(|candidate| {
                sample_distance(center, &self.points[candidate.idx]) <= self.eps_m
            })
            .map(|candidate| candidate.idx)
            .collect();
        found.sort_unstable();
        found.dedup();
        found
    }
}
