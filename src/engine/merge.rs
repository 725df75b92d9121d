//! Merging of place candidates.
//!
//! Chunked processing can split one physical place across several chunks,
//! and a new run usually rediscovers places the caller already knows. Both
//! cases are resolved by centroid distance against `distance_threshold_m`.

use log::debug;

use crate::feedback::rescore_with_evidence;
use crate::geo_utils::haversine_distance;
use crate::union_find::UnionFind;
use crate::{PlaceCandidate, PlaceConfig, SamplePoint};

/// Merge candidates whose centroids chain together within the threshold.
///
/// Each merged group is rebuilt from the union of its samples, so its
/// pattern, category and confidence reflect all of them. Groups keep the
/// order of their earliest member. Returns the merged candidates and the
/// number of candidates absorbed into another.
pub fn merge_nearby_candidates(
    candidates: Vec<PlaceCandidate>,
    config: &PlaceConfig,
) -> (Vec<PlaceCandidate>, usize) {
    if candidates.len() < 2 {
        return (candidates, 0);
    }

    let mut uf = UnionFind::with_capacity(candidates.len());
    for i in 0..candidates.len() {
        uf.make_set(i);
    }
    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            let distance = haversine_distance(&candidates[i].centroid, &candidates[j].centroid);
            if distance <= config.distance_threshold_m {
                uf.union(&i, &j);
            }
        }
    }

    let mut groups: Vec<Vec<usize>> = uf.groups().into_values().collect();
    for group in &mut groups {
        group.sort_unstable();
    }
    groups.sort_by_key(|group| group[0]);

    let mut slots: Vec<Option<PlaceCandidate>> = candidates.into_iter().map(Some).collect();
    let mut merged: Vec<PlaceCandidate> = Vec::with_capacity(groups.len());
    let mut absorbed = 0usize;

    for group in groups {
        let members: Vec<PlaceCandidate> = group.iter().filter_map(|&i| slots[i].take()).collect();
        if members.len() == 1 {
            merged.extend(members);
            continue;
        }

        absorbed += members.len() - 1;
        let points: Vec<SamplePoint> = members.into_iter().flat_map(|c| c.points).collect();
        if let Some(candidate) = PlaceCandidate::from_points(points, config) {
            merged.push(candidate);
        }
    }

    debug!(
        "[Batch] Merged {} chunk candidates into {} places",
        merged.len() + absorbed,
        merged.len()
    );

    (merged, absorbed)
}

/// Fold freshly inferred candidates into the caller's prior places.
///
/// Each fresh candidate is absorbed by the nearest prior place within the
/// threshold (earliest prior on ties) via [`rescore_with_evidence`]. Priors
/// that nothing matched pass through unchanged, and unmatched fresh
/// candidates are appended after the priors. Returns the result and the
/// number of fresh candidates absorbed.
pub fn merge_with_prior(
    fresh: Vec<PlaceCandidate>,
    prior: &[PlaceCandidate],
    config: &PlaceConfig,
) -> (Vec<PlaceCandidate>, usize) {
    if prior.is_empty() {
        return (fresh, 0);
    }

    let mut evidence: Vec<Vec<SamplePoint>> = vec![Vec::new(); prior.len()];
    let mut unmatched: Vec<PlaceCandidate> = Vec::new();
    let mut absorbed = 0usize;

    for candidate in fresh {
        let nearest = prior
            .iter()
            .enumerate()
            .map(|(i, p)| (i, haversine_distance(&p.centroid, &candidate.centroid)))
            .filter(|(_, d)| *d <= config.distance_threshold_m)
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

        match nearest {
            Some((i, _)) => {
                evidence[i].extend(candidate.points);
                absorbed += 1;
            }
            None => unmatched.push(candidate),
        }
    }

    let mut result: Vec<PlaceCandidate> = prior
        .iter()
        .zip(&evidence)
        .map(|(place, points)| {
            if points.is_empty() {
                place.clone()
            } else {
                rescore_with_evidence(place, points, config)
            }
        })
        .collect();
    result.extend(unmatched);

    debug!(
        "[Batch] {} fresh candidates absorbed into {} prior places",
        absorbed,
        prior.len()
    );

    (result, absorbed)
}
