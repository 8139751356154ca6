//! Exact nearest-neighbor search in standardized feature space.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use timbre_core::{FeatureVector, RowIndex};

use crate::normalizer::FeatureMatrix;

/// A single search hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub row: RowIndex,
    /// Euclidean distance to the query point.
    pub distance: f64,
}

impl Neighbor {
    /// Total order used for every result list: ascending distance, then
    /// ascending row index on ties.
    fn cmp_rank(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.row.cmp(&other.row))
    }
}

/// A read-only k-nearest-neighbor structure over a fixed row space.
pub trait NeighborSearch {
    /// Number of indexed rows.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `min(k, len)` rows closest to `point`, ordered by ascending
    /// distance with ties broken by ascending row index.
    fn query(&self, point: &FeatureVector, k: usize) -> Vec<Neighbor>;
}

/// Euclidean distance between two feature vectors.
///
/// Symmetric bit-for-bit, and exactly zero for identical vectors.
#[must_use]
pub fn euclidean_distance(a: &FeatureVector, b: &FeatureVector) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Brute-force index: every query scans all rows, so results are exact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityIndex {
    points: Vec<FeatureVector>,
}

impl SimilarityIndex {
    /// Build an index over the rows of a standardized matrix.
    #[must_use]
    pub fn build(matrix: &FeatureMatrix) -> Self {
        log::info!("Building similarity index over {} rows", matrix.len());
        Self {
            points: matrix.rows().to_vec(),
        }
    }

    /// The indexed point of a row.
    #[must_use]
    pub fn point(&self, row: RowIndex) -> Option<&FeatureVector> {
        self.points.get(row.get())
    }

    #[must_use]
    pub fn points(&self) -> &[FeatureVector] {
        &self.points
    }

    /// Distance between two indexed rows, or `None` if either is out of range.
    #[must_use]
    pub fn distance(&self, a: RowIndex, b: RowIndex) -> Option<f64> {
        Some(euclidean_distance(self.point(a)?, self.point(b)?))
    }
}

impl NeighborSearch for SimilarityIndex {
    fn len(&self) -> usize {
        self.points.len()
    }

    fn query(&self, point: &FeatureVector, k: usize) -> Vec<Neighbor> {
        let k = k.min(self.points.len());
        if k == 0 {
            return Vec::new();
        }

        let mut hits: Vec<Neighbor> = self
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| Neighbor {
                row: RowIndex::new(i),
                distance: euclidean_distance(point, p),
            })
            .collect();

        if k < hits.len() {
            hits.select_nth_unstable_by(k - 1, Neighbor::cmp_rank);
            hits.truncate(k);
        }
        hits.sort_unstable_by(Neighbor::cmp_rank);
        hits
    }
}
