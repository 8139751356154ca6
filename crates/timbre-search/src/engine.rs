//! The recommendation engine.
//!
//! A [`Recommender`] owns everything fitted at startup: the dataset, the
//! scaler, the standardized feature matrix, the similarity index and the
//! name resolver. None of it changes after construction, so one instance
//! can serve any number of queries (and readers on several threads).

use serde::Serialize;
use timbre_core::{Dataset, RowIndex, TrackRecord};

use crate::error::{SearchError, SearchResult};
use crate::index::{NeighborSearch, SimilarityIndex};
use crate::normalizer::{self, FeatureMatrix, ScalerState};
use crate::persistence::IndexArtifact;
use crate::resolver::{EntityResolver, QueryMode};

/// Largest number of recommendations a single query may ask for.
pub const MAX_RECOMMENDATIONS: usize = 20;

/// Number of recommendations returned when the caller does not say.
pub const DEFAULT_RECOMMENDATIONS: usize = 5;

/// One recommended track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Recommendation<'a> {
    /// 1-based position in the result list.
    pub rank: usize,
    pub row: RowIndex,
    pub track: &'a TrackRecord,
    /// Euclidean distance to the seed track in standardized feature space.
    pub distance: f64,
}

/// The result of a recommendation query.
///
/// `NotFound` (the key matched nothing) is kept apart from a `Found` with no
/// recommendations, which happens when the seed is the only track.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecommendOutcome<'a> {
    Found {
        /// The row the key resolved to.
        seed: RowIndex,
        seed_track: &'a TrackRecord,
        recommendations: Vec<Recommendation<'a>>,
    },
    NotFound {
        mode: QueryMode,
        key: String,
    },
}

impl<'a> RecommendOutcome<'a> {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// The recommendations, empty when the key was not found.
    pub fn recommendations(&self) -> &[Recommendation<'a>] {
        match self {
            Self::Found {
                recommendations, ..
            } => recommendations.as_slice(),
            Self::NotFound { .. } => &[],
        }
    }

    pub fn seed(&self) -> Option<RowIndex> {
        match self {
            Self::Found { seed, .. } => Some(*seed),
            Self::NotFound { .. } => None,
        }
    }
}

/// Immutable recommendation context, generic over the neighbor search
/// backend.
#[derive(Debug)]
pub struct Recommender<I = SimilarityIndex> {
    dataset: Dataset,
    scaler: ScalerState,
    matrix: FeatureMatrix,
    index: I,
    resolver: EntityResolver,
}

impl Recommender<SimilarityIndex> {
    /// Fit the scaler and build the index from scratch.
    pub fn build(dataset: Dataset) -> SearchResult<Self> {
        let (matrix, scaler) = normalizer::fit(&dataset.feature_rows())?;
        let index = SimilarityIndex::build(&matrix);
        let resolver = EntityResolver::new(&dataset);
        log::info!("Recommender ready: {} tracks indexed", dataset.len());
        Ok(Self {
            dataset,
            scaler,
            matrix,
            index,
            resolver,
        })
    }

    /// Pair a dataset with a previously persisted scaler and index.
    ///
    /// The dataset is standardized with the persisted scaler (no refit) and
    /// must reproduce the persisted index point for point.
    ///
    /// # Errors
    ///
    /// [`SearchError::Misaligned`] when the row counts differ and
    /// [`SearchError::StaleArtifact`] when the artifact was built from
    /// different data.
    pub fn from_artifact(dataset: Dataset, artifact: IndexArtifact) -> SearchResult<Self> {
        let IndexArtifact { scaler, index, .. } = artifact;
        let recommender = Self::with_index(dataset, scaler, index)?;

        let stale = recommender
            .matrix
            .rows()
            .iter()
            .zip(recommender.index.points())
            .position(|(m, p)| m != p);
        if let Some(row) = stale {
            return Err(SearchError::StaleArtifact { row });
        }

        log::info!(
            "Recommender ready: {} tracks from persisted index",
            recommender.dataset.len()
        );
        Ok(recommender)
    }

    /// Snapshot the fitted scaler and index for persistence.
    #[must_use]
    pub fn to_artifact(&self) -> IndexArtifact {
        IndexArtifact::new(self.index.clone(), self.scaler.clone())
    }
}

impl<I: NeighborSearch> Recommender<I> {
    /// Assemble a recommender around an already built index.
    ///
    /// The dataset is standardized with `scaler` and the index must cover
    /// exactly the dataset's rows.
    pub fn with_index(dataset: Dataset, scaler: ScalerState, index: I) -> SearchResult<Self> {
        if index.len() != dataset.len() {
            return Err(SearchError::Misaligned {
                index_rows: index.len(),
                dataset_rows: dataset.len(),
            });
        }
        let matrix = scaler.transform(&dataset.feature_rows())?;
        let resolver = EntityResolver::new(&dataset);
        Ok(Self {
            dataset,
            scaler,
            matrix,
            index,
            resolver,
        })
    }

    /// Recommend up to `n` tracks similar to the row `key` resolves to.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error, before any lookup, when `n` is
    /// outside `1..=MAX_RECOMMENDATIONS` or `key` is blank. An unknown key
    /// is not an error: it yields [`RecommendOutcome::NotFound`].
    pub fn recommend(
        &self,
        mode: QueryMode,
        key: &str,
        n: usize,
    ) -> SearchResult<RecommendOutcome<'_>> {
        validate_count(n)?;
        if key.trim().is_empty() {
            return Err(SearchError::BlankKey {
                mode: mode.as_str(),
            });
        }

        let Some(seed) = self.resolver.resolve(mode, key) else {
            log::debug!("No {mode} matches {key:?}");
            return Ok(RecommendOutcome::NotFound {
                mode,
                key: key.to_string(),
            });
        };

        let (Some(point), Some(seed_track)) = (self.matrix.row(seed), self.dataset.get(seed))
        else {
            return Err(SearchError::Misaligned {
                index_rows: self.index.len(),
                dataset_rows: self.dataset.len(),
            });
        };

        // One extra neighbor makes room for the seed itself.
        let neighbors = self.index.query(point, n + 1);

        let mut recommendations = Vec::with_capacity(n);
        for neighbor in neighbors.into_iter().filter(|nb| nb.row != seed).take(n) {
            let track = self
                .dataset
                .get(neighbor.row)
                .ok_or(SearchError::Misaligned {
                    index_rows: self.index.len(),
                    dataset_rows: self.dataset.len(),
                })?;
            recommendations.push(Recommendation {
                rank: recommendations.len() + 1,
                row: neighbor.row,
                track,
                distance: neighbor.distance,
            });
        }

        log::debug!(
            "{mode} {key:?} resolved to {seed}; returning {} of {n} requested",
            recommendations.len()
        );

        Ok(RecommendOutcome::Found {
            seed,
            seed_track,
            recommendations,
        })
    }

    pub fn recommend_by_track(&self, name: &str, n: usize) -> SearchResult<RecommendOutcome<'_>> {
        self.recommend(QueryMode::Track, name, n)
    }

    pub fn recommend_by_artist(&self, name: &str, n: usize) -> SearchResult<RecommendOutcome<'_>> {
        self.recommend(QueryMode::Artist, name, n)
    }

    pub fn recommend_by_genre(&self, name: &str, n: usize) -> SearchResult<RecommendOutcome<'_>> {
        self.recommend(QueryMode::Genre, name, n)
    }

    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    #[must_use]
    pub fn scaler(&self) -> &ScalerState {
        &self.scaler
    }

    #[must_use]
    pub fn matrix(&self) -> &FeatureMatrix {
        &self.matrix
    }

    #[must_use]
    pub fn index(&self) -> &I {
        &self.index
    }

    #[must_use]
    pub fn resolver(&self) -> &EntityResolver {
        &self.resolver
    }
}

fn validate_count(n: usize) -> SearchResult<()> {
    if (1..=MAX_RECOMMENDATIONS).contains(&n) {
        Ok(())
    } else {
        Err(SearchError::InvalidCount {
            requested: n,
            max: MAX_RECOMMENDATIONS,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use timbre_core::{AudioFeatures, FeatureVector};

    use crate::index::Neighbor;

    /// Ten tracks spread along a curve; "Track_1" is row 0.
    fn dataset(n: usize) -> Dataset {
        let tracks = (0..n)
            .map(|i| {
                let x = i as f64;
                let v: FeatureVector = [
                    0.1 * x,
                    0.9 - 0.05 * x,
                    -5.0 - x,
                    0.03 * x * x,
                    (x * 0.7).sin().abs(),
                    0.01 * x,
                    0.2 + 0.02 * x,
                    (x * 1.3).cos().abs(),
                    90.0 + 7.0 * x,
                ];
                TrackRecord::new(
                    format!("Track_{}", i + 1),
                    format!("Artist_{}", i % 3),
                    if i % 2 == 0 { "Pop" } else { "Rock" },
                    AudioFeatures::from_vector(v),
                )
            })
            .collect();
        Dataset::new(tracks).unwrap()
    }

    #[test]
    fn test_track_scenario_excludes_seed() {
        let rec = Recommender::build(dataset(10)).unwrap();
        let outcome = rec.recommend_by_track("Track_1", 5).unwrap();

        assert_eq!(outcome.seed(), Some(RowIndex::new(0)));
        let recs = outcome.recommendations();
        assert_eq!(recs.len(), 5);
        assert!(recs.iter().all(|r| r.row != RowIndex::new(0)));
        assert!(recs.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert_eq!(
            recs.iter().map(|r| r.rank).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5]
        );
    }

    #[test]
    fn test_unknown_artist_is_not_found() {
        let rec = Recommender::build(dataset(10)).unwrap();
        let outcome = rec.recommend_by_artist("Unknown_Artist_999", 5).unwrap();
        assert!(outcome.is_not_found());
        assert!(outcome.recommendations().is_empty());
        assert_eq!(outcome.seed(), None);
    }

    #[test]
    fn test_result_length_is_min_of_n_and_others() {
        let rec = Recommender::build(dataset(4)).unwrap();
        for n in 1..=MAX_RECOMMENDATIONS {
            let outcome = rec.recommend_by_genre("pop", n).unwrap();
            assert_eq!(outcome.recommendations().len(), n.min(3), "n = {n}");
        }
    }

    #[test]
    fn test_invalid_counts_are_rejected() {
        let rec = Recommender::build(dataset(10)).unwrap();
        for n in [0, MAX_RECOMMENDATIONS + 1, 1000] {
            let err = rec.recommend_by_genre("Pop", n).unwrap_err();
            assert!(err.is_invalid_argument(), "n = {n}");
        }
        let err = rec.recommend_by_track("   ", 5).unwrap_err();
        assert!(matches!(err, SearchError::BlankKey { mode: "track" }));
    }

    /// Brute-force backend that counts how often it is queried.
    #[derive(Debug)]
    struct CountingIndex {
        inner: SimilarityIndex,
        queries: Cell<usize>,
    }

    impl NeighborSearch for CountingIndex {
        fn len(&self) -> usize {
            self.inner.len()
        }

        fn query(&self, point: &FeatureVector, k: usize) -> Vec<Neighbor> {
            self.queries.set(self.queries.get() + 1);
            self.inner.query(point, k)
        }
    }

    fn counting(n: usize) -> Recommender<CountingIndex> {
        let data = dataset(n);
        let (matrix, scaler) = normalizer::fit(&data.feature_rows()).unwrap();
        let index = CountingIndex {
            inner: SimilarityIndex::build(&matrix),
            queries: Cell::new(0),
        };
        Recommender::with_index(data, scaler, index).unwrap()
    }

    #[test]
    fn test_invalid_count_is_rejected_before_querying() {
        let rec = counting(10);
        assert!(rec.recommend_by_genre("Pop", 0).is_err());
        assert_eq!(rec.index().queries.get(), 0);

        rec.recommend_by_genre("Pop", 3).unwrap();
        assert_eq!(rec.index().queries.get(), 1);
    }

    #[test]
    fn test_not_found_does_not_query() {
        let rec = counting(10);
        let outcome = rec.recommend_by_track("Nope", 3).unwrap();
        assert!(outcome.is_not_found());
        assert_eq!(rec.index().queries.get(), 0);
    }

    #[test]
    fn test_single_track_dataset_is_found_but_empty() {
        // A lone row has zero variance everywhere, so borrow a scaler fitted
        // on a wider sample.
        let wide = dataset(3);
        let scaler = ScalerState::fit(&wide.feature_rows()).unwrap();
        let lone = Dataset::new(vec![wide.tracks()[0].clone()]).unwrap();
        let matrix = scaler.transform(&lone.feature_rows()).unwrap();
        let index = SimilarityIndex::build(&matrix);
        let rec = Recommender::with_index(lone, scaler, index).unwrap();

        let outcome = rec.recommend_by_track("Track_1", 5).unwrap();
        assert!(!outcome.is_not_found());
        assert!(outcome.recommendations().is_empty());
    }

    #[test]
    fn test_duplicate_of_seed_is_kept_and_seed_dropped() {
        // Rows 0 and 2 share identical features: both sit at distance zero
        // from each other, but only the seed itself is removed.
        let mut data: Vec<TrackRecord> = dataset(5).tracks().to_vec();
        data[2].features = data[0].features;
        let rec = Recommender::build(Dataset::new(data).unwrap()).unwrap();

        let outcome = rec.recommend_by_track("Track_3", 4).unwrap();
        let recs = outcome.recommendations();
        assert_eq!(outcome.seed(), Some(RowIndex::new(2)));
        assert_eq!(recs.len(), 4);
        assert_eq!(recs[0].row, RowIndex::new(0));
        assert_eq!(recs[0].distance, 0.0);
        assert!(recs.iter().all(|r| r.row != RowIndex::new(2)));
    }

    #[test]
    fn test_misaligned_index_is_rejected() {
        let data = dataset(5);
        let (matrix, scaler) = normalizer::fit(&dataset(6).feature_rows()).unwrap();
        let err =
            Recommender::with_index(data, scaler, SimilarityIndex::build(&matrix)).unwrap_err();
        assert!(matches!(
            err,
            SearchError::Misaligned {
                index_rows: 6,
                dataset_rows: 5
            }
        ));
    }

    #[test]
    fn test_recommender_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Recommender>();
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let rec = Recommender::build(dataset(4)).unwrap();
        let outcome = rec.recommend_by_track("track_2", 1).unwrap();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "found");
        assert_eq!(json["seed"], 1);
        assert_eq!(json["recommendations"][0]["rank"], 1);

        let missing = rec.recommend_by_track("x", 1).unwrap();
        let json = serde_json::to_value(&missing).unwrap();
        assert_eq!(json["status"], "not_found");
        assert_eq!(json["mode"], "track");
    }
}
