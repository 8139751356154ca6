//! End-to-end tests: CSV on disk → recommender → queries, including the
//! persisted-index path.

use std::io::Write;
use tempfile::{NamedTempFile, TempDir};
use timbre_core::{Dataset, RowIndex};
use timbre_search::{
    IndexArtifact, NeighborSearch, QueryMode, Recommender, SearchError, MAX_RECOMMENDATIONS,
};

const HEADER: &str = "track_name,artist,genre,danceability,energy,loudness,speechiness,acousticness,instrumentalness,liveness,valence,tempo";
const GENRES: [&str; 4] = ["Pop", "Rock", "Jazz", "Hip-Hop"];

/// Deterministic pseudo-random catalog in the shape of the synthetic
/// Spotify export.
fn catalog_csv(rows: usize, seed: u64) -> String {
    let mut state = seed;
    let mut next = move || {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (state >> 11) as f64 / (1u64 << 53) as f64
    };

    let mut out = String::from(HEADER);
    for i in 0..rows {
        out.push_str(&format!(
            "\nTrack_{},Artist_{},{},{:.3},{:.3},{:.2},{:.3},{:.3},{:.3},{:.3},{:.3},{:.1}",
            i + 1,
            i % 7,
            GENRES[i % GENRES.len()],
            next(),
            next(),
            -60.0 * next(),
            next(),
            next(),
            next(),
            next(),
            next(),
            60.0 + 140.0 * next(),
        ));
    }
    out
}

fn write_csv(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn recommender(rows: usize) -> Recommender {
    let file = write_csv(&catalog_csv(rows, 17));
    Recommender::build(Dataset::load(file.path()).unwrap()).unwrap()
}

#[test]
fn test_every_track_query_respects_invariants() {
    let rec = recommender(25);
    let size = rec.dataset().len();

    for (row, track) in rec.dataset().iter() {
        for n in [1, 5, MAX_RECOMMENDATIONS] {
            let outcome = rec.recommend(QueryMode::Track, &track.track_name, n).unwrap();
            assert_eq!(outcome.seed(), Some(row));

            let recs = outcome.recommendations();
            assert_eq!(recs.len(), n.min(size - 1));
            assert!(recs.iter().all(|r| r.row != row));
            for pair in recs.windows(2) {
                assert!(pair[0].distance <= pair[1].distance);
                if pair[0].distance == pair[1].distance {
                    assert!(pair[0].row < pair[1].row);
                }
            }
        }
    }
}

#[test]
fn test_distances_match_index_geometry() {
    let rec = recommender(12);
    let outcome = rec.recommend_by_artist("artist_2", 5).unwrap();
    let seed = outcome.seed().unwrap();
    for r in outcome.recommendations() {
        assert_eq!(rec.index().distance(seed, r.row), Some(r.distance));
        assert_eq!(rec.index().distance(r.row, seed), Some(r.distance));
    }
}

#[test]
fn test_repeated_queries_are_identical() {
    let rec = recommender(30);
    let first = rec.recommend_by_genre("JAZZ", 8).unwrap();
    let second = rec.recommend_by_genre("JAZZ", 8).unwrap();
    assert_eq!(first, second);

    let bits = |o: &timbre_search::RecommendOutcome<'_>| {
        o.recommendations()
            .iter()
            .map(|r| (r.row, r.distance.to_bits()))
            .collect::<Vec<_>>()
    };
    assert_eq!(bits(&first), bits(&second));
}

#[test]
fn test_artist_and_genre_resolve_to_first_row() {
    let rec = recommender(20);
    assert_eq!(
        rec.recommend_by_artist("Artist_3", 3).unwrap().seed(),
        Some(RowIndex::new(3))
    );
    assert_eq!(
        rec.recommend_by_genre("rock", 3).unwrap().seed(),
        Some(RowIndex::new(1))
    );
    assert_eq!(
        rec.resolver().resolve_by_artist("Artist_17"),
        rec.resolver().resolve_by_artist("artist_17")
    );
}

#[test]
fn test_unknown_keys_and_bad_counts() {
    let rec = recommender(10);
    assert!(rec
        .recommend_by_artist("Unknown_Artist_999", 5)
        .unwrap()
        .is_not_found());

    let err = rec.recommend_by_genre("Pop", 0).unwrap_err();
    assert!(matches!(err, SearchError::InvalidCount { requested: 0, .. }));
}

#[test]
fn test_persisted_index_gives_same_answers() {
    let csv = catalog_csv(40, 99);
    let file = write_csv(&csv);
    let dir = TempDir::new().unwrap();
    let artifact_path = dir.path().join("index.json.gz");

    let built = Recommender::build(Dataset::load(file.path()).unwrap()).unwrap();
    built.to_artifact().save(&artifact_path).unwrap();

    let artifact = IndexArtifact::load(&artifact_path).unwrap();
    assert_eq!(artifact.rows(), 40);
    let loaded = Recommender::from_artifact(Dataset::load(file.path()).unwrap(), artifact).unwrap();

    assert_eq!(loaded.index().len(), built.index().len());
    assert_eq!(loaded.scaler(), built.scaler());
    for name in ["Track_1", "Track_20", "track_40"] {
        assert_eq!(
            loaded.recommend_by_track(name, 10).unwrap(),
            built.recommend_by_track(name, 10).unwrap()
        );
    }
}

#[test]
fn test_artifact_from_other_dataset_is_rejected() {
    let original =
        Recommender::build(Dataset::from_reader(catalog_csv(15, 1).as_bytes()).unwrap()).unwrap();
    let artifact = original.to_artifact();

    let other = Dataset::from_reader(catalog_csv(15, 2).as_bytes()).unwrap();
    let err = Recommender::from_artifact(other, artifact.clone()).unwrap_err();
    assert!(matches!(err, SearchError::StaleArtifact { .. }));

    let shorter = Dataset::from_reader(catalog_csv(14, 1).as_bytes()).unwrap();
    let err = Recommender::from_artifact(shorter, artifact).unwrap_err();
    assert!(matches!(err, SearchError::Misaligned { .. }));
}

#[test]
fn test_constant_feature_column_fails_startup() {
    let csv = format!(
        "{HEADER}\nA,X,Pop,0.5,0.1,-5,0.1,0.2,0.3,0.4,0.5,120\nB,Y,Pop,0.6,0.2,-6,0.2,0.3,0.4,0.5,0.6,120"
    );
    let dataset = Dataset::from_reader(csv.as_bytes()).unwrap();
    let err = Recommender::build(dataset).unwrap_err();
    assert!(matches!(err, SearchError::ZeroVariance { column: "tempo" }));
    assert!(err.is_fatal());
}
