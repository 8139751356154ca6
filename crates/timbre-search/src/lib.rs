//! Similarity search for timbre.
//!
//! Standardizes the audio features of a [`Dataset`](timbre_core::Dataset),
//! builds an exact Euclidean nearest-neighbor index over them, resolves
//! track/artist/genre names to representative rows, and turns index
//! queries into ordered recommendations.
//!
//! The fitted state is held by an immutable [`Recommender`] that is built
//! once and then shared by reference across queries.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod engine;
pub mod error;
pub mod index;
pub mod normalizer;
pub mod persistence;
pub mod resolver;

pub use engine::{
    RecommendOutcome, Recommendation, Recommender, DEFAULT_RECOMMENDATIONS, MAX_RECOMMENDATIONS,
};
pub use error::{SearchError, SearchResult};
pub use index::{euclidean_distance, Neighbor, NeighborSearch, SimilarityIndex};
pub use normalizer::{FeatureMatrix, ScalerState};
pub use persistence::{IndexArtifact, ARTIFACT_VERSION};
pub use resolver::{EntityResolver, QueryMode};
