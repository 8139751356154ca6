//! Core domain model for timbre.
//!
//! This crate defines the track record and its audio feature vector, the
//! row-index identity shared by every downstream structure, and the loader
//! that turns a tabular dataset into an immutable, validated [`Dataset`].

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod dataset;
pub mod error;
pub mod model;

pub use dataset::Dataset;
pub use error::{Error, Result};
pub use model::{
    AudioFeatures, FeatureVector, RowIndex, TrackRecord, FEATURE_COLUMNS, FEATURE_COUNT,
};
