//! Persisting a fitted scaler and index.
//!
//! An artifact is gzip-compressed JSON:
//!
//! ```text
//! { "version": 1, "built_at": "...", "scaler": { ... }, "index": { "points": [...] } }
//! ```
//!
//! Floats are written and read back exactly, so an artifact paired with the
//! dataset it was built from reproduces the rebuilt index bit for bit.

use chrono::{DateTime, Utc};
use flate2::read::{GzDecoder, GzEncoder};
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

use crate::error::{SearchError, SearchResult};
use crate::index::{NeighborSearch, SimilarityIndex};
use crate::normalizer::ScalerState;

/// Current artifact format version.
pub const ARTIFACT_VERSION: u32 = 1;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// A fitted scaler and the index built with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexArtifact {
    pub version: u32,
    pub built_at: DateTime<Utc>,
    pub scaler: ScalerState,
    pub index: SimilarityIndex,
}

impl IndexArtifact {
    #[must_use]
    pub fn new(index: SimilarityIndex, scaler: ScalerState) -> Self {
        Self {
            version: ARTIFACT_VERSION,
            built_at: Utc::now(),
            scaler,
            index,
        }
    }

    /// Number of indexed rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.index.len()
    }

    pub fn to_bytes(&self) -> SearchResult<Vec<u8>> {
        let json = serde_json::to_vec(self)?;
        let mut encoder = GzEncoder::new(json.as_slice(), Compression::default());
        let mut compressed = Vec::new();
        encoder.read_to_end(&mut compressed)?;
        Ok(compressed)
    }

    /// Decode an artifact, checking the format version and that the scaler
    /// and index agree on the row count.
    pub fn from_bytes(bytes: &[u8]) -> SearchResult<Self> {
        if !bytes.starts_with(&GZIP_MAGIC) {
            return Err(SearchError::Corrupt("missing gzip header".into()));
        }
        let mut decoder = GzDecoder::new(bytes);
        let mut json = Vec::new();
        decoder
            .read_to_end(&mut json)
            .map_err(|e| SearchError::Corrupt(format!("gzip stream: {e}")))?;

        let artifact: Self = serde_json::from_slice(&json)?;
        if artifact.version != ARTIFACT_VERSION {
            return Err(SearchError::UnsupportedVersion {
                found: artifact.version,
                expected: ARTIFACT_VERSION,
            });
        }
        if artifact.scaler.samples() != artifact.rows() {
            return Err(SearchError::Corrupt(format!(
                "scaler fitted on {} rows but index holds {}",
                artifact.scaler.samples(),
                artifact.rows()
            )));
        }
        Ok(artifact)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> SearchResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_bytes()?)?;
        log::info!("Saved index artifact ({} rows) to {}", self.rows(), path.display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> SearchResult<Self> {
        let path = path.as_ref();
        let artifact = Self::from_bytes(&std::fs::read(path)?)?;
        log::info!(
            "Loaded index artifact ({} rows, built {}) from {}",
            artifact.rows(),
            artifact.built_at,
            path.display()
        );
        Ok(artifact)
    }
}

/// Serialize an index and its scaler.
pub fn save(index: &SimilarityIndex, scaler: &ScalerState) -> SearchResult<Vec<u8>> {
    IndexArtifact::new(index.clone(), scaler.clone()).to_bytes()
}

/// Deserialize an index and its scaler.
pub fn load(bytes: &[u8]) -> SearchResult<(SimilarityIndex, ScalerState)> {
    let artifact = IndexArtifact::from_bytes(bytes)?;
    Ok((artifact.index, artifact.scaler))
}
