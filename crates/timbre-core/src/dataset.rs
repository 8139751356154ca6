//! Loading and validating the track dataset.
//!
//! The dataset is a CSV file with a header row. The `track_name`, `artist`
//! and `genre` columns plus the nine [`FEATURE_COLUMNS`] are required; any
//! other columns are ignored and column order does not matter. Header names
//! are trimmed; cell text is kept exactly as written. A dataset is
//! loaded once and never mutated afterwards.

use csv::StringRecord;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{
    AudioFeatures, FeatureVector, RowIndex, TrackRecord, FEATURE_COLUMNS, FEATURE_COUNT,
};

const TRACK_NAME: &str = "track_name";
const ARTIST: &str = "artist";
const GENRE: &str = "genre";

/// An immutable, non-empty catalog of tracks addressed by [`RowIndex`].
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    tracks: Vec<TrackRecord>,
}

impl Dataset {
    /// Wrap already-parsed tracks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyDataset`] for an empty list and
    /// [`Error::InvalidData`] when a track carries a non-finite feature.
    pub fn new(tracks: Vec<TrackRecord>) -> Result<Self> {
        if tracks.is_empty() {
            return Err(Error::EmptyDataset);
        }
        if let Some(row) = tracks.iter().position(|t| !t.features.is_finite()) {
            return Err(Error::InvalidData(format!(
                "track {:?} at row {row} has non-finite features",
                tracks[row].track_name
            )));
        }
        Ok(Self { tracks })
    }

    /// Load a dataset from a CSV file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let dataset = Self::from_reader(file)?;
        log::info!("Loaded {} tracks from {}", dataset.len(), path.display());
        Ok(dataset)
    }

    /// Parse a dataset from any CSV source.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let columns = ColumnMap::from_headers(reader.headers()?)?;

        let mut tracks = Vec::new();
        for record in reader.records() {
            tracks.push(columns.parse(&record?)?);
        }

        Self::new(tracks)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    #[must_use]
    pub fn get(&self, row: RowIndex) -> Option<&TrackRecord> {
        self.tracks.get(row.get())
    }

    #[must_use]
    pub fn tracks(&self) -> &[TrackRecord] {
        &self.tracks
    }

    /// Iterate over tracks together with their row index, in row order.
    pub fn iter(&self) -> impl Iterator<Item = (RowIndex, &TrackRecord)> {
        self.tracks
            .iter()
            .enumerate()
            .map(|(i, track)| (RowIndex::new(i), track))
    }

    /// Raw feature vectors, one per row, in row order.
    #[must_use]
    pub fn feature_rows(&self) -> Vec<FeatureVector> {
        self.tracks.iter().map(|t| t.features.to_vector()).collect()
    }

    /// Number of distinct artists, compared case-insensitively.
    #[must_use]
    pub fn artist_count(&self) -> usize {
        distinct_lowercase(self.tracks.iter().map(|t| t.artist.as_str()))
    }

    /// Number of distinct genres, compared case-insensitively.
    #[must_use]
    pub fn genre_count(&self) -> usize {
        distinct_lowercase(self.tracks.iter().map(|t| t.genre.as_str()))
    }
}

fn distinct_lowercase<'a>(values: impl Iterator<Item = &'a str>) -> usize {
    values.map(str::to_lowercase).collect::<HashSet<_>>().len()
}

/// Positions of the required columns in the header row.
#[derive(Debug)]
struct ColumnMap {
    track_name: usize,
    artist: usize,
    genre: usize,
    features: [usize; FEATURE_COUNT],
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let mut missing = Vec::new();
        let mut locate = |name: &str| match headers.iter().position(|h| h == name) {
            Some(pos) => pos,
            None => {
                missing.push(name.to_string());
                0
            }
        };

        let track_name = locate(TRACK_NAME);
        let artist = locate(ARTIST);
        let genre = locate(GENRE);
        let mut features = [0; FEATURE_COUNT];
        for (slot, name) in features.iter_mut().zip(FEATURE_COLUMNS) {
            *slot = locate(name);
        }

        if !missing.is_empty() {
            return Err(Error::MissingColumns { columns: missing });
        }

        Ok(Self {
            track_name,
            artist,
            genre,
            features,
        })
    }

    fn parse(&self, record: &StringRecord) -> Result<TrackRecord> {
        let line = record.position().map_or(0, |p| p.line());
        let text = |pos: usize| record.get(pos).unwrap_or_default().to_string();

        let mut vector = [0.0; FEATURE_COUNT];
        for ((value, &pos), column) in vector.iter_mut().zip(&self.features).zip(FEATURE_COLUMNS) {
            let raw = record.get(pos).unwrap_or_default();
            *value = raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| Error::InvalidValue {
                    line,
                    column,
                    value: raw.to_string(),
                })?;
        }

        Ok(TrackRecord::new(
            text(self.track_name),
            text(self.artist),
            text(self.genre),
            AudioFeatures::from_vector(vector),
        ))
    }
}
