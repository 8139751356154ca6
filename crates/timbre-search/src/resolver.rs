//! Resolving user-supplied names to a representative dataset row.
//!
//! Names are compared case-insensitively and must otherwise match exactly.
//! When several rows share a name (an artist with many tracks, a genre, or a
//! duplicated track title) the row with the lowest index wins. Ambiguous
//! track titles therefore always resolve to the same, first, recording.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use timbre_core::{Dataset, RowIndex, TrackRecord};

/// Which track attribute a lookup key is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    Track,
    Artist,
    Genre,
}

impl QueryMode {
    pub const ALL: [Self; 3] = [Self::Track, Self::Artist, Self::Genre];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Track => "track",
            Self::Artist => "artist",
            Self::Genre => "genre",
        }
    }

    /// The attribute of `track` this mode matches on.
    #[must_use]
    pub fn key_of(self, track: &TrackRecord) -> &str {
        match self {
            Self::Track => &track.track_name,
            Self::Artist => &track.artist,
            Self::Genre => &track.genre,
        }
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "track" => Ok(Self::Track),
            "artist" => Ok(Self::Artist),
            "genre" => Ok(Self::Genre),
            other => Err(format!("unknown query mode: {other}")),
        }
    }
}

/// Case-insensitive name → first-row lookup tables, one per [`QueryMode`].
#[derive(Debug, Clone, Default)]
pub struct EntityResolver {
    tracks: HashMap<String, RowIndex>,
    artists: HashMap<String, RowIndex>,
    genres: HashMap<String, RowIndex>,
}

impl EntityResolver {
    #[must_use]
    pub fn new(dataset: &Dataset) -> Self {
        let mut resolver = Self::default();
        // Rows are visited in ascending order, so the first insert per key
        // is the first match.
        for (row, track) in dataset.iter() {
            for mode in QueryMode::ALL {
                resolver
                    .table_mut(mode)
                    .entry(mode.key_of(track).to_lowercase())
                    .or_insert(row);
            }
        }
        log::debug!(
            "Resolver tables: {} tracks, {} artists, {} genres",
            resolver.tracks.len(),
            resolver.artists.len(),
            resolver.genres.len()
        );
        resolver
    }

    /// The first row whose `mode` attribute equals `name`, ignoring case.
    #[must_use]
    pub fn resolve(&self, mode: QueryMode, name: &str) -> Option<RowIndex> {
        self.table(mode).get(&name.to_lowercase()).copied()
    }

    #[must_use]
    pub fn resolve_by_track(&self, name: &str) -> Option<RowIndex> {
        self.resolve(QueryMode::Track, name)
    }

    #[must_use]
    pub fn resolve_by_artist(&self, name: &str) -> Option<RowIndex> {
        self.resolve(QueryMode::Artist, name)
    }

    #[must_use]
    pub fn resolve_by_genre(&self, name: &str) -> Option<RowIndex> {
        self.resolve(QueryMode::Genre, name)
    }

    /// Number of distinct (case-folded) names known for `mode`.
    #[must_use]
    pub fn distinct(&self, mode: QueryMode) -> usize {
        self.table(mode).len()
    }

    fn table(&self, mode: QueryMode) -> &HashMap<String, RowIndex> {
        match mode {
            QueryMode::Track => &self.tracks,
            QueryMode::Artist => &self.artists,
            QueryMode::Genre => &self.genres,
        }
    }

    fn table_mut(&mut self, mode: QueryMode) -> &mut HashMap<String, RowIndex> {
        match mode {
            QueryMode::Track => &mut self.tracks,
            QueryMode::Artist => &mut self.artists,
            QueryMode::Genre => &mut self.genres,
        }
    }
}
