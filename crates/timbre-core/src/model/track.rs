use serde::{Deserialize, Serialize};

use crate::model::features::AudioFeatures;

/// A single track of the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub track_name: String,
    pub artist: String,
    pub genre: String,

    /// Raw audio features as read from the dataset.
    pub features: AudioFeatures,
}

impl TrackRecord {
    #[must_use]
    pub fn new(
        track_name: impl Into<String>,
        artist: impl Into<String>,
        genre: impl Into<String>,
        features: AudioFeatures,
    ) -> Self {
        Self {
            track_name: track_name.into(),
            artist: artist.into(),
            genre: genre.into(),
            features,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_new() {
        let track = TrackRecord::new("Track_1", "Artist_17", "Pop", AudioFeatures::default());
        assert_eq!(track.track_name, "Track_1");
        assert_eq!(track.artist, "Artist_17");
        assert_eq!(track.genre, "Pop");
    }
}
