use serde::{Deserialize, Serialize};

/// Number of audio features per track.
pub const FEATURE_COUNT: usize = 9;

/// Dataset column names of the audio features, in vector order.
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "danceability",
    "energy",
    "loudness",
    "speechiness",
    "acousticness",
    "instrumentalness",
    "liveness",
    "valence",
    "tempo",
];

/// A point in feature space, ordered as [`FEATURE_COLUMNS`].
pub type FeatureVector = [f64; FEATURE_COUNT];

/// The raw (unscaled) audio features of a track.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub danceability: f64,
    pub energy: f64,
    /// Loudness in dB, usually negative.
    pub loudness: f64,
    pub speechiness: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub valence: f64,
    /// Tempo in beats per minute.
    pub tempo: f64,
}

impl AudioFeatures {
    /// Build features from a vector ordered as [`FEATURE_COLUMNS`].
    #[must_use]
    pub const fn from_vector(v: FeatureVector) -> Self {
        Self {
            danceability: v[0],
            energy: v[1],
            loudness: v[2],
            speechiness: v[3],
            acousticness: v[4],
            instrumentalness: v[5],
            liveness: v[6],
            valence: v[7],
            tempo: v[8],
        }
    }

    #[must_use]
    pub const fn to_vector(&self) -> FeatureVector {
        [
            self.danceability,
            self.energy,
            self.loudness,
            self.speechiness,
            self.acousticness,
            self.instrumentalness,
            self.liveness,
            self.valence,
            self.tempo,
        ]
    }

    /// Returns `true` when every feature is a finite number.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.to_vector().iter().all(|v| v.is_finite())
    }
}

impl From<FeatureVector> for AudioFeatures {
    fn from(v: FeatureVector) -> Self {
        Self::from_vector(v)
    }
}
