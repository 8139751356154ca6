pub mod features;
pub mod ids;
pub mod track;

pub use features::{AudioFeatures, FeatureVector, FEATURE_COLUMNS, FEATURE_COUNT};
pub use ids::RowIndex;
pub use track::TrackRecord;
