//! Feature standardization.
//!
//! Every feature column is shifted to zero mean and scaled to unit
//! (population) standard deviation, using statistics computed once over the
//! whole dataset. The fitted [`ScalerState`] is immutable; applying it to
//! more rows never refits.

use serde::{Deserialize, Serialize};
use timbre_core::{FeatureVector, RowIndex, FEATURE_COLUMNS, FEATURE_COUNT};

use crate::error::{SearchError, SearchResult};

/// Relative tolerance under which a column's standard deviation counts as
/// zero. Summing identical values does not always reproduce them exactly, so
/// a constant column can show a spurious deviation of a few ULPs.
const ZERO_VARIANCE_EPSILON: f64 = 10.0 * f64::EPSILON;

/// Per-column mean and standard deviation of a fitted scaler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerState {
    mean: FeatureVector,
    scale: FeatureVector,
    samples: usize,
}

impl ScalerState {
    /// Compute column statistics over `rows`.
    ///
    /// # Errors
    ///
    /// - [`SearchError::EmptyMatrix`] when `rows` is empty.
    /// - [`SearchError::NonFinite`] when any value is NaN or infinite.
    /// - [`SearchError::ZeroVariance`] when a column is constant.
    pub fn fit(rows: &[FeatureVector]) -> SearchResult<Self> {
        if rows.is_empty() {
            return Err(SearchError::EmptyMatrix);
        }
        check_finite(rows)?;

        let n = rows.len() as f64;
        let mut mean = [0.0; FEATURE_COUNT];
        for row in rows {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        let mut scale = [0.0; FEATURE_COUNT];
        for row in rows {
            for ((s, v), m) in scale.iter_mut().zip(row).zip(&mean) {
                let d = v - m;
                *s += d * d;
            }
        }
        for (col, (s, m)) in scale.iter_mut().zip(&mean).enumerate() {
            *s = (*s / n).sqrt();
            if *s <= ZERO_VARIANCE_EPSILON * m.abs().max(1.0) {
                return Err(SearchError::ZeroVariance {
                    column: FEATURE_COLUMNS[col],
                });
            }
        }

        log::debug!("Fitted scaler over {} rows: mean={mean:?} scale={scale:?}", rows.len());

        Ok(Self {
            mean,
            scale,
            samples: rows.len(),
        })
    }

    #[must_use]
    pub const fn mean(&self) -> &FeatureVector {
        &self.mean
    }

    /// Population standard deviation of each column.
    #[must_use]
    pub const fn scale(&self) -> &FeatureVector {
        &self.scale
    }

    /// Number of rows the scaler was fitted on.
    #[must_use]
    pub const fn samples(&self) -> usize {
        self.samples
    }

    /// Standardize a single vector.
    #[must_use]
    pub fn transform_one(&self, v: &FeatureVector) -> FeatureVector {
        let mut out = [0.0; FEATURE_COUNT];
        for (i, o) in out.iter_mut().enumerate() {
            *o = (v[i] - self.mean[i]) / self.scale[i];
        }
        out
    }

    /// Standardize every row without refitting.
    pub fn transform(&self, rows: &[FeatureVector]) -> SearchResult<FeatureMatrix> {
        check_finite(rows)?;
        Ok(FeatureMatrix {
            rows: rows.iter().map(|r| self.transform_one(r)).collect(),
        })
    }
}

/// Fit a scaler over `rows` and return the standardized matrix with it.
pub fn fit(rows: &[FeatureVector]) -> SearchResult<(FeatureMatrix, ScalerState)> {
    let scaler = ScalerState::fit(rows)?;
    let matrix = scaler.transform(rows)?;
    Ok((matrix, scaler))
}

fn check_finite(rows: &[FeatureVector]) -> SearchResult<()> {
    for (row, values) in rows.iter().enumerate() {
        if let Some(col) = values.iter().position(|v| !v.is_finite()) {
            return Err(SearchError::NonFinite {
                column: FEATURE_COLUMNS[col],
                row,
            });
        }
    }
    Ok(())
}

/// Standardized features, one row per track, aligned with the dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    rows: Vec<FeatureVector>,
}

impl FeatureMatrix {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn row(&self, row: RowIndex) -> Option<&FeatureVector> {
        self.rows.get(row.get())
    }

    #[must_use]
    pub fn rows(&self) -> &[FeatureVector] {
        &self.rows
    }
}
