use crate::error::{KestrelError, Result};
use kestrel_ta::{FeatureMatrix, indicator};
use serde::{Deserialize, Serialize};

/// Per-feature standardisation parameters, serialised as
/// `{"mean": [..], "std": [..], "features": [..]}`.
///
/// A zero (or non-finite) standard deviation is stored as `1.0`, so constant features are only
/// centred.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScalerParams {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
    pub features: Vec<String>,
}

impl ScalerParams {
    /// Fit mean and population standard deviation of every [`FeatureMatrix`] column.
    pub fn fit(matrix: &FeatureMatrix) -> Result<Self> {
        Self::fit_rows(matrix.feature_names().to_vec(), matrix.values())
    }

    /// Fit over row-major `values` with one column per name in `features`.
    pub fn fit_rows(features: Vec<String>, values: &[f64]) -> Result<Self> {
        let width = features.len();
        if width == 0 {
            return Err(KestrelError::InvalidScaler("no features".to_string()));
        }
        if values.is_empty() || values.len() % width != 0 {
            return Err(KestrelError::InsufficientData {
                available: values.len() / width,
                required: 1,
            });
        }

        let (mean, std): (Vec<f64>, Vec<f64>) = (0..width)
            .map(|column| {
                let column = values
                    .iter()
                    .skip(column)
                    .step_by(width)
                    .copied()
                    .collect::<Vec<_>>();
                let std = indicator::std_dev(&column);
                let std = if std == 0.0 || !std.is_finite() { 1.0 } else { std };
                (indicator::mean(&column), std)
            })
            .unzip();

        Ok(Self {
            mean,
            std,
            features,
        })
    }

    /// Deserialise and validate [`ScalerParams`] from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let params = serde_json::from_str::<Self>(json)?;
        params.validate()?;
        Ok(params)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.features.is_empty() {
            return Err(KestrelError::InvalidScaler("no features".to_string()));
        }
        if self.mean.len() != self.features.len() || self.std.len() != self.features.len() {
            return Err(KestrelError::InvalidScaler(format!(
                "{} features with {} means and {} deviations",
                self.features.len(),
                self.mean.len(),
                self.std.len()
            )));
        }
        if self.mean.iter().any(|mean| !mean.is_finite()) {
            return Err(KestrelError::InvalidScaler("non-finite mean".to_string()));
        }
        if self.std.iter().any(|std| !std.is_finite() || *std <= 0.0) {
            return Err(KestrelError::InvalidScaler(
                "deviations must be finite and positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Ensure these parameters were fitted on exactly `features`, in order.
    pub fn check_features<S>(&self, features: &[S]) -> Result<()>
    where
        S: AsRef<str>,
    {
        let matches = self.features.len() == features.len()
            && self
                .features
                .iter()
                .zip(features)
                .all(|(expected, found)| expected == found.as_ref());

        if matches {
            Ok(())
        } else {
            Err(KestrelError::FeatureMismatch {
                expected: self.features.clone(),
                found: features.iter().map(|name| name.as_ref().to_string()).collect(),
            })
        }
    }

    /// Standardise a single `value` of feature `column`.
    pub fn scale(&self, column: usize, value: f64) -> f64 {
        match (self.mean.get(column), self.std.get(column)) {
            (Some(mean), Some(std)) => (value - mean) / std,
            _ => value,
        }
    }

    /// Standardise every [`FeatureMatrix`] column, rejecting a matrix with different features.
    pub fn transform(&self, matrix: &FeatureMatrix) -> Result<FeatureMatrix> {
        self.check_features(matrix.feature_names())?;
        Ok(matrix.map_columns(|column, value| self.scale(column, value)))
    }

    /// Standardise row-major `values` in place.
    pub fn transform_rows(&self, values: &mut [f64]) {
        let width = self.features.len().max(1);
        values
            .iter_mut()
            .enumerate()
            .for_each(|(index, value)| *value = self.scale(index % width, *value));
    }
}
