use derive_more::Display;
use kestrel_ta::error::{ConfigError, InputError};
use smol_str::SmolStr;
use thiserror::Error;

/// Artifact a model-driven strategy requires for an asset.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Display)]
pub enum ArtifactKind {
    #[display("model")]
    Model,
    #[display("scaler")]
    Scaler,
}

/// All errors generated in the Kestrel pipeline.
#[derive(Debug, Error)]
pub enum KestrelError {
    #[error("InvalidInput: {0}")]
    InvalidInput(#[from] InputError),

    #[error("Config: {0}")]
    Config(#[from] ConfigError),

    #[error("InsufficientData: {available} available, {required} required")]
    InsufficientData { available: usize, required: usize },

    #[error("InvalidPrice: close {price} at series index {index} cannot anchor a return")]
    InvalidPrice { index: usize, price: f64 },

    #[error("MissingArtifact: no {artifact} for asset {asset}")]
    MissingArtifact {
        asset: SmolStr,
        artifact: ArtifactKind,
    },

    #[error("FeatureMismatch: expected {expected:?}, found {found:?}")]
    FeatureMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error(
        "MatrixMismatch: series of {series_len} candles does not match matrix of {matrix_len} rows after warmup {warmup}"
    )]
    MatrixMismatch {
        series_len: usize,
        matrix_len: usize,
        warmup: usize,
    },

    #[error("InvalidScaler: {0}")]
    InvalidScaler(String),

    #[error("PredictionCount: strategy {strategy} produced {actual} predictions, expected {expected}")]
    PredictionCount {
        strategy: SmolStr,
        expected: usize,
        actual: usize,
    },

    #[error("DuplicateMetrics: asset {asset} strategy {strategy} evaluated more than once")]
    DuplicateMetrics { asset: SmolStr, strategy: SmolStr },

    #[error("Serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl KestrelError {
    /// Determines if the error is non-fatal for a single (asset, strategy) pair within a batch.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::MissingArtifact { .. })
    }
}

pub type Result<T> = std::result::Result<T, KestrelError>;
