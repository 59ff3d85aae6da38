use crate::{
    dataset::scaler::ScalerParams,
    error::{ArtifactKind, KestrelError, Result},
    evaluation::{Direction, Prediction},
};
use derive_more::Constructor;
use fnv::FnvHashMap;
use kestrel_ta::{CandleSeries, indicator::mean};
use smol_str::SmolStr;
use std::ops::Range;
use thiserror::Error;
use tracing::warn;

/// Ordered input features of a [`SequenceModel`] window row.
pub const MODEL_FEATURES: [&str; 2] = ["close", "volume"];

/// Produces one directional [`Prediction`] per candle index: the expected direction from
/// `close[i]` to `close[i + 1]`, using only candles before `i + 1`.
pub trait DirectionalStrategy {
    /// Unique name used to group [`Metrics`](super::metrics::Metrics) across assets.
    fn name(&self) -> &str;

    /// Smallest candle index a prediction can be made for.
    fn min_history(&self) -> usize;

    /// Predict every index in `indices` for `asset`.
    ///
    /// Returns exactly `indices.len()` predictions.
    fn predict(
        &self,
        asset: &str,
        series: &CandleSeries,
        indices: Range<usize>,
    ) -> Result<Vec<Prediction>>;
}

fn check_indices(series: &CandleSeries, indices: &Range<usize>, min_history: usize) -> Result<()> {
    if indices.start < min_history {
        return Err(KestrelError::InsufficientData {
            available: indices.start,
            required: min_history,
        });
    }
    if indices.end > series.len() {
        return Err(KestrelError::InsufficientData {
            available: series.len(),
            required: indices.end,
        });
    }
    Ok(())
}

/// Always predicts [`Prediction::Up`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct BuyAndHold;

impl BuyAndHold {
    pub const NAME: &'static str = "buy_and_hold";
}

impl DirectionalStrategy for BuyAndHold {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn min_history(&self) -> usize {
        0
    }

    fn predict(
        &self,
        _: &str,
        series: &CandleSeries,
        indices: Range<usize>,
    ) -> Result<Vec<Prediction>> {
        check_indices(series, &indices, self.min_history())?;
        Ok(indices.map(|_| Prediction::Up).collect())
    }
}

/// Predicts `Up` when the mean of the `fast` closes before `i` exceeds the mean of the `slow`
/// closes before `i`, otherwise `Down`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Constructor)]
pub struct SmaMomentum {
    pub fast: usize,
    pub slow: usize,
}

impl Default for SmaMomentum {
    fn default() -> Self {
        Self { fast: 5, slow: 20 }
    }
}

impl SmaMomentum {
    pub const NAME: &'static str = "sma_momentum";
}

impl DirectionalStrategy for SmaMomentum {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn min_history(&self) -> usize {
        self.fast.max(self.slow)
    }

    fn predict(
        &self,
        _: &str,
        series: &CandleSeries,
        indices: Range<usize>,
    ) -> Result<Vec<Prediction>> {
        check_indices(series, &indices, self.min_history())?;
        let closes = series.closes();

        Ok(indices
            .map(|i| {
                let fast = mean(&closes[i - self.fast..i]);
                let slow = mean(&closes[i - self.slow..i]);
                if fast > slow {
                    Prediction::Up
                } else {
                    Prediction::Down
                }
            })
            .collect())
    }
}

/// Inference failure of a [`SequenceModel`].
#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("model inference failed: {0}")]
pub struct ModelError(pub String);

/// Externally trained sequence regressor.
pub trait SequenceModel {
    /// Predict the next scaled close from `window`: row-major rows of scaled
    /// [`MODEL_FEATURES`], oldest first.
    fn predict(&self, window: &[f64]) -> std::result::Result<f64, ModelError>;
}

impl<F> SequenceModel for F
where
    F: Fn(&[f64]) -> std::result::Result<f64, ModelError>,
{
    fn predict(&self, window: &[f64]) -> std::result::Result<f64, ModelError> {
        self(window)
    }
}

/// Per-asset model and scaler lookup.
pub trait ModelRepository {
    type Model: SequenceModel;

    fn model(&self, asset: &str) -> Option<&Self::Model>;

    fn scaler(&self, asset: &str) -> Option<&ScalerParams>;
}

/// [`ModelRepository`] holding already loaded artifacts.
#[derive(Debug, Clone)]
pub struct InMemoryModelRepository<Model> {
    models: FnvHashMap<SmolStr, Model>,
    scalers: FnvHashMap<SmolStr, ScalerParams>,
}

impl<Model> Default for InMemoryModelRepository<Model> {
    fn default() -> Self {
        Self {
            models: FnvHashMap::default(),
            scalers: FnvHashMap::default(),
        }
    }
}

impl<Model> InMemoryModelRepository<Model> {
    pub fn with_model<Asset>(mut self, asset: Asset, model: Model) -> Self
    where
        Asset: Into<SmolStr>,
    {
        self.models.insert(asset.into(), model);
        self
    }

    pub fn with_scaler<Asset>(mut self, asset: Asset, scaler: ScalerParams) -> Self
    where
        Asset: Into<SmolStr>,
    {
        self.scalers.insert(asset.into(), scaler);
        self
    }
}

impl<Model> ModelRepository for InMemoryModelRepository<Model>
where
    Model: SequenceModel,
{
    type Model = Model;

    fn model(&self, asset: &str) -> Option<&Self::Model> {
        self.models.get(asset)
    }

    fn scaler(&self, asset: &str) -> Option<&ScalerParams> {
        self.scalers.get(asset)
    }
}

/// Drives an asset's [`SequenceModel`] over trailing windows of scaled [`MODEL_FEATURES`].
///
/// The window for index `i` holds candles `[i - sequence_length, i)`. The prediction is `Up` if
/// the predicted scaled close exceeds the scaled close at `i`. A failed or non-finite inference
/// yields [`Prediction::Abstain`].
#[derive(Debug, Clone, Constructor)]
pub struct ModelStrategy<Repository> {
    pub repository: Repository,
    pub sequence_length: usize,
}

impl<Repository> ModelStrategy<Repository> {
    pub const NAME: &'static str = "ai_model";
}

impl<Repository> DirectionalStrategy for ModelStrategy<Repository>
where
    Repository: ModelRepository,
{
    fn name(&self) -> &str {
        Self::NAME
    }

    fn min_history(&self) -> usize {
        self.sequence_length
    }

    fn predict(
        &self,
        asset: &str,
        series: &CandleSeries,
        indices: Range<usize>,
    ) -> Result<Vec<Prediction>> {
        let model = self
            .repository
            .model(asset)
            .ok_or_else(|| KestrelError::MissingArtifact {
                asset: asset.into(),
                artifact: ArtifactKind::Model,
            })?;
        let scaler = self
            .repository
            .scaler(asset)
            .ok_or_else(|| KestrelError::MissingArtifact {
                asset: asset.into(),
                artifact: ArtifactKind::Scaler,
            })?;
        scaler.validate()?;
        scaler.check_features(&MODEL_FEATURES)?;
        check_indices(series, &indices, self.min_history())?;

        let width = MODEL_FEATURES.len();
        let mut scaled = series
            .candles()
            .iter()
            .flat_map(|candle| [candle.close, candle.volume])
            .collect::<Vec<_>>();
        scaler.transform_rows(&mut scaled);

        Ok(indices
            .map(|i| {
                let window = &scaled[(i - self.sequence_length) * width..i * width];
                let current = scaled[i * width];

                match model.predict(window) {
                    Ok(predicted) if predicted.is_finite() => {
                        Prediction::from(Direction::between(current, predicted))
                    }
                    Ok(predicted) => {
                        warn!(%asset, index = i, predicted, "non-finite model output, abstaining");
                        Prediction::Abstain
                    }
                    Err(error) => {
                        warn!(%asset, index = i, %error, "abstaining");
                        Prediction::Abstain
                    }
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_ta::synthetic;

    type ModelFn = fn(&[f64]) -> std::result::Result<f64, ModelError>;

    fn scaler() -> ScalerParams {
        ScalerParams {
            mean: vec![100.0, 1_000.0],
            std: vec![10.0, 100.0],
            features: MODEL_FEATURES.iter().map(|name| name.to_string()).collect(),
        }
    }

    // Predicts the latest scaled close in the window plus a fixed offset
    fn last_close_plus(offset: f64) -> impl Fn(&[f64]) -> std::result::Result<f64, ModelError> {
        move |window: &[f64]| Ok(window[window.len() - 2] + offset)
    }

    #[test]
    fn test_buy_and_hold() {
        let series = synthetic::constant(50, 1.0).unwrap();
        let predictions = BuyAndHold.predict("btc", &series, 30..49).unwrap();
        assert_eq!(predictions.len(), 19);
        assert!(predictions.iter().all(|prediction| *prediction == Prediction::Up));
    }

    #[test]
    fn test_sma_momentum() {
        struct TestCase {
            series: CandleSeries,
            expected: Prediction,
        }

        let cases = vec![
            // TC0: rising closes
            TestCase {
                series: synthetic::linear(60, 10.0, 70.0).unwrap(),
                expected: Prediction::Up,
            },
            // TC1: falling closes
            TestCase {
                series: synthetic::linear(60, 70.0, 10.0).unwrap(),
                expected: Prediction::Down,
            },
            // TC2: flat closes tie to Down
            TestCase {
                series: synthetic::constant(60, 10.0).unwrap(),
                expected: Prediction::Down,
            },
        ];

        for (index, test) in cases.into_iter().enumerate() {
            let predictions = SmaMomentum::default()
                .predict("btc", &test.series, 30..59)
                .unwrap();
            assert_eq!(predictions.len(), 29, "TC{index} failed");
            assert!(
                predictions.iter().all(|prediction| *prediction == test.expected),
                "TC{index} failed"
            );
        }
    }

    #[test]
    fn test_sma_momentum_requires_history() {
        let series = synthetic::constant(60, 10.0).unwrap();
        assert!(matches!(
            SmaMomentum::default().predict("btc", &series, 10..59),
            Err(KestrelError::InsufficientData {
                available: 10,
                required: 20
            })
        ));
        assert!(matches!(
            SmaMomentum::default().predict("btc", &series, 30..61),
            Err(KestrelError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_model_strategy() {
        let series = synthetic::linear(40, 100.0, 139.0).unwrap();

        let bullish = ModelStrategy::new(
            InMemoryModelRepository::default()
                .with_model("btc", last_close_plus(1.0))
                .with_scaler("btc", scaler()),
            30,
        );
        let predictions = bullish.predict("btc", &series, 30..39).unwrap();
        assert_eq!(predictions.len(), 9);
        // Scaled close steps by 0.1 per candle, previous close + 1.0 is above the current
        assert!(predictions.iter().all(|prediction| *prediction == Prediction::Up));

        let bearish = ModelStrategy::new(
            InMemoryModelRepository::default()
                .with_model("btc", last_close_plus(0.0))
                .with_scaler("btc", scaler()),
            30,
        );
        let predictions = bearish.predict("btc", &series, 30..39).unwrap();
        assert!(predictions.iter().all(|prediction| *prediction == Prediction::Down));
    }

    #[test]
    fn test_model_failure_abstains() {
        let series = synthetic::linear(40, 100.0, 139.0).unwrap();
        let failing: ModelFn = |_| Err(ModelError("session closed".to_string()));
        let non_finite: ModelFn = |_| Ok(f64::NAN);

        for model in [failing, non_finite] {
            let strategy = ModelStrategy::new(
                InMemoryModelRepository::default()
                    .with_model("btc", model)
                    .with_scaler("btc", scaler()),
                30,
            );
            let predictions = strategy.predict("btc", &series, 30..39).unwrap();
            assert!(
                predictions
                    .iter()
                    .all(|prediction| *prediction == Prediction::Abstain)
            );
        }
    }

    #[test]
    fn test_model_missing_artifacts() {
        let series = synthetic::linear(40, 100.0, 139.0).unwrap();

        let no_model = ModelStrategy::new(
            InMemoryModelRepository::<ModelFn>::default().with_scaler("btc", scaler()),
            30,
        );
        assert!(matches!(
            no_model.predict("btc", &series, 30..39),
            Err(KestrelError::MissingArtifact {
                artifact: ArtifactKind::Model,
                ..
            })
        ));

        let no_scaler = ModelStrategy::new(
            InMemoryModelRepository::default().with_model("btc", last_close_plus(0.0)),
            30,
        );
        let error = no_scaler.predict("btc", &series, 30..39).unwrap_err();
        assert!(error.is_skippable());
        assert!(matches!(
            error,
            KestrelError::MissingArtifact {
                artifact: ArtifactKind::Scaler,
                ..
            }
        ));
    }

    #[test]
    fn test_model_rejects_foreign_scaler() {
        let series = synthetic::linear(40, 100.0, 139.0).unwrap();
        let scaler = ScalerParams {
            features: vec!["close".to_string(), "rsi_14".to_string()],
            ..scaler()
        };

        let strategy = ModelStrategy::new(
            InMemoryModelRepository::default()
                .with_model("btc", last_close_plus(0.0))
                .with_scaler("btc", scaler),
            30,
        );
        assert!(matches!(
            strategy.predict("btc", &series, 30..39),
            Err(KestrelError::FeatureMismatch { .. })
        ));
    }
}
