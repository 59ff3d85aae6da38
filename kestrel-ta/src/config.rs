use crate::{
    error::ConfigError,
    indicator::{
        AtrMode, BollingerBase, CrossoverMode, Indicator, ObvMode, StochasticScale,
        WindowBoundary,
    },
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Ordered set of [`Indicator`]s making up a feature vector, plus the window boundary
/// convention they are evaluated with.
///
/// The order of `indicators` is the index-to-feature mapping of every
/// [`FeatureMatrix`](crate::engine::FeatureMatrix) row, so it must not change between training
/// and inference.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct IndicatorConfig {
    #[serde(default)]
    pub boundary: WindowBoundary,
    pub indicators: Vec<Indicator>,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self::sequence_model()
    }
}

impl IndicatorConfig {
    /// Eleven features over exclusive windows, with the OBV column left as the `0.0` placeholder.
    pub fn sequence_model() -> Self {
        Self {
            boundary: WindowBoundary::Exclusive,
            indicators: vec![
                Indicator::Rsi { period: 14 },
                Indicator::MacdProxy { fast: 12, slow: 26 },
                Indicator::BollingerWidth {
                    period: 20,
                    num_std: 2.0,
                    base: BollingerBase::Sma,
                },
                Indicator::BollingerPosition {
                    period: 20,
                    num_std: 2.0,
                },
                Indicator::SmaCrossover {
                    fast: 20,
                    slow: 50,
                    mode: CrossoverMode::Distance,
                },
                Indicator::SmaCrossover {
                    fast: 50,
                    slow: 200,
                    mode: CrossoverMode::Distance,
                },
                Indicator::Momentum { period: 5 },
                Indicator::VolumeRatio { period: 20 },
                Indicator::Atr {
                    period: 14,
                    mode: AtrMode::Mean,
                },
                Indicator::Stochastic {
                    period: 14,
                    scale: StochasticScale::Percent,
                },
                Indicator::ObvMomentum {
                    mode: ObvMode::Disabled,
                },
            ],
        }
    }

    /// [`Self::sequence_model`] with cumulative OBV momentum enabled.
    pub fn signal_model() -> Self {
        let mut config = Self::sequence_model();
        if let Some(obv) = config
            .indicators
            .iter_mut()
            .find(|indicator| matches!(indicator, Indicator::ObvMomentum { .. }))
        {
            *obv = Indicator::ObvMomentum {
                mode: ObvMode::Cumulative { period: 5 },
            };
        }
        config
    }

    /// Eleven features over inclusive windows with binary crossover flags, as used by the
    /// per-timeframe classifiers.
    pub fn multi_timeframe() -> Self {
        Self {
            boundary: WindowBoundary::Inclusive,
            indicators: vec![
                Indicator::Rsi { period: 14 },
                Indicator::MacdProxy { fast: 12, slow: 26 },
                Indicator::BollingerWidth {
                    period: 20,
                    num_std: 2.0,
                    base: BollingerBase::Close,
                },
                Indicator::BollingerPosition {
                    period: 20,
                    num_std: 2.0,
                },
                Indicator::SmaCrossover {
                    fast: 20,
                    slow: 50,
                    mode: CrossoverMode::Flag,
                },
                Indicator::SmaCrossover {
                    fast: 50,
                    slow: 200,
                    mode: CrossoverMode::Flag,
                },
                Indicator::Momentum { period: 10 },
                Indicator::VolumeRatio { period: 20 },
                Indicator::Atr {
                    period: 14,
                    mode: AtrMode::Latest,
                },
                Indicator::Stochastic {
                    period: 14,
                    scale: StochasticScale::Unit,
                },
                Indicator::ObvMomentum {
                    mode: ObvMode::VolumeChange { period: 5 },
                },
            ],
        }
    }

    /// Largest lookback required by any configured indicator.
    pub fn warmup(&self) -> usize {
        self.indicators
            .iter()
            .map(|indicator| indicator.lookback(self.boundary))
            .max()
            .unwrap_or(0)
    }

    /// Feature vector length.
    pub fn width(&self) -> usize {
        self.indicators.len()
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.indicators.iter().map(Indicator::name).collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.indicators.is_empty() {
            return Err(ConfigError::NoIndicators);
        }

        let mut names = HashSet::with_capacity(self.indicators.len());
        for indicator in &self.indicators {
            indicator.validate()?;
            let name = indicator.name();
            if !names.insert(name.clone()) {
                return Err(ConfigError::DuplicateFeature(name));
            }
        }

        Ok(())
    }
}
