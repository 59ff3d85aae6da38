use crate::{
    config::PipelineConfig,
    dataset::{
        LabeledDataset,
        label::LabelGenerator,
        scaler::ScalerParams,
        window::{WindowBuilder, Windows},
    },
    error::Result,
    evaluation::backtest::Backtest,
};
use kestrel_ta::{CandleSeries, FeatureMatrix, IndicatorEngine};
use tracing::debug;

/// Validated [`PipelineConfig`] bound to its [`IndicatorEngine`] and [`LabelGenerator`].
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    engine: IndicatorEngine,
    labeler: LabelGenerator,
}

impl Pipeline {
    /// Validate the [`PipelineConfig`] and construct a new [`Pipeline`].
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let engine = IndicatorEngine::new(config.indicators.clone())?;
        let labeler = LabelGenerator::new(config.horizon(), config.label_threshold_percent);

        Ok(Self {
            config,
            engine,
            labeler,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn labeler(&self) -> &LabelGenerator {
        &self.labeler
    }

    /// Compute the [`FeatureMatrix`] of `series`.
    pub fn features(&self, series: &CandleSeries) -> Result<FeatureMatrix> {
        Ok(self.engine.compute(series)?)
    }

    /// Windows of `matrix` at the configured sequence length and horizon.
    pub fn windows<'a>(&self, matrix: &'a FeatureMatrix) -> Result<Windows<'a>> {
        WindowBuilder::build(matrix, self.config.sequence_length, self.config.horizon())
    }

    /// Compute features and label every window of `series`.
    pub fn dataset(&self, series: &CandleSeries) -> Result<LabeledDataset> {
        let matrix = self.features(series)?;
        LabeledDataset::build(
            series,
            &matrix,
            self.config.sequence_length,
            self.config.label_alignment,
            &self.labeler,
        )
    }

    /// Compute features, then fit a [`ScalerParams`] on them and return the standardised matrix.
    pub fn scaled_features(&self, series: &CandleSeries) -> Result<(FeatureMatrix, ScalerParams)> {
        let matrix = self.features(series)?;
        let scaler = ScalerParams::fit(&matrix)?;
        let scaled = scaler.transform(&matrix)?;
        debug!(rows = scaled.len(), width = scaled.width(), "standardised features");
        Ok((scaled, scaler))
    }

    pub fn backtest(&self) -> Backtest {
        Backtest::new(&self.config)
    }
}
