use crate::error::{KestrelError, Result};
use kestrel_ta::{CandleSeries, FeatureMatrix, error::ConfigError};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Forward-return labels and the [`LabelGenerator`](label::LabelGenerator).
pub mod label;

/// Feature standardisation parameters.
pub mod scaler;

/// Fixed-length overlapping [`FeatureMatrix`] windows.
pub mod window;

use label::{Label, LabelGenerator};
use window::{Window, WindowBuilder};

/// Which candle of a [`Window`] its [`Label`] is measured from.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelAlignment {
    /// The anchor candle following the last feature row, so the label is never visible in
    /// the window.
    #[default]
    Anchor,
    /// The candle of the last feature row, pairing each row with the move that starts at it.
    LastRow,
}

impl LabelAlignment {
    /// Series index labeled for `window`.
    pub fn label_index(&self, window: &Window<'_>) -> usize {
        match self {
            Self::Anchor => window.series_index,
            // anchor >= seq_length >= 1
            Self::LastRow => window.series_index - 1,
        }
    }
}

/// A single supervised sample: one [`Window`](window::Window) of features paired with the
/// [`Label`] selected by its [`LabelAlignment`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LabeledSample {
    /// Matrix-relative anchor row.
    pub anchor: usize,
    /// Candle series index of the labeled close, see [`LabelAlignment`].
    pub series_index: usize,
    /// Row-major `seq_length x width` features.
    pub features: Vec<f64>,
    pub label: Label,
}

/// Number of samples per [`Label`] class.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Deserialize, Serialize)]
pub struct ClassDistribution {
    pub sell: usize,
    pub hold: usize,
    pub buy: usize,
}

impl ClassDistribution {
    pub fn total(&self) -> usize {
        self.sell + self.hold + self.buy
    }

    pub fn count(&self, label: Label) -> usize {
        match label {
            Label::Sell => self.sell,
            Label::Hold => self.hold,
            Label::Buy => self.buy,
        }
    }
}

/// Labeled windows over one [`CandleSeries`], in chronological order.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LabeledDataset {
    feature_names: Vec<String>,
    sequence_length: usize,
    alignment: LabelAlignment,
    samples: Vec<LabeledSample>,
    skipped: Vec<usize>,
}

impl LabeledDataset {
    /// Pair every window of `matrix` with the label of the close selected by `alignment`.
    ///
    /// `matrix` must have been computed from `series`. Labeled closes of zero are skipped and
    /// recorded in [`Self::skipped`], any other labeling failure is returned.
    pub fn build(
        series: &CandleSeries,
        matrix: &FeatureMatrix,
        sequence_length: usize,
        alignment: LabelAlignment,
        labeler: &LabelGenerator,
    ) -> Result<Self> {
        if matrix.warmup() + matrix.len() != series.len() {
            return Err(KestrelError::MatrixMismatch {
                series_len: series.len(),
                matrix_len: matrix.len(),
                warmup: matrix.warmup(),
            });
        }

        let windows = WindowBuilder::build(matrix, sequence_length, labeler.horizon)?;
        let closes = series.closes();

        let mut samples = Vec::with_capacity(windows.len());
        let mut skipped = Vec::new();

        for window in windows {
            let series_index = alignment.label_index(&window);
            match labeler.label(&closes, series_index) {
                Ok(label) => samples.push(LabeledSample {
                    anchor: window.anchor,
                    series_index,
                    features: window.values().to_vec(),
                    label,
                }),
                Err(KestrelError::InvalidPrice { index, price }) => {
                    warn!(index, price, "skipping window anchored on an invalid price");
                    skipped.push(index);
                }
                Err(error) => return Err(error),
            }
        }

        let dataset = Self {
            feature_names: matrix.feature_names().to_vec(),
            sequence_length,
            alignment,
            samples,
            skipped,
        };

        debug!(
            samples = dataset.len(),
            skipped = dataset.skipped.len(),
            distribution = ?dataset.class_distribution(),
            "built labeled dataset"
        );

        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[LabeledSample] {
        &self.samples
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    pub fn alignment(&self) -> LabelAlignment {
        self.alignment
    }

    /// Series indices of anchors excluded because of an invalid price.
    pub fn skipped(&self) -> &[usize] {
        &self.skipped
    }

    pub fn labels(&self) -> impl Iterator<Item = Label> + '_ {
        self.samples.iter().map(|sample| sample.label)
    }

    pub fn class_distribution(&self) -> ClassDistribution {
        self.labels()
            .fold(ClassDistribution::default(), |mut distribution, label| {
                match label {
                    Label::Sell => distribution.sell += 1,
                    Label::Hold => distribution.hold += 1,
                    Label::Buy => distribution.buy += 1,
                }
                distribution
            })
    }

    /// Chronological `(train, validation)` split, with the first `train_fraction` of samples
    /// used for training.
    pub fn split(&self, train_fraction: f64) -> Result<(&[LabeledSample], &[LabeledSample])> {
        if !(train_fraction > 0.0 && train_fraction < 1.0) {
            return Err(ConfigError::OutOfRange {
                name: "train_fraction",
                value: train_fraction,
                min: 0.0,
                max: 1.0,
            }
            .into());
        }

        let train_len = (self.samples.len() as f64 * train_fraction) as usize;
        Ok(self.samples.split_at(train_len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_ta::{
        Candle, IndicatorConfig, IndicatorEngine,
        indicator::{Indicator, WindowBoundary},
    };

    fn config() -> IndicatorConfig {
        IndicatorConfig {
            boundary: WindowBoundary::Exclusive,
            indicators: vec![Indicator::Momentum { period: 1 }],
        }
    }

    fn series(closes: &[f64]) -> CandleSeries {
        CandleSeries::from_records(
            closes
                .iter()
                .enumerate()
                .map(|(index, close)| Candle::new(index as i64, *close, *close, *close, *close, 1.0)),
        )
        .unwrap()
    }

    #[test]
    fn test_build() {
        // warmup 1, seq 2, horizon 1
        let series = series(&[10.0, 10.0, 10.0, 11.0, 10.0, 10.0, 10.5]);
        let matrix = IndicatorEngine::new(config()).unwrap().compute(&series).unwrap();
        let dataset = LabeledDataset::build(
            &series,
            &matrix,
            2,
            LabelAlignment::Anchor,
            &LabelGenerator::new(1, 2.0),
        )
        .unwrap();

        // matrix len 6, anchors 2..5 => series indices 3..6
        let indices = dataset
            .samples()
            .iter()
            .map(|sample| sample.series_index)
            .collect::<Vec<_>>();
        assert_eq!(indices, vec![3, 4, 5]);

        let labels = dataset.labels().collect::<Vec<_>>();
        assert_eq!(labels, vec![Label::Sell, Label::Hold, Label::Buy]);

        assert_eq!(
            dataset.class_distribution(),
            ClassDistribution {
                sell: 1,
                hold: 1,
                buy: 1
            }
        );
        assert_eq!(dataset.samples()[0].features.len(), 2);
    }

    #[test]
    fn test_build_last_row_alignment() {
        // warmup 1, seq 1, horizon 1
        let series = series(&[10.0, 10.0, 10.0, 11.0, 10.0, 10.0, 10.5]);
        let matrix = IndicatorEngine::new(config()).unwrap().compute(&series).unwrap();
        let dataset = LabeledDataset::build(
            &series,
            &matrix,
            1,
            LabelAlignment::LastRow,
            &LabelGenerator::new(1, 2.0),
        )
        .unwrap();

        // matrix len 6, anchors 1..=4 => last rows at series indices 1..=4
        let indices = dataset
            .samples()
            .iter()
            .map(|sample| sample.series_index)
            .collect::<Vec<_>>();
        assert_eq!(indices, vec![1, 2, 3, 4]);

        for sample in dataset.samples() {
            let row = matrix.row(sample.series_index - matrix.warmup()).unwrap();
            assert_eq!(sample.features, row);
        }

        let labels = dataset.labels().collect::<Vec<_>>();
        assert_eq!(labels, vec![Label::Hold, Label::Buy, Label::Sell, Label::Hold]);
        assert_eq!(dataset.alignment(), LabelAlignment::LastRow);
    }

    #[test]
    fn test_build_skips_invalid_prices() {
        let series = series(&[1.0, 1.0, 1.0, 0.0, 1.0, 1.0, 1.0]);
        let matrix = IndicatorEngine::new(config()).unwrap().compute(&series).unwrap();
        let dataset = LabeledDataset::build(
            &series,
            &matrix,
            2,
            LabelAlignment::Anchor,
            &LabelGenerator::new(1, 2.0),
        )
        .unwrap();

        assert_eq!(dataset.skipped(), &[3]);
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn test_build_rejects_foreign_matrix() {
        let series_a = series(&[1.0; 10]);
        let series_b = series(&[1.0; 12]);
        let matrix = IndicatorEngine::new(config()).unwrap().compute(&series_b).unwrap();

        assert!(matches!(
            LabeledDataset::build(
                &series_a,
                &matrix,
                2,
                LabelAlignment::Anchor,
                &LabelGenerator::new(1, 2.0)
            ),
            Err(KestrelError::MatrixMismatch { .. })
        ));
    }

    #[test]
    fn test_split() {
        let series = series(&[1.0; 16]);
        let matrix = IndicatorEngine::new(config()).unwrap().compute(&series).unwrap();
        let dataset = LabeledDataset::build(
            &series,
            &matrix,
            3,
            LabelAlignment::Anchor,
            &LabelGenerator::new(2, 0.15),
        )
        .unwrap();
        assert_eq!(dataset.len(), 10);

        let (train, validation) = dataset.split(0.8).unwrap();
        assert_eq!(train.len(), 8);
        assert_eq!(validation.len(), 2);
        assert!(train.last().unwrap().anchor < validation[0].anchor);

        assert!(dataset.split(0.0).is_err());
        assert!(dataset.split(1.5).is_err());
    }
}
