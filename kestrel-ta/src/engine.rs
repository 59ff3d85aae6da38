use crate::{
    candle::CandleSeries,
    config::IndicatorConfig,
    error::{ConfigError, InputError},
    indicator::{
        AtrMode, BollingerBase, CrossoverMode, Indicator, ObvMode, StochasticScale,
        VOLUME_RATIO_NEUTRAL, WindowBoundary, bollinger_bands, bollinger_position,
        guarded_ratio, mean, rsi, stochastic,
    },
};
use serde::{Deserialize, Serialize};
use ta::{
    Next,
    indicators::{Maximum, Minimum},
};
use tracing::debug;

/// Fixed-width indicator vectors aligned 1:1 with the candle series indices `[warmup, len)`.
///
/// Row `r` holds the features of series index `warmup + r`. Values are stored row-major.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FeatureMatrix {
    warmup: usize,
    feature_names: Vec<String>,
    values: Vec<f64>,
}

impl FeatureMatrix {
    /// Number of rows (timesteps).
    pub fn len(&self) -> usize {
        match self.width() {
            0 => 0,
            width => self.values.len() / width,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Feature vector length.
    pub fn width(&self) -> usize {
        self.feature_names.len()
    }

    /// Number of leading series indices excluded from the matrix.
    pub fn warmup(&self) -> usize {
        self.warmup
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Series index of matrix row `row`.
    pub fn series_index(&self, row: usize) -> usize {
        self.warmup + row
    }

    pub fn row(&self, row: usize) -> Option<&[f64]> {
        let width = self.width();
        self.values.get(row * width..(row + 1) * width)
    }

    pub fn rows(&self) -> std::slice::ChunksExact<'_, f64> {
        self.values.chunks_exact(self.width().max(1))
    }

    /// Contiguous row-major values of rows `[start, end)`.
    pub fn rows_between(&self, start: usize, end: usize) -> Option<&[f64]> {
        let width = self.width();
        self.values.get(start * width..end * width)
    }

    pub fn column(&self, column: usize) -> impl Iterator<Item = f64> + '_ {
        self.values
            .iter()
            .skip(column)
            .step_by(self.width().max(1))
            .copied()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// New [`FeatureMatrix`] with every value mapped by `f(column, value)`.
    pub fn map_columns<F>(&self, mut f: F) -> Self
    where
        F: FnMut(usize, f64) -> f64,
    {
        let width = self.width().max(1);
        Self {
            warmup: self.warmup,
            feature_names: self.feature_names.clone(),
            values: self
                .values
                .iter()
                .enumerate()
                .map(|(index, value)| f(index % width, *value))
                .collect(),
        }
    }
}

/// Computes a [`FeatureMatrix`] from a [`CandleSeries`] for a fixed [`IndicatorConfig`].
///
/// Deterministic and side effect free: the same series and configuration always produce the
/// same matrix.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    config: IndicatorConfig,
    kernels: Vec<Kernel>,
}

#[derive(Debug, Clone)]
struct Kernel {
    indicator: Indicator,
    extrema: Option<(Maximum, Minimum)>,
}

impl IndicatorEngine {
    /// Validate the [`IndicatorConfig`] and construct a new [`IndicatorEngine`].
    pub fn new(config: IndicatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let kernels = config
            .indicators
            .iter()
            .map(|indicator| {
                let extrema = match *indicator {
                    Indicator::Stochastic { period, .. } => Some((
                        Maximum::new(period).map_err(|_| ConfigError::Zero {
                            name: "Stochastic period",
                        })?,
                        Minimum::new(period).map_err(|_| ConfigError::Zero {
                            name: "Stochastic period",
                        })?,
                    )),
                    _ => None,
                };
                Ok(Kernel {
                    indicator: *indicator,
                    extrema,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self { config, kernels })
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    pub fn warmup(&self) -> usize {
        self.config.warmup()
    }

    /// Compute the [`FeatureMatrix`] for the provided [`CandleSeries`].
    ///
    /// Fails with [`InputError::SeriesTooShort`] if `series.len() <= warmup`.
    pub fn compute(&self, series: &CandleSeries) -> Result<FeatureMatrix, InputError> {
        let warmup = self.warmup();
        let len = series.len();
        if len <= warmup {
            return Err(InputError::SeriesTooShort { len, warmup });
        }

        let columns = SeriesColumns::new(series);
        let rows = len - warmup;
        let width = self.kernels.len();

        let mut values = vec![0.0; rows * width];
        for (column, kernel) in self.kernels.iter().enumerate() {
            let feature = kernel.column(&columns, warmup, self.config.boundary);
            for (row, value) in feature.into_iter().enumerate() {
                values[row * width + column] = value;
            }
        }

        debug!(
            candles = len,
            warmup,
            rows,
            width,
            "computed feature matrix"
        );

        Ok(FeatureMatrix {
            warmup,
            feature_names: self.config.feature_names(),
            values,
        })
    }
}

/// Column-oriented view of a [`CandleSeries`] plus derived series shared between indicators.
#[derive(Debug)]
struct SeriesColumns {
    close: Vec<f64>,
    high: Vec<f64>,
    low: Vec<f64>,
    volume: Vec<f64>,
    true_range: Vec<f64>,
    obv: Vec<f64>,
}

impl SeriesColumns {
    fn new(series: &CandleSeries) -> Self {
        let candles = series.candles();

        let true_range = candles
            .iter()
            .enumerate()
            .map(|(index, candle)| match index {
                0 => candle.high - candle.low,
                _ => candle.true_range(candles[index - 1].close),
            })
            .collect();

        let mut obv = Vec::with_capacity(candles.len());
        let mut running = 0.0;
        for (index, candle) in candles.iter().enumerate() {
            running = match index {
                0 => candle.volume,
                _ => {
                    let prev_close = candles[index - 1].close;
                    if candle.close > prev_close {
                        running + candle.volume
                    } else if candle.close < prev_close {
                        running - candle.volume
                    } else {
                        running
                    }
                }
            };
            obv.push(running);
        }

        Self {
            close: series.closes(),
            high: series.highs(),
            low: series.lows(),
            volume: series.volumes(),
            true_range,
            obv,
        }
    }
}

impl Kernel {
    /// Feature column for series indices `[warmup, len)`.
    fn column(
        &self,
        columns: &SeriesColumns,
        warmup: usize,
        boundary: WindowBoundary,
    ) -> Vec<f64> {
        let len = columns.close.len();

        if let (
            Indicator::Stochastic { scale, .. },
            Some((highest, lowest)),
        ) = (self.indicator, &self.extrema)
        {
            return stochastic_column(columns, warmup, boundary, scale, highest, lowest);
        }

        (warmup..len)
            .map(|i| self.value(columns, i, boundary))
            .collect()
    }

    fn value(&self, columns: &SeriesColumns, i: usize, boundary: WindowBoundary) -> f64 {
        let close = &columns.close;
        let price = close[i];

        match self.indicator {
            Indicator::Rsi { period } => rsi(boundary.slice(close, i, period + 1)),
            Indicator::MacdProxy { fast, slow } => {
                let fast = mean(boundary.slice(close, i, fast));
                let slow = mean(boundary.slice(close, i, slow));
                guarded_ratio(fast - slow, price, 0.0)
            }
            Indicator::BollingerWidth {
                period,
                num_std,
                base,
            } => {
                let (lower, middle, upper) =
                    bollinger_bands(boundary.slice(close, i, period), num_std);
                let base = match base {
                    BollingerBase::Sma => middle,
                    BollingerBase::Close => price,
                };
                guarded_ratio(upper - lower, base, 0.0)
            }
            Indicator::BollingerPosition { period, num_std } => {
                let (lower, _, upper) = bollinger_bands(boundary.slice(close, i, period), num_std);
                bollinger_position(price, lower, upper)
            }
            Indicator::SmaCrossover { fast, slow, mode } => {
                let fast = mean(boundary.slice(close, i, fast));
                let slow = mean(boundary.slice(close, i, slow));
                match mode {
                    CrossoverMode::Distance => guarded_ratio(fast - slow, slow, 0.0),
                    CrossoverMode::Flag => {
                        if fast > slow {
                            1.0
                        } else {
                            0.0
                        }
                    }
                }
            }
            Indicator::Momentum { period } => {
                let past = close[i - period];
                guarded_ratio(price - past, past, 0.0)
            }
            Indicator::VolumeRatio { period } => {
                let average = mean(boundary.slice(&columns.volume, i, period));
                guarded_ratio(columns.volume[i], average, VOLUME_RATIO_NEUTRAL)
            }
            Indicator::Atr { period, mode } => {
                let range = match mode {
                    AtrMode::Mean => mean(boundary.slice(&columns.true_range, i, period)),
                    AtrMode::Latest => columns.true_range[i],
                };
                guarded_ratio(range, price, 0.0)
            }
            Indicator::ObvMomentum { mode } => match mode {
                // Placeholder column: OBV tracking disabled
                ObvMode::Disabled => 0.0,
                ObvMode::Cumulative { period } => {
                    let past = columns.obv[i - period];
                    guarded_ratio(columns.obv[i] - past, past.abs(), 0.0)
                }
                ObvMode::VolumeChange { period } => {
                    let past = columns.volume[i - period];
                    guarded_ratio(columns.volume[i] - past, past, 0.0)
                }
            },
            // Handled column-wise with rolling extrema
            Indicator::Stochastic { .. } => 0.0,
        }
    }
}

fn stochastic_column(
    columns: &SeriesColumns,
    warmup: usize,
    boundary: WindowBoundary,
    scale: StochasticScale,
    highest: &Maximum,
    lowest: &Minimum,
) -> Vec<f64> {
    let mut highest = highest.clone();
    let mut lowest = lowest.clone();
    let highs = columns
        .high
        .iter()
        .map(|high| highest.next(*high))
        .collect::<Vec<_>>();
    let lows = columns
        .low
        .iter()
        .map(|low| lowest.next(*low))
        .collect::<Vec<_>>();

    (warmup..columns.close.len())
        .map(|i| {
            let last = boundary.last_index(i);
            let value = stochastic(columns.close[i], lows[last], highs[last]);
            match scale {
                StochasticScale::Percent => value,
                StochasticScale::Unit => value / 100.0,
            }
        })
        .collect()
}
