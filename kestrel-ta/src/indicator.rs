use crate::error::ConfigError;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Neutral RSI value when no losses are observed in the window.
pub const RSI_NO_LOSS: f64 = 100.0;

/// Neutral Bollinger position when the bands collapse (`upper == lower`).
pub const BOLLINGER_POSITION_NEUTRAL: f64 = 0.5;

/// Neutral volume ratio when the trailing mean volume is zero.
pub const VOLUME_RATIO_NEUTRAL: f64 = 1.0;

/// Neutral Stochastic %K (percent scale) when the high/low range is zero.
pub const STOCHASTIC_NEUTRAL: f64 = 50.0;

/// Inclusive/exclusive convention for trailing indicator windows.
///
/// For a window of `len` values evaluated at index `i`:
/// - [`WindowBoundary::Exclusive`]: values `[i - len, i)`, the current candle is not included.
/// - [`WindowBoundary::Inclusive`]: values `(i - len, i]`, the current candle is included.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowBoundary {
    #[default]
    Exclusive,
    Inclusive,
}

impl WindowBoundary {
    /// Trailing window of `len` values for index `i`.
    ///
    /// Callers must ensure `i >= self.required_history(len)`.
    pub fn slice(self, values: &[f64], i: usize, len: usize) -> &[f64] {
        match self {
            Self::Exclusive => &values[i - len..i],
            Self::Inclusive => &values[i + 1 - len..=i],
        }
    }

    /// Index of the most recent value inside a window evaluated at index `i`.
    pub fn last_index(self, i: usize) -> usize {
        match self {
            Self::Exclusive => i - 1,
            Self::Inclusive => i,
        }
    }

    /// Smallest index at which a window of `len` values is fully populated.
    pub fn required_history(self, len: usize) -> usize {
        match self {
            Self::Exclusive => len,
            Self::Inclusive => len.saturating_sub(1),
        }
    }
}

/// Denominator used for the Bollinger band width.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BollingerBase {
    #[default]
    Sma,
    Close,
}

/// Representation of a moving average crossover feature.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverMode {
    /// Signed fractional distance `(fast - slow) / slow`.
    #[default]
    Distance,
    /// `1.0` when `fast > slow`, otherwise `0.0`.
    Flag,
}

/// True range aggregation for the ATR feature.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AtrMode {
    /// Mean true range over the trailing window.
    #[default]
    Mean,
    /// Latest true range only.
    Latest,
}

/// Output scale of the Stochastic oscillator.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StochasticScale {
    /// `[0, 100]`
    #[default]
    Percent,
    /// `[0, 1]`
    Unit,
}

/// On-balance-volume momentum source.
///
/// [`ObvMode::Disabled`] is a deliberate placeholder: the feature column is kept (so the feature
/// vector width stays stable) but always holds `0.0`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObvMode {
    #[default]
    Disabled,
    /// `(obv[i] - obv[i - period]) / |obv[i - period]|` over cumulative OBV.
    Cumulative { period: usize },
    /// `(volume[i] - volume[i - period]) / volume[i - period]`.
    VolumeChange { period: usize },
}

/// One column of the feature vector.
///
/// Formulas are the simplified labeling variants, not textbook definitions. Every ratio resolves
/// to a documented neutral constant on a zero denominator, and nothing here ever yields NaN or
/// infinity.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Indicator {
    Rsi {
        period: usize,
    },
    MacdProxy {
        fast: usize,
        slow: usize,
    },
    BollingerWidth {
        period: usize,
        num_std: f64,
        #[serde(default)]
        base: BollingerBase,
    },
    BollingerPosition {
        period: usize,
        num_std: f64,
    },
    SmaCrossover {
        fast: usize,
        slow: usize,
        #[serde(default)]
        mode: CrossoverMode,
    },
    Momentum {
        period: usize,
    },
    VolumeRatio {
        period: usize,
    },
    Atr {
        period: usize,
        #[serde(default)]
        mode: AtrMode,
    },
    Stochastic {
        period: usize,
        #[serde(default)]
        scale: StochasticScale,
    },
    ObvMomentum {
        #[serde(default)]
        mode: ObvMode,
    },
}

impl Indicator {
    /// Stable feature name, used for scaler parameters and training/inference parity.
    pub fn name(&self) -> String {
        match self {
            Self::Rsi { period } => format!("rsi_{period}"),
            Self::MacdProxy { fast, slow } => format!("macd_{fast}_{slow}"),
            Self::BollingerWidth { period, .. } => format!("bb_width_{period}"),
            Self::BollingerPosition { period, .. } => format!("bb_position_{period}"),
            Self::SmaCrossover { fast, slow, .. } => format!("sma_cross_{fast}_{slow}"),
            Self::Momentum { period } => format!("momentum_{period}"),
            Self::VolumeRatio { period } => format!("volume_ratio_{period}"),
            Self::Atr { period, .. } => format!("atr_{period}"),
            Self::Stochastic { period, .. } => format!("stochastic_{period}"),
            Self::ObvMomentum { mode } => match mode {
                ObvMode::Disabled => "obv_momentum".to_string(),
                ObvMode::Cumulative { period } | ObvMode::VolumeChange { period } => {
                    format!("obv_momentum_{period}")
                }
            },
        }
    }

    /// Number of leading candles required before this indicator can be evaluated.
    pub fn lookback(&self, boundary: WindowBoundary) -> usize {
        match *self {
            // Deltas over `period` steps need `period + 1` closes
            Self::Rsi { period } => boundary.required_history(period + 1),
            Self::MacdProxy { fast, slow } => boundary.required_history(fast.max(slow)),
            Self::BollingerWidth { period, .. }
            | Self::BollingerPosition { period, .. }
            | Self::VolumeRatio { period }
            | Self::Stochastic { period, .. } => boundary.required_history(period),
            Self::SmaCrossover { fast, slow, .. } => boundary.required_history(fast.max(slow)),
            Self::Momentum { period } => period,
            // True range needs the previous close
            Self::Atr {
                period,
                mode: AtrMode::Mean,
            } => boundary.required_history(period) + 1,
            Self::Atr {
                mode: AtrMode::Latest,
                ..
            } => 1,
            Self::ObvMomentum { mode } => match mode {
                ObvMode::Disabled => 0,
                ObvMode::Cumulative { period } | ObvMode::VolumeChange { period } => period,
            },
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Self::Rsi { period }
            | Self::Momentum { period }
            | Self::VolumeRatio { period }
            | Self::Atr { period, .. }
            | Self::Stochastic { period, .. } => non_zero(period, "indicator period"),
            Self::MacdProxy { fast, slow } => periods_ordered(fast, slow, "MACD"),
            Self::SmaCrossover { fast, slow, .. } => periods_ordered(fast, slow, "SMA crossover"),
            Self::BollingerWidth {
                period, num_std, ..
            }
            | Self::BollingerPosition { period, num_std } => {
                non_zero(period, "Bollinger period")?;
                if num_std.is_finite() && num_std >= 0.0 {
                    Ok(())
                } else {
                    Err(ConfigError::InvalidValue {
                        name: "Bollinger num_std",
                        value: num_std,
                    })
                }
            }
            Self::ObvMomentum { mode } => match mode {
                ObvMode::Disabled => Ok(()),
                ObvMode::Cumulative { period } | ObvMode::VolumeChange { period } => {
                    non_zero(period, "OBV momentum period")
                }
            },
        }
    }
}

fn non_zero(value: usize, name: &'static str) -> Result<(), ConfigError> {
    if value == 0 {
        Err(ConfigError::Zero { name })
    } else {
        Ok(())
    }
}

fn periods_ordered(fast: usize, slow: usize, name: &'static str) -> Result<(), ConfigError> {
    non_zero(fast, "fast period")?;
    non_zero(slow, "slow period")?;
    if fast < slow {
        Ok(())
    } else {
        Err(ConfigError::PeriodOrder { name, fast, slow })
    }
}

/// Resolve `numerator / denominator`, falling back to `neutral` on a zero denominator or a
/// non-finite result.
pub fn guarded_ratio(numerator: f64, denominator: f64, neutral: f64) -> f64 {
    if denominator == 0.0 {
        return neutral;
    }
    let value = numerator / denominator;
    if value.is_finite() { value } else { neutral }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean(values);
    let variance =
        values.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Simplified RSI over consecutive deltas of `closes`.
///
/// Mean gain over mean loss, with [`RSI_NO_LOSS`] when the mean loss is exactly zero.
pub fn rsi(closes: &[f64]) -> f64 {
    let deltas = closes.len().saturating_sub(1);
    if deltas == 0 {
        return RSI_NO_LOSS;
    }

    let (gains, losses) = closes
        .iter()
        .tuple_windows()
        .fold((0.0, 0.0), |(gains, losses), (prev, next)| {
            let change = next - prev;
            if change > 0.0 {
                (gains + change, losses)
            } else {
                (gains, losses - change)
            }
        });

    let avg_gain = gains / deltas as f64;
    let avg_loss = losses / deltas as f64;
    if avg_loss == 0.0 {
        return RSI_NO_LOSS;
    }

    let rs = avg_gain / avg_loss;
    let value = 100.0 - 100.0 / (1.0 + rs);
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        RSI_NO_LOSS
    }
}

/// Bollinger bands `(lower, middle, upper)` over `values` at `num_std` population deviations.
pub fn bollinger_bands(values: &[f64], num_std: f64) -> (f64, f64, f64) {
    let middle = mean(values);
    let offset = num_std * std_dev(values);
    (middle - offset, middle, middle + offset)
}

/// Bollinger position of `price` within `(lower, upper)`, [`BOLLINGER_POSITION_NEUTRAL`] when the
/// bands collapse.
pub fn bollinger_position(price: f64, lower: f64, upper: f64) -> f64 {
    if upper == lower {
        BOLLINGER_POSITION_NEUTRAL
    } else {
        guarded_ratio(price - lower, upper - lower, BOLLINGER_POSITION_NEUTRAL)
    }
}

/// Stochastic %K in percent, clamped to `[0, 100]` and [`STOCHASTIC_NEUTRAL`] on a zero range.
///
/// With [`WindowBoundary::Exclusive`] the current close may sit outside the trailing high/low
/// range, hence the clamp.
pub fn stochastic(close: f64, lowest: f64, highest: f64) -> f64 {
    if highest == lowest {
        return STOCHASTIC_NEUTRAL;
    }
    guarded_ratio(close - lowest, highest - lowest, STOCHASTIC_NEUTRAL / 100.0).clamp(0.0, 1.0)
        * 100.0
}
