use crate::{dataset::LabelAlignment, error::Result};
use derive_more::Display;
use kestrel_ta::{config::IndicatorConfig, error::ConfigError};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

/// Default minimum aggregate accuracy (percent) for a strategy to pass.
pub const DEFAULT_ACCURACY_PASS_THRESHOLD_PERCENT: Decimal = Decimal::from_parts(55, 0, 0, false, 0);

/// Default chronological train share of a labeled dataset.
pub const DEFAULT_TRAIN_FRACTION: f64 = 0.8;

/// Named candle timeframe horizon, measured in 5 minute candles.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display)]
pub enum Timeframe {
    #[serde(rename = "5m")]
    #[display("5m")]
    Minutes5,
    #[serde(rename = "30m")]
    #[display("30m")]
    Minutes30,
    #[serde(rename = "1h")]
    #[display("1h")]
    Hours1,
    #[serde(rename = "3h")]
    #[display("3h")]
    Hours3,
    #[serde(rename = "6h")]
    #[display("6h")]
    Hours6,
    #[serde(rename = "24h")]
    #[display("24h")]
    Hours24,
}

impl Timeframe {
    pub const ALL: [Self; 6] = [
        Self::Minutes5,
        Self::Minutes30,
        Self::Hours1,
        Self::Hours3,
        Self::Hours6,
        Self::Hours24,
    ];

    /// Number of 5 minute candles spanned by this [`Timeframe`].
    pub fn candles(&self) -> usize {
        match self {
            Self::Minutes5 => 1,
            Self::Minutes30 => 6,
            Self::Hours1 => 12,
            Self::Hours3 => 36,
            Self::Hours6 => 72,
            Self::Hours24 => 288,
        }
    }
}

/// Forward label horizon, either a raw candle count or a named [`Timeframe`].
///
/// Deserialises from either `6` or `"30m"`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Horizon {
    Candles(usize),
    Timeframe(Timeframe),
}

impl Horizon {
    pub fn candles(&self) -> usize {
        match self {
            Self::Candles(candles) => *candles,
            Self::Timeframe(timeframe) => timeframe.candles(),
        }
    }
}

impl From<Timeframe> for Horizon {
    fn from(value: Timeframe) -> Self {
        Self::Timeframe(value)
    }
}

/// Immutable configuration of a full pipeline run, passed explicitly to every component.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PipelineConfig {
    pub sequence_length: usize,
    pub horizon: Horizon,
    pub label_threshold_percent: f64,
    #[serde(
        with = "rust_decimal::serde::float",
        default = "default_accuracy_pass_threshold_percent"
    )]
    pub accuracy_pass_threshold_percent: Decimal,
    #[serde(default)]
    pub label_alignment: LabelAlignment,
    #[serde(default = "default_train_fraction")]
    pub train_fraction: f64,
    #[serde(default)]
    pub indicators: IndicatorConfig,
}

fn default_accuracy_pass_threshold_percent() -> Decimal {
    DEFAULT_ACCURACY_PASS_THRESHOLD_PERCENT
}

fn default_train_fraction() -> f64 {
    DEFAULT_TRAIN_FRACTION
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sequence_length: 30,
            horizon: Horizon::Candles(6),
            label_threshold_percent: 0.15,
            accuracy_pass_threshold_percent: DEFAULT_ACCURACY_PASS_THRESHOLD_PERCENT,
            label_alignment: LabelAlignment::Anchor,
            train_fraction: DEFAULT_TRAIN_FRACTION,
            indicators: IndicatorConfig::sequence_model(),
        }
    }
}

impl PipelineConfig {
    /// 60 candle sequences labeled 6 candles ahead at 0.15%, with cumulative OBV momentum.
    pub fn signal_model() -> Self {
        Self {
            sequence_length: 60,
            indicators: IndicatorConfig::signal_model(),
            ..Self::default()
        }
    }

    /// Next candle direction over 30 candle sequences.
    pub fn backtest() -> Self {
        Self {
            horizon: Horizon::Candles(1),
            ..Self::default()
        }
    }

    /// Single row samples over inclusive windows, each labeled from its own close at 2% over the
    /// [`Timeframe`].
    pub fn multi_timeframe(timeframe: Timeframe) -> Self {
        Self {
            sequence_length: 1,
            horizon: Horizon::Timeframe(timeframe),
            label_threshold_percent: 2.0,
            label_alignment: LabelAlignment::LastRow,
            indicators: IndicatorConfig::multi_timeframe(),
            ..Self::default()
        }
    }

    /// Forward label horizon in candles.
    pub fn horizon(&self) -> usize {
        self.horizon.candles()
    }

    /// Indicator warmup derived from the configured indicators.
    pub fn warmup(&self) -> usize {
        self.indicators.warmup()
    }

    /// Smallest series length that yields at least one labeled window.
    pub fn min_series_len(&self) -> usize {
        self.warmup()
            .saturating_add(self.sequence_length)
            .saturating_add(self.horizon())
            .saturating_add(1)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.sequence_length == 0 {
            return Err(ConfigError::Zero {
                name: "sequence_length",
            });
        }
        if self.horizon() == 0 {
            return Err(ConfigError::Zero { name: "horizon" });
        }
        if !self.label_threshold_percent.is_finite() || self.label_threshold_percent < 0.0 {
            return Err(ConfigError::InvalidValue {
                name: "label_threshold_percent",
                value: self.label_threshold_percent,
            });
        }
        if self.accuracy_pass_threshold_percent < Decimal::ZERO
            || self.accuracy_pass_threshold_percent > Decimal::ONE_HUNDRED
        {
            return Err(ConfigError::OutOfRange {
                name: "accuracy_pass_threshold_percent",
                value: self
                    .accuracy_pass_threshold_percent
                    .to_f64()
                    .unwrap_or(f64::NAN),
                min: 0.0,
                max: 100.0,
            });
        }
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(ConfigError::OutOfRange {
                name: "train_fraction",
                value: self.train_fraction,
                min: 0.0,
                max: 1.0,
            });
        }
        self.indicators.validate()
    }

    /// Deserialise and validate a [`PipelineConfig`] from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let config = serde_json::from_str::<Self>(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
