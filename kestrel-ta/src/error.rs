use thiserror::Error;

/// Malformed or too-short candle input handed to the indicator pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("candle series is empty")]
    EmptySeries,

    #[error("candle {index} has a non-finite {field}")]
    NonFinite { index: usize, field: &'static str },

    #[error("candle {index} has a negative {field}: {value}")]
    Negative {
        index: usize,
        field: &'static str,
        value: f64,
    },

    #[error("candle {index} open_time {current} does not follow previous open_time {previous}")]
    Unordered {
        index: usize,
        previous: i64,
        current: i64,
    },

    #[error("series of {len} candles does not exceed the indicator warmup of {warmup}")]
    SeriesTooShort { len: usize, warmup: usize },
}

/// Invalid indicator or pipeline configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("no indicators configured")]
    NoIndicators,

    #[error("{name} must be non-zero")]
    Zero { name: &'static str },

    #[error("{name} fast period {fast} must be shorter than slow period {slow}")]
    PeriodOrder {
        name: &'static str,
        fast: usize,
        slow: usize,
    },

    #[error("{name} must be finite and non-negative, got {value}")]
    InvalidValue { name: &'static str, value: f64 },

    #[error("{name} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("feature {0} is configured more than once")]
    DuplicateFeature(String),
}
