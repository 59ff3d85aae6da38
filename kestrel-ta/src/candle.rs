use crate::error::InputError;
use chrono::{DateTime, Utc};
use derive_more::Constructor;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Normalised OHLCV [`Candle`] model.
///
/// `open_time` is a unix timestamp in milliseconds, as delivered by exchange kline endpoints.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Deserialize, Serialize, Constructor)]
pub struct Candle {
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// `open_time` as a [`DateTime<Utc>`], if it is within the representable range.
    pub fn open_time_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.open_time)
    }

    /// True range of this candle given the previous candle close.
    pub fn true_range(&self, prev_close: f64) -> f64 {
        (self.high - self.low)
            .max((self.high - prev_close).abs())
            .max((self.low - prev_close).abs())
    }

    fn fields(&self) -> [(&'static str, f64); 5] {
        [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ]
    }
}

impl From<(i64, f64, f64, f64, f64, f64)> for Candle {
    fn from((open_time, open, high, low, close, volume): (i64, f64, f64, f64, f64, f64)) -> Self {
        Self::new(open_time, open, high, low, close, volume)
    }
}

/// Validated, ordered in-memory OHLCV history.
///
/// Guarantees:
/// - At least one [`Candle`].
/// - Every price and volume field is finite and non-negative.
/// - `open_time` is strictly increasing. Gaps are accepted as-is, all downstream computation is
///   index based.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Validate and construct a [`CandleSeries`].
    pub fn new(candles: Vec<Candle>) -> Result<Self, InputError> {
        if candles.is_empty() {
            return Err(InputError::EmptySeries);
        }

        for (index, candle) in candles.iter().enumerate() {
            for (field, value) in candle.fields() {
                if !value.is_finite() {
                    return Err(InputError::NonFinite { index, field });
                }
                if value < 0.0 {
                    return Err(InputError::Negative {
                        index,
                        field,
                        value,
                    });
                }
            }
        }

        if let Some((index, (prev, next))) = candles
            .iter()
            .tuple_windows()
            .enumerate()
            .find(|(_, (prev, next))| next.open_time <= prev.open_time)
        {
            return Err(InputError::Unordered {
                index: index + 1,
                previous: prev.open_time,
                current: next.open_time,
            });
        }

        Ok(Self { candles })
    }

    /// Validate and construct a [`CandleSeries`] from any records convertible into [`Candle`].
    pub fn from_records<Iter, Record>(records: Iter) -> Result<Self, InputError>
    where
        Iter: IntoIterator<Item = Record>,
        Record: Into<Candle>,
    {
        Self::new(records.into_iter().map(Into::into).collect())
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    pub fn first(&self) -> Option<&Candle> {
        self.candles.first()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|candle| candle.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.candles.iter().map(|candle| candle.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.candles.iter().map(|candle| candle.low).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.candles.iter().map(|candle| candle.volume).collect()
    }
}

impl<'de> Deserialize<'de> for CandleSeries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let candles = Vec::<Candle>::deserialize(deserializer)?;
        Self::new(candles).map_err(serde::de::Error::custom)
    }
}

impl<'a> IntoIterator for &'a CandleSeries {
    type Item = &'a Candle;
    type IntoIter = std::slice::Iter<'a, Candle>;

    fn into_iter(self) -> Self::IntoIter {
        self.candles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(open_time: i64, close: f64) -> Candle {
        Candle::new(open_time, close, close, close, close, 1.0)
    }

    #[test]
    fn test_candle_series_new() {
        struct TestCase {
            input: Vec<Candle>,
            expected: Result<usize, InputError>,
        }

        let cases = vec![
            // TC0: valid ascending series
            TestCase {
                input: vec![candle(1, 10.0), candle(2, 11.0), candle(5, 12.0)],
                expected: Ok(3),
            },
            // TC1: empty series
            TestCase {
                input: vec![],
                expected: Err(InputError::EmptySeries),
            },
            // TC2: duplicate open_time
            TestCase {
                input: vec![candle(1, 10.0), candle(2, 11.0), candle(2, 12.0)],
                expected: Err(InputError::Unordered {
                    index: 2,
                    previous: 2,
                    current: 2,
                }),
            },
            // TC3: descending open_time
            TestCase {
                input: vec![candle(3, 10.0), candle(2, 11.0)],
                expected: Err(InputError::Unordered {
                    index: 1,
                    previous: 3,
                    current: 2,
                }),
            },
            // TC4: NaN close
            TestCase {
                input: vec![candle(1, 10.0), Candle::new(2, 1.0, 1.0, 1.0, f64::NAN, 1.0)],
                expected: Err(InputError::NonFinite {
                    index: 1,
                    field: "close",
                }),
            },
            // TC5: negative volume
            TestCase {
                input: vec![Candle::new(1, 1.0, 1.0, 1.0, 1.0, -2.0)],
                expected: Err(InputError::Negative {
                    index: 0,
                    field: "volume",
                    value: -2.0,
                }),
            },
            // TC6: zero prices are accepted
            TestCase {
                input: vec![candle(1, 0.0), candle(2, 0.0)],
                expected: Ok(2),
            },
        ];

        for (index, test) in cases.into_iter().enumerate() {
            let actual = CandleSeries::new(test.input).map(|series| series.len());
            assert_eq!(actual, test.expected, "TC{index} failed");
        }
    }

    #[test]
    fn test_true_range() {
        let candle = Candle::new(0, 10.0, 12.0, 9.0, 11.0, 1.0);

        // high - low dominates
        assert_eq!(candle.true_range(10.0), 3.0);
        // gap up from previous close
        assert_eq!(candle.true_range(5.0), 7.0);
        // gap down from previous close
        assert_eq!(candle.true_range(16.0), 7.0);
    }

    #[test]
    fn test_deserialize_validates() {
        let valid = r#"[
            {"open_time": 1, "open": 1.0, "high": 1.0, "low": 1.0, "close": 1.0, "volume": 1.0},
            {"open_time": 2, "open": 1.0, "high": 1.0, "low": 1.0, "close": 1.0, "volume": 1.0}
        ]"#;
        assert_eq!(serde_json::from_str::<CandleSeries>(valid).unwrap().len(), 2);

        let unordered = r#"[
            {"open_time": 2, "open": 1.0, "high": 1.0, "low": 1.0, "close": 1.0, "volume": 1.0},
            {"open_time": 1, "open": 1.0, "high": 1.0, "low": 1.0, "close": 1.0, "volume": 1.0}
        ]"#;
        assert!(serde_json::from_str::<CandleSeries>(unordered).is_err());
    }

    #[test]
    fn test_open_time_utc() {
        let candle = candle(1_700_000_000_000, 1.0);
        assert_eq!(
            candle.open_time_utc().unwrap().timestamp_millis(),
            1_700_000_000_000
        );
    }
}
