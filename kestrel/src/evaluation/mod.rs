use derive_more::{Constructor, Display};
use serde::{Deserialize, Serialize};

/// Batch evaluation of strategies over many assets.
pub mod backtest;

/// Summary tables for a [`BacktestReport`](backtest::BacktestReport).
pub mod display;

/// Accuracy and flat simulated return [`Metrics`](metrics::Metrics), their aggregation per
/// strategy and the acceptance gate.
pub mod metrics;

/// Directional prediction strategies.
pub mod strategy;

/// Realised price direction between consecutive closes.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
#[serde(into = "i8", try_from = "i8")]
pub enum Direction {
    #[display("up")]
    Up,
    #[display("down")]
    Down,
}

impl Direction {
    /// `Up` if `next > current`, otherwise `Down` (ties are `Down`).
    pub fn between(current: f64, next: f64) -> Self {
        if next > current { Self::Up } else { Self::Down }
    }
}

impl From<Direction> for i8 {
    fn from(value: Direction) -> Self {
        match value {
            Direction::Up => 1,
            Direction::Down => -1,
        }
    }
}

impl TryFrom<i8> for Direction {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Up),
            -1 => Ok(Self::Down),
            other => Err(format!("invalid direction {other}, expected 1 or -1")),
        }
    }
}

/// Directional prediction `+1 / -1`, or `0` when a strategy could not produce one.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
#[serde(into = "i8", try_from = "i8")]
pub enum Prediction {
    #[display("up")]
    Up,
    #[display("down")]
    Down,
    #[display("abstain")]
    Abstain,
}

impl Prediction {
    /// An [`Prediction::Abstain`] is never correct.
    pub fn is_correct(&self, actual: Direction) -> bool {
        matches!(
            (self, actual),
            (Self::Up, Direction::Up) | (Self::Down, Direction::Down)
        )
    }
}

impl From<Direction> for Prediction {
    fn from(value: Direction) -> Self {
        match value {
            Direction::Up => Self::Up,
            Direction::Down => Self::Down,
        }
    }
}

impl From<Prediction> for i8 {
    fn from(value: Prediction) -> Self {
        match value {
            Prediction::Up => 1,
            Prediction::Down => -1,
            Prediction::Abstain => 0,
        }
    }
}

impl TryFrom<i8> for Prediction {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Up),
            -1 => Ok(Self::Down),
            0 => Ok(Self::Abstain),
            other => Err(format!("invalid prediction {other}, expected 1, 0 or -1")),
        }
    }
}

/// A strategy prediction paired with the realised [`Direction`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, Constructor)]
pub struct PredictionRecord {
    pub predicted: Prediction,
    pub actual: Direction,
}

impl PredictionRecord {
    pub fn is_correct(&self) -> bool {
        self.predicted.is_correct(self.actual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_between() {
        assert_eq!(Direction::between(1.0, 2.0), Direction::Up);
        assert_eq!(Direction::between(2.0, 1.0), Direction::Down);
        assert_eq!(Direction::between(1.0, 1.0), Direction::Down);
    }

    #[test]
    fn test_prediction_is_correct() {
        struct TestCase {
            input: PredictionRecord,
            expected: bool,
        }

        let cases = vec![
            // TC0: up matches up
            TestCase {
                input: PredictionRecord::new(Prediction::Up, Direction::Up),
                expected: true,
            },
            // TC1: down matches down
            TestCase {
                input: PredictionRecord::new(Prediction::Down, Direction::Down),
                expected: true,
            },
            // TC2: mismatch
            TestCase {
                input: PredictionRecord::new(Prediction::Up, Direction::Down),
                expected: false,
            },
            // TC3: abstain is always incorrect
            TestCase {
                input: PredictionRecord::new(Prediction::Abstain, Direction::Up),
                expected: false,
            },
            // TC4: abstain is always incorrect
            TestCase {
                input: PredictionRecord::new(Prediction::Abstain, Direction::Down),
                expected: false,
            },
        ];

        for (index, test) in cases.into_iter().enumerate() {
            assert_eq!(test.input.is_correct(), test.expected, "TC{index} failed");
        }
    }

    #[test]
    fn test_serde_as_signed_integers() {
        let record = PredictionRecord::new(Prediction::Abstain, Direction::Down);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"predicted":0,"actual":-1}"#);
        assert_eq!(
            serde_json::from_str::<PredictionRecord>(&json).unwrap(),
            record
        );

        assert!(serde_json::from_str::<Direction>("0").is_err());
        assert!(serde_json::from_str::<Prediction>("2").is_err());
    }
}
