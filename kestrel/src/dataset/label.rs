use crate::error::{KestrelError, Result};
use derive_more::{Constructor, Display};
use serde::{Deserialize, Serialize};

/// Categorical forward-return label.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Sell,
    Hold,
    Buy,
}

impl Label {
    /// Class index used by classifiers: `Sell = 0`, `Hold = 1`, `Buy = 2`.
    pub fn class_index(&self) -> usize {
        match self {
            Self::Sell => 0,
            Self::Hold => 1,
            Self::Buy => 2,
        }
    }

    pub fn from_class_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Sell),
            1 => Some(Self::Hold),
            2 => Some(Self::Buy),
            _ => None,
        }
    }
}

/// Percentage return from `current` to `future`.
///
/// Callers guarantee `current != 0`.
pub fn forward_return(current: f64, future: f64) -> f64 {
    (future - current) / current * 100.0
}

/// Labels an anchor by its forward return over `horizon` candles against a symmetric
/// percentage threshold.
#[derive(Debug, Copy, Clone, PartialEq, Constructor)]
pub struct LabelGenerator {
    pub horizon: usize,
    pub threshold_percent: f64,
}

impl LabelGenerator {
    /// Label the close at series index `anchor` against the close `horizon` candles later.
    ///
    /// Pure function of `(closes[anchor], closes[anchor + horizon], threshold)`.
    pub fn label(&self, closes: &[f64], anchor: usize) -> Result<Label> {
        let future_index = anchor.checked_add(self.horizon).unwrap_or(usize::MAX);
        let Some(&future) = closes.get(future_index) else {
            return Err(KestrelError::InsufficientData {
                available: closes.len(),
                required: future_index.saturating_add(1),
            });
        };

        let current = closes[anchor];
        if current == 0.0 {
            return Err(KestrelError::InvalidPrice {
                index: anchor,
                price: current,
            });
        }

        Ok(self.classify(forward_return(current, future)))
    }

    /// `Buy` above `threshold`, `Sell` below `-threshold`, otherwise `Hold` (strict bounds).
    pub fn classify(&self, return_percent: f64) -> Label {
        if return_percent > self.threshold_percent {
            Label::Buy
        } else if return_percent < -self.threshold_percent {
            Label::Sell
        } else {
            Label::Hold
        }
    }
}
