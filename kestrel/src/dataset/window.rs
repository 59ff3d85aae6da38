use crate::error::{KestrelError, Result};
use kestrel_ta::{FeatureMatrix, error::ConfigError};

/// Slices a [`FeatureMatrix`] into fixed-length overlapping [`Window`]s.
#[derive(Debug, Copy, Clone)]
pub struct WindowBuilder;

impl WindowBuilder {
    /// Construct the [`Windows`] of `seq_length` rows whose anchors leave `horizon` rows of
    /// lookahead inside the matrix.
    ///
    /// Anchors run from `seq_length` to `matrix_len - horizon - 1` inclusive with stride 1.
    /// Fails with [`KestrelError::InsufficientData`] when no anchor satisfies both bounds.
    pub fn build(
        matrix: &FeatureMatrix,
        seq_length: usize,
        horizon: usize,
    ) -> Result<Windows<'_>> {
        if seq_length == 0 {
            return Err(ConfigError::Zero {
                name: "sequence_length",
            }
            .into());
        }

        let required = seq_length
            .checked_add(horizon)
            .and_then(|rows| rows.checked_add(1))
            .unwrap_or(usize::MAX);
        if matrix.len() < required {
            return Err(KestrelError::InsufficientData {
                available: matrix.len(),
                required,
            });
        }

        Ok(Windows {
            matrix,
            seq_length,
            next: seq_length,
            end: matrix.len() - horizon,
        })
    }
}

/// Contiguous `seq_length` rows of a [`FeatureMatrix`] ending (exclusive) at `anchor`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Window<'a> {
    /// Matrix-relative anchor row.
    pub anchor: usize,
    /// Candle series index of the anchor row.
    pub series_index: usize,
    width: usize,
    values: &'a [f64],
}

impl<'a> Window<'a> {
    /// Row-major values of every row in the [`Window`].
    pub fn values(&self) -> &'a [f64] {
        self.values
    }

    pub fn rows(&self) -> std::slice::ChunksExact<'a, f64> {
        self.values.chunks_exact(self.width.max(1))
    }

    /// Number of rows (the sequence length).
    pub fn len(&self) -> usize {
        match self.width {
            0 => 0,
            width => self.values.len() / width,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn width(&self) -> usize {
        self.width
    }
}

/// Lazy, restartable iterator of [`Window`]s with strictly increasing anchors.
#[derive(Debug, Clone)]
pub struct Windows<'a> {
    matrix: &'a FeatureMatrix,
    seq_length: usize,
    next: usize,
    end: usize,
}

impl<'a> Iterator for Windows<'a> {
    type Item = Window<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }

        let anchor = self.next;
        self.next += 1;

        Some(Window {
            anchor,
            series_index: self.matrix.series_index(anchor),
            width: self.matrix.width(),
            values: self.matrix.rows_between(anchor - self.seq_length, anchor)?,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Windows<'_> {}

impl std::iter::FusedIterator for Windows<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_ta::{
        IndicatorConfig, IndicatorEngine,
        indicator::{CrossoverMode, Indicator, WindowBoundary},
        synthetic,
    };

    // Warmup 1, single flag column
    fn matrix(len: usize) -> FeatureMatrix {
        let config = IndicatorConfig {
            boundary: WindowBoundary::Inclusive,
            indicators: vec![Indicator::SmaCrossover {
                fast: 1,
                slow: 2,
                mode: CrossoverMode::Flag,
            }],
        };
        IndicatorEngine::new(config)
            .unwrap()
            .compute(&synthetic::linear(len + 1, 1.0, (len + 1) as f64).unwrap())
            .unwrap()
    }

    #[test]
    fn test_window_count() {
        struct TestCase {
            matrix_len: usize,
            seq_length: usize,
            horizon: usize,
            expected: Option<usize>,
        }

        let cases = vec![
            // TC0: room for several windows
            TestCase {
                matrix_len: 100,
                seq_length: 30,
                horizon: 6,
                expected: Some(64),
            },
            // TC1: exactly one window
            TestCase {
                matrix_len: 37,
                seq_length: 30,
                horizon: 6,
                expected: Some(1),
            },
            // TC2: zero windows possible
            TestCase {
                matrix_len: 36,
                seq_length: 30,
                horizon: 6,
                expected: None,
            },
            // TC3: sequence longer than matrix
            TestCase {
                matrix_len: 10,
                seq_length: 60,
                horizon: 1,
                expected: None,
            },
            // TC4: horizon overflowing the required length
            TestCase {
                matrix_len: 10,
                seq_length: 2,
                horizon: usize::MAX,
                expected: None,
            },
        ];

        for (index, test) in cases.into_iter().enumerate() {
            let matrix = matrix(test.matrix_len);
            assert_eq!(matrix.len(), test.matrix_len, "TC{index} failed setup");

            let actual = WindowBuilder::build(&matrix, test.seq_length, test.horizon)
                .ok()
                .map(|windows| windows.len());
            assert_eq!(actual, test.expected, "TC{index} failed");
        }
    }

    #[test]
    fn test_anchors_and_bounds() {
        let matrix = matrix(50);
        let windows = WindowBuilder::build(&matrix, 10, 5).unwrap();

        let anchors = windows.clone().map(|window| window.anchor).collect::<Vec<_>>();
        assert_eq!(anchors, (10..45).collect::<Vec<_>>());

        for window in windows {
            assert_eq!(window.len(), 10);
            assert_eq!(window.series_index, window.anchor + 1);
            assert!(window.anchor + 5 < matrix.len());
            assert_eq!(
                window.values(),
                matrix.rows_between(window.anchor - 10, window.anchor).unwrap()
            );
        }
    }

    #[test]
    fn test_restartable() {
        let matrix = matrix(40);
        let windows = WindowBuilder::build(&matrix, 5, 2).unwrap();

        let first = windows.clone().collect::<Vec<_>>();
        let second = windows.collect::<Vec<_>>();
        assert_eq!(first, second);
    }

    #[test]
    fn test_insufficient_data() {
        let matrix = matrix(20);
        assert!(matches!(
            WindowBuilder::build(&matrix, 15, 5),
            Err(KestrelError::InsufficientData {
                available: 20,
                required: 21
            })
        ));
        assert!(matches!(
            WindowBuilder::build(&matrix, 0, 5),
            Err(KestrelError::Config(_))
        ));
    }
}
