//! Deterministic synthetic [`CandleSeries`] generators, used as a fallback when no market data
//! is available and as fixtures for degenerate input handling.

use crate::{
    candle::{Candle, CandleSeries},
    error::InputError,
};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Spacing between synthetic candle `open_time`s (5 minutes).
pub const SYNTHETIC_INTERVAL_MS: i64 = 300_000;

/// Volume assigned to every synthetic candle.
pub const SYNTHETIC_VOLUME: f64 = 1_000.0;

/// Flat series where every OHLC field equals `price`.
pub fn constant(len: usize, price: f64) -> Result<CandleSeries, InputError> {
    from_closes(std::iter::repeat_n(price, len))
}

/// Evenly spaced closes from `start` to `end` inclusive.
pub fn linear(len: usize, start: f64, end: f64) -> Result<CandleSeries, InputError> {
    let step = match len {
        0 | 1 => 0.0,
        len => (end - start) / (len - 1) as f64,
    };
    from_closes((0..len).map(|index| start + step * index as f64))
}

/// Seeded multiplicative random walk: each close moves by a uniform fraction in
/// `[-max_step, max_step]` of the previous close.
///
/// The same `seed` always yields the same series.
pub fn random_walk(
    seed: u64,
    len: usize,
    start: f64,
    max_step: f64,
) -> Result<CandleSeries, InputError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let step = max_step.abs();

    let closes = (0..len)
        .scan(start, |close, index| {
            if index > 0 && step > 0.0 {
                *close = (*close * (1.0 + rng.random_range(-step..=step))).max(0.0);
            }
            Some(*close)
        })
        .collect::<Vec<_>>();

    from_closes(closes)
}

fn from_closes<Iter>(closes: Iter) -> Result<CandleSeries, InputError>
where
    Iter: IntoIterator<Item = f64>,
{
    let mut prev_close = None;
    let candles = closes
        .into_iter()
        .enumerate()
        .map(|(index, close)| {
            let open = prev_close.unwrap_or(close);
            prev_close = Some(close);
            Candle::new(
                index as i64 * SYNTHETIC_INTERVAL_MS,
                open,
                open.max(close),
                open.min(close),
                close,
                SYNTHETIC_VOLUME,
            )
        })
        .collect();

    CandleSeries::new(candles)
}
