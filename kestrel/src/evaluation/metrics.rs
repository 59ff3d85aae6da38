use crate::{
    config::DEFAULT_ACCURACY_PASS_THRESHOLD_PERCENT,
    error::{KestrelError, Result},
    evaluation::PredictionRecord,
};
use derive_more::{Constructor, Display};
use fnv::FnvHashSet;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::io::Write;

/// Directional accuracy and flat simulated return of one strategy on one asset.
///
/// `total_simulated_return_percent` adds `+1` for every correct prediction and `-1` for every
/// incorrect one (non-compounding).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Metrics {
    pub asset: SmolStr,
    pub strategy: SmolStr,
    pub accuracy_percent: Decimal,
    pub total_simulated_return_percent: Decimal,
    pub sample_count: usize,
}

/// Incrementally evaluates [`PredictionRecord`]s for one (asset, strategy) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyEvaluator {
    asset: SmolStr,
    strategy: SmolStr,
    correct: usize,
    total: usize,
}

impl StrategyEvaluator {
    pub fn init<Asset, Strategy>(asset: Asset, strategy: Strategy) -> Self
    where
        Asset: Into<SmolStr>,
        Strategy: Into<SmolStr>,
    {
        Self {
            asset: asset.into(),
            strategy: strategy.into(),
            correct: 0,
            total: 0,
        }
    }

    /// Evaluate every record of one (asset, strategy) pair.
    pub fn evaluate<Asset, Strategy>(
        asset: Asset,
        strategy: Strategy,
        records: &[PredictionRecord],
    ) -> Result<Metrics>
    where
        Asset: Into<SmolStr>,
        Strategy: Into<SmolStr>,
    {
        let mut evaluator = Self::init(asset, strategy);
        records.iter().for_each(|record| evaluator.update(record));
        evaluator.generate()
    }

    pub fn update(&mut self, record: &PredictionRecord) {
        self.total += 1;
        if record.is_correct() {
            self.correct += 1;
        }
    }

    /// Generate the [`Metrics`] of every record seen so far.
    ///
    /// Fails with [`KestrelError::InsufficientData`] if no record has been seen.
    pub fn generate(&self) -> Result<Metrics> {
        if self.total == 0 {
            return Err(KestrelError::InsufficientData {
                available: 0,
                required: 1,
            });
        }

        let correct = Decimal::from(self.correct);
        let total = Decimal::from(self.total);
        let incorrect = total - correct;

        Ok(Metrics {
            asset: self.asset.clone(),
            strategy: self.strategy.clone(),
            accuracy_percent: correct * Decimal::ONE_HUNDRED / total,
            total_simulated_return_percent: correct - incorrect,
            sample_count: self.total,
        })
    }
}

/// Mean-of-means view of one strategy across every evaluated asset.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StrategyAggregate {
    pub strategy: SmolStr,
    pub assets: Vec<SmolStr>,
    pub mean_accuracy_percent: Decimal,
    pub mean_total_return_percent: Decimal,
    pub sample_count: usize,
}

/// Aggregate [`Metrics`] per strategy, in order of first appearance.
///
/// Every asset contributes equally regardless of its sample count. Fails with
/// [`KestrelError::DuplicateMetrics`] if an (asset, strategy) pair appears more than once.
pub fn aggregate_by_strategy(metrics: &[Metrics]) -> Result<IndexMap<SmolStr, StrategyAggregate>> {
    let mut seen = FnvHashSet::default();
    let mut grouped = IndexMap::<SmolStr, Vec<&Metrics>>::new();

    for metric in metrics {
        if !seen.insert((&metric.asset, &metric.strategy)) {
            return Err(KestrelError::DuplicateMetrics {
                asset: metric.asset.clone(),
                strategy: metric.strategy.clone(),
            });
        }
        grouped
            .entry(metric.strategy.clone())
            .or_default()
            .push(metric);
    }

    Ok(grouped
        .into_iter()
        .map(|(strategy, metrics)| {
            let count = Decimal::from(metrics.len());
            let aggregate = StrategyAggregate {
                strategy: strategy.clone(),
                assets: metrics.iter().map(|metric| metric.asset.clone()).collect(),
                mean_accuracy_percent: metrics
                    .iter()
                    .map(|metric| metric.accuracy_percent)
                    .sum::<Decimal>()
                    / count,
                mean_total_return_percent: metrics
                    .iter()
                    .map(|metric| metric.total_simulated_return_percent)
                    .sum::<Decimal>()
                    / count,
                sample_count: metrics.iter().map(|metric| metric.sample_count).sum(),
            };
            (strategy, aggregate)
        })
        .collect())
}

/// Pass or fail outcome of an [`AcceptanceGate`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, Display)]
pub enum Verdict {
    #[display("PASS")]
    Pass,
    #[display("FAIL")]
    Fail,
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// Minimum aggregate accuracy (percent, inclusive) for a strategy to pass.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Serialize, Constructor)]
pub struct AcceptanceGate {
    #[serde(with = "rust_decimal::serde::float")]
    pub threshold_percent: Decimal,
}

impl Default for AcceptanceGate {
    fn default() -> Self {
        Self::new(DEFAULT_ACCURACY_PASS_THRESHOLD_PERCENT)
    }
}

impl AcceptanceGate {
    pub fn verdict(&self, accuracy_percent: Decimal) -> Verdict {
        if accuracy_percent >= self.threshold_percent {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }

    pub fn judge(&self, aggregate: &StrategyAggregate) -> Verdict {
        self.verdict(aggregate.mean_accuracy_percent)
    }
}

/// Metrics file record, percentages rounded to 2 decimal places.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MetricsRecord {
    pub asset: SmolStr,
    pub strategy: SmolStr,
    #[serde(with = "rust_decimal::serde::float")]
    pub accuracy: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_return: Decimal,
    pub num_predictions: usize,
}

impl From<&Metrics> for MetricsRecord {
    fn from(value: &Metrics) -> Self {
        Self {
            asset: value.asset.clone(),
            strategy: value.strategy.clone(),
            accuracy: value.accuracy_percent.round_dp(2),
            total_return: value.total_simulated_return_percent.round_dp(2),
            num_predictions: value.sample_count,
        }
    }
}

/// Write `metrics` as a JSON array of [`MetricsRecord`]s.
pub fn write_metrics_json<W>(writer: W, metrics: &[Metrics]) -> Result<()>
where
    W: Write,
{
    let records = metrics.iter().map(MetricsRecord::from).collect::<Vec<_>>();
    serde_json::to_writer_pretty(writer, &records)?;
    Ok(())
}
