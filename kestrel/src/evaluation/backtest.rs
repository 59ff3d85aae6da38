use crate::{
    config::PipelineConfig,
    error::{KestrelError, Result},
    evaluation::{
        Direction, PredictionRecord,
        metrics::{
            AcceptanceGate, Metrics, StrategyAggregate, StrategyEvaluator, Verdict,
            aggregate_by_strategy, write_metrics_json,
        },
        strategy::DirectionalStrategy,
    },
};
use indexmap::IndexMap;
use itertools::Itertools;
use kestrel_ta::CandleSeries;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::io::Write;
use tracing::{debug, info, warn};

/// An (asset, strategy) pair excluded from a [`BacktestReport`].
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct SkippedPair {
    pub asset: SmolStr,
    pub strategy: SmolStr,
    pub reason: String,
}

/// Outcome of a [`Backtest`] batch.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BacktestReport {
    pub metrics: Vec<Metrics>,
    pub skipped: Vec<SkippedPair>,
    pub aggregates: IndexMap<SmolStr, StrategyAggregate>,
    pub gate: AcceptanceGate,
}

impl BacktestReport {
    /// [`Verdict`] of every aggregated strategy, in order of first appearance.
    pub fn verdicts(&self) -> impl Iterator<Item = (&SmolStr, Verdict)> + '_ {
        self.aggregates
            .iter()
            .map(|(strategy, aggregate)| (strategy, self.gate.judge(aggregate)))
    }

    pub fn verdict(&self, strategy: &str) -> Option<Verdict> {
        self.aggregates
            .get(strategy)
            .map(|aggregate| self.gate.judge(aggregate))
    }

    /// Write the per-pair [`Metrics`] as a JSON array.
    pub fn write_metrics_json<W>(&self, writer: W) -> Result<()>
    where
        W: Write,
    {
        write_metrics_json(writer, &self.metrics)
    }
}

/// Evaluates directional strategies on many assets over the same candle index range.
///
/// For a series of `len` candles every strategy predicts indices `[start, len - 1)`, paired with
/// the realised [`Direction`] from `close[i]` to `close[i + 1]`. `start` is the larger of the
/// configured start index and the history every strategy in the batch requires, so all
/// strategies are scored on identical samples.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Backtest {
    pub start_index: usize,
    pub gate: AcceptanceGate,
}

impl Backtest {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            start_index: config.sequence_length,
            gate: AcceptanceGate::new(config.accuracy_pass_threshold_percent),
        }
    }

    /// Run every strategy over every asset.
    ///
    /// A [`KestrelError::MissingArtifact`] skips only the affected pair, any other error aborts
    /// the batch.
    pub fn run<'a, Assets>(
        &self,
        assets: Assets,
        strategies: &[&dyn DirectionalStrategy],
    ) -> Result<BacktestReport>
    where
        Assets: IntoIterator<Item = (&'a str, &'a CandleSeries)>,
    {
        let start = strategies
            .iter()
            .map(|strategy| strategy.min_history())
            .fold(self.start_index, usize::max);

        let mut metrics = Vec::new();
        let mut skipped = Vec::new();

        for (asset, series) in assets {
            let end = series.len().saturating_sub(1);
            if end <= start {
                return Err(KestrelError::InsufficientData {
                    available: series.len(),
                    required: start + 2,
                });
            }

            let actuals = series
                .candles()
                .iter()
                .tuple_windows()
                .skip(start)
                .map(|(current, next)| Direction::between(current.close, next.close))
                .collect::<Vec<_>>();

            for strategy in strategies {
                let predictions = match strategy.predict(asset, series, start..end) {
                    Ok(predictions) => predictions,
                    Err(error) if error.is_skippable() => {
                        warn!(%asset, strategy = strategy.name(), %error, "skipping strategy");
                        skipped.push(SkippedPair {
                            asset: asset.into(),
                            strategy: strategy.name().into(),
                            reason: error.to_string(),
                        });
                        continue;
                    }
                    Err(error) => return Err(error),
                };

                if predictions.len() != actuals.len() {
                    return Err(KestrelError::PredictionCount {
                        strategy: strategy.name().into(),
                        expected: actuals.len(),
                        actual: predictions.len(),
                    });
                }

                let records = predictions
                    .into_iter()
                    .zip(actuals.iter().copied())
                    .map(|(predicted, actual)| PredictionRecord::new(predicted, actual))
                    .collect::<Vec<_>>();

                let metric = StrategyEvaluator::evaluate(asset, strategy.name(), &records)?;
                debug!(
                    %asset,
                    strategy = strategy.name(),
                    accuracy = %metric.accuracy_percent.round_dp(2),
                    samples = metric.sample_count,
                    "evaluated strategy"
                );
                metrics.push(metric);
            }
        }

        let aggregates = aggregate_by_strategy(&metrics)?;
        let report = BacktestReport {
            metrics,
            skipped,
            aggregates,
            gate: self.gate,
        };

        for (strategy, verdict) in report.verdicts() {
            let aggregate = &report.aggregates[strategy];
            info!(
                %strategy,
                %verdict,
                accuracy = %aggregate.mean_accuracy_percent.round_dp(2),
                total_return = %aggregate.mean_total_return_percent.round_dp(2),
                assets = aggregate.assets.len(),
                "strategy backtest summary"
            );
        }

        Ok(report)
    }
}
