use crate::evaluation::{
    backtest::BacktestReport,
    metrics::{Metrics, StrategyAggregate},
};
use prettytable::{Cell, Row, Table};

impl BacktestReport {
    pub fn print_summary(&self) {
        println!();
        self.strategy_table().printstd();
        self.metrics_table().printstd();
        if !self.skipped.is_empty() {
            self.skipped_table().printstd();
        }
    }

    pub fn strategy_table(&self) -> Table {
        let mut table = Table::new();

        // Styling
        table.set_format(*prettytable::format::consts::FORMAT_BOX_CHARS);

        // Title row spanning all columns
        let num_columns = self.aggregates.len() + 1;
        let mut title_row = Row::new(vec![]);
        let mut title_cell = Cell::new(&format!(
            "Strategy Summary (pass >= {}%)",
            self.gate.threshold_percent.round_dp(2)
        ))
        .style_spec("bcB");
        title_cell.set_hspan(num_columns);
        title_row.add_cell(title_cell);
        table.add_row(title_row);

        // Header row (eg/ Metric | ai_model | sma_momentum | ... )
        let mut header_row = Row::new(vec![Cell::new("").style_spec("bcB")]);
        for strategy in self.aggregates.keys() {
            header_row.add_cell(Cell::new(strategy.as_str()).style_spec("bcB"));
        }
        table.add_row(header_row);

        self.add_strategy_metric_row(&mut table, "Avg Accuracy", |aggregate| {
            format!("{:.2}%", aggregate.mean_accuracy_percent)
        });
        self.add_strategy_metric_row(&mut table, "Avg Return", |aggregate| {
            format!("{:+.2}%", aggregate.mean_total_return_percent)
        });
        self.add_strategy_metric_row(&mut table, "Assets", |aggregate| {
            aggregate.assets.len().to_string()
        });
        self.add_strategy_metric_row(&mut table, "Predictions", |aggregate| {
            aggregate.sample_count.to_string()
        });
        self.add_strategy_metric_row(&mut table, "Verdict", |aggregate| {
            self.gate.judge(aggregate).to_string()
        });

        table
    }

    fn add_strategy_metric_row<F>(&self, table: &mut Table, label: &str, format_value: F)
    where
        F: Fn(&StrategyAggregate) -> String,
    {
        let mut row = Row::new(vec![Cell::new(label).style_spec("bcB")]);
        for aggregate in self.aggregates.values() {
            row.add_cell(Cell::new(&format_value(aggregate)));
        }
        table.add_row(row);
    }

    pub fn metrics_table(&self) -> Table {
        let mut table = Table::new();
        table.set_format(*prettytable::format::consts::FORMAT_BOX_CHARS);

        let mut title_cell = Cell::new("Detailed Results by Asset").style_spec("bcB");
        title_cell.set_hspan(5);
        table.add_row(Row::new(vec![title_cell]));

        table.add_row(Row::new(
            ["Asset", "Strategy", "Accuracy", "Return", "Predictions"]
                .into_iter()
                .map(|header| Cell::new(header).style_spec("bcB"))
                .collect(),
        ));

        for Metrics {
            asset,
            strategy,
            accuracy_percent,
            total_simulated_return_percent,
            sample_count,
        } in &self.metrics
        {
            table.add_row(Row::new(vec![
                Cell::new(asset.as_str()),
                Cell::new(strategy.as_str()),
                Cell::new(&format!("{accuracy_percent:.2}%")).style_spec("r"),
                Cell::new(&format!("{total_simulated_return_percent:+.2}%")).style_spec("r"),
                Cell::new(&sample_count.to_string()).style_spec("r"),
            ]));
        }

        table
    }

    pub fn skipped_table(&self) -> Table {
        let mut table = Table::new();
        table.set_format(*prettytable::format::consts::FORMAT_BOX_CHARS);

        let mut title_cell = Cell::new("Skipped").style_spec("bcB");
        title_cell.set_hspan(3);
        table.add_row(Row::new(vec![title_cell]));

        for skipped in &self.skipped {
            table.add_row(Row::new(vec![
                Cell::new(skipped.asset.as_str()),
                Cell::new(skipped.strategy.as_str()),
                Cell::new(&skipped.reason),
            ]));
        }

        table
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        config::PipelineConfig,
        evaluation::{backtest::Backtest, strategy::BuyAndHold},
    };
    use kestrel_ta::synthetic;

    #[test]
    fn test_tables_render_every_pair() {
        let btc = synthetic::linear(60, 10.0, 20.0).unwrap();
        let eth = synthetic::linear(60, 20.0, 10.0).unwrap();

        let report = Backtest::new(&PipelineConfig::backtest())
            .run([("btc", &btc), ("eth", &eth)], &[&BuyAndHold])
            .unwrap();

        let strategies = report.strategy_table().to_string();
        assert!(strategies.contains("buy_and_hold"));
        assert!(strategies.contains("50.00%"));
        assert!(strategies.contains("FAIL"));

        let metrics = report.metrics_table().to_string();
        assert!(metrics.contains("btc"));
        assert!(metrics.contains("eth"));
        assert!(metrics.contains("100.00%"));
        assert!(metrics.contains("+29.00%"));
        assert!(metrics.contains("-29.00%"));
    }
}
