use criterion::{Criterion, Throughput};
use kestrel::{
    Pipeline,
    config::{PipelineConfig, Timeframe},
    evaluation::strategy::{BuyAndHold, SmaMomentum},
};
use kestrel_ta::{CandleSeries, synthetic};
use std::hint::black_box;

criterion::criterion_main!(benchmark_pipeline);

const SERIES_LEN: usize = 5_000;

fn benchmark_pipeline() {
    let series = synthetic::random_walk(42, SERIES_LEN, 100.0, 0.01)
        .expect("random walk closes are finite and non-negative");

    let mut c = Criterion::default().without_plots();

    bench_features(&mut c, &series);
    bench_dataset(&mut c, &series);
    bench_backtest(&mut c, &series);
}

fn bench_features(c: &mut Criterion, series: &CandleSeries) {
    let mut group = c.benchmark_group("Features");
    group.warm_up_time(std::time::Duration::from_secs(1));
    group.measurement_time(std::time::Duration::from_secs(5));
    group.throughput(Throughput::Elements(SERIES_LEN as u64));

    for (name, config) in [
        ("Sequence Model", PipelineConfig::default()),
        ("Multi Timeframe", PipelineConfig::multi_timeframe(Timeframe::Hours1)),
    ] {
        let pipeline = Pipeline::new(config).expect("preset is valid");
        group.bench_function(name, |b| {
            b.iter(|| pipeline.features(black_box(series)).expect("series is long enough"))
        });
    }

    group.finish();
}

fn bench_dataset(c: &mut Criterion, series: &CandleSeries) {
    let pipeline = Pipeline::new(PipelineConfig::default()).expect("preset is valid");

    let mut group = c.benchmark_group("Dataset");
    group.warm_up_time(std::time::Duration::from_secs(1));
    group.measurement_time(std::time::Duration::from_secs(10));
    group.sample_size(50);
    group.throughput(Throughput::Elements(SERIES_LEN as u64));

    group.bench_function("Labeled", |b| {
        b.iter(|| pipeline.dataset(black_box(series)).expect("series is long enough"))
    });
    group.bench_function("Scaled Features", |b| {
        b.iter(|| {
            pipeline
                .scaled_features(black_box(series))
                .expect("series is long enough")
        })
    });

    group.finish();
}

fn bench_backtest(c: &mut Criterion, series: &CandleSeries) {
    let backtest = Pipeline::new(PipelineConfig::backtest())
        .expect("preset is valid")
        .backtest();
    let momentum = SmaMomentum::default();

    let mut group = c.benchmark_group("Backtest");
    group.warm_up_time(std::time::Duration::from_secs(1));
    group.measurement_time(std::time::Duration::from_secs(5));
    group.throughput(Throughput::Elements(2));

    group.bench_function("Baselines", |b| {
        b.iter(|| {
            backtest
                .run([("btc", black_box(series))], &[&BuyAndHold, &momentum])
                .expect("baselines never fail")
        })
    });

    group.finish();
}
