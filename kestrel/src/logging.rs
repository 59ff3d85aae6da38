use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialise default non-JSON `Kestrel` logging.
///
/// Defaults to `INFO`, overridable with the `RUST_LOG` environment variable.
///
/// ```
/// use kestrel::{Pipeline, config::PipelineConfig, evaluation::strategy::BuyAndHold};
/// use kestrel_ta::synthetic;
///
/// kestrel::logging::init_logging();
///
/// // Logs one summary line per strategy
/// let series = synthetic::random_walk(3, 120, 100.0, 0.01).unwrap();
/// Pipeline::new(PipelineConfig::backtest())
///     .unwrap()
///     .backtest()
///     .run([("btc", &series)], &[&BuyAndHold])
///     .unwrap();
/// ```
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer())
        .init()
}

/// Initialise default JSON `Kestrel` logging, one flattened object per event.
///
/// ```
/// use kestrel::{Pipeline, config::PipelineConfig};
/// use kestrel_ta::synthetic;
///
/// kestrel::logging::init_json_logging();
///
/// // Computed shapes are logged as JSON events with `RUST_LOG=debug`
/// let series = synthetic::constant(300, 100.0).unwrap();
/// let dataset = Pipeline::new(PipelineConfig::default())
///     .unwrap()
///     .dataset(&series)
///     .unwrap();
/// assert_eq!(dataset.len(), 64);
/// ```
pub fn init_json_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
        .init()
}
