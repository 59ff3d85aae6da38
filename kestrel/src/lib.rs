#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_crate_dependencies,
    unused_extern_crates,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    missing_debug_implementations,
    rust_2018_idioms,
    rust_2024_compatibility
)]

//! # Kestrel
//! Indicator feature, labeling and directional backtest pipeline for sequence trading models.
//!
//! * **Features**: [`kestrel_ta`] turns a validated OHLCV [`CandleSeries`](kestrel_ta::CandleSeries)
//!   into a fixed-width [`FeatureMatrix`](kestrel_ta::FeatureMatrix), excluding the warm-up rows.
//! * **Dataset**: [`dataset`] slices the matrix into overlapping windows, labels each anchor by
//!   its forward return and standardises features with serialisable [`ScalerParams`](dataset::scaler::ScalerParams).
//! * **Evaluation**: [`evaluation`] scores directional strategies against realised price moves,
//!   aggregates accuracy and flat simulated return per strategy, and gates acceptance.
//!
//! Nothing here trains a model or performs network or file I/O: model inference is supplied via
//! [`SequenceModel`](evaluation::strategy::SequenceModel) and output is written to any
//! [`std::io::Write`].
//!
//! ## Example
//! ```
//! use kestrel::{
//!     Pipeline,
//!     config::PipelineConfig,
//!     dataset::label::Label,
//!     evaluation::strategy::{BuyAndHold, SmaMomentum},
//! };
//! use kestrel_ta::synthetic;
//!
//! let series = synthetic::linear(300, 100.0, 130.0).unwrap();
//!
//! let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
//! let dataset = pipeline.dataset(&series).unwrap();
//! assert!(dataset.labels().all(|label| label == Label::Buy));
//!
//! let report = pipeline
//!     .backtest()
//!     .run([("btc", &series)], &[&BuyAndHold, &SmaMomentum::default()])
//!     .unwrap();
//! assert_eq!(report.metrics.len(), 2);
//! ```

pub use kestrel_ta;

/// Immutable pipeline configuration and presets.
pub mod config;

/// Windowed, labeled and standardised training data.
pub mod dataset;

/// Kestrel errors.
pub mod error;

/// Strategy evaluation, aggregation and reporting.
pub mod evaluation;

/// Logging initialisers.
pub mod logging;

/// [`Pipeline`] bundling a validated configuration with its components.
pub mod pipeline;

pub use error::{KestrelError, Result};
pub use pipeline::Pipeline;
