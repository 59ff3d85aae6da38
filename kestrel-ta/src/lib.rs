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

//! Candle series and technical indicator features for Kestrel.
//!
//! This crate validates OHLCV history, computes fixed-width indicator feature vectors over it
//! and provides deterministic synthetic series for degenerate input handling.
//!
//! ```
//! use kestrel_ta::{config::IndicatorConfig, engine::IndicatorEngine, synthetic};
//!
//! let series = synthetic::linear(300, 100.0, 130.0).unwrap();
//! let engine = IndicatorEngine::new(IndicatorConfig::signal_model()).unwrap();
//! let features = engine.compute(&series).unwrap();
//!
//! assert_eq!(features.len(), 100);
//! assert_eq!(features.width(), 11);
//! ```

pub mod candle;
pub mod config;
pub mod engine;
pub mod error;
pub mod indicator;
pub mod synthetic;

pub use candle::{Candle, CandleSeries};
pub use config::IndicatorConfig;
pub use engine::{FeatureMatrix, IndicatorEngine};
pub use error::{ConfigError, InputError};
