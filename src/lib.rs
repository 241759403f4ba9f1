//! Allocation-free streaming FIR and IIR filters for sensor sample streams.
//!
//! The engines in [`signal_processing`] borrow all of their working memory
//! from the caller and process one sample per call, which makes them usable
//! from a tight polling loop. The remaining modules are host-side tooling
//! around them: pipeline configuration, sample sources, telemetry output.

pub mod config;
pub mod constants;
pub mod error;
pub mod sampling;
pub mod signal_processing;
pub mod telemetry;
pub mod wav;

#[cfg(feature = "simulation")]
pub mod simulation;

pub use config::PipelineConfig;
pub use error::{FilterError, Result};
pub use signal_processing::{Filter, FirFilter, IirFilter};
pub use wav::save_wav;
