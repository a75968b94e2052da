//! Orcplay command-line tools
//!
//! - `inspect`: decode files and print their waveform as text
//! - `simulate`: drive a playback session against a dry-run engine and
//!   print the UI updates it emits

pub mod config;
pub mod engine;
pub mod error;
pub mod inspect;
pub mod simulate;

pub use config::AppConfig;
pub use engine::DryRunEngine;
pub use error::{CliError, Result};
pub use simulate::{run_simulation, SimulationOptions, SimulationSummary, StopReason};
