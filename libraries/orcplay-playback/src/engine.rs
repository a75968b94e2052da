//! External audio engine boundary
//!
//! The engine compiles a textual instrument program, owns a private file store
//! the program reads from, and exposes transport plus named control channels.
//! It is consumed as a black box: the session only sequences calls into it.

use crate::error::EngineError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result type for engine calls
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// State of the engine's audio output context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputState {
    /// Output is producing audio
    Running,

    /// Output is blocked until resumed (autoplay policy, no user gesture yet)
    Suspended,

    /// Output has been torn down
    Closed,
}

/// Capability set consumed from the external audio engine
///
/// Every call may suspend until the engine resolves or rejects it. No
/// deadline is imposed. Implementations must be shareable across tasks:
/// the session polls the level channel from a background task.
#[async_trait]
pub trait Engine: Send + Sync + 'static {
    /// Install a signal-processing program; must succeed before `start`
    async fn compile_program(&self, source: &str) -> EngineResult<()>;

    /// Select the output device before `start`
    async fn set_output_destination(&self, descriptor: &str) -> EngineResult<()>;

    /// Stage a byte buffer in the engine's private storage under `path`
    async fn write_input_file(&self, path: &str, bytes: &[u8]) -> EngineResult<()>;

    /// Start transport
    async fn start(&self) -> EngineResult<()>;

    /// Stop transport
    async fn stop(&self) -> EngineResult<()>;

    /// Suspend transport mid-track
    async fn pause(&self) -> EngineResult<()>;

    /// Resume suspended transport
    async fn resume(&self) -> EngineResult<()>;

    /// Reset the engine session (drops the compiled program)
    async fn reset(&self) -> EngineResult<()>;

    /// Read a scalar control channel
    async fn get_control_value(&self, name: &str) -> EngineResult<f64>;

    /// Write a scalar control channel
    async fn set_control_value(&self, name: &str, value: f64) -> EngineResult<()>;

    /// Write a string control channel
    async fn set_string_value(&self, name: &str, value: &str) -> EngineResult<()>;

    /// Current state of the underlying output context
    async fn output_state(&self) -> EngineResult<OutputState>;

    /// Resume a suspended output context
    async fn resume_output(&self) -> EngineResult<()>;
}
