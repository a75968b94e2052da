/// Dry-run engine: accepts every call and logs it
use async_trait::async_trait;
use orcplay_playback::{ChannelNames, Engine, EngineError, EngineResult, OutputState};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

#[derive(Debug, Default)]
struct DryRunState {
    compiled: bool,
    running: bool,
    paused: bool,
    /// Staged files and their sizes
    files: HashMap<String, usize>,
    controls: HashMap<String, f64>,
    strings: HashMap<String, String>,
}

/// Engine stand-in for headless runs
///
/// Keeps just enough state to reject obviously wrong sequences (starting
/// without a program, playing a file that was never staged) and reports a
/// fixed level on the level channel while running.
#[derive(Debug)]
pub struct DryRunEngine {
    channels: ChannelNames,
    level: f64,
    state: Mutex<DryRunState>,
}

impl DryRunEngine {
    /// `level` is the raw level reported at unity gain
    pub fn new(channels: ChannelNames, level: f64) -> Self {
        Self {
            channels,
            level: level.clamp(0.0, 1.0),
            state: Mutex::new(DryRunState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, DryRunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn staged_files(&self) -> Vec<String> {
        let mut files: Vec<String> = self.state().files.keys().cloned().collect();
        files.sort();
        files
    }

    pub fn control(&self, name: &str) -> Option<f64> {
        self.state().controls.get(name).copied()
    }

    pub fn is_running(&self) -> bool {
        let state = self.state();
        state.running && !state.paused
    }
}

#[async_trait]
impl Engine for DryRunEngine {
    async fn compile_program(&self, source: &str) -> EngineResult<()> {
        if source.trim().is_empty() {
            return Err(EngineError::new("compile_program", "empty program"));
        }
        debug!(bytes = source.len(), "engine: compile program");
        self.state().compiled = true;
        Ok(())
    }

    async fn set_output_destination(&self, descriptor: &str) -> EngineResult<()> {
        debug!(descriptor, "engine: output destination");
        Ok(())
    }

    async fn write_input_file(&self, path: &str, bytes: &[u8]) -> EngineResult<()> {
        debug!(path, bytes = bytes.len(), "engine: write input file");
        self.state().files.insert(path.to_string(), bytes.len());
        Ok(())
    }

    async fn start(&self) -> EngineResult<()> {
        let mut state = self.state();
        if !state.compiled {
            return Err(EngineError::new("start", "no program compiled"));
        }
        if let Some(file) = state.strings.get(&self.channels.file) {
            if !state.files.contains_key(file) {
                return Err(EngineError::new("start", format!("{file} was never staged")));
            }
        }
        state.running = true;
        state.paused = false;
        info!(file = ?state.strings.get(&self.channels.file), "engine: start");
        Ok(())
    }

    async fn stop(&self) -> EngineResult<()> {
        let mut state = self.state();
        state.running = false;
        state.paused = false;
        debug!("engine: stop");
        Ok(())
    }

    async fn pause(&self) -> EngineResult<()> {
        self.state().paused = true;
        info!("engine: pause");
        Ok(())
    }

    async fn resume(&self) -> EngineResult<()> {
        self.state().paused = false;
        info!("engine: resume");
        Ok(())
    }

    async fn reset(&self) -> EngineResult<()> {
        let mut state = self.state();
        state.compiled = false;
        state.running = false;
        state.paused = false;
        state.controls.clear();
        state.strings.clear();
        debug!("engine: reset");
        Ok(())
    }

    async fn get_control_value(&self, name: &str) -> EngineResult<f64> {
        if name == self.channels.level {
            let state = self.state();
            let gain = state
                .controls
                .get(&self.channels.volume)
                .copied()
                .unwrap_or(1.0);
            return Ok(if state.running && !state.paused {
                self.level * gain
            } else {
                0.0
            });
        }
        Ok(self.state().controls.get(name).copied().unwrap_or(0.0))
    }

    async fn set_control_value(&self, name: &str, value: f64) -> EngineResult<()> {
        debug!(name, value, "engine: control");
        self.state().controls.insert(name.to_string(), value);
        Ok(())
    }

    async fn set_string_value(&self, name: &str, value: &str) -> EngineResult<()> {
        debug!(name, value, "engine: string");
        self.state()
            .strings
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    async fn output_state(&self) -> EngineResult<OutputState> {
        Ok(OutputState::Running)
    }

    async fn resume_output(&self) -> EngineResult<()> {
        Ok(())
    }
}
