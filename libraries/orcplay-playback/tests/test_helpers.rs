#![allow(dead_code)]

use async_trait::async_trait;
use orcplay_playback::{
    AudioDecoder, DecodedAudio, Engine, EngineError, EngineResult, OutputState, PlaybackError,
    PlaybackSession, PlayerConfig, Renderer, Track, UiUpdate,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use tokio::sync::Semaphore;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// One recorded engine call
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub op: &'static str,
    pub arg: String,
}

#[derive(Default)]
struct Script {
    calls: Vec<Call>,
    failing: HashSet<&'static str>,
    gates: HashMap<&'static str, Arc<Semaphore>>,
    level: f64,
    output: Option<OutputState>,
}

/// Engine double that records calls and fails or holds operations on request
#[derive(Clone, Default)]
pub struct ScriptedEngine {
    script: Arc<Mutex<Script>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call to `op` fail until cleared
    pub fn fail(&self, op: &'static str) {
        self.script.lock().unwrap().failing.insert(op);
    }

    pub fn clear_failures(&self) {
        self.script.lock().unwrap().failing.clear();
    }

    /// Block calls to `op` until `release`
    pub fn hold(&self, op: &'static str) {
        self.script
            .lock()
            .unwrap()
            .gates
            .insert(op, Arc::new(Semaphore::new(0)));
    }

    pub fn release(&self, op: &'static str) {
        if let Some(gate) = self.script.lock().unwrap().gates.remove(op) {
            gate.close();
        }
    }

    pub fn set_level(&self, level: f64) {
        self.script.lock().unwrap().level = level;
    }

    pub fn set_output_state(&self, state: OutputState) {
        self.script.lock().unwrap().output = Some(state);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn ops(&self) -> Vec<&'static str> {
        self.calls().into_iter().map(|c| c.op).collect()
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls().iter().filter(|c| c.op == op).count()
    }

    pub fn args(&self, op: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.op == op)
            .map(|c| c.arg)
            .collect()
    }

    pub fn clear_calls(&self) {
        self.script.lock().unwrap().calls.clear();
    }

    /// Yield until `op` has been called `n` times
    pub async fn wait_for(&self, op: &str, n: usize) {
        for _ in 0..10_000 {
            if self.count(op) >= n {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("engine never saw {n} call(s) to {op}");
    }

    async fn call(&self, op: &'static str, arg: String) -> EngineResult<()> {
        let gate = {
            let mut script = self.script.lock().unwrap();
            script.calls.push(Call { op, arg });
            script.gates.get(op).cloned()
        };
        if let Some(gate) = gate {
            // Closed on release
            let _ = gate.acquire().await;
        }
        if self.script.lock().unwrap().failing.contains(op) {
            return Err(EngineError::new(op, "scripted failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl Engine for ScriptedEngine {
    async fn compile_program(&self, _source: &str) -> EngineResult<()> {
        self.call("compile_program", String::new()).await
    }

    async fn set_output_destination(&self, descriptor: &str) -> EngineResult<()> {
        self.call("set_output_destination", descriptor.to_string())
            .await
    }

    async fn write_input_file(&self, path: &str, _bytes: &[u8]) -> EngineResult<()> {
        self.call("write_input_file", path.to_string()).await
    }

    async fn start(&self) -> EngineResult<()> {
        self.call("start", String::new()).await
    }

    async fn stop(&self) -> EngineResult<()> {
        self.call("stop", String::new()).await
    }

    async fn pause(&self) -> EngineResult<()> {
        self.call("pause", String::new()).await
    }

    async fn resume(&self) -> EngineResult<()> {
        self.call("resume", String::new()).await
    }

    async fn reset(&self) -> EngineResult<()> {
        self.call("reset", String::new()).await
    }

    async fn get_control_value(&self, name: &str) -> EngineResult<f64> {
        self.call("get_control_value", name.to_string()).await?;
        Ok(self.script.lock().unwrap().level)
    }

    async fn set_control_value(&self, name: &str, value: f64) -> EngineResult<()> {
        self.call("set_control_value", format!("{name}={value}"))
            .await
    }

    async fn set_string_value(&self, name: &str, value: &str) -> EngineResult<()> {
        self.call("set_string_value", format!("{name}={value}"))
            .await
    }

    async fn output_state(&self) -> EngineResult<OutputState> {
        self.call("output_state", String::new()).await?;
        Ok(self
            .script
            .lock()
            .unwrap()
            .output
            .unwrap_or(OutputState::Running))
    }

    async fn resume_output(&self) -> EngineResult<()> {
        self.call("resume_output", String::new()).await?;
        self.script.lock().unwrap().output = Some(OutputState::Running);
        Ok(())
    }
}

/// Decoder returning a fixed duration, or failing when none is set
pub struct StubDecoder {
    pub duration: Option<Duration>,
}

impl StubDecoder {
    pub fn with_duration(duration: Duration) -> Self {
        Self {
            duration: Some(duration),
        }
    }

    pub fn failing() -> Self {
        Self { duration: None }
    }
}

impl AudioDecoder for StubDecoder {
    fn decode(&self, _bytes: &[u8], _extension: Option<&str>) -> orcplay_playback::Result<DecodedAudio> {
        let duration = self
            .duration
            .ok_or_else(|| PlaybackError::decode("unsupported format"))?;
        Ok(DecodedAudio {
            duration,
            sample_rate: 8000,
            channels: 1,
            samples: vec![0.5, -0.5, 0.25, -0.25],
        })
    }
}

/// Renderer that keeps every update
#[derive(Default)]
pub struct RecordingRenderer {
    updates: Mutex<Vec<UiUpdate>>,
}

impl RecordingRenderer {
    pub fn updates(&self) -> Vec<UiUpdate> {
        self.updates.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&UiUpdate) -> bool) -> usize {
        self.updates().iter().filter(|u| pred(u)).count()
    }

    pub fn last_label(&self) -> Option<orcplay_playback::TransportLabel> {
        self.updates().into_iter().rev().find_map(|u| match u {
            UiUpdate::TransportLabel { label } => Some(label),
            _ => None,
        })
    }

    pub fn clear(&self) {
        self.updates.lock().unwrap().clear();
    }
}

impl Renderer for RecordingRenderer {
    fn render(&self, update: UiUpdate) {
        self.updates.lock().unwrap().push(update);
    }
}

pub struct Harness {
    pub session: PlaybackSession<ScriptedEngine>,
    pub engine: ScriptedEngine,
    pub renderer: Arc<RecordingRenderer>,
}

pub fn harness(decoder: StubDecoder, config: PlayerConfig) -> Harness {
    init_tracing();
    let engine = ScriptedEngine::new();
    let renderer = Arc::new(RecordingRenderer::default());
    let session = PlaybackSession::new(
        engine.clone(),
        Arc::new(decoder),
        renderer.clone(),
        config,
    )
    .expect("valid config");
    Harness {
        session,
        engine,
        renderer,
    }
}

/// Harness with 10 s tracks and default config
pub fn default_harness() -> Harness {
    harness(
        StubDecoder::with_duration(Duration::from_secs(10)),
        PlayerConfig::default(),
    )
}

pub fn tracks(names: &[&str]) -> Vec<Track> {
    names
        .iter()
        .map(|name| Track::new(*name, vec![0u8; 16]))
        .collect()
}
