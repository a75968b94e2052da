/// Headless playback run against the dry-run engine
use crate::config::AppConfig;
use crate::engine::DryRunEngine;
use crate::error::Result;
use orcplay_decode::SymphoniaDecoder;
use orcplay_playback::{LoadTrigger, PlaybackSession, Track, UiUpdate};
use serde::Serialize;
use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Why a simulation ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Every track reached its end once
    AllFinished,

    /// Time limit elapsed
    Limit,

    /// Interrupt signal
    Interrupted,

    /// Engine rejected an operation mid-run
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationSummary {
    pub tracks_finished: usize,
    pub updates: usize,
    pub stopped_by: StopReason,
}

/// Output options for [`run_simulation`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulationOptions {
    /// One JSON object per update instead of text
    pub json: bool,

    /// Overrides `simulation.limit_secs`
    pub limit: Option<Duration>,
}

/// Play `tracks` through a session until each has finished once
///
/// Auto-advance is always on. The run also ends when the limit elapses,
/// when `interrupt` resolves, or when the engine reports an error. The
/// session is shut down before returning.
pub async fn run_simulation<W, F>(
    tracks: Vec<Track>,
    config: &AppConfig,
    options: SimulationOptions,
    interrupt: F,
    out: &mut W,
) -> Result<SimulationSummary>
where
    W: Write,
    F: Future<Output = ()>,
{
    let mut player = config.player.clone();
    player.auto_advance = true;

    let engine = DryRunEngine::new(player.channels.clone(), config.simulation.level);
    let (tx, mut rx) = mpsc::unbounded_channel::<UiUpdate>();
    let session = PlaybackSession::new(engine, Arc::new(SymphoniaDecoder::new()), Arc::new(tx), player)?;

    let total = tracks.len();
    info!(tracks = total, "Starting simulation");
    session.add_tracks(tracks, LoadTrigger::UserAction).await?;

    let limit = options
        .limit
        .or_else(|| config.simulation.limit_secs.map(Duration::from_secs_f64));
    let deadline = async move {
        match limit {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);
    tokio::pin!(interrupt);

    let mut printer = TextPrinter::default();
    let mut finished = 0;
    let mut updates = 0;

    let stopped_by = loop {
        tokio::select! {
            update = rx.recv() => {
                let Some(update) = update else {
                    break StopReason::Interrupted;
                };
                updates += 1;

                if options.json {
                    writeln!(out, "{}", serde_json::to_string(&update)?)?;
                } else {
                    printer.print(&update, out)?;
                }

                match update {
                    UiUpdate::TrackFinished { .. } => {
                        finished += 1;
                        if finished >= total {
                            break StopReason::AllFinished;
                        }
                    }
                    UiUpdate::Error { message } => {
                        warn!(error = %message, "Engine error during simulation");
                        break StopReason::Failed(message);
                    }
                    _ => {}
                }
            }
            () = &mut deadline => break StopReason::Limit,
            () = &mut interrupt => break StopReason::Interrupted,
        }
    };

    session.shutdown().await?;
    info!(finished, updates, reason = ?stopped_by, "Simulation finished");

    Ok(SimulationSummary {
        tracks_finished: finished,
        updates,
        stopped_by,
    })
}

/// Human-readable rendering of updates
///
/// Level frames are skipped and progress is printed in 10% steps.
#[derive(Debug, Default)]
struct TextPrinter {
    last_decile: Option<u32>,
}

impl TextPrinter {
    fn print<W: Write>(&mut self, update: &UiUpdate, out: &mut W) -> std::io::Result<()> {
        match update {
            UiUpdate::Progress { fraction } => {
                let decile = (fraction.clamp(0.0, 1.0) * 10.0).floor() as u32;
                if decile == 0 {
                    self.last_decile = None;
                } else if !matches!(self.last_decile, Some(last) if decile <= last) {
                    self.last_decile = Some(decile);
                    writeln!(out, "  {:>3}%", decile * 10)?;
                }
            }
            UiUpdate::Level { .. } => {}
            UiUpdate::Waveform { peaks } => writeln!(out, "  waveform: {} columns", peaks.len())?,
            UiUpdate::WaveformCleared => writeln!(out, "  waveform unavailable")?,
            UiUpdate::Track { name, index, total } => {
                writeln!(out, "[{}/{}] {}", index + 1, total, name)?;
            }
            UiUpdate::Playlist { names, active, .. } => {
                let listing: Vec<String> = names
                    .iter()
                    .enumerate()
                    .map(|(i, name)| {
                        if Some(i) == *active {
                            format!("*{name}")
                        } else {
                            name.clone()
                        }
                    })
                    .collect();
                writeln!(out, "  playlist: {}", listing.join(", "))?;
            }
            UiUpdate::TransportLabel { label } => writeln!(out, "  button: {}", label.as_str())?,
            UiUpdate::TrackFinished { index } => writeln!(out, "  finished track {}", index + 1)?,
            UiUpdate::Error { message } => writeln!(out, "  error: {message}")?,
        }
        Ok(())
    }
}
