/// Orcplay - headless playlist tools
use anyhow::Context;
use clap::{Parser, Subcommand};
use orcplay_cli::{
    inspect::{inspect_file, render_ascii},
    run_simulation, AppConfig, SimulationOptions, StopReason,
};
use orcplay_playback::Track;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "orcplay")]
#[command(about = "Engine-driven audio playlist player, headless tools", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print duration, format and waveform of audio files
    Inspect {
        /// Audio files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Waveform width in characters
        #[arg(long, default_value_t = 60)]
        columns: usize,
        /// Waveform height in rows
        #[arg(long, default_value_t = 9)]
        height: usize,
    },
    /// Play files through a session against a dry-run engine
    Simulate {
        /// Audio files, played in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Print every update as JSON, one per line
        #[arg(long)]
        json: bool,
        /// Stop after this many seconds
        #[arg(long)]
        limit: Option<f64>,
        /// Level reported by the engine while playing (0.0-1.0)
        #[arg(long)]
        level: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orcplay=info,orcplay_cli=info,orcplay_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config =
        AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Inspect {
            files,
            columns,
            height,
        } => {
            let mut failed = 0;
            for path in &files {
                match inspect_file(path, columns) {
                    Ok(report) => {
                        println!("{}", report.summary());
                        for row in render_ascii(&report.peaks, height) {
                            println!("{row}");
                        }
                        println!();
                    }
                    Err(e) => {
                        tracing::error!("Failed to inspect {}: {}", path.display(), e);
                        failed += 1;
                    }
                }
            }
            if failed > 0 {
                anyhow::bail!("{failed} of {} files could not be inspected", files.len());
            }
        }
        Commands::Simulate {
            files,
            json,
            limit,
            level,
        } => {
            if let Some(level) = level {
                config.simulation.level = level;
            }
            config.validate().context("Invalid configuration")?;

            let tracks = files
                .iter()
                .map(|path| read_track(path))
                .collect::<anyhow::Result<Vec<_>>>()?;

            let limit = match limit {
                Some(secs) if secs.is_finite() && secs > 0.0 => Some(Duration::from_secs_f64(secs)),
                Some(secs) => anyhow::bail!("--limit must be positive, got {secs}"),
                None => None,
            };

            let interrupt = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::warn!("Failed to listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await;
                }
            };

            let mut stdout = std::io::stdout().lock();
            let summary = run_simulation(
                tracks,
                &config,
                SimulationOptions { json, limit },
                interrupt,
                &mut stdout,
            )
            .await
            .context("Simulation failed")?;

            if !json {
                println!(
                    "{} of {} tracks finished ({} updates)",
                    summary.tracks_finished,
                    files.len(),
                    summary.updates
                );
            }
            if let StopReason::Failed(message) = summary.stopped_by {
                anyhow::bail!("Engine error: {message}");
            }
        }
    }

    Ok(())
}

fn read_track(path: &Path) -> anyhow::Result<Track> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("Not a file: {}", path.display()))?;
    Ok(Track::new(name, bytes))
}
