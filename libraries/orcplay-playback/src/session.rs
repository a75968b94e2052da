//! Playback session
//!
//! [`PlaybackSession`] owns the playlist, transport state, progress clock,
//! level meter and volume, and sequences every call into the [`Engine`].
//!
//! Engine calls are asynchronous and may resolve in any order relative to new
//! user input. Two mechanisms keep the session coherent:
//!
//! - an engine lane (async mutex) so multi-step engine sequences never
//!   interleave with each other
//! - a request generation, bumped by every load or stop request before it
//!   waits for the lane; a sequence that observes a newer generation after any
//!   await abandons itself without touching state or the UI
//!
//! Progress and level polling run as tokio tasks at the configured frame
//! rate. They hold only a weak reference to the session and exit as soon as
//! their generation is superseded or their handle is aborted.

use crate::decoder::AudioDecoder;
use crate::engine::{Engine, OutputState};
use crate::error::{EngineError, PlaybackError, Result};
use crate::events::{Renderer, UiUpdate};
use crate::level::{LevelMeter, LevelReading};
use crate::playlist::PlaylistManager;
use crate::progress::{ProgressSnapshot, ProgressTick, ProgressTracker};
use crate::types::{
    LoadOutcome, LoadTrigger, PlayerConfig, Track, TrackId, TransportLabel, TransportState,
};
use crate::volume::Volume;
use crate::waveform::WaveformPeaks;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Runtime clock as a std instant; follows tokio's paused clock in tests
fn now() -> std::time::Instant {
    time::Instant::now().into_std()
}

/// Why an engine sequence stopped early
enum Abort {
    /// A newer request took over
    Superseded,
    /// The sequence itself failed
    Failed(PlaybackError),
}

impl From<EngineError> for Abort {
    fn from(err: EngineError) -> Self {
        Self::Failed(err.into())
    }
}

impl From<PlaybackError> for Abort {
    fn from(err: PlaybackError) -> Self {
        Self::Failed(err)
    }
}

type Step<T> = std::result::Result<T, Abort>;

/// Track currently staged in the engine
#[derive(Debug, Clone)]
struct Prepared {
    id: TrackId,
}

/// Background poller handles
#[derive(Default)]
struct Pollers {
    progress: Option<JoinHandle<()>>,
    level: Option<JoinHandle<()>>,
}

impl Pollers {
    fn cancel(&mut self) {
        self.cancel_progress();
        self.cancel_level();
    }

    fn cancel_progress(&mut self) {
        if let Some(handle) = self.progress.take() {
            handle.abort();
        }
    }

    fn cancel_level(&mut self) {
        if let Some(handle) = self.level.take() {
            handle.abort();
        }
    }
}

impl Drop for Pollers {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[derive(Default)]
struct SessionState {
    transport: TransportState,
    playlist: PlaylistManager,
    prepared: Option<Prepared>,
    /// Engine has a compiled program and output destination
    program_ready: bool,
    output_unlocked: bool,
    progress: ProgressTracker,
    level: LevelMeter,
    volume: Volume,
    pollers: Pollers,
    closed: bool,
}

impl SessionState {
    fn playlist_update(&self) -> UiUpdate {
        UiUpdate::Playlist {
            names: self.playlist.names(),
            active: self.playlist.active_index(),
            can_navigate: self.playlist.can_navigate(),
        }
    }

    /// Drop everything tied to the engine's current program
    fn fall_to_stopped(&mut self) {
        self.pollers.cancel();
        self.transport = TransportState::Stopped;
        self.prepared = None;
        self.program_ready = false;
        self.progress.reset();
        self.level.stop();
    }
}

struct SessionInner<E: Engine> {
    engine: E,
    decoder: Arc<dyn AudioDecoder>,
    renderer: Arc<dyn Renderer>,
    config: PlayerConfig,
    /// Serializes multi-step engine sequences
    lane: tokio::sync::Mutex<()>,
    generation: AtomicU64,
    state: Mutex<SessionState>,
}

impl<E: Engine> SessionInner<E> {
    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Must be called with the state lock held
    fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.current_generation() == generation
    }

    fn check(&self, generation: u64) -> Step<()> {
        if self.is_current(generation) {
            Ok(())
        } else {
            Err(Abort::Superseded)
        }
    }

    /// Apply `f` to the state if `generation` is still current
    fn commit<R>(&self, generation: u64, f: impl FnOnce(&mut SessionState) -> R) -> Step<R> {
        let mut state = self.lock_state();
        if !self.is_current(generation) {
            return Err(Abort::Superseded);
        }
        Ok(f(&mut state))
    }

    fn emit(&self, updates: impl IntoIterator<Item = UiUpdate>) {
        for update in updates {
            self.renderer.render(update);
        }
    }

    fn emit_level(&self, reading: LevelReading) {
        self.renderer.render(UiUpdate::Level {
            percent: reading.display_percent,
            band: reading.band,
        });
    }
}

/// A load that has claimed its generation and is waiting for the lane
struct LoadRequest {
    generation: u64,
    track: Track,
    trigger: LoadTrigger,
    /// Rendered once the state lock is released
    updates: Vec<UiUpdate>,
}

/// Decode result used for display
struct Visual {
    duration: Duration,
    peaks: Arc<WaveformPeaks>,
}

/// Playback session over an audio engine
///
/// Cheap to clone; all clones drive the same session.
pub struct PlaybackSession<E: Engine> {
    inner: Arc<SessionInner<E>>,
}

impl<E: Engine> Clone for PlaybackSession<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Engine> PlaybackSession<E> {
    /// Create a session
    ///
    /// Polling tasks are spawned onto the runtime that drives the session's
    /// futures.
    pub fn new(
        engine: E,
        decoder: Arc<dyn AudioDecoder>,
        renderer: Arc<dyn Renderer>,
        config: PlayerConfig,
    ) -> Result<Self> {
        config.validate()?;
        let state = SessionState {
            volume: Volume::new(config.volume, config.volume_curve),
            ..Default::default()
        };

        Ok(Self {
            inner: Arc::new(SessionInner {
                engine,
                decoder,
                renderer,
                config,
                lane: tokio::sync::Mutex::new(()),
                generation: AtomicU64::new(0),
                state: Mutex::new(state),
            }),
        })
    }

    fn from_inner(inner: Arc<SessionInner<E>>) -> Self {
        Self { inner }
    }

    pub fn engine(&self) -> &E {
        &self.inner.engine
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.inner.config
    }

    // ===== Setup =====

    /// Compile the program and route output ahead of the first load
    ///
    /// Optional: every load recompiles. Calling it surfaces program errors
    /// before any track is added.
    pub async fn initialize(&self) -> Result<()> {
        let generation = {
            let state = self.inner.lock_state();
            if state.closed {
                return Err(PlaybackError::SessionClosed);
            }
            self.inner.current_generation()
        };

        let _lane = self.inner.lane.lock().await;
        let gain = self.inner.lock_state().volume.gain();
        let result: Step<()> = async {
            let engine = &self.inner.engine;
            engine.compile_program(&self.inner.config.program).await?;
            self.inner.check(generation)?;
            engine
                .set_output_destination(&self.inner.config.output_destination)
                .await?;
            self.inner.check(generation)?;
            engine
                .set_control_value(&self.inner.config.channels.volume, gain)
                .await?;
            self.inner.commit(generation, |state| state.program_ready = true)
        }
        .await;

        match result {
            Ok(()) => {
                info!("engine program compiled");
                Ok(())
            }
            Err(abort) => self.settle(generation, abort).map(|_| ()),
        }
    }

    // ===== Playlist =====

    /// Append tracks in order
    ///
    /// If nothing was selected before, the first new track is loaded with
    /// `trigger` and its outcome returned.
    pub async fn add_tracks(
        &self,
        tracks: Vec<Track>,
        trigger: LoadTrigger,
    ) -> Result<Option<LoadOutcome>> {
        let request = {
            let mut state = self.inner.lock_state();
            if state.closed {
                return Err(PlaybackError::SessionClosed);
            }
            let first_new = state.playlist.len();
            let was_unselected = state.playlist.active_index().is_none();
            let added = tracks.len();
            for track in tracks {
                state.playlist.append(track);
            }
            debug!(added, total = state.playlist.len(), "tracks added");

            if was_unselected && added > 0 {
                Some(self.request_load(&mut state, first_new, trigger)?)
            } else {
                let update = state.playlist_update();
                drop(state);
                self.inner.emit([update]);
                None
            }
        };

        match request {
            Some(request) => self.run_load(request).await.map(Some),
            None => Ok(None),
        }
    }

    /// Stop, replace the whole playlist, and load the first new track
    pub async fn replace_tracks(
        &self,
        tracks: Vec<Track>,
        trigger: LoadTrigger,
    ) -> Result<Option<LoadOutcome>> {
        self.stop().await?;
        {
            let mut state = self.inner.lock_state();
            state.playlist.clear();
        }
        self.add_tracks(tracks, trigger).await
    }

    /// Remove the track at `index`
    ///
    /// Removing the active or staged track stops playback and supersedes any
    /// load in flight, in the same step as the removal.
    pub async fn remove_track(&self, index: usize) -> Result<Track> {
        let (removed, updates, stopping) = {
            let mut state = self.inner.lock_state();
            if state.closed {
                return Err(PlaybackError::SessionClosed);
            }
            let id = state
                .playlist
                .get(index)
                .ok_or(PlaybackError::IndexOutOfBounds {
                    index,
                    len: state.playlist.len(),
                })?
                .id;
            let engaged = state.prepared.as_ref().is_some_and(|p| p.id == id)
                || state.playlist.active_index() == Some(index);

            let stopping = engaged.then(|| self.request_stop(&mut state));
            let removed = state.playlist.remove(index)?;

            let mut updates = Vec::new();
            if stopping.is_some() {
                updates.extend(stopped_updates());
            }
            updates.push(state.playlist_update());
            if state.playlist.is_empty() {
                state.progress.set_duration(None);
                updates.push(UiUpdate::WaveformCleared);
            }
            (removed, updates, stopping)
        };

        info!(track = %removed.display_name, "track removed");
        self.inner.emit(updates);

        if let Some(generation) = stopping {
            self.finish_stop(generation).await?;
        }
        Ok(removed)
    }

    // ===== Loading =====

    /// Stage the track at `index` in the engine
    ///
    /// `UserAction` starts playback once staged; `Initial` leaves the
    /// transport stopped. Returns `LoadOutcome::Superseded` when a newer load
    /// or stop took over while this one was in flight.
    pub async fn load(&self, index: usize, trigger: LoadTrigger) -> Result<LoadOutcome> {
        let request = {
            let mut state = self.inner.lock_state();
            self.request_load(&mut state, index, trigger)?
        };
        self.run_load(request).await
    }

    /// Select a track and play it
    pub async fn select(&self, index: usize) -> Result<LoadOutcome> {
        self.load(index, LoadTrigger::UserAction).await
    }

    /// Load the following track (wrapping) and play it
    pub async fn next(&self) -> Result<LoadOutcome> {
        let request = {
            let mut state = self.inner.lock_state();
            if state.closed {
                return Err(PlaybackError::SessionClosed);
            }
            let index = state.playlist.next()?;
            self.request_load(&mut state, index, LoadTrigger::UserAction)?
        };
        self.run_load(request).await
    }

    /// Load the preceding track (wrapping) and play it
    pub async fn previous(&self) -> Result<LoadOutcome> {
        let request = {
            let mut state = self.inner.lock_state();
            if state.closed {
                return Err(PlaybackError::SessionClosed);
            }
            let index = state.playlist.previous()?;
            self.request_load(&mut state, index, LoadTrigger::UserAction)?
        };
        self.run_load(request).await
    }

    /// Reload the active track from the start and play it
    pub async fn restart(&self) -> Result<LoadOutcome> {
        let index = self
            .inner
            .lock_state()
            .playlist
            .active_index()
            .ok_or(PlaybackError::EmptyPlaylist)?;
        self.select(index).await
    }

    /// Claim a generation for a load of `index` and reset the transport.
    /// Called with the state lock held; the UI updates travel with the
    /// request.
    fn request_load(
        &self,
        state: &mut SessionState,
        index: usize,
        trigger: LoadTrigger,
    ) -> Result<LoadRequest> {
        if state.closed {
            return Err(PlaybackError::SessionClosed);
        }
        let track = state.playlist.select_at(index)?.clone();
        let generation = self.inner.bump_generation();

        state.pollers.cancel();
        state.transport = TransportState::Stopped;
        state.prepared = None;
        state.progress.reset();
        state.progress.set_duration(track.duration);
        state.level.stop();

        let updates = vec![
            UiUpdate::Track {
                name: track.display_name.clone(),
                index,
                total: state.playlist.len(),
            },
            state.playlist_update(),
            UiUpdate::Progress { fraction: 0.0 },
            UiUpdate::Level {
                percent: 0.0,
                band: LevelReading::SILENT.band,
            },
        ];

        debug!(track = %track.display_name, index, generation, "load requested");
        Ok(LoadRequest {
            generation,
            track,
            trigger,
            updates,
        })
    }

    async fn run_load(&self, mut request: LoadRequest) -> Result<LoadOutcome> {
        self.inner.emit(std::mem::take(&mut request.updates));
        let generation = request.generation;
        let _lane = self.inner.lane.lock().await;
        match self.load_steps(request).await {
            Ok(outcome) => Ok(outcome),
            Err(abort) => self.settle(generation, abort),
        }
    }

    async fn load_steps(&self, request: LoadRequest) -> Step<LoadOutcome> {
        let LoadRequest {
            generation,
            track,
            trigger,
            ..
        } = request;
        let inner = &self.inner;
        let engine = &inner.engine;
        let config = &inner.config;
        inner.check(generation)?;

        if trigger.autoplay() {
            self.ensure_output_ready().await?;
            inner.check(generation)?;
        }

        engine.stop().await?;
        inner.check(generation)?;
        engine.reset().await?;
        inner.commit(generation, |state| state.program_ready = false)?;

        engine.compile_program(&config.program).await?;
        inner.check(generation)?;
        engine
            .set_output_destination(&config.output_destination)
            .await?;
        inner.commit(generation, |state| state.program_ready = true)?;

        let path = config.staged_path(&track);
        engine.write_input_file(&path, &track.source_bytes).await?;
        inner.check(generation)?;

        let visual = self.decode_for_display(&track).await;
        inner.check(generation)?;

        let gain = inner.lock_state().volume.gain();
        engine.set_control_value(&config.channels.volume, gain).await?;
        inner.check(generation)?;
        engine.set_string_value(&config.channels.file, &path).await?;

        let index = inner.commit(generation, |state| {
            // Removed from the playlist while staging
            let index = state.playlist.position(track.id)?;
            let duration = visual.as_ref().map(|v| v.duration);
            if let Some(duration) = duration {
                state.playlist.set_duration(track.id, duration);
            }
            state.progress.reset();
            state.progress.set_duration(duration);
            state.prepared = Some(Prepared { id: track.id });
            state.transport = TransportState::Stopped;
            Some(index)
        })?;
        let index = index.ok_or(Abort::Superseded)?;

        let decoded = visual.is_some();
        inner.emit([match visual {
            Some(visual) => UiUpdate::Waveform {
                peaks: visual.peaks,
            },
            None => UiUpdate::WaveformCleared,
        }]);

        let playing = if trigger.autoplay() {
            self.start_transport(generation).await?;
            true
        } else {
            inner.emit([UiUpdate::TransportLabel {
                label: TransportLabel::Play,
            }]);
            false
        };

        info!(track = %track.display_name, index, decoded, playing, "track loaded");
        Ok(LoadOutcome::Loaded {
            index,
            decoded,
            playing,
        })
    }

    /// Decode off the runtime for duration and peaks
    ///
    /// Failures are logged and leave the waveform hidden; playback itself
    /// does not depend on this decode.
    async fn decode_for_display(&self, track: &Track) -> Option<Visual> {
        let decoder = Arc::clone(&self.inner.decoder);
        let bytes = Arc::clone(&track.source_bytes);
        let extension = track.extension();
        let columns = self.inner.config.waveform_columns;

        let result = tokio::task::spawn_blocking(move || {
            decoder
                .decode(&bytes, extension.as_deref())
                .map(|decoded| Visual {
                    duration: decoded.duration,
                    peaks: Arc::new(WaveformPeaks::from_samples(&decoded.samples, columns)),
                })
        })
        .await;

        match result {
            Ok(Ok(visual)) => Some(visual),
            Ok(Err(err)) => {
                warn!(track = %track.display_name, error = %err, "could not decode track for display");
                None
            }
            Err(err) => {
                warn!(track = %track.display_name, error = %err, "decode task failed");
                None
            }
        }
    }

    /// Resume a suspended output context once per session
    async fn ensure_output_ready(&self) -> Step<()> {
        if self.inner.lock_state().output_unlocked {
            return Ok(());
        }

        match self.inner.engine.output_state().await? {
            OutputState::Running => {}
            OutputState::Suspended => {
                debug!("resuming suspended output");
                self.inner.engine.resume_output().await?;
            }
            OutputState::Closed => {
                return Err(EngineError::new("output_state", "output context is closed").into());
            }
        }

        self.inner.lock_state().output_unlocked = true;
        Ok(())
    }

    /// Resolve an aborted sequence into the caller's result
    fn settle(&self, generation: u64, abort: Abort) -> Result<LoadOutcome> {
        match abort {
            Abort::Superseded => {
                debug!(generation, "request superseded");
                Ok(LoadOutcome::Superseded)
            }
            Abort::Failed(err) => {
                let mut state = self.inner.lock_state();
                if !self.inner.is_current(generation) {
                    warn!(generation, error = %err, "ignoring failure of superseded request");
                    return Ok(LoadOutcome::Superseded);
                }
                state.fall_to_stopped();
                drop(state);

                error!(error = %err, "engine sequence failed; transport stopped");
                self.inner.emit([
                    UiUpdate::TransportLabel {
                        label: TransportLabel::Play,
                    },
                    UiUpdate::Level {
                        percent: 0.0,
                        band: LevelReading::SILENT.band,
                    },
                    UiUpdate::Error {
                        message: err.to_string(),
                    },
                ]);
                Err(err)
            }
        }
    }

    // ===== Transport =====

    /// Start playback
    ///
    /// Resumes when paused, starts the staged track when stopped, and loads
    /// the selected track when nothing is staged.
    pub async fn play(&self) -> Result<()> {
        let (transport, staged, active, generation) = {
            let state = self.inner.lock_state();
            if state.closed {
                return Err(PlaybackError::SessionClosed);
            }
            (
                state.transport,
                state.prepared.is_some(),
                state.playlist.active_index(),
                self.inner.current_generation(),
            )
        };

        match transport {
            TransportState::Playing => Ok(()),
            TransportState::Paused => self.resume().await,
            TransportState::Stopped if staged => {
                let _lane = self.inner.lane.lock().await;
                match self.start_transport(generation).await {
                    Ok(()) => Ok(()),
                    Err(abort) => self.settle(generation, abort).map(|_| ()),
                }
            }
            TransportState::Stopped => {
                let index = active.ok_or(PlaybackError::EmptyPlaylist)?;
                self.load(index, LoadTrigger::UserAction).await.map(|_| ())
            }
        }
    }

    /// Start the staged track; caller holds the lane
    async fn start_transport(&self, generation: u64) -> Step<()> {
        self.ensure_output_ready().await?;
        self.inner.check(generation)?;
        self.inner.engine.start().await?;

        self.inner.commit(generation, |state| {
            state.transport = TransportState::Playing;
            state.progress.start(now());
            state.level.start();
            state.pollers.cancel();
            state.pollers.progress = Some(spawn_progress_poller(&self.inner, generation));
            state.pollers.level = Some(spawn_level_poller(&self.inner, generation));
        })?;

        debug!(generation, "transport started");
        self.inner.emit([UiUpdate::TransportLabel {
            label: TransportLabel::Pause,
        }]);
        Ok(())
    }

    /// Pause mid-track
    ///
    /// No-op unless playing. Level polling keeps running while paused.
    pub async fn pause(&self) -> Result<()> {
        let generation = self.inner.current_generation();
        let _lane = self.inner.lane.lock().await;
        if self.inner.lock_state().transport != TransportState::Playing {
            return Ok(());
        }

        let result: Step<()> = async {
            self.inner.check(generation)?;
            self.inner.engine.pause().await?;
            self.inner.commit(generation, |state| {
                state.transport = TransportState::Paused;
                state.progress.pause(now());
                state.pollers.cancel_progress();
            })
        }
        .await;

        match result {
            Ok(()) => {
                debug!("transport paused");
                self.inner.emit([UiUpdate::TransportLabel {
                    label: TransportLabel::Play,
                }]);
                Ok(())
            }
            Err(abort) => self.settle(generation, abort).map(|_| ()),
        }
    }

    /// Resume from pause; elapsed time continues where it stopped
    pub async fn resume(&self) -> Result<()> {
        let generation = self.inner.current_generation();
        let _lane = self.inner.lane.lock().await;
        if self.inner.lock_state().transport != TransportState::Paused {
            return Ok(());
        }

        let result: Step<()> = async {
            self.inner.check(generation)?;
            self.inner.engine.resume().await?;
            self.inner.commit(generation, |state| {
                state.transport = TransportState::Playing;
                state.progress.start(now());
                state.pollers.cancel_progress();
                state.pollers.progress = Some(spawn_progress_poller(&self.inner, generation));
            })
        }
        .await;

        match result {
            Ok(()) => {
                debug!("transport resumed");
                self.inner.emit([UiUpdate::TransportLabel {
                    label: TransportLabel::Pause,
                }]);
                Ok(())
            }
            Err(abort) => self.settle(generation, abort).map(|_| ()),
        }
    }

    /// Play/pause button
    pub async fn toggle(&self) -> Result<()> {
        let transport = self.inner.lock_state().transport;
        match transport {
            TransportState::Playing => self.pause().await,
            TransportState::Paused | TransportState::Stopped => self.play().await,
        }
    }

    /// Stop transport and reset the engine session
    ///
    /// Supersedes any in-flight load. Progress and the meter reset at once;
    /// engine teardown follows on the lane.
    pub async fn stop(&self) -> Result<()> {
        let generation = {
            let mut state = self.inner.lock_state();
            if state.closed {
                return Err(PlaybackError::SessionClosed);
            }
            self.request_stop(&mut state)
        };
        self.inner.emit(stopped_updates());
        self.finish_stop(generation).await
    }

    /// Supersede everything in flight and stop polling. Called with the
    /// state lock held.
    fn request_stop(&self, state: &mut SessionState) -> u64 {
        let generation = self.inner.bump_generation();
        state.pollers.cancel();
        state.transport = TransportState::Stopped;
        state.progress.reset();
        state.level.stop();
        generation
    }

    /// Engine teardown for a claimed stop
    async fn finish_stop(&self, generation: u64) -> Result<()> {
        let _lane = self.inner.lane.lock().await;
        match self.teardown(generation).await {
            Ok(()) => {
                debug!(generation, "transport stopped");
                Ok(())
            }
            Err(abort) => self.settle(generation, abort).map(|_| ()),
        }
    }

    /// Engine stop and reset; caller holds the lane
    async fn teardown(&self, generation: u64) -> Step<()> {
        self.inner.check(generation)?;
        self.inner.engine.stop().await?;
        self.inner.check(generation)?;
        self.inner.engine.reset().await?;
        self.inner.commit(generation, |state| {
            state.prepared = None;
            state.program_ready = false;
        })
    }

    /// Natural end of the staged track, called from the progress poller
    async fn finish_track(&self, generation: u64) {
        let _lane = self.inner.lane.lock().await;
        let metering_stopped = self.inner.commit(generation, |state| {
            state.level.stop();
            state.pollers.cancel_level();
        });
        if metering_stopped.is_err() {
            return;
        }
        self.inner.emit_level(LevelReading::SILENT);

        if let Err(abort) = self.teardown(generation).await {
            let _ = self.settle(generation, abort);
            return;
        }

        let finished = self.inner.commit(generation, |state| {
            state.transport = TransportState::Stopped;
            // This runs inside the progress task; release without aborting
            drop(state.pollers.progress.take());
            state.playlist.active_index()
        });
        let Ok(index) = finished else {
            return;
        };

        info!(?index, "track finished");
        let mut updates = vec![UiUpdate::TransportLabel {
            label: TransportLabel::Play,
        }];
        if let Some(index) = index {
            updates.push(UiUpdate::TrackFinished { index });
        }
        self.inner.emit(updates);

        if self.inner.config.auto_advance {
            let session = self.clone();
            tokio::spawn(async move {
                if let Err(err) = session.next().await {
                    warn!(error = %err, "auto-advance failed");
                }
            });
        }
    }

    // ===== Volume =====

    /// Set volume from a 0.0-1.0 slider position
    pub async fn set_volume(&self, fraction: f64) -> Result<()> {
        self.apply_volume(|volume| volume.set_fraction(fraction)).await
    }

    /// Set volume level (0-100)
    pub async fn set_volume_level(&self, level: u8) -> Result<()> {
        self.apply_volume(|volume| volume.set_level(level)).await
    }

    pub async fn mute(&self) -> Result<()> {
        self.apply_volume(Volume::mute).await
    }

    pub async fn unmute(&self) -> Result<()> {
        self.apply_volume(Volume::unmute).await
    }

    /// Update the volume and push the gain when a program is running
    ///
    /// Without a program the gain is applied by the next load.
    async fn apply_volume(&self, f: impl FnOnce(&mut Volume)) -> Result<()> {
        {
            let mut state = self.inner.lock_state();
            if state.closed {
                return Err(PlaybackError::SessionClosed);
            }
            f(&mut state.volume);
        }

        let generation = self.inner.current_generation();
        let _lane = self.inner.lane.lock().await;
        let (ready, gain) = {
            let state = self.inner.lock_state();
            (state.program_ready, state.volume.gain())
        };
        if !ready {
            return Ok(());
        }

        let result = self
            .inner
            .engine
            .set_control_value(&self.inner.config.channels.volume, gain)
            .await;
        match result {
            Ok(()) => {
                debug!(gain, "volume applied");
                Ok(())
            }
            Err(err) => self.settle(generation, err.into()).map(|_| ()),
        }
    }

    // ===== Lifecycle =====

    /// Stop everything and refuse further commands
    pub async fn shutdown(&self) -> Result<()> {
        let generation = {
            let mut state = self.inner.lock_state();
            if state.closed {
                return Ok(());
            }
            state.closed = true;
            let generation = self.inner.bump_generation();
            state.fall_to_stopped();
            generation
        };

        let _lane = self.inner.lane.lock().await;
        match self.teardown(generation).await {
            Ok(()) | Err(Abort::Superseded) => {
                info!("playback session shut down");
                Ok(())
            }
            Err(Abort::Failed(err)) => {
                warn!(error = %err, "engine teardown failed during shutdown");
                Err(err)
            }
        }
    }

    // ===== Queries =====

    pub fn transport(&self) -> TransportState {
        self.inner.lock_state().transport
    }

    pub fn transport_label(&self) -> TransportLabel {
        TransportLabel::for_state(self.transport())
    }

    /// Progress at the current instant
    pub fn progress(&self) -> ProgressSnapshot {
        self.inner.lock_state().progress.snapshot(now())
    }

    pub fn level(&self) -> LevelReading {
        self.inner.lock_state().level.reading()
    }

    pub fn is_metering(&self) -> bool {
        self.inner.lock_state().level.is_active()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.inner.lock_state().playlist.active_index()
    }

    pub fn current_track(&self) -> Option<Track> {
        self.inner.lock_state().playlist.active().cloned()
    }

    /// Id of the track staged in the engine
    pub fn staged_track(&self) -> Option<TrackId> {
        self.inner.lock_state().prepared.as_ref().map(|p| p.id)
    }

    pub fn tracks(&self) -> Vec<Track> {
        self.inner.lock_state().playlist.tracks().to_vec()
    }

    pub fn track_names(&self) -> Vec<String> {
        self.inner.lock_state().playlist.names()
    }

    pub fn playlist_len(&self) -> usize {
        self.inner.lock_state().playlist.len()
    }

    /// Whether previous/next are meaningful
    pub fn can_navigate(&self) -> bool {
        self.inner.lock_state().playlist.can_navigate()
    }

    pub fn volume(&self) -> u8 {
        self.inner.lock_state().volume.level()
    }

    pub fn is_muted(&self) -> bool {
        self.inner.lock_state().volume.is_muted()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock_state().closed
    }
}

/// Transport label, cursor and meter after a stop
fn stopped_updates() -> [UiUpdate; 3] {
    [
        UiUpdate::TransportLabel {
            label: TransportLabel::Play,
        },
        UiUpdate::Progress { fraction: 0.0 },
        UiUpdate::Level {
            percent: 0.0,
            band: LevelReading::SILENT.band,
        },
    ]
}

fn spawn_progress_poller<E: Engine>(inner: &Arc<SessionInner<E>>, generation: u64) -> JoinHandle<()> {
    let weak: Weak<SessionInner<E>> = Arc::downgrade(inner);
    let period = inner.config.frame_interval();

    tokio::spawn(async move {
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let Some(inner) = weak.upgrade() else {
                break;
            };

            let tick = {
                let mut state = inner.lock_state();
                if !inner.is_current(generation) || state.transport != TransportState::Playing {
                    break;
                }
                state.progress.poll(now())
            };

            match tick {
                ProgressTick::Advanced { fraction, .. } => {
                    inner.emit([UiUpdate::Progress { fraction }]);
                }
                ProgressTick::Ended { elapsed } => {
                    debug!(?elapsed, "end of track reached");
                    inner.emit([UiUpdate::Progress { fraction: 1.0 }]);
                    PlaybackSession::from_inner(inner)
                        .finish_track(generation)
                        .await;
                    break;
                }
                // Without a duration there is no cursor and no end to detect
                ProgressTick::Unknown | ProgressTick::Finished => break,
            }
        }
    })
}

fn spawn_level_poller<E: Engine>(inner: &Arc<SessionInner<E>>, generation: u64) -> JoinHandle<()> {
    let weak: Weak<SessionInner<E>> = Arc::downgrade(inner);
    let period = inner.config.frame_interval();

    tokio::spawn(async move {
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let Some(inner) = weak.upgrade() else {
                break;
            };
            if !inner.is_current(generation) {
                break;
            }

            let level = match inner
                .engine
                .get_control_value(&inner.config.channels.level)
                .await
            {
                Ok(level) => level,
                Err(err) => {
                    warn!(error = %err, "level polling failed; meter stopped");
                    let stopped = inner.commit(generation, |state| {
                        state.level.stop();
                        drop(state.pollers.level.take());
                    });
                    if stopped.is_ok() {
                        inner.emit_level(LevelReading::SILENT);
                    }
                    break;
                }
            };

            let reading = {
                let mut state = inner.lock_state();
                if !inner.is_current(generation) {
                    break;
                }
                state.level.update(level)
            };
            match reading {
                Some(reading) => inner.emit_level(reading),
                None => break,
            }
        }
    })
}
