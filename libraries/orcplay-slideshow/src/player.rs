//! Running slideshow
//!
//! [`SlideshowPlayer`] shows one image at a time, advances images on a timer
//! at the current section's speed, and plays the current section's music
//! through a [`PlaybackSession`].

use crate::error::{Result, SlideshowError};
use crate::keys::{command_for, Key, SlideshowCommand};
use crate::navigator::SlideshowNavigator;
use crate::project::{SectionId, SlideshowProject};
use orcplay_playback::{Engine, LoadTrigger, PlaybackSession, TransportState};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

/// Updates emitted by the slideshow
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SlideshowUpdate {
    /// Image, section label and navigation state
    Slide {
        section_label: String,
        color: String,
        image_name: String,
        counter: String,
        image_nav: bool,
        section_nav: bool,
    },

    /// Slideshow play/pause button
    Playback { playing: bool },

    /// Music info line and music button state
    Music {
        info: String,
        enabled: bool,
        playing: bool,
    },

    /// Controls shown or hidden
    Controls { visible: bool },

    Closed,
}

pub trait SlideshowRenderer: Send + Sync + 'static {
    fn render(&self, update: SlideshowUpdate);
}

impl SlideshowRenderer for UnboundedSender<SlideshowUpdate> {
    fn render(&self, update: SlideshowUpdate) {
        let _ = self.send(update);
    }
}

struct PlayerState {
    navigator: SlideshowNavigator,
    active: bool,
    playing: bool,
    controls_visible: bool,
    /// Section whose music is loaded
    music_section: Option<SectionId>,
    auto_advance: Option<JoinHandle<()>>,
}

impl PlayerState {
    fn slide_update(&self) -> SlideshowUpdate {
        let section = self.navigator.current_section();
        SlideshowUpdate::Slide {
            section_label: section.label.clone(),
            color: section.color.clone(),
            image_name: self.navigator.current_image().name.clone(),
            counter: self.navigator.counter_text(),
            image_nav: self.navigator.image_nav_enabled(),
            section_nav: self.navigator.section_nav_enabled(),
        }
    }

    fn cancel_auto_advance(&mut self) {
        if let Some(handle) = self.auto_advance.take() {
            handle.abort();
        }
    }
}

impl Drop for PlayerState {
    fn drop(&mut self) {
        self.cancel_auto_advance();
    }
}

struct PlayerInner<E: Engine> {
    music: PlaybackSession<E>,
    renderer: Arc<dyn SlideshowRenderer>,
    state: Mutex<PlayerState>,
}

impl<E: Engine> PlayerInner<E> {
    fn lock_state(&self) -> MutexGuard<'_, PlayerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock the state of an open slideshow
    fn active_state(&self) -> Result<MutexGuard<'_, PlayerState>> {
        let state = self.lock_state();
        if state.active {
            Ok(state)
        } else {
            Err(SlideshowError::NotActive)
        }
    }
}

/// A running slideshow
pub struct SlideshowPlayer<E: Engine> {
    inner: Arc<PlayerInner<E>>,
}

impl<E: Engine> Clone for SlideshowPlayer<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Engine> SlideshowPlayer<E> {
    /// Open a slideshow over the sections of `project` that have images
    ///
    /// Shows the first image, starts auto-advance, and plays the first
    /// section's music.
    pub async fn start(
        project: &SlideshowProject,
        music: PlaybackSession<E>,
        renderer: Arc<dyn SlideshowRenderer>,
    ) -> Result<Self> {
        let navigator = SlideshowNavigator::new(project)?;
        let player = Self {
            inner: Arc::new(PlayerInner {
                music,
                renderer,
                state: Mutex::new(PlayerState {
                    navigator,
                    active: true,
                    playing: true,
                    controls_visible: true,
                    music_section: None,
                    auto_advance: None,
                }),
            }),
        };

        let updates = {
            let mut state = player.inner.lock_state();
            player.restart_auto_advance(&mut state);
            [
                state.slide_update(),
                SlideshowUpdate::Playback { playing: true },
                SlideshowUpdate::Controls { visible: true },
            ]
        };
        player.emit(updates);
        info!(
            sections = player.inner.lock_state().navigator.section_count(),
            "slideshow started"
        );

        player.sync_music().await?;
        Ok(player)
    }

    fn emit(&self, updates: impl IntoIterator<Item = SlideshowUpdate>) {
        for update in updates {
            self.inner.renderer.render(update);
        }
    }

    /// Music session driven by this slideshow
    pub fn music(&self) -> &PlaybackSession<E> {
        &self.inner.music
    }

    // ===== Images =====

    pub fn next_image(&self) -> Result<()> {
        let update = {
            let mut state = self.inner.active_state()?;
            state.navigator.next_image();
            state.slide_update()
        };
        self.emit([update]);
        Ok(())
    }

    pub fn previous_image(&self) -> Result<()> {
        let update = {
            let mut state = self.inner.active_state()?;
            state.navigator.previous_image();
            state.slide_update()
        };
        self.emit([update]);
        Ok(())
    }

    // ===== Sections =====

    pub async fn next_section(&self) -> Result<()> {
        self.change_section(SlideshowNavigator::next_section).await
    }

    pub async fn previous_section(&self) -> Result<()> {
        self.change_section(SlideshowNavigator::previous_section)
            .await
    }

    async fn change_section(&self, step: fn(&mut SlideshowNavigator) -> usize) -> Result<()> {
        let update = {
            let mut state = self.inner.active_state()?;
            let section = step(&mut state.navigator);
            debug!(section, "section changed");
            // New section, new speed
            self.restart_auto_advance(&mut state);
            state.slide_update()
        };
        self.emit([update]);
        self.sync_music().await
    }

    /// Load the current section's music if the section changed
    async fn sync_music(&self) -> Result<()> {
        let (section_id, tracks) = {
            let mut state = self.inner.active_state()?;
            let section = state.navigator.current_section();
            let id = section.id;
            if state.music_section == Some(id) {
                return Ok(());
            }
            let tracks = section.music.clone();
            state.music_section = Some(id);
            (id, tracks)
        };

        if tracks.is_empty() {
            debug!(%section_id, "section has no music");
            self.inner.music.stop().await?;
        } else {
            self.inner
                .music
                .replace_tracks(tracks, LoadTrigger::UserAction)
                .await?;
        }

        self.emit([self.music_update()]);
        Ok(())
    }

    // ===== Auto-advance =====

    /// Slideshow play/pause; music is unaffected
    pub fn toggle_playback(&self) -> Result<()> {
        let playing = {
            let mut state = self.inner.active_state()?;
            state.playing = !state.playing;
            self.restart_auto_advance(&mut state);
            state.playing
        };
        self.emit([SlideshowUpdate::Playback { playing }]);
        Ok(())
    }

    /// Replace the auto-advance task; none is started while paused
    fn restart_auto_advance(&self, state: &mut PlayerState) {
        state.cancel_auto_advance();
        if !state.active || !state.playing {
            return;
        }

        let period = state.navigator.current_section().transition;
        let weak: Weak<PlayerInner<E>> = Arc::downgrade(&self.inner);
        state.auto_advance = Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let update = {
                    let mut state = inner.lock_state();
                    if !state.active || !state.playing {
                        break;
                    }
                    state.navigator.next_image();
                    state.slide_update()
                };
                inner.renderer.render(update);
            }
        }));
    }

    // ===== Music =====

    /// Pause or resume the section's music
    ///
    /// A song that ended on its own counts as stopped, so this plays it again.
    pub async fn toggle_music(&self) -> Result<()> {
        if !self.has_music()? {
            return Ok(());
        }

        if self.is_music_playing() {
            self.inner.music.pause().await?;
        } else {
            self.inner.music.play().await?;
        }
        self.emit([self.music_update()]);
        Ok(())
    }

    pub async fn next_song(&self) -> Result<()> {
        if !self.has_music()? {
            return Ok(());
        }
        self.inner.music.next().await?;
        self.after_song_change();
        Ok(())
    }

    pub async fn previous_song(&self) -> Result<()> {
        if !self.has_music()? {
            return Ok(());
        }
        self.inner.music.previous().await?;
        self.after_song_change();
        Ok(())
    }

    fn has_music(&self) -> Result<bool> {
        let state = self.inner.active_state()?;
        Ok(!state.navigator.current_section().music.is_empty())
    }

    fn after_song_change(&self) {
        self.emit([self.music_update()]);
    }

    /// Music volume from a 0.0-1.0 slider
    pub async fn set_volume(&self, fraction: f64) -> Result<()> {
        drop(self.inner.active_state()?);
        self.inner.music.set_volume(fraction).await?;
        Ok(())
    }

    /// "♫ name (i/n)", or a notice when the section has no music
    pub fn music_info(&self) -> String {
        let has_music = {
            let state = self.inner.lock_state();
            !state.navigator.current_section().music.is_empty()
        };
        let current = self.inner.music.current_track();
        match (has_music, current, self.inner.music.active_index()) {
            (true, Some(track), Some(index)) => format!(
                "\u{266B} {} ({}/{})",
                track.display_name,
                index + 1,
                self.inner.music.playlist_len()
            ),
            _ => "No music in this section".to_string(),
        }
    }

    fn music_update(&self) -> SlideshowUpdate {
        let enabled = !self
            .inner
            .lock_state()
            .navigator
            .current_section()
            .music
            .is_empty();
        SlideshowUpdate::Music {
            info: self.music_info(),
            enabled,
            playing: self.is_music_playing(),
        }
    }

    // ===== Controls =====

    pub fn toggle_controls(&self) -> Result<()> {
        let visible = {
            let mut state = self.inner.active_state()?;
            state.controls_visible = !state.controls_visible;
            state.controls_visible
        };
        self.emit([SlideshowUpdate::Controls { visible }]);
        Ok(())
    }

    pub async fn execute(&self, command: SlideshowCommand) -> Result<()> {
        match command {
            SlideshowCommand::PreviousImage => self.previous_image(),
            SlideshowCommand::NextImage => self.next_image(),
            SlideshowCommand::PreviousSection => self.previous_section().await,
            SlideshowCommand::NextSection => self.next_section().await,
            SlideshowCommand::TogglePlayback => self.toggle_playback(),
            SlideshowCommand::ToggleMusic => self.toggle_music().await,
            SlideshowCommand::ToggleControls => self.toggle_controls(),
            SlideshowCommand::Close => self.close().await,
        }
    }

    /// Handle a key press; unbound keys are ignored
    pub async fn handle_key(&self, key: Key) -> Result<()> {
        match command_for(key) {
            Some(command) => self.execute(command).await,
            None => Ok(()),
        }
    }

    /// Stop auto-advance and music; later commands fail with `NotActive`
    pub async fn close(&self) -> Result<()> {
        {
            let mut state = self.inner.active_state()?;
            state.active = false;
            state.playing = false;
            state.music_section = None;
            state.cancel_auto_advance();
        }

        if let Err(err) = self.inner.music.stop().await {
            warn!(error = %err, "could not stop music while closing slideshow");
        }
        self.emit([SlideshowUpdate::Closed]);
        info!("slideshow closed");
        Ok(())
    }

    // ===== Queries =====

    pub fn is_active(&self) -> bool {
        self.inner.lock_state().active
    }

    pub fn is_playing(&self) -> bool {
        self.inner.lock_state().playing
    }

    /// Read from the music session, so a song that ended reads as stopped
    pub fn is_music_playing(&self) -> bool {
        self.inner.music.transport() == TransportState::Playing
    }

    pub fn controls_visible(&self) -> bool {
        self.inner.lock_state().controls_visible
    }

    pub fn counter_text(&self) -> String {
        self.inner.lock_state().navigator.counter_text()
    }

    /// (section, image) position
    pub fn position(&self) -> (usize, usize) {
        let state = self.inner.lock_state();
        (state.navigator.section_index(), state.navigator.image_index())
    }

    pub fn current_image_name(&self) -> String {
        self.inner.lock_state().navigator.current_image().name.clone()
    }
}
