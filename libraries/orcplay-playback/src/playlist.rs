//! Ordered playlist with an active selection
//!
//! Insertion order is playback order. The active index is either `None` or a
//! valid index into the track list; every mutation re-establishes that.

use crate::error::{PlaybackError, Result};
use crate::types::{Track, TrackId};
use std::time::Duration;

/// Playlist of loaded audio sources
#[derive(Debug, Clone, Default)]
pub struct PlaylistManager {
    /// Tracks in playback order
    tracks: Vec<Track>,

    /// Currently selected track
    active: Option<usize>,
}

impl PlaylistManager {
    /// Create new empty playlist
    pub fn new() -> Self {
        Self::default()
    }

    /// Add track to the end
    ///
    /// The first track added is also selected. Starting playback is the
    /// caller's decision.
    pub fn append(&mut self, track: Track) {
        self.tracks.push(track);
        if self.active.is_none() {
            self.active = Some(0);
        }
    }

    /// Select track at index
    pub fn select_at(&mut self, index: usize) -> Result<&Track> {
        if index >= self.tracks.len() {
            return Err(PlaybackError::IndexOutOfBounds {
                index,
                len: self.tracks.len(),
            });
        }
        self.active = Some(index);
        Ok(&self.tracks[index])
    }

    /// Select the following track, wrapping to the start
    pub fn next(&mut self) -> Result<usize> {
        let len = self.tracks.len();
        if len == 0 {
            return Err(PlaybackError::EmptyPlaylist);
        }
        let index = self.active.map_or(0, |current| (current + 1) % len);
        self.active = Some(index);
        Ok(index)
    }

    /// Select the preceding track, wrapping to the end
    pub fn previous(&mut self) -> Result<usize> {
        let len = self.tracks.len();
        if len == 0 {
            return Err(PlaybackError::EmptyPlaylist);
        }
        let index = self.active.map_or(len - 1, |current| (current + len - 1) % len);
        self.active = Some(index);
        Ok(index)
    }

    /// Remove track at index
    ///
    /// Removing the active track selects its successor, which now occupies
    /// `index`; if it was the last one the selection clamps to the new last
    /// track, or clears when the playlist is empty. Stopping playback of the
    /// removed track is the caller's job.
    pub fn remove(&mut self, index: usize) -> Result<Track> {
        if index >= self.tracks.len() {
            return Err(PlaybackError::IndexOutOfBounds {
                index,
                len: self.tracks.len(),
            });
        }

        let track = self.tracks.remove(index);
        let len = self.tracks.len();

        self.active = match self.active {
            _ if len == 0 => None,
            Some(active) if active == index => Some(index.min(len - 1)),
            Some(active) if active > index => Some(active - 1),
            other => other,
        };

        Ok(track)
    }

    /// Remove every track
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.active = None;
    }

    /// Record a decoded duration on a track
    pub fn set_duration(&mut self, id: TrackId, duration: Duration) -> bool {
        match self.tracks.iter_mut().find(|t| t.id == id) {
            Some(track) => {
                track.duration = Some(duration);
                true
            }
            None => false,
        }
    }

    /// Index of the active track
    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    /// Active track
    pub fn active(&self) -> Option<&Track> {
        self.active.and_then(|i| self.tracks.get(i))
    }

    /// Track at index
    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Position of a track by id
    pub fn position(&self, id: TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    /// All tracks in playback order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Display names in playback order
    pub fn names(&self) -> Vec<String> {
        self.tracks.iter().map(|t| t.display_name.clone()).collect()
    }

    /// Whether previous/next would select a different track
    pub fn can_navigate(&self) -> bool {
        self.tracks.len() > 1
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
