use crate::project::SectionId;
use orcplay_playback::PlaybackError;
use thiserror::Error;

/// Result type for slideshow operations
pub type Result<T> = std::result::Result<T, SlideshowError>;

/// Slideshow errors
#[derive(Error, Debug)]
pub enum SlideshowError {
    /// No section has an image
    #[error("No images to show")]
    NoImages,

    #[error("Section not found: {0}")]
    SectionNotFound(SectionId),

    #[error("Index out of bounds: {index} (section has {len} items)")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Transition speed must be a positive number of seconds
    #[error("Invalid transition speed: {0}")]
    InvalidTransition(f64),

    /// Slideshow was closed
    #[error("Slideshow is not active")]
    NotActive,

    /// Music playback failed
    #[error(transparent)]
    Playback(#[from] PlaybackError),
}
