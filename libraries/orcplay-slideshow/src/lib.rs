//! Orcplay - Slideshow
//!
//! Photo slideshow organised in sections, each with its own background
//! music and photo speed.
//!
//! This crate provides:
//! - Project editing (sections, labels, colours, images, music, speed)
//! - Pure navigation with wrapping image and section order
//! - A running player with timed auto-advance and per-section music
//! - Keyboard shortcut mapping
//!
//! Music is played through an `orcplay_playback::PlaybackSession`, so any
//! engine the session accepts drives the slideshow too.

mod error;
pub mod keys;
mod navigator;
mod player;
pub mod project;

// Public exports
pub use error::{Result, SlideshowError};
pub use keys::{command_for, Key, SlideshowCommand};
pub use navigator::SlideshowNavigator;
pub use player::{SlideshowPlayer, SlideshowRenderer, SlideshowUpdate};
pub use project::{Section, SectionId, SlideImage, SlideshowProject};
