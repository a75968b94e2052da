//! Slideshow project editing
//!
//! A project is an ordered list of sections. Each section carries its own
//! images, background music and photo transition speed.

use crate::error::{Result, SlideshowError};
use orcplay_playback::Track;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Section background colours, assigned in order and cycled
pub const COLOR_PALETTE: [&str; 8] = [
    "#f4e4d7", // beige
    "#e8f4d7", // light green
    "#d7e8f4", // light blue
    "#f4d7e8", // light pink
    "#f4ead7", // peach
    "#e8d7f4", // lavender
    "#d7f4ea", // mint
    "#f4d7d7", // light coral
];

/// Seconds each photo stays on screen unless changed
pub const DEFAULT_TRANSITION: Duration = Duration::from_secs(3);

/// Accepted transition range
pub const MIN_TRANSITION: Duration = Duration::from_secs(1);
pub const MAX_TRANSITION: Duration = Duration::from_secs(10);

/// Stable section identifier; never reused within a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SectionId(u64);

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An opaque image: the slideshow only shows it, never decodes it
#[derive(Debug, Clone, PartialEq)]
pub struct SlideImage {
    pub name: String,
    pub bytes: Arc<[u8]>,
}

impl SlideImage {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Section {
    pub id: SectionId,
    pub label: String,
    pub color: String,
    pub images: Vec<SlideImage>,
    pub music: Vec<Track>,
    pub transition: Duration,
}

/// Ordered collection of sections
#[derive(Debug, Clone, Default)]
pub struct SlideshowProject {
    sections: Vec<Section>,
    next_id: u64,
}

impl SlideshowProject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an empty section labelled "Section N"
    pub fn add_section(&mut self) -> SectionId {
        let id = SectionId(self.next_id);
        self.next_id += 1;

        let position = self.sections.len();
        self.sections.push(Section {
            id,
            label: format!("Section {}", position + 1),
            color: COLOR_PALETTE[position % COLOR_PALETTE.len()].to_string(),
            images: Vec::new(),
            music: Vec::new(),
            transition: DEFAULT_TRANSITION,
        });
        id
    }

    pub fn remove_section(&mut self, id: SectionId) -> Result<Section> {
        let index = self
            .sections
            .iter()
            .position(|s| s.id == id)
            .ok_or(SlideshowError::SectionNotFound(id))?;
        Ok(self.sections.remove(index))
    }

    /// Rename a section; blank labels are ignored
    pub fn rename(&mut self, id: SectionId, label: &str) -> Result<()> {
        let label = label.trim();
        let section = self.section_mut(id)?;
        if !label.is_empty() {
            section.label = label.to_string();
        }
        Ok(())
    }

    pub fn set_color(&mut self, id: SectionId, color: impl Into<String>) -> Result<()> {
        self.section_mut(id)?.color = color.into();
        Ok(())
    }

    /// Set seconds per photo, clamped to 1-10
    pub fn set_transition_secs(&mut self, id: SectionId, secs: f64) -> Result<Duration> {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(SlideshowError::InvalidTransition(secs));
        }
        let transition = Duration::from_secs_f64(secs).clamp(MIN_TRANSITION, MAX_TRANSITION);
        self.section_mut(id)?.transition = transition;
        Ok(transition)
    }

    pub fn add_images(&mut self, id: SectionId, images: Vec<SlideImage>) -> Result<()> {
        self.section_mut(id)?.images.extend(images);
        Ok(())
    }

    pub fn remove_image(&mut self, id: SectionId, index: usize) -> Result<SlideImage> {
        let images = &mut self.section_mut(id)?.images;
        if index >= images.len() {
            return Err(SlideshowError::IndexOutOfBounds {
                index,
                len: images.len(),
            });
        }
        Ok(images.remove(index))
    }

    pub fn add_music(&mut self, id: SectionId, tracks: Vec<Track>) -> Result<()> {
        self.section_mut(id)?.music.extend(tracks);
        Ok(())
    }

    pub fn remove_music(&mut self, id: SectionId, index: usize) -> Result<Track> {
        let music = &mut self.section_mut(id)?.music;
        if index >= music.len() {
            return Err(SlideshowError::IndexOutOfBounds {
                index,
                len: music.len(),
            });
        }
        Ok(music.remove(index))
    }

    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    fn section_mut(&mut self, id: SectionId) -> Result<&mut Section> {
        self.sections
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(SlideshowError::SectionNotFound(id))
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Images across all sections
    pub fn image_count(&self) -> usize {
        self.sections.iter().map(|s| s.images.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(name: &str) -> SlideImage {
        SlideImage::new(name, vec![0u8; 4])
    }

    #[test]
    fn sections_get_default_label_and_palette_colour() {
        let mut project = SlideshowProject::new();
        let ids: Vec<_> = (0..9).map(|_| project.add_section()).collect();

        let first = project.section(ids[0]).unwrap();
        assert_eq!(first.label, "Section 1");
        assert_eq!(first.color, COLOR_PALETTE[0]);
        assert_eq!(first.transition, DEFAULT_TRANSITION);

        // Ninth section wraps to the first colour
        assert_eq!(project.section(ids[8]).unwrap().color, COLOR_PALETTE[0]);
        assert_eq!(project.section(ids[8]).unwrap().label, "Section 9");
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let mut project = SlideshowProject::new();
        let a = project.add_section();
        project.remove_section(a).unwrap();
        let b = project.add_section();

        assert_ne!(a, b);
        assert!(matches!(
            project.remove_section(a),
            Err(SlideshowError::SectionNotFound(_))
        ));
        // Label follows position, not id
        assert_eq!(project.section(b).unwrap().label, "Section 1");
    }

    #[test]
    fn rename_ignores_blank_labels() {
        let mut project = SlideshowProject::new();
        let id = project.add_section();

        project.rename(id, "  1970s ").unwrap();
        assert_eq!(project.section(id).unwrap().label, "1970s");

        project.rename(id, "   ").unwrap();
        assert_eq!(project.section(id).unwrap().label, "1970s");
    }

    #[test]
    fn transition_is_validated_and_clamped() {
        let mut project = SlideshowProject::new();
        let id = project.add_section();

        assert_eq!(
            project.set_transition_secs(id, 5.0).unwrap(),
            Duration::from_secs(5)
        );
        assert_eq!(project.set_transition_secs(id, 0.2).unwrap(), MIN_TRANSITION);
        assert_eq!(project.set_transition_secs(id, 60.0).unwrap(), MAX_TRANSITION);

        assert!(matches!(
            project.set_transition_secs(id, 0.0),
            Err(SlideshowError::InvalidTransition(_))
        ));
        assert!(matches!(
            project.set_transition_secs(id, f64::NAN),
            Err(SlideshowError::InvalidTransition(_))
        ));
        assert_eq!(project.section(id).unwrap().transition, MAX_TRANSITION);
    }

    #[test]
    fn images_and_music_are_edited_in_place() {
        let mut project = SlideshowProject::new();
        let id = project.add_section();

        project
            .add_images(id, vec![image("a.jpg"), image("b.jpg"), image("c.jpg")])
            .unwrap();
        let removed = project.remove_image(id, 1).unwrap();
        assert_eq!(removed.name, "b.jpg");
        assert_eq!(project.image_count(), 2);
        assert!(matches!(
            project.remove_image(id, 5),
            Err(SlideshowError::IndexOutOfBounds { index: 5, len: 2 })
        ));

        project
            .add_music(id, vec![Track::new("song.mp3", vec![1u8])])
            .unwrap();
        assert_eq!(project.remove_music(id, 0).unwrap().display_name, "song.mp3");
        assert!(project.section(id).unwrap().music.is_empty());
    }
}
