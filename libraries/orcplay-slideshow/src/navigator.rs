//! Slide navigation
//!
//! Pure position bookkeeping over the sections that have images. Image
//! navigation wraps within a section; section navigation wraps across
//! sections and always lands on the section's first image.

use crate::error::{Result, SlideshowError};
use crate::project::{Section, SlideImage, SlideshowProject};

#[derive(Debug, Clone)]
pub struct SlideshowNavigator {
    /// Sections with at least one image, in project order
    sections: Vec<Section>,
    section: usize,
    image: usize,
}

impl SlideshowNavigator {
    /// Snapshot the showable sections of `project`
    pub fn new(project: &SlideshowProject) -> Result<Self> {
        let sections: Vec<Section> = project
            .sections()
            .iter()
            .filter(|s| !s.images.is_empty())
            .cloned()
            .collect();

        if sections.is_empty() {
            return Err(SlideshowError::NoImages);
        }

        Ok(Self {
            sections,
            section: 0,
            image: 0,
        })
    }

    pub fn current_section(&self) -> &Section {
        &self.sections[self.section]
    }

    pub fn current_image(&self) -> &SlideImage {
        &self.current_section().images[self.image]
    }

    pub fn section_index(&self) -> usize {
        self.section
    }

    pub fn image_index(&self) -> usize {
        self.image
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn next_image(&mut self) -> usize {
        let len = self.current_section().images.len();
        self.image = (self.image + 1) % len;
        self.image
    }

    pub fn previous_image(&mut self) -> usize {
        let len = self.current_section().images.len();
        self.image = (self.image + len - 1) % len;
        self.image
    }

    pub fn next_section(&mut self) -> usize {
        self.section = (self.section + 1) % self.sections.len();
        self.image = 0;
        self.section
    }

    pub fn previous_section(&mut self) -> usize {
        let len = self.sections.len();
        self.section = (self.section + len - 1) % len;
        self.image = 0;
        self.section
    }

    /// "Image i of n | Section s of m"
    pub fn counter_text(&self) -> String {
        format!(
            "Image {} of {} | Section {} of {}",
            self.image + 1,
            self.current_section().images.len(),
            self.section + 1,
            self.sections.len()
        )
    }

    /// Previous/next image buttons are meaningful
    pub fn image_nav_enabled(&self) -> bool {
        self.current_section().images.len() > 1
    }

    /// Previous/next section buttons are meaningful
    pub fn section_nav_enabled(&self) -> bool {
        self.sections.len() > 1
    }
}
