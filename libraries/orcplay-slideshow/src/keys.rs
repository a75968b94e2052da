//! Keyboard shortcuts

/// A key press as reported by the UI layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Space,
    Escape,
    Char(char),
}

impl Key {
    /// Parse a DOM-style key name ("ArrowLeft", " ", "Escape", "m", ...)
    pub fn from_name(name: &str) -> Option<Self> {
        let key = match name {
            "ArrowLeft" => Self::Left,
            "ArrowRight" => Self::Right,
            "ArrowUp" => Self::Up,
            "ArrowDown" => Self::Down,
            " " | "Spacebar" => Self::Space,
            "Escape" => Self::Escape,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::Char(c),
                    _ => return None,
                }
            }
        };
        Some(key)
    }
}

/// Slideshow actions reachable from the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideshowCommand {
    PreviousImage,
    NextImage,
    PreviousSection,
    NextSection,
    TogglePlayback,
    ToggleMusic,
    ToggleControls,
    Close,
}

/// Map a key to its command; unbound keys map to `None`
pub fn command_for(key: Key) -> Option<SlideshowCommand> {
    let command = match key {
        Key::Left => SlideshowCommand::PreviousImage,
        Key::Right => SlideshowCommand::NextImage,
        Key::Up => SlideshowCommand::PreviousSection,
        Key::Down => SlideshowCommand::NextSection,
        Key::Space => SlideshowCommand::TogglePlayback,
        Key::Escape => SlideshowCommand::Close,
        Key::Char('m' | 'M') => SlideshowCommand::ToggleMusic,
        Key::Char('h' | 'H') => SlideshowCommand::ToggleControls,
        Key::Char(_) => return None,
    };
    Some(command)
}
