/// CLI error types
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Playback(#[from] orcplay_playback::PlaybackError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<config::ConfigError> for CliError {
    fn from(err: config::ConfigError) -> Self {
        CliError::Config(err.to_string())
    }
}
