/// Application configuration
use crate::error::{CliError, Result};
use orcplay_playback::PlayerConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "orcplay.toml";

/// Environment variable prefix (`ORCPLAY_PLAYER__VOLUME=50`)
pub const ENV_PREFIX: &str = "ORCPLAY";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub player: PlayerConfig,

    #[serde(default)]
    pub simulation: SimulationSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationSettings {
    /// Level reported by the dry-run engine while running (0.0-1.0)
    #[serde(default = "default_level")]
    pub level: f64,

    /// Stop after this many seconds
    #[serde(default)]
    pub limit_secs: Option<f64>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            limit_secs: None,
        }
    }
}

fn default_level() -> f64 {
    0.5
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `orcplay.toml` is used when
    /// present. `ORCPLAY_`-prefixed variables override file values, with `__`
    /// separating nested keys.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Like [`AppConfig::load`], reading variables from `env` instead of the
    /// process environment when given
    pub fn load_with_env(path: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.player.validate()?;

        let level = self.simulation.level;
        if !(0.0..=1.0).contains(&level) {
            return Err(CliError::Config(format!(
                "simulation.level must be within 0.0-1.0, got {level}"
            )));
        }
        if let Some(limit) = self.simulation.limit_secs {
            if !limit.is_finite() || limit <= 0.0 {
                return Err(CliError::Config(format!(
                    "simulation.limit_secs must be positive, got {limit}"
                )));
            }
        }

        Ok(())
    }
}
