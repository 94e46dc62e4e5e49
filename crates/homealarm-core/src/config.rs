use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validation::{validate_threshold, ValidationError};

pub const ENV_PREFIX: &str = "HOMEALARM";
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 50.0;
pub const DEFAULT_DATABASE_PATH: &str = "homealarm.db";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config load failed: {0}")]
    Load(#[from] config::ConfigError),
    #[error("config render failed: {0}")]
    Render(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(#[from] ValidationError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Minimum classifier confidence (percent) for a frame to count as a cat.
    pub confidence_threshold: f32,
    pub database_path: PathBuf,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
        }
    }
}

impl SecurityConfig {
    /// Defaults, then the TOML file at `path` (if given), then `HOMEALARM_*`
    /// environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    pub(crate) fn load_with_prefix(path: Option<&Path>, prefix: &str) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("confidence_threshold", f64::from(DEFAULT_CONFIDENCE_THRESHOLD))?
            .set_default("database_path", DEFAULT_DATABASE_PATH)?;
        if let Some(p) = path {
            builder = builder.add_source(
                config::File::from(p).format(config::FileFormat::Toml).required(true),
            );
        }
        let cfg: SecurityConfig = builder
            .add_source(config::Environment::with_prefix(prefix).try_parsing(true))
            .build()?
            .try_deserialize()?;
        cfg.validate()?;
        log::debug!("loaded config: {:?}", cfg);
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_threshold(self.confidence_threshold)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
