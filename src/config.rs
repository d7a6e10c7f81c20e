// Layered settings: built-in defaults, an optional file, then environment

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::EngineConfig;
use crate::validation::ValidatorConfig;

/// Environment variables use this prefix with `__` between path segments,
/// e.g. `MARKETLENS__VALIDATOR__MIN_RISK_REWARD=1.5`
pub const ENV_PREFIX: &str = "MARKETLENS";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineConfig,
    pub validator: ValidatorConfig,
    pub log_filter: String, // tracing-subscriber EnvFilter directive
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            validator: ValidatorConfig::default(),
            log_filter: "marketlens=info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings; a missing `path` means defaults plus environment only
    ///
    /// The file format follows its extension (TOML, JSON, YAML, ...).
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        let mut builder = ::config::Config::builder()
            .add_source(::config::Config::try_from(&Settings::default())?);

        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(true));
        }

        let settings: Settings = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        tracing::debug!("Loaded settings (file: {:?})", path);
        Ok(settings)
    }
}
