//! Configuration management for the synfield CLI.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// On-disk CLI configuration: the engine's own tunables (`synfield_net::Config`)
/// plus CLI-local output preferences, loaded from and saved to a TOML file
/// under the user's config directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    pub engine: EngineConfig,
    pub output_format: OutputFormat,
}

/// Mirrors `synfield_net::Config` field for field, so the TOML file can be
/// hand-edited without reaching into the library crate's own type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EngineConfig {
    pub alpha: f64,
    pub learn_rate: f64,
    pub training_enabled: bool,
    pub counting_enabled: bool,
    pub neuron_provider_retention: i64,
    pub timeout: i64,
}

impl From<EngineConfig> for synfield_net::Config {
    fn from(c: EngineConfig) -> Self {
        synfield_net::Config {
            alpha: c.alpha,
            learn_rate: c.learn_rate,
            training_enabled: c.training_enabled,
            counting_enabled: c.counting_enabled,
            neuron_provider_retention: c.neuron_provider_retention,
            timeout: c.timeout,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        let d = synfield_net::Config::default();
        Self {
            alpha: d.alpha,
            learn_rate: d.learn_rate,
            training_enabled: d.training_enabled,
            counting_enabled: d.counting_enabled,
            neuron_provider_retention: d.neuron_provider_retention,
            timeout: d.timeout,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Text,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            output_format: OutputFormat::Json,
        }
    }
}

impl CliConfig {
    /// The default config file path: `<config_dir>/synfield/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("synfield").join("config.toml"))
    }

    pub fn load_from_file(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(CliError::from)
    }

    pub fn save_to_file(&self, path: &Path) -> CliResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(CliError::from)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Loads from `explicit` if given, else the default path, falling back
    /// to built-in defaults when neither exists.
    pub fn load(explicit: Option<&Path>) -> CliResult<Self> {
        match explicit {
            Some(path) => Self::load_from_file(path),
            None => match Self::default_path() {
                Some(path) => Self::load_from_file(&path),
                None => Err(CliError::config("could not determine a config directory")),
            },
        }
    }
}
