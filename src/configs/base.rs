use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{common::types::AnyResult, configs::*};

const DEFAULT_CONFIG_PATHS: [&str; 2] = ["config.toml", "config.default.toml"];

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
  #[serde(default)]
  pub logging: Option<LoggingConfig>,
  #[serde(default)]
  pub sources: SourcesConfig,
  #[serde(default)]
  pub gamepass: Option<GamepassConfig>,
}

impl Config {
  /// Loads `explicit` if given, else the first default file that exists, else defaults.
  pub fn load(explicit: Option<&Path>) -> AnyResult<Self> {
    let config_path = match explicit {
      Some(path) if path.exists() => path,
      Some(path) => return Err(format!("{} not found", path.display()).into()),
      None => match DEFAULT_CONFIG_PATHS.iter().copied().map(Path::new).find(|p| p.exists()) {
        Some(path) => path,
        None => return Ok(Self::default()),
      },
    };

    let config_str = std::fs::read_to_string(config_path)?;
    if config_str.trim().is_empty() {
      return Err(format!("{} is empty", config_path.display()).into());
    }

    Self::from_toml(&config_str)
  }

  pub fn from_toml(config_str: &str) -> AnyResult<Self> {
    let config: Config = toml::from_str(config_str)?;
    Ok(config)
  }
}
