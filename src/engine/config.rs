//! Engine configuration: fixed viewport, sampling parameters, asset root.
//!
//! Loaded from an optional JSON file; every field has a default so running
//! with no config at all works.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("dot_target must be at least 1")]
    ZeroDotTarget,
    #[error("viewport dimensions must be non-zero")]
    ZeroViewport,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Root for models/, shaders/ and audio/.
    pub asset_root: PathBuf,
    /// Width x height of both the window and the offscreen target. Not
    /// resizable at runtime.
    pub viewport: [u32; 2],
    /// Total dot-stream samples per model.
    pub dot_target: u32,
    /// Seed for the surface sampler; same seed, same dots.
    pub sampler_seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("assets"),
            viewport: [1024, 1024],
            dot_target: 500,
            sampler_seed: 0,
        }
    }
}

impl EngineConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            None => Self::default(),
        };
        config.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.dot_target == 0 {
            return Err(ConfigError::ZeroDotTarget);
        }
        if self.viewport[0] == 0 || self.viewport[1] == 0 {
            return Err(ConfigError::ZeroViewport);
        }
        Ok(self)
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.asset_root.join("audio")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::load(None).unwrap();
        assert_eq!(config.viewport, [1024, 1024]);
        assert_eq!(config.dot_target, 500);
        assert_eq!(config.asset_root, PathBuf::from("assets"));
    }

    #[test]
    fn partial_json_keeps_the_remaining_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{ "dot_target": 64 }"#).unwrap();
        let config = config.validate().unwrap();
        assert_eq!(config.dot_target, 64);
        assert_eq!(config.viewport, [1024, 1024]);
    }

    #[test]
    fn zero_dot_target_is_rejected() {
        let config: EngineConfig = serde_json::from_str(r#"{ "dot_target": 0 }"#).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroDotTarget)
        ));
    }
}
