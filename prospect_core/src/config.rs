//! Runtime configuration for the prospecting core.
//!
//! Loaded from `prospect_config.json` with an environment variable override,
//! falling back to the builtin copy when nothing readable is found.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::Deserialize;
use thiserror::Error;

pub const BUILTIN_PROSPECT_CONFIG: &str = include_str!("data/prospect_config.json");

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProspectConfig {
    /// Hard bound on the daily visiting sequence.
    pub tour_capacity: usize,
    /// Maximum pool fed to the suggestion heuristic.
    pub suggestion_pool_max: usize,
    /// Target-pool size at which the visibility pass goes parallel.
    pub parallel_min_targets: usize,
}

impl Default for ProspectConfig {
    fn default() -> Self {
        Self {
            tour_capacity: 8,
            suggestion_pool_max: 50,
            parallel_min_targets: 256,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProspectConfigError {
    #[error("failed to parse prospect config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read prospect config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ProspectConfig {
    pub fn builtin() -> Arc<Self> {
        Arc::new(serde_json::from_str(BUILTIN_PROSPECT_CONFIG).unwrap_or_else(|err| {
            tracing::warn!(
                target: "prospect::config",
                error = %err,
                "builtin prospect config failed to parse, using defaults"
            );
            Self::default()
        }))
    }

    pub fn from_file(path: &Path) -> Result<Self, ProspectConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ProspectConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&data)?)
    }
}

/// Where the active configuration came from.
#[derive(Debug, Clone)]
pub struct ProspectConfigMetadata {
    path: Option<PathBuf>,
}

impl ProspectConfigMetadata {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }
}

/// Load configuration from `PROSPECT_CONFIG_PATH` or the bundled default.
pub fn load_prospect_config_from_env() -> (Arc<ProspectConfig>, ProspectConfigMetadata) {
    if let Some(path) = env::var("PROSPECT_CONFIG_PATH").ok().map(PathBuf::from) {
        match ProspectConfig::from_file(&path) {
            Ok(config) => {
                tracing::info!(
                    target: "prospect::config",
                    path = %path.display(),
                    "prospect_config.loaded=file"
                );
                return (Arc::new(config), ProspectConfigMetadata::new(Some(path)));
            }
            Err(err) => {
                tracing::warn!(
                    target: "prospect::config",
                    path = %path.display(),
                    error = %err,
                    "prospect_config.load_failed"
                );
            }
        }
    }

    let config = ProspectConfig::builtin();
    tracing::info!(target: "prospect::config", "prospect_config.loaded=builtin");
    (config, ProspectConfigMetadata::new(None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_product_bounds() {
        let config = ProspectConfig::default();
        assert_eq!(config.tour_capacity, 8);
        assert_eq!(config.suggestion_pool_max, 50);
    }

    #[test]
    fn builtin_config_parses() {
        let config = ProspectConfig::builtin();
        assert_eq!(config.tour_capacity, 8);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = ProspectConfig::from_file(Path::new("/nonexistent/prospect.json")).unwrap_err();
        assert!(matches!(err, ProspectConfigError::Read { .. }));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: ProspectConfig = serde_json::from_str("{\"tour_capacity\": 4}").unwrap();
        assert_eq!(config.tour_capacity, 4);
        assert_eq!(config.suggestion_pool_max, 50);
    }
}
