// src/config.rs
use crate::error::FolioError;
use folio_core::{CacheStrategy, EngineSettings};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// Engine configuration, usually loaded from a JSON file.
///
/// Every field has a default, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Allow independent sub-captures of one request to run in parallel when
    /// the engine is lightly loaded.
    ///
    /// Defaults to `false`.
    pub concurrent_subrequests: bool,

    /// Verify parent/child edge agreement every time a page enters a request
    /// cache. Explicit full verification runs regardless.
    ///
    /// Defaults to `true`.
    pub verify_parent_child: bool,

    /// The number of concurrently active requests below which parallel
    /// processing is recommended.
    ///
    /// Defaults to the number of available CPUs.
    pub preferred_concurrency: Option<usize>,

    /// Which page cache requests use.
    ///
    /// Defaults to [`CacheStrategy::Auto`].
    pub cache_strategy: CacheStrategy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrent_subrequests: false,
            verify_parent_child: true,
            preferred_concurrency: None,
            cache_strategy: CacheStrategy::Auto,
        }
    }
}

impl EngineConfig {
    pub fn from_json(source: &str) -> Result<Self, FolioError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, FolioError> {
        let path_ref = path.as_ref();
        let source = fs::read_to_string(path_ref).map_err(|e| {
            FolioError::Io(io::Error::new(
                e.kind(),
                format!("Failed to read engine config from '{}': {}", path_ref.display(), e),
            ))
        })?;
        Self::from_json(&source)
    }

    pub(crate) fn settings(&self) -> EngineSettings {
        EngineSettings {
            verify_parent_child: self.verify_parent_child,
            cache_strategy: self.cache_strategy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_gives_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(!config.concurrent_subrequests);
        assert!(config.verify_parent_child);
    }

    #[test]
    fn test_partial_config() {
        let config =
            EngineConfig::from_json(r#"{"concurrent_subrequests": true, "cache_strategy": "shared"}"#).unwrap();
        assert!(config.concurrent_subrequests);
        assert_eq!(config.cache_strategy, CacheStrategy::Shared);
        assert_eq!(config.preferred_concurrency, None);
    }

    #[test]
    fn test_invalid_strategy_is_rejected() {
        let err = EngineConfig::from_json(r#"{"cache_strategy": "global"}"#).unwrap_err();
        assert!(matches!(err, FolioError::Json(_)));
    }
}
