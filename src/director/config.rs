//! Director configuration

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::{DirectorError, DirectorResult};

/// Default key the catalog is persisted under in `state`
pub const DEFAULT_STORE_KEY: &str = "$store";
/// Default key of the user-visible message slot in `state`
pub const DEFAULT_MESSAGE_KEY: &str = "message";

/// How a director interacts with the shared `state` object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorConfig {
    /// Install and sync the modifier catalog into `state`
    pub persist_catalog: bool,
    /// Key of the persisted catalog
    pub store_key: String,
    /// Mirror recovered errors and `Director::log` messages into the message slot
    pub surface_errors: bool,
    /// Key of the user-visible message slot
    pub message_key: String,
}

impl DirectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_persist_catalog(mut self, persist: bool) -> Self {
        self.persist_catalog = persist;
        self
    }

    pub fn with_store_key(mut self, key: impl Into<String>) -> Self {
        self.store_key = key.into();
        self
    }

    pub fn with_surface_errors(mut self, surface: bool) -> Self {
        self.surface_errors = surface;
        self
    }

    pub fn with_message_key(mut self, key: impl Into<String>) -> Self {
        self.message_key = key.into();
        self
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> DirectorResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| DirectorError::Io {
            origin: "DirectorConfig::from_file".to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| DirectorError::Json {
            origin: "DirectorConfig::from_file".to_string(),
            source,
        })?;
        config.validate()?;
        tracing::info!("Loaded director config from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> DirectorResult<()> {
        if self.store_key.is_empty() || self.message_key.is_empty() {
            return Err(DirectorError::Config {
                origin: "DirectorConfig::validate".to_string(),
                message: "state keys must not be empty".to_string(),
            });
        }
        if self.persist_catalog && self.store_key == self.message_key {
            return Err(DirectorError::Config {
                origin: "DirectorConfig::validate".to_string(),
                message: format!("\"{}\" is used for both catalog and message", self.store_key),
            });
        }
        Ok(())
    }
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            persist_catalog: true,
            store_key: DEFAULT_STORE_KEY.to_string(),
            surface_errors: true,
            message_key: DEFAULT_MESSAGE_KEY.to_string(),
        }
    }
}
