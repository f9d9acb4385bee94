use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

use crate::core::Options;
use crate::validate::{Url, Validator};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Adapter selection for one facade.
///
/// `adapter` names a registered adapter (the family default when absent);
/// `options` are handed to that adapter once it is created.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    pub adapter: Option<String>,
    pub options: Options,
}

impl AdapterConfig {
    pub fn named(adapter: impl Into<String>) -> Self {
        Self {
            adapter: Some(adapter.into()),
            options: Options::new(),
        }
    }

    pub fn with_option(mut self, name: impl Into<String>, value: Value) -> Self {
        self.options.insert(name.into(), value);
        self
    }
}

/// Top-level tracker settings.
///
/// ```json
/// {
///   "tracking_id": "UA-12345-1",
///   "bot_info": { "adapter": "keywords", "options": { "empty_is_bot": false } },
///   "proxy": { "adapter": "rotating", "options": { "proxies": ["http://10.0.0.2:3128"] } }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Collection endpoint; the HTTP facade's `endpoint` option when unset.
    pub endpoint: Option<String>,
    pub tracking_id: Option<String>,
    pub filter_bots: bool,
    pub http: AdapterConfig,
    pub bot_info: AdapterConfig,
    pub proxy: AdapterConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            tracking_id: None,
            filter_bots: true,
            http: AdapterConfig::default(),
            bot_info: AdapterConfig::default(),
            proxy: AdapterConfig::default(),
        }
    }
}

impl TrackerConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        log::debug!("loading tracker config from {}", path.display());
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(endpoint) = &self.endpoint {
            let mut validator = Url::new();
            if !validator.is_valid(Value::String(endpoint.clone())) {
                return Err(ConfigError::Invalid(format!(
                    "endpoint: {}",
                    validator.messages().join("; ")
                )));
            }
        }
        if let Some(tracking_id) = &self.tracking_id
            && tracking_id.trim().is_empty()
        {
            return Err(ConfigError::Invalid("tracking_id must not be blank".into()));
        }
        Ok(())
    }
}
