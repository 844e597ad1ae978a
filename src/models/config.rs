use serde::Deserialize;
use thiserror::Error;
use validator::Validate;

use crate::domain::types::{ClassificationMode, KeyColumn};

/// Event namespace used when none is configured.
pub const DEFAULT_EVENT_NAMESPACE: &str = "categorizable.category";

/// Prefix of environment variables overriding file settings.
pub const ENV_PREFIX: &str = "CATEGORIZABLE";

/// Errors raised while loading [`CategorizableConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Source(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

/// Runtime settings of the categorizable layer.
#[derive(Clone, Debug, Deserialize, Validate, PartialEq)]
pub struct CategorizableConfig {
    /// SQLite database path used by the Diesel store.
    #[serde(default = "default_database_url")]
    #[validate(length(min = 1))]
    pub database_url: String,
    /// Prefix of published event names.
    #[serde(default = "default_event_namespace")]
    #[validate(length(min = 1))]
    pub event_namespace: String,
    /// Classification applied to untyped list input.
    #[serde(default)]
    pub classification: ClassificationMode,
    /// Column used by owner filters when none is given.
    #[serde(default)]
    pub default_key_column: KeyColumn,
}

fn default_database_url() -> String {
    "categorizable.db".to_string()
}

fn default_event_namespace() -> String {
    DEFAULT_EVENT_NAMESPACE.to_string()
}

impl Default for CategorizableConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            event_namespace: default_event_namespace(),
            classification: ClassificationMode::default(),
            default_key_column: KeyColumn::default(),
        }
    }
}

impl CategorizableConfig {
    /// Load settings from an optional YAML file, then `CATEGORIZABLE_*`
    /// environment variables (after reading `.env` if present).
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::new(path, config::FileFormat::Yaml));
        }
        builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX));

        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;
        log::debug!(
            "Loaded categorizable config: namespace={}, classification={}",
            settings.event_namespace,
            settings.classification
        );
        Ok(settings)
    }
}
