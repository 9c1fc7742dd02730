//! # gqlbind-config
//!
//! Configuration for the gqlbind GraphQL layer.
//!
//! Configuration can be specified in `gqlbind.toml` and overridden with
//! `GQLBIND__*` environment variables (see [`loader`]).
//!
//! # Example Configuration
//!
//! ```toml
//! default_schema = "default"
//! lazyload_types = true
//! execution_middleware = ["cache"]
//! params_key = "variables"
//!
//! [schemas]
//! default = "DefaultSchema"
//!
//! [types]
//! Example = "ExampleType"
//!
//! [apq]
//! enable = true
//! cache_prefix = "graphql.apq"
//! ttl = 300
//! ```

pub mod loader;

use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Error types for configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Source error: {0}")]
    Source(#[from] config::ConfigError),
}

impl ConfigError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// GraphQL layer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQLConfig {
    /// Schema used when a request or call does not name one.
    /// Default: "default"
    #[serde(default = "default_schema")]
    pub default_schema: String,

    /// Schemas registered at startup: schema name -> config provider identifier.
    #[serde(default)]
    pub schemas: IndexMap<String, String>,

    /// Types registered at startup: type name -> type identifier.
    #[serde(default)]
    pub types: IndexMap<String, String>,

    /// Resolve member types on demand while assembling a schema.
    /// When disabled every registered type is resolved for every schema.
    /// Default: true
    #[serde(default = "default_lazyload_types")]
    pub lazyload_types: bool,

    /// Container identifier of the wrapper used by `paginate`.
    #[serde(default = "default_pagination_type")]
    pub pagination_type: String,

    /// Container identifier of the wrapper used by `simple_paginate`.
    #[serde(default = "default_simple_pagination_type")]
    pub simple_pagination_type: String,

    /// Ordered container identifiers of execution middleware.
    #[serde(default)]
    pub execution_middleware: Vec<String>,

    /// Container identifier of a custom error formatter.
    /// `None` uses the built-in formatter.
    #[serde(default)]
    pub error_formatter: Option<String>,

    /// Container identifier of a custom errors handler.
    /// `None` uses the built-in handler.
    #[serde(default)]
    pub errors_handler: Option<String>,

    /// Request key holding the query variables.
    /// Default: "variables"
    #[serde(default = "default_params_key")]
    pub params_key: String,

    /// Expose internal error messages to clients.
    /// Default: false
    #[serde(default)]
    pub debug: bool,

    /// Automatic persisted queries.
    #[serde(default)]
    pub apq: ApqConfig,
}

/// Automatic persisted query configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApqConfig {
    /// Default: false
    #[serde(default)]
    pub enable: bool,

    /// Cache driver name; `None` selects the default driver.
    #[serde(default)]
    pub cache_driver: Option<String>,

    /// Default: "graphql.apq"
    #[serde(default = "default_apq_cache_prefix")]
    pub cache_prefix: String,

    /// Seconds a persisted query stays cached.
    /// Default: 300
    #[serde(default = "default_apq_ttl")]
    pub ttl: u64,
}

fn default_schema() -> String {
    "default".to_string()
}

fn default_lazyload_types() -> bool {
    true
}

fn default_pagination_type() -> String {
    "pagination".to_string()
}

fn default_simple_pagination_type() -> String {
    "simple_pagination".to_string()
}

fn default_params_key() -> String {
    "variables".to_string()
}

fn default_apq_cache_prefix() -> String {
    "graphql.apq".to_string()
}

fn default_apq_ttl() -> u64 {
    300
}

impl Default for GraphQLConfig {
    fn default() -> Self {
        Self {
            default_schema: default_schema(),
            schemas: IndexMap::new(),
            types: IndexMap::new(),
            lazyload_types: default_lazyload_types(),
            pagination_type: default_pagination_type(),
            simple_pagination_type: default_simple_pagination_type(),
            execution_middleware: Vec::new(),
            error_formatter: None,
            errors_handler: None,
            params_key: default_params_key(),
            debug: false,
            apq: ApqConfig::default(),
        }
    }
}

impl Default for ApqConfig {
    fn default() -> Self {
        Self {
            enable: false,
            cache_driver: None,
            cache_prefix: default_apq_cache_prefix(),
            ttl: default_apq_ttl(),
        }
    }
}

impl ApqConfig {
    /// TTL as a duration.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl)
    }
}

impl GraphQLConfig {
    /// Parses a configuration from a TOML document.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| ConfigError::parse(format!("TOML parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.default_schema.is_empty() {
            return Err(ConfigError::validation("default_schema must not be empty"));
        }
        if self.params_key.is_empty() {
            return Err(ConfigError::validation("params_key must not be empty"));
        }
        if self.pagination_type.is_empty() || self.simple_pagination_type.is_empty() {
            return Err(ConfigError::validation(
                "pagination_type and simple_pagination_type must not be empty",
            ));
        }
        if let Some(id) = self.execution_middleware.iter().find(|id| id.is_empty()) {
            return Err(ConfigError::validation(format!(
                "execution_middleware contains an empty identifier: {id:?}"
            )));
        }
        if self.apq.enable && self.apq.ttl == 0 {
            return Err(ConfigError::validation("apq.ttl must be > 0 when apq is enabled"));
        }
        Ok(())
    }
}
