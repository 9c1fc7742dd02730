//! Layered configuration loading.
//!
//! Sources, lowest priority first:
//! 1. Field defaults
//! 2. `gqlbind.toml` (or the given path)
//! 3. Environment variables, e.g. `GQLBIND__APQ__ENABLE=true`
//!
//! Map keys pass through the `config` crate, which does not preserve case;
//! type registrations with mixed-case names belong in the TOML file loaded
//! with [`GraphQLConfig::from_toml_str`] or in code.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use tracing::debug;

use crate::{ConfigError, GraphQLConfig, Result};

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "gqlbind.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "GQLBIND";

pub fn load_config(path: Option<&str>) -> Result<GraphQLConfig> {
    let mut builder = Config::builder();
    let file = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_FILE));
    if file.exists() {
        debug!(path = %file.display(), "Loading GraphQL configuration file");
        builder = builder.add_source(File::from(file));
    }
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("execution_middleware"),
    );
    let cfg = builder.build()?;
    let merged: GraphQLConfig = cfg
        .try_deserialize()
        .map_err(|e| ConfigError::parse(format!("config deserialize error: {e}")))?;
    merged.validate()?;
    Ok(merged)
}

pub fn load_config_with_default_path<P: AsRef<Path>>(path: Option<P>) -> Result<GraphQLConfig> {
    let p = path
        .as_ref()
        .map(|p| p.as_ref().to_string_lossy().to_string());
    load_config(p.as_deref())
}
