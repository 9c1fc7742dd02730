//! Automatic persisted queries.
//!
//! A client may send `extensions.persistedQuery.sha256Hash` instead of (or
//! along with) the query text:
//!
//! - hash only, cached: the cached text is executed
//! - hash only, not cached: `PersistedQueryNotFound`, so the client retries
//!   with the full text
//! - hash and text: the text is cached under the hash and executed
//!
//! Cache keys are `"{prefix}.{schema}.{hash}"`. The hash is used as sent;
//! it is not checked against the text.

use std::sync::Arc;

use gqlbind_config::ApqConfig;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::cache::{CacheManager, CacheStore};

/// Persisted query protocol failures, answered with HTTP 200.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PersistedQueryError {
    #[error("PersistedQueryNotFound")]
    NotFound,

    #[error("PersistedQueryNotSupported")]
    NotSupported,
}

impl PersistedQueryError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "PERSISTED_QUERY_NOT_FOUND",
            Self::NotSupported => "PERSISTED_QUERY_NOT_SUPPORTED",
        }
    }

    /// Renders the complete response body.
    #[must_use]
    pub fn to_response(&self) -> serde_json::Value {
        json!({
            "errors": [{
                "message": self.to_string(),
                "extensions": { "code": self.code() }
            }]
        })
    }
}

/// Hex-encoded SHA-256 of a query text.
#[must_use]
pub fn hash_query(query: &str) -> String {
    hex::encode(Sha256::digest(query.as_bytes()))
}

/// Persisted query resolution against the configured cache driver.
#[derive(Debug, Clone)]
pub struct PersistedQueries {
    config: ApqConfig,
    cache: Arc<CacheManager>,
}

impl PersistedQueries {
    #[must_use]
    pub fn new(config: ApqConfig, cache: Arc<CacheManager>) -> Self {
        Self { config, cache }
    }

    #[must_use]
    pub fn cache_key(&self, schema: &str, hash: &str) -> String {
        format!("{}.{}.{}", self.config.cache_prefix, schema, hash)
    }

    /// Returns the query text to execute.
    ///
    /// Without a `persistedQuery` extension the given text is returned
    /// unchanged (empty if missing).
    ///
    /// # Errors
    ///
    /// `NotSupported` if the extension is present while persisted queries
    /// are disabled, `NotFound` for an uncached hash sent without text.
    pub async fn resolve(
        &self,
        schema: &str,
        query: Option<&str>,
        extensions: Option<&serde_json::Value>,
    ) -> Result<String, PersistedQueryError> {
        let persisted = extensions
            .and_then(|ext| ext.get("persistedQuery"))
            .filter(|pq| !pq.is_null());
        let Some(persisted) = persisted else {
            return Ok(query.unwrap_or_default().to_string());
        };

        if !self.config.enable {
            return Err(PersistedQueryError::NotSupported);
        }

        let Some(hash) = persisted.get("sha256Hash").and_then(|h| h.as_str()) else {
            return Ok(query.unwrap_or_default().to_string());
        };

        let key = self.cache_key(schema, hash);
        let store = self.cache.driver(self.config.cache_driver.as_deref());

        match query {
            None => {
                if !store.has(&key).await {
                    debug!(key = %key, "Persisted query not found");
                    return Err(PersistedQueryError::NotFound);
                }
                store.get(&key).await.ok_or(PersistedQueryError::NotFound)
            }
            Some(query) => {
                debug!(key = %key, "Storing persisted query");
                store
                    .set(&key, query.to_string(), self.config.ttl())
                    .await;
                Ok(query.to_string())
            }
        }
    }
}
