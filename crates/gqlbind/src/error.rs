//! Error types for the GraphQL layer.
//!
//! [`GraphQLError`] covers registry and configuration failures. These are
//! fatal to the schema build or type resolution that raised them and are
//! propagated as `Result` errors.
//!
//! [`ValidationError`] and [`AuthorizationError`] are raised by resolvers
//! during execution. They travel as the source of an engine error and are
//! recognized by the error decorator, which formats them for the client and
//! never reports them.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Errors that can occur while registering, resolving or assembling types
/// and schemas.
#[derive(Debug)]
pub enum GraphQLError {
    /// Unregistered or misconfigured type reference.
    TypeNotFound(String),

    /// Unregistered schema name or unknown schema provider.
    SchemaNotFound(String),

    /// Container has no binding for an identifier.
    ComponentNotFound(String),

    /// Container binding does not provide the requested capability.
    ComponentMismatch {
        /// Container identifier.
        id: String,
        /// Capability the caller asked for.
        expected: &'static str,
        /// Capability the binding provides.
        found: &'static str,
    },

    /// The engine rejected the assembled schema.
    SchemaBuildFailed(String),

    /// Malformed request payload.
    InvalidRequest(String),

    /// Internal error.
    Internal(String),
}

impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeNotFound(msg) => write!(f, "{msg}"),
            Self::SchemaNotFound(msg) => write!(f, "{msg}"),
            Self::ComponentNotFound(id) => {
                write!(f, "No component is bound to identifier {id}")
            }
            Self::ComponentMismatch {
                id,
                expected,
                found,
            } => {
                write!(f, "Component {id} is a {found}, expected a {expected}")
            }
            Self::SchemaBuildFailed(msg) => {
                write!(f, "Failed to build GraphQL schema: {msg}")
            }
            Self::InvalidRequest(msg) => {
                write!(f, "Invalid GraphQL request: {msg}")
            }
            Self::Internal(msg) => {
                write!(f, "Internal error: {msg}")
            }
        }
    }
}

impl std::error::Error for GraphQLError {}

impl GraphQLError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) => 400,
            Self::SchemaNotFound(_) => 404,
            Self::TypeNotFound(_)
            | Self::ComponentNotFound(_)
            | Self::ComponentMismatch { .. }
            | Self::SchemaBuildFailed(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for GraphQL error extensions.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::TypeNotFound(_) => "TYPE_NOT_FOUND",
            Self::SchemaNotFound(_) => "SCHEMA_NOT_FOUND",
            Self::ComponentNotFound(_) => "COMPONENT_NOT_FOUND",
            Self::ComponentMismatch { .. } => "COMPONENT_MISMATCH",
            Self::SchemaBuildFailed(_) => "SCHEMA_BUILD_FAILED",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Renders the error as a GraphQL response body.
    #[must_use]
    pub fn to_response_body(&self) -> serde_json::Value {
        serde_json::json!({
            "errors": [{
                "message": self.to_string(),
                "extensions": {
                    "code": self.error_code(),
                }
            }]
        })
    }
}

/// Per-field validation messages, keyed by argument or field name.
pub type FieldMessages = BTreeMap<String, Vec<String>>;

/// Validation failure raised by a resolver with field-level messages.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
    messages: FieldMessages,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            messages: FieldMessages::new(),
        }
    }

    /// Adds a message for a field.
    #[must_use]
    pub fn with_message(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.messages
            .entry(field.into())
            .or_default()
            .push(message.into());
        self
    }

    /// Builds the error from `validator` output.
    #[must_use]
    pub fn from_validator(message: impl Into<String>, errors: &validator::ValidationErrors) -> Self {
        Self {
            message: message.into(),
            messages: validator_messages(errors),
        }
    }

    /// Field-level messages.
    #[must_use]
    pub fn messages(&self) -> &FieldMessages {
        &self.messages
    }
}

/// Access denied by a resolver.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct AuthorizationError(pub String);

impl Default for AuthorizationError {
    fn default() -> Self {
        Self("Unauthorized".to_string())
    }
}

/// Unexpected resolver failure forwarded to the exception reporter.
#[derive(Clone, thiserror::Error)]
#[error("{message}")]
pub struct ReportableError {
    /// Original error message.
    pub message: String,
    /// Value of the `code` extension, if the error carried one.
    pub code: Option<String>,
    /// The original error value.
    pub cause: Option<Arc<dyn Any + Send + Sync>>,
}

impl fmt::Debug for ReportableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportableError")
            .field("message", &self.message)
            .field("code", &self.code)
            .field("has_cause", &self.cause.is_some())
            .finish()
    }
}

/// Flattens `validator` output into per-field messages.
///
/// A rule without a message is reported by its code.
pub fn validator_messages(errors: &validator::ValidationErrors) -> FieldMessages {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}
