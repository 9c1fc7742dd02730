//! # gqlbind
//!
//! Binds the `async-graphql` dynamic schema engine to a host application's
//! configuration, component container, validation errors and cache.
//!
//! The engine parses, validates and executes documents. This crate owns
//! what sits around it:
//!
//! - a type registry that resolves references such as `"[Post!]!"` and
//!   realizes each type at most once per schema build
//! - a schema registry of named schema configurations, deep-merged on
//!   repeated registration
//! - schema assembly with lazy or eager type collection
//! - an execution middleware pipeline that may rewrite or answer a request
//! - an error decorator that formats validation and authorization errors,
//!   masks unexpected ones and reports them
//! - automatic persisted queries over pluggable cache drivers
//!
//! ## Endpoints
//!
//! - `POST /graphql` / `GET /graphql` - default schema
//! - `POST /graphql/{schema}` / `GET /graphql/{schema}` - named schema
//!
//! ## Configuration
//!
//! ```toml
//! default_schema = "default"
//! lazyload_types = true
//! execution_middleware = ["auth"]
//!
//! [schemas]
//! default = "DefaultSchema"
//!
//! [types]
//! Post = "PostType"
//!
//! [apq]
//! enable = true
//! ttl = 300
//! ```
//!
//! ## Modules
//!
//! - [`container`] - identifier to component bindings
//! - [`types`] - type definitions, references and pagination wrappers
//! - [`registry`] - type and schema registries
//! - [`schema`] - schema configuration and assembly
//! - [`pipeline`] - execution middleware
//! - [`decorator`] - error formatting, handling and reporting
//! - [`apq`] / [`cache`] - persisted queries and cache drivers
//! - [`request`] / [`handler`] - request protocol and axum handlers
//! - [`error`] - error types

pub mod apq;
pub mod cache;
pub mod container;
pub mod decorator;
pub mod error;
pub mod graphql;
pub mod handler;
pub mod pipeline;
pub mod registry;
pub mod request;
pub mod resolvers;
pub mod result;
pub mod schema;
pub mod types;

// Re-export main types
pub use apq::{PersistedQueries, PersistedQueryError, hash_query};
pub use cache::{CacheManager, CacheStore, MemoryCache};
pub use container::{Component, Container};
pub use decorator::{ErrorFormatter, ErrorsHandler, ExceptionReporter, TracingReporter};
pub use error::{AuthorizationError, GraphQLError, ReportableError, ValidationError};
pub use gqlbind_config::{ApqConfig, GraphQLConfig};
pub use graphql::GraphQL;
pub use handler::{GraphQLState, RequestId, router};
pub use pipeline::{ExecutionMiddleware, Flow, Pipeline, PipelineState, QueryOptions};
pub use registry::{SchemaEntry, SchemaRegistry, TypeDescriptor, TypeRegistry};
pub use request::{OperationRequest, Payload};
pub use resolvers::RootValue;
pub use result::ExecutionResult;
pub use schema::{
    FieldDescriptor, FieldMap, ObjectSource, SchemaConfig, SchemaSource, ToConfig, TypeOverrides,
};
pub use types::{
    FieldDefinition, GraphQLType, InputValueDefinition, NamedType, ToField, ToType,
    TypeDefinition, WrapType,
};

/// Result type for GraphQL operations.
pub type Result<T> = std::result::Result<T, GraphQLError>;
