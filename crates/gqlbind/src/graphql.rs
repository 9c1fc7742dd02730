//! The `GraphQL` facade.
//!
//! Ties together the configuration, the component container, both
//! registries, the cache drivers and the exception reporter, and exposes the
//! operations a host application uses:
//!
//! - schema management: [`add_schema`](GraphQL::add_schema),
//!   [`schema`](GraphQL::schema), [`clear_schema`](GraphQL::clear_schema)
//! - type management: [`add_type`](GraphQL::add_type),
//!   [`type_ref`](GraphQL::type_ref), [`paginate`](GraphQL::paginate)
//! - execution: [`query`](GraphQL::query) and
//!   [`query_and_return_result`](GraphQL::query_and_return_result)

use std::fmt;
use std::sync::Arc;

use async_graphql::dynamic::Schema;
use async_graphql::{Request, Variables};
use gqlbind_config::GraphQLConfig;
use tracing::{debug, instrument};

use crate::apq::PersistedQueries;
use crate::cache::CacheManager;
use crate::container::Container;
use crate::decorator::{
    ExceptionReporter, TracingReporter, default_error_formatter, default_errors_handler,
};
use crate::error::GraphQLError;
use crate::pipeline::{Flow, Pipeline, PipelineState, QueryOptions};
use crate::registry::{SchemaEntry, SchemaRegistry, TypeDescriptor, TypeRegistry};
use crate::resolvers::RootValue;
use crate::result::ExecutionResult;
use crate::schema::{ObjectSource, SchemaAssembler, SchemaSource, TypeOverrides, object_type};
use crate::types::{GraphQLType, NamedType, TypeDefinition};

/// Schema registry, type registry and executor bound to one configuration.
pub struct GraphQL {
    config: GraphQLConfig,
    container: Arc<Container>,
    types: TypeRegistry,
    schemas: SchemaRegistry,
    cache: Arc<CacheManager>,
    reporter: Arc<dyn ExceptionReporter>,
    apq: PersistedQueries,
}

impl fmt::Debug for GraphQL {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphQL")
            .field("default_schema", &self.config.default_schema)
            .field("types", &self.types)
            .field("schemas", &self.schemas)
            .field("cache", &self.cache)
            .finish()
    }
}

impl GraphQL {
    /// Creates the facade and registers the types and schemas named in the
    /// configuration.
    #[must_use]
    pub fn new(config: GraphQLConfig, container: Arc<Container>) -> Self {
        let types = TypeRegistry::new(Arc::clone(&container), config.lazyload_types);
        for (name, id) in &config.types {
            types.insert(name, TypeDescriptor::factory(id.as_str()));
        }

        let schemas = SchemaRegistry::new();
        for (name, id) in &config.schemas {
            schemas.register(name, SchemaEntry::Provider(id.clone()));
        }

        let cache = Arc::new(CacheManager::new());
        let apq = PersistedQueries::new(config.apq.clone(), Arc::clone(&cache));
        debug!(
            types = config.types.len(),
            schemas = config.schemas.len(),
            lazyload = config.lazyload_types,
            "GraphQL facade created"
        );

        Self {
            config,
            container,
            types,
            schemas,
            cache,
            reporter: Arc::new(TracingReporter),
            apq,
        }
    }

    /// Replaces the cache drivers used for persisted queries.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<CacheManager>) -> Self {
        self.apq = PersistedQueries::new(self.config.apq.clone(), Arc::clone(&cache));
        self.cache = cache;
        self
    }

    /// Replaces the reporter of unexpected resolver errors.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn ExceptionReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    #[must_use]
    pub fn config(&self) -> &GraphQLConfig {
        &self.config
    }

    #[must_use]
    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<CacheManager> {
        &self.cache
    }

    #[must_use]
    pub fn persisted_queries(&self) -> &PersistedQueries {
        &self.apq
    }

    #[must_use]
    pub fn type_registry(&self) -> &TypeRegistry {
        &self.types
    }

    #[must_use]
    pub fn schema_registry(&self) -> &SchemaRegistry {
        &self.schemas
    }

    // ---------------------------------------------------------------------
    // Schemas
    // ---------------------------------------------------------------------

    /// Builds the engine schema for a source.
    ///
    /// A prebuilt schema is returned unchanged. Anything else starts from an
    /// empty type instance cache.
    ///
    /// # Errors
    ///
    /// `SchemaNotFound` for unknown schema names or providers, `TypeNotFound`
    /// for unresolvable types, `SchemaBuildFailed` if the engine rejects the
    /// result.
    pub fn schema(&self, source: impl Into<SchemaSource>) -> Result<Schema, GraphQLError> {
        let config = match source.into() {
            SchemaSource::Prebuilt(schema) => return Ok(schema),
            SchemaSource::Config(config) => {
                self.types.invalidate_instances();
                config
            }
            SchemaSource::Name(name) => {
                self.types.invalidate_instances();
                let name = name.unwrap_or_else(|| self.config.default_schema.clone());
                match self.schemas.get(&name) {
                    None => {
                        return Err(GraphQLError::SchemaNotFound(format!(
                            "Schema {name} not found."
                        )));
                    }
                    Some(SchemaEntry::Prebuilt(schema)) => return Ok(schema),
                    Some(SchemaEntry::Config(config)) => config,
                    Some(SchemaEntry::Provider(id)) => self.container.make_config(&id)?.to_config(),
                }
            }
        };

        SchemaAssembler::new(&self.types, &self.container).build(&config)
    }

    /// Registers a schema, deep-merging structured configs.
    pub fn add_schema(&self, name: &str, schema: impl Into<SchemaEntry>) {
        self.merge_schemas(name, schema);
    }

    pub fn merge_schemas(&self, name: &str, schema: impl Into<SchemaEntry>) {
        self.schemas.register(name, schema);
    }

    pub fn clear_schema(&self, name: &str) {
        self.schemas.unregister(name);
    }

    pub fn clear_schemas(&self) {
        self.schemas.clear();
    }

    /// Registered schema names.
    #[must_use]
    pub fn schemas(&self) -> Vec<String> {
        self.schemas.names()
    }

    // ---------------------------------------------------------------------
    // Types
    // ---------------------------------------------------------------------

    /// Registers a type and returns the name it was registered under.
    ///
    /// # Errors
    ///
    /// Fails if `name` is `None` and the descriptor cannot be made.
    pub fn add_type(
        &self,
        descriptor: impl Into<TypeDescriptor>,
        name: Option<&str>,
    ) -> Result<String, GraphQLError> {
        self.types.register(name, descriptor.into())
    }

    /// Registers several types.
    pub fn add_types<I>(&self, types: I) -> Result<(), GraphQLError>
    where
        I: IntoIterator<Item = (Option<String>, TypeDescriptor)>,
    {
        for (name, descriptor) in types {
            self.types.register(name.as_deref(), descriptor)?;
        }
        Ok(())
    }

    /// Resolves a type reference such as `"[Post!]!"`.
    pub fn type_ref(&self, reference: &str, fresh: bool) -> Result<GraphQLType, GraphQLError> {
        self.types.resolve(reference, fresh)
    }

    /// Resolves a bare type name.
    pub fn get_type(&self, name: &str, fresh: bool) -> Result<NamedType, GraphQLError> {
        self.types.resolve_named(name, fresh)
    }

    /// Builds an object type. See [`ObjectSource`].
    pub fn object_type(
        &self,
        source: impl Into<ObjectSource>,
        overrides: TypeOverrides,
    ) -> Result<TypeDefinition, GraphQLError> {
        object_type(&self.container, source.into(), overrides)
    }

    pub fn clear_type(&self, name: &str) {
        self.types.unregister(name);
    }

    pub fn clear_types(&self) {
        self.types.clear();
    }

    /// Registered type names.
    #[must_use]
    pub fn types(&self) -> Vec<String> {
        self.types.names()
    }

    /// Registers `{type}Pagination` (or `custom_name`) and returns it.
    pub fn paginate(
        &self,
        type_name: &str,
        custom_name: Option<&str>,
    ) -> Result<GraphQLType, GraphQLError> {
        let name = custom_name.map_or_else(|| format!("{type_name}Pagination"), str::to_string);
        self.wrap_type(type_name, &name, &self.config.pagination_type)
    }

    /// Registers `{type}SimplePagination` (or `custom_name`) and returns it.
    pub fn simple_paginate(
        &self,
        type_name: &str,
        custom_name: Option<&str>,
    ) -> Result<GraphQLType, GraphQLError> {
        let name =
            custom_name.map_or_else(|| format!("{type_name}SimplePagination"), str::to_string);
        self.wrap_type(type_name, &name, &self.config.simple_pagination_type)
    }

    /// Wraps `type_name` in the wrapper bound to `wrapper_id` and registers
    /// the result as `custom_name`.
    ///
    /// The wrapper is registered both as a descriptor and as a cached
    /// instance; an already cached instance is returned as is.
    ///
    /// # Errors
    ///
    /// Fails if `wrapper_id` is not bound to a type wrapper.
    pub fn wrap_type(
        &self,
        type_name: &str,
        custom_name: &str,
        wrapper_id: &str,
    ) -> Result<GraphQLType, GraphQLError> {
        if let Some(cached) = self.types.cached(custom_name) {
            return Ok(GraphQLType::Named(NamedType::Defined(cached)));
        }

        let provider = self.container.make_wrapper(wrapper_id)?.wrap(type_name, custom_name);
        let instance = Arc::new(provider.to_type());
        self.types
            .register(Some(custom_name), TypeDescriptor::Instance(provider))?;
        self.types.cache_instance(custom_name, Arc::clone(&instance));
        debug!(type_name = %type_name, wrapper = %wrapper_id, name = %custom_name, "Wrapped type");
        Ok(GraphQLType::Named(NamedType::Defined(instance)))
    }

    // ---------------------------------------------------------------------
    // Execution
    // ---------------------------------------------------------------------

    /// Middleware identifiers from the configuration, in order.
    #[must_use]
    pub fn execution_middleware(&self) -> &[String] {
        &self.config.execution_middleware
    }

    /// Makes the configured middleware pipeline.
    pub fn pipeline(&self) -> Result<Pipeline, GraphQLError> {
        let stages = self
            .execution_middleware()
            .iter()
            .map(|id| self.container.make_middleware(id))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Pipeline::new(stages))
    }

    /// Executes an operation and returns the decorated response body.
    ///
    /// # Errors
    ///
    /// Only fatal schema or configuration errors are returned; errors of the
    /// operation itself are part of the body.
    pub async fn query(
        &self,
        query: &str,
        variables: Option<serde_json::Value>,
        options: QueryOptions,
    ) -> Result<serde_json::Value, GraphQLError> {
        let result = self.query_and_return_result(query, variables, options).await?;
        Ok(self.decorate_execution_result(result)?.to_json())
    }

    /// Executes an operation without decorating its errors.
    ///
    /// The schema is built first, then the middleware pipeline runs. A
    /// middleware answer is returned as is and the engine is not invoked.
    #[instrument(skip_all, fields(operation = options.operation_name.as_deref().unwrap_or("")))]
    pub async fn query_and_return_result(
        &self,
        query: &str,
        variables: Option<serde_json::Value>,
        options: QueryOptions,
    ) -> Result<ExecutionResult, GraphQLError> {
        let schema = self.schema(options.schema.clone())?;

        let state = PipelineState::new(query, variables, options);
        let PipelineState {
            query,
            variables,
            options,
        } = match self.pipeline()?.run(state).await {
            Flow::Continue(state) => state,
            Flow::Respond(result) => return Ok(result),
        };

        let mut request = Request::new(query);
        if let Some(variables) = variables {
            request = request.variables(Variables::from_json(variables));
        }
        if let Some(operation_name) = options.operation_name {
            request = request.operation_name(operation_name);
        }
        request.data = options.context;
        if let Some(root_value) = options.root_value {
            request = request.data(RootValue(root_value));
        }

        let response = schema.execute(request).await;
        debug!(errors = response.errors.len(), "GraphQL operation executed");
        Ok(response.into())
    }

    /// Attaches the configured error formatter and errors handler.
    ///
    /// # Errors
    ///
    /// Fails if a configured identifier is not bound to the right component.
    pub fn decorate_execution_result(
        &self,
        result: ExecutionResult,
    ) -> Result<ExecutionResult, GraphQLError> {
        let formatter = match &self.config.error_formatter {
            Some(id) => self.container.make_error_formatter(id)?,
            None => default_error_formatter(self.config.debug),
        };
        let handler = match &self.config.errors_handler {
            Some(id) => self.container.make_errors_handler(id)?,
            None => default_errors_handler(Arc::clone(&self.reporter)),
        };
        Ok(result
            .with_errors_handler(handler)
            .with_error_formatter(formatter))
    }
}

#[cfg(test)]
mod tests {
    use async_graphql::dynamic::{FieldFuture, FieldValue};

    use super::*;
    use crate::schema::SchemaConfig;
    use crate::types::FieldDefinition;

    fn hello_schema() -> SchemaConfig {
        SchemaConfig::new().query(
            "hello",
            FieldDefinition::new("hello", "String!").resolve(|_| {
                FieldFuture::new(async { Ok(Some(FieldValue::value("world"))) })
            }),
        )
    }

    #[test]
    fn test_config_registrations() {
        let mut config = GraphQLConfig::default();
        config.types.insert("Example".into(), "ExampleType".into());
        config.schemas.insert("default".into(), "DefaultSchema".into());

        let graphql = GraphQL::new(config, Arc::new(Container::new()));
        assert_eq!(graphql.types(), vec!["Example"]);
        assert_eq!(graphql.schemas(), vec!["default"]);
        assert!(matches!(
            graphql.type_registry().descriptor("Example"),
            Some(TypeDescriptor::Factory(id)) if id == "ExampleType"
        ));
    }

    #[test]
    fn test_config_types_are_made_on_first_use() {
        let mut config = GraphQLConfig::default();
        config.types.insert("Example".into(), "ExampleType".into());
        let container = Arc::new(Container::new());
        let graphql = GraphQL::new(config, Arc::clone(&container));

        let err = graphql.get_type("Example", false).err().unwrap();
        assert!(matches!(err, GraphQLError::ComponentNotFound(_)));

        container.bind_type("ExampleType", |_| TypeDefinition::scalar("Example"));
        assert!(graphql.get_type("Example", false).is_ok());
    }

    #[test]
    fn test_unknown_schema() {
        let graphql = GraphQL::new(GraphQLConfig::default(), Arc::new(Container::new()));
        let err = graphql.schema("missing").err().unwrap();
        assert!(matches!(err, GraphQLError::SchemaNotFound(_)));
        assert_eq!(err.to_string(), "Schema missing not found.");
    }

    #[test]
    fn test_unknown_schema_provider() {
        let mut config = GraphQLConfig::default();
        config.schemas.insert("default".into(), "MissingSchema".into());
        let graphql = GraphQL::new(config, Arc::new(Container::new()));

        let err = graphql.schema(SchemaSource::default_schema()).err().unwrap();
        assert_eq!(err.to_string(), "Schema class MissingSchema not found.");
    }

    #[test]
    fn test_prebuilt_schema_returned_unchanged() {
        let graphql = GraphQL::new(GraphQLConfig::default(), Arc::new(Container::new()));
        let built = graphql.schema(hello_schema()).unwrap();
        let sdl = built.sdl();

        let again = graphql.schema(built).unwrap();
        assert_eq!(again.sdl(), sdl);
    }

    #[tokio::test]
    async fn test_query_default_schema() {
        let graphql = GraphQL::new(GraphQLConfig::default(), Arc::new(Container::new()));
        graphql.add_schema("default", hello_schema());

        let body = graphql
            .query("{ hello }", None, QueryOptions::new())
            .await
            .unwrap();
        assert_eq!(body, serde_json::json!({ "data": { "hello": "world" } }));
    }

    #[test]
    fn test_paginate_is_registered_and_cached() {
        let graphql = GraphQL::new(GraphQLConfig::default(), Arc::new(Container::new()));
        let first = graphql.paginate("Post", None).unwrap();
        let second = graphql.paginate("Post", None).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.to_string(), "PostPagination");
        assert!(graphql.types().contains(&"PostPagination".to_string()));

        let simple = graphql.simple_paginate("Post", Some("PostPage")).unwrap();
        assert_eq!(simple.to_string(), "PostPage");
        let fields: Vec<_> = simple
            .definition()
            .unwrap()
            .fields()
            .iter()
            .map(|f| f.name.clone())
            .collect();
        assert!(!fields.contains(&"total".to_string()));
    }

    #[test]
    fn test_unknown_pagination_wrapper() {
        let config = GraphQLConfig {
            pagination_type: "CustomPagination".into(),
            ..GraphQLConfig::default()
        };
        let graphql = GraphQL::new(config, Arc::new(Container::new()));
        let err = graphql.paginate("Post", None).unwrap_err();
        assert!(matches!(err, GraphQLError::ComponentNotFound(id) if id == "CustomPagination"));
    }
}
