//! Integration tests for the `GraphQL` facade.
//!
//! These tests go through the public API only: registration, schema
//! assembly, the middleware pipeline, error decoration and persisted
//! queries.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_graphql::dynamic::{FieldFuture, FieldValue};
use async_graphql::{Data, Pos};
use async_trait::async_trait;
use gqlbind::resolvers::{into_field_value, json_to_graphql_value};
use gqlbind::{
    AuthorizationError, Container, ExceptionReporter, ExecutionMiddleware, ExecutionResult,
    FieldDefinition, Flow, GraphQL, GraphQLConfig, GraphQLError, GraphQLType, OperationRequest,
    PipelineState, QueryOptions, ReportableError, SchemaConfig, SchemaEntry, TypeDefinition,
    ValidationError, hash_query,
};
use serde_json::json;

// =============================================================================
// Fixtures
// =============================================================================

fn example_type() -> TypeDefinition {
    TypeDefinition::object("Example")
        .description("An example")
        .field(FieldDefinition::new("id", "ID!"))
        .field(FieldDefinition::new("test", "String"))
}

fn examples_field() -> FieldDefinition {
    FieldDefinition::new("examples", "[Example!]!").resolve(|_| {
        FieldFuture::new(async {
            let rows = json!([
                { "id": "1", "test": "first" },
                { "id": "2", "test": "second" }
            ]);
            Ok(Some(into_field_value(json_to_graphql_value(rows))))
        })
    })
}

fn container() -> Arc<Container> {
    let container = Arc::new(Container::new());
    container.bind_type("ExampleType", |_| example_type());
    container
}

fn config() -> GraphQLConfig {
    let mut config = GraphQLConfig::default();
    config.types.insert("Example".into(), "ExampleType".into());
    config
}

fn graphql() -> GraphQL {
    let graphql = GraphQL::new(config(), container());
    graphql.add_schema("default", SchemaConfig::new().query("examples", examples_field()));
    graphql
}

#[derive(Default)]
struct Collecting(Mutex<Vec<String>>);

impl ExceptionReporter for Collecting {
    fn report(&self, error: &ReportableError) {
        if let Ok(mut reports) = self.0.lock() {
            reports.push(error.message.clone());
        }
    }
}

// =============================================================================
// Type references and instance cache
// =============================================================================

#[test]
fn test_type_reference_matches_manual_wrapping() {
    let graphql = graphql();

    let parsed = graphql.type_ref("[Example!]!", false).unwrap();
    let base = GraphQLType::Named(graphql.get_type("Example", false).unwrap());
    let manual = GraphQLType::non_null(GraphQLType::list(GraphQLType::non_null(base)));

    assert_eq!(parsed, manual);
    assert_eq!(parsed.to_string(), "[Example!]!");
}

#[test]
fn test_builtin_scalars_need_no_registration() {
    let graphql = graphql();
    assert_eq!(graphql.type_ref("[ID!]", false).unwrap().to_string(), "[ID!]");
}

#[test]
fn test_instances_are_cached_until_fresh() {
    let graphql = graphql();

    let first = graphql.get_type("Example", false).unwrap();
    let second = graphql.get_type("Example", false).unwrap();
    assert_eq!(first, second);

    let fresh = graphql.get_type("Example", true).unwrap();
    assert_ne!(first, fresh);
    assert_eq!(graphql.get_type("Example", false).unwrap(), fresh);
}

#[test]
fn test_schema_build_reinstantiates_types() {
    let graphql = graphql();
    let before = graphql.get_type("Example", false).unwrap();

    graphql.schema(None::<String>).unwrap();
    let after = graphql.get_type("Example", false).unwrap();
    assert_ne!(before, after);
}

#[test]
fn test_unknown_type_with_lazy_hint() {
    let graphql = graphql();
    let err = graphql.type_ref("[Missing]", false).unwrap_err();
    assert!(matches!(err, GraphQLError::TypeNotFound(_)));
    assert!(err.to_string().starts_with("Type Missing not found."));
    assert!(err.to_string().contains("lazyload_types"));
}

// =============================================================================
// Schema registry
// =============================================================================

#[test]
fn test_schema_configs_are_deep_merged() {
    let graphql = graphql();
    graphql.add_schema(
        "default",
        SchemaConfig::new().mutation(
            "touch",
            FieldDefinition::new("touch", "Boolean")
                .resolve(|_| FieldFuture::new(async { Ok(Some(FieldValue::value(true))) })),
        ),
    );

    let sdl = graphql.schema("default").unwrap().sdl();
    assert!(sdl.contains("examples: [Example!]!"));
    assert!(sdl.contains("touch: Boolean"));
}

#[test]
fn test_prebuilt_schema_replaces_config() {
    let graphql = graphql();
    let other = GraphQL::new(config(), container());
    let prebuilt = other
        .schema(SchemaConfig::new().query("only", FieldDefinition::new("only", "String")))
        .unwrap();

    graphql.add_schema("default", prebuilt);
    assert!(matches!(
        graphql.schema_registry().get("default"),
        Some(SchemaEntry::Prebuilt(_))
    ));

    let sdl = graphql.schema("default").unwrap().sdl();
    assert!(sdl.contains("only: String"));
    assert!(!sdl.contains("examples"));
}

#[test]
fn test_empty_mutation_is_omitted() {
    let sdl = graphql().schema("default").unwrap().sdl();
    assert!(sdl.contains("type Query"));
    assert!(!sdl.contains("type Mutation"));
}

#[test]
fn test_schema_provider_from_container() {
    let container = container();
    container.bind_config("AdminSchema", |_| {
        SchemaConfig::new().query("admin", FieldDefinition::new("admin", "String"))
    });
    let mut config = config();
    config.schemas.insert("admin".into(), "AdminSchema".into());

    let graphql = GraphQL::new(config, container);
    let sdl = graphql.schema("admin").unwrap().sdl();
    assert!(sdl.contains("admin: String"));

    graphql.clear_schema("admin");
    assert!(matches!(
        graphql.schema("admin").err(),
        Some(GraphQLError::SchemaNotFound(_))
    ));
}

// =============================================================================
// Execution
// =============================================================================

#[tokio::test]
async fn test_query_default_schema() {
    let body = graphql()
        .query("{ examples { id test } }", None, QueryOptions::new())
        .await
        .unwrap();

    assert_eq!(
        body,
        json!({ "data": { "examples": [
            { "id": "1", "test": "first" },
            { "id": "2", "test": "second" }
        ]}})
    );
}

#[tokio::test]
async fn test_variables_and_root_value() {
    let graphql = graphql();
    graphql.add_schema(
        "default",
        SchemaConfig::new().query("greeting", FieldDefinition::new("greeting", "String")),
    );

    let body = graphql
        .query(
            "query Greeting { greeting }",
            Some(json!({})),
            QueryOptions::new()
                .operation_name("Greeting")
                .root_value(json!({ "greeting": "hello" })),
        )
        .await
        .unwrap();
    assert_eq!(body["data"]["greeting"], "hello");
}

struct Blocked;

#[async_trait]
impl ExecutionMiddleware for Blocked {
    async fn handle(&self, _state: PipelineState) -> Flow {
        let err = async_graphql::Error::from(AuthorizationError::default())
            .into_server_error(Pos::default());
        Flow::Respond(ExecutionResult::from_errors(vec![err]))
    }
}

#[tokio::test]
async fn test_middleware_short_circuits_engine() {
    let hits = Arc::new(AtomicUsize::new(0));
    let container = container();
    container.bind_middleware("blocked", |_| Blocked);

    let mut config = config();
    config.execution_middleware = vec!["blocked".into()];
    let graphql = GraphQL::new(config, container);

    let counter = Arc::clone(&hits);
    graphql.add_schema(
        "default",
        SchemaConfig::new().query(
            "count",
            FieldDefinition::new("count", "Int").resolve(move |_| {
                let counter = Arc::clone(&counter);
                FieldFuture::new(async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(Some(FieldValue::value(1)))
                })
            }),
        ),
    );

    let body = graphql
        .query("{ count }", None, QueryOptions::new())
        .await
        .unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert_eq!(body["errors"][0]["message"], "Unauthorized");
    assert_eq!(body["errors"][0]["extensions"]["category"], "authorization");
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn test_unknown_middleware_is_fatal() {
    let mut config = config();
    config.execution_middleware = vec!["missing".into()];
    let graphql = GraphQL::new(config, container());
    graphql.add_schema("default", SchemaConfig::new().query("examples", examples_field()));

    let err = graphql
        .query("{ examples { id } }", None, QueryOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, GraphQLError::ComponentNotFound(_)));
}

#[tokio::test]
async fn test_resolver_errors_are_decorated() {
    let reporter = Arc::new(Collecting::default());
    let graphql = GraphQL::new(config(), container()).with_reporter(reporter.clone());
    graphql.add_schema(
        "default",
        SchemaConfig::new()
            .query("examples", examples_field())
            .mutation(
                "save",
                FieldDefinition::new("save", "String").resolve(|_| {
                    FieldFuture::new(async {
                        let result: async_graphql::Result<Option<FieldValue>> =
                            Err(ValidationError::new("Invalid input")
                                .with_message("email", "The email must be a valid email address.")
                                .into());
                        result
                    })
                }),
            )
            .mutation(
                "crash",
                FieldDefinition::new("crash", "String").resolve(|_| {
                    FieldFuture::new(async {
                        let result: async_graphql::Result<Option<FieldValue>> =
                            Err(std::io::Error::other("db down").into());
                        result
                    })
                }),
            ),
    );

    let body = graphql
        .query("mutation { save }", None, QueryOptions::new())
        .await
        .unwrap();
    let error = &body["errors"][0];
    assert_eq!(error["message"], "Invalid input");
    assert_eq!(error["extensions"]["category"], "validation");
    assert_eq!(
        error["extensions"]["validation"]["email"],
        json!(["The email must be a valid email address."])
    );
    assert_eq!(error["path"], json!(["save"]));

    let body = graphql
        .query("mutation { crash }", None, QueryOptions::new())
        .await
        .unwrap();
    assert_eq!(body["errors"][0]["message"], "Internal server error");
    assert_eq!(*reporter.0.lock().unwrap(), vec!["db down".to_string()]);
}

#[tokio::test]
async fn test_plain_resolver_errors_are_reported() {
    let reporter = Arc::new(Collecting::default());
    let graphql = GraphQL::new(config(), container()).with_reporter(reporter.clone());
    graphql.add_schema(
        "default",
        SchemaConfig::new().query(
            "lost",
            FieldDefinition::new("lost", "String").resolve(|_| {
                FieldFuture::new(async {
                    let result: async_graphql::Result<Option<FieldValue>> =
                        Err(async_graphql::Error::new("db connection lost"));
                    result
                })
            }),
        ),
    );

    let body = graphql
        .query("{ lost }", None, QueryOptions::new())
        .await
        .unwrap();
    assert_eq!(body["errors"][0]["message"], "db connection lost");
    assert_eq!(body["errors"][0]["path"], json!(["lost"]));
    assert_eq!(*reporter.0.lock().unwrap(), vec!["db connection lost".to_string()]);

    let body = graphql
        .query("{ nope }", None, QueryOptions::new())
        .await
        .unwrap();
    assert_eq!(body["errors"][0]["extensions"]["category"], "graphql");
    assert_eq!(reporter.0.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_custom_error_formatter_from_container() {
    let container = container();
    container.bind_error_formatter(
        "plain",
        Arc::new(|err: &async_graphql::ServerError| json!({ "error": err.message })),
    );
    let mut config = config();
    config.error_formatter = Some("plain".into());
    let graphql = GraphQL::new(config, container);
    graphql.add_schema("default", SchemaConfig::new().query("examples", examples_field()));

    let body = graphql
        .query("{ nope }", None, QueryOptions::new())
        .await
        .unwrap();
    assert!(body["errors"][0]["error"].is_string());
    assert!(body["errors"][0].get("message").is_none());
}

// =============================================================================
// Pagination
// =============================================================================

#[tokio::test]
async fn test_paginated_field() {
    let graphql = graphql();
    let page = graphql.paginate("Example", None).unwrap();
    assert_eq!(page.to_string(), "ExamplePagination");

    graphql.add_schema(
        "default",
        SchemaConfig::new().query(
            "page",
            FieldDefinition::new("page", "ExamplePagination!").resolve(|_| {
                FieldFuture::new(async {
                    let page = json!({
                        "data": [{ "id": "1" }],
                        "total": 1,
                        "per_page": 15,
                        "current_page": 1,
                        "from": 1,
                        "to": 1,
                        "last_page": 1,
                        "has_more_pages": false
                    });
                    Ok(Some(FieldValue::owned_any(page)))
                })
            }),
        ),
    );

    let body = graphql
        .query(
            "{ page { total has_more_pages data { id } } }",
            None,
            QueryOptions::new(),
        )
        .await
        .unwrap();
    assert_eq!(
        body,
        json!({ "data": { "page": {
            "total": 1, "has_more_pages": false, "data": [{ "id": "1" }]
        }}})
    );
}

// =============================================================================
// Persisted queries
// =============================================================================

const APQ_QUERY: &str = "{ examples { id } }";

fn persisted(hash: &str, query: Option<&str>) -> OperationRequest {
    OperationRequest {
        query: query.map(str::to_string),
        extensions: Some(json!({ "persistedQuery": { "version": 1, "sha256Hash": hash } })),
        ..OperationRequest::default()
    }
}

#[tokio::test]
async fn test_persisted_query_not_found_then_hit() {
    let mut config = config();
    config.apq.enable = true;
    let graphql = GraphQL::new(config, container());
    graphql.add_schema("default", SchemaConfig::new().query("examples", examples_field()));
    let hash = hash_query(APQ_QUERY);

    let body = graphql
        .execute_operation("default", persisted(&hash, None), Data::default())
        .await
        .unwrap();
    assert_eq!(
        body,
        json!({ "errors": [{
            "message": "PersistedQueryNotFound",
            "extensions": { "code": "PERSISTED_QUERY_NOT_FOUND" }
        }]})
    );

    let body = graphql
        .execute_operation("default", persisted(&hash, Some(APQ_QUERY)), Data::default())
        .await
        .unwrap();
    assert_eq!(body["data"]["examples"][0]["id"], "1");

    let body = graphql
        .execute_operation("default", persisted(&hash, None), Data::default())
        .await
        .unwrap();
    assert_eq!(body["data"]["examples"][1]["id"], "2");
}

#[tokio::test]
async fn test_persisted_query_not_supported() {
    let graphql = graphql();
    let body = graphql
        .execute_operation(
            "default",
            persisted(&hash_query(APQ_QUERY), Some(APQ_QUERY)),
            Data::default(),
        )
        .await
        .unwrap();
    assert_eq!(
        body,
        json!({ "errors": [{
            "message": "PersistedQueryNotSupported",
            "extensions": { "code": "PERSISTED_QUERY_NOT_SUPPORTED" }
        }]})
    );
}
