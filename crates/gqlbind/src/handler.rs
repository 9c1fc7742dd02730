//! Axum HTTP handlers for GraphQL endpoints.
//!
//! - `POST /graphql` - execute against the default schema
//! - `GET /graphql` - same, with the request in URL parameters
//! - `POST /graphql/{*schema}` - execute against a named schema
//! - `GET /graphql/{*schema}` - same, with the request in URL parameters
//!
//! Nested schema names are taken from the remaining path, so
//! `/graphql/admin/v2` executes against the schema `admin/v2`.
//!
//! Operation errors are part of a 200 response. Fatal errors (unknown
//! schema, unresolvable types, malformed bodies) map to the status from
//! [`GraphQLError::status_code`].

use std::collections::HashMap;
use std::sync::Arc;

use async_graphql::Data;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::GraphQLError;
use crate::graphql::GraphQL;
use crate::request::Payload;

/// State shared across GraphQL handlers.
#[derive(Clone)]
pub struct GraphQLState {
    pub graphql: Arc<GraphQL>,
}

/// Identifier of the HTTP request, available to resolvers through the
/// request context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Routes for the GraphQL endpoints.
pub fn router(graphql: Arc<GraphQL>) -> Router {
    Router::new()
        .route("/graphql", post(graphql_handler).get(graphql_handler_get))
        .route(
            "/graphql/{*schema}",
            post(schema_graphql_handler).get(schema_graphql_handler_get),
        )
        .with_state(GraphQLState { graphql })
}

/// Handles POST requests to /graphql.
pub async fn graphql_handler(
    State(state): State<GraphQLState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    execute_graphql(state, headers, None, body).await
}

/// Handles GET requests to /graphql.
pub async fn graphql_handler_get(
    State(state): State<GraphQLState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    execute_graphql(state, headers, None, params_to_body(params)).await
}

/// Handles POST requests to /graphql/{*schema}.
pub async fn schema_graphql_handler(
    State(state): State<GraphQLState>,
    headers: HeaderMap,
    Path(schema): Path<String>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    execute_graphql(state, headers, Some(schema), body).await
}

/// Handles GET requests to /graphql/{*schema}.
pub async fn schema_graphql_handler_get(
    State(state): State<GraphQLState>,
    headers: HeaderMap,
    Path(schema): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    execute_graphql(state, headers, Some(schema), params_to_body(params)).await
}

/// Executes a request body against a schema.
async fn execute_graphql(
    state: GraphQLState,
    headers: HeaderMap,
    schema: Option<String>,
    body: Value,
) -> axum::response::Response {
    let graphql = state.graphql;
    let schema = schema
        .map(|s| s.trim_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| graphql.config().default_schema.clone());

    let payload = match Payload::from_json(&body, &graphql.config().params_key) {
        Ok(payload) => payload,
        Err(e) => return error_response(&e).into_response(),
    };

    // Extract request ID from headers (set by middleware)
    let request_id = headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    debug!(
        schema = %schema,
        request_id = %request_id,
        batch = payload.is_batch(),
        "Processing GraphQL request"
    );

    let context = || {
        let mut data = Data::default();
        data.insert(RequestId(request_id.clone()));
        data
    };

    match graphql.execute_payload(&schema, payload, context).await {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            Json(body),
        )
            .into_response(),
        Err(e) => {
            warn!(schema = %schema, error = %e, "GraphQL request failed");
            error_response(&e).into_response()
        }
    }
}

/// Converts GET query params to a request body. Variables and extensions
/// stay strings and are decoded with the body.
fn params_to_body(params: HashMap<String, String>) -> Value {
    Value::Object(
        params
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect(),
    )
}

/// Returns an error response.
fn error_response(error: &GraphQLError) -> impl IntoResponse {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(error.to_response_body()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_to_body() {
        let mut params = HashMap::new();
        params.insert("query".to_string(), "{ examples }".to_string());
        params.insert("variables".to_string(), r#"{"id": 1}"#.to_string());

        let body = params_to_body(params);
        assert_eq!(body["query"], "{ examples }");
        assert_eq!(body["variables"], r#"{"id": 1}"#);
    }

    #[test]
    fn test_error_response_status() {
        let response =
            error_response(&GraphQLError::SchemaNotFound("Schema x not found.".into()))
                .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response =
            error_response(&GraphQLError::InvalidRequest("bad".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
