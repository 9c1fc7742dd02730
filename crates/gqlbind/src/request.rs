//! Request protocol.
//!
//! A request body is either one operation object or an array of them (a
//! batch). Each operation carries `query`, `operationName`, `extensions` and
//! its variables under the configured `params_key` (default `variables`).
//! Variables and extensions sent as JSON strings are decoded, which is how
//! they arrive on GET requests.

use async_graphql::Data;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::GraphQLError;
use crate::graphql::GraphQL;
use crate::pipeline::QueryOptions;

/// One operation of a request body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationRequest {
    pub query: Option<String>,
    pub variables: Option<Value>,
    pub operation_name: Option<String>,
    pub extensions: Option<Value>,
}

impl OperationRequest {
    /// Reads an operation from a JSON object.
    ///
    /// Non-object input yields an empty operation.
    #[must_use]
    pub fn from_json(value: &Value, params_key: &str) -> Self {
        let Some(input) = value.as_object() else {
            return Self::default();
        };

        Self {
            query: input
                .get("query")
                .and_then(Value::as_str)
                .map(str::to_string),
            variables: decode_param(input.get(params_key), params_key),
            operation_name: input
                .get("operationName")
                .and_then(Value::as_str)
                .map(str::to_string),
            extensions: decode_param(input.get("extensions"), "extensions"),
        }
    }
}

/// Decodes a parameter that may be sent as a JSON string.
///
/// Null, blank strings and strings that are not valid JSON are all absent.
fn decode_param(value: Option<&Value>, name: &str) -> Option<Value> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(raw)) if raw.trim().is_empty() => None,
        Some(Value::String(raw)) => match serde_json::from_str::<Value>(raw) {
            Ok(decoded) => Some(decoded).filter(|v| !v.is_null()),
            Err(e) => {
                warn!(param = name, error = %e, "Ignoring parameter that is not valid JSON");
                None
            }
        },
        Some(other) => Some(other.clone()),
    }
}

/// A single operation or a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Single(OperationRequest),
    Batch(Vec<OperationRequest>),
}

impl Payload {
    /// Reads a request body.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` if the body is neither an object nor an array.
    pub fn from_json(body: &Value, params_key: &str) -> Result<Self, GraphQLError> {
        match body {
            Value::Object(_) => Ok(Self::Single(OperationRequest::from_json(body, params_key))),
            Value::Array(items) => Ok(Self::Batch(
                items
                    .iter()
                    .map(|item| OperationRequest::from_json(item, params_key))
                    .collect(),
            )),
            _ => Err(GraphQLError::InvalidRequest(
                "request body must be an object or an array of objects".to_string(),
            )),
        }
    }

    #[must_use]
    pub fn is_batch(&self) -> bool {
        matches!(self, Self::Batch(_))
    }
}

impl GraphQL {
    /// Executes one operation against a named schema.
    ///
    /// Persisted query failures are answered as a complete response body
    /// without building the schema.
    ///
    /// # Errors
    ///
    /// Fatal schema or configuration errors, see [`GraphQL::schema`].
    pub async fn execute_operation(
        &self,
        schema: &str,
        operation: OperationRequest,
        context: Data,
    ) -> Result<Value, GraphQLError> {
        let query = match self
            .persisted_queries()
            .resolve(
                schema,
                operation.query.as_deref(),
                operation.extensions.as_ref(),
            )
            .await
        {
            Ok(query) => query,
            Err(err) => {
                warn!(schema = %schema, error = %err, "Persisted query rejected");
                return Ok(err.to_response());
            }
        };

        let mut options = QueryOptions::new().schema(schema);
        options.context = context;
        options.operation_name = operation.operation_name;

        self.query(&query, operation.variables, options).await
    }

    /// Executes a single operation or a batch, in order.
    ///
    /// `context` is called once per operation to build its request data.
    /// A batch answers with an array of bodies.
    pub async fn execute_payload<F>(
        &self,
        schema: &str,
        payload: Payload,
        context: F,
    ) -> Result<Value, GraphQLError>
    where
        F: Fn() -> Data,
    {
        match payload {
            Payload::Single(operation) => {
                self.execute_operation(schema, operation, context()).await
            }
            Payload::Batch(operations) => {
                debug!(schema = %schema, size = operations.len(), "Executing batch");
                let mut responses = Vec::with_capacity(operations.len());
                for operation in operations {
                    responses.push(self.execute_operation(schema, operation, context()).await?);
                }
                Ok(Value::Array(responses))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_single_operation() {
        let body = json!({
            "query": "query Q($id: ID) { example(id: $id) { id } }",
            "operationName": "Q",
            "variables": { "id": "1" }
        });
        let Payload::Single(op) = Payload::from_json(&body, "variables").unwrap() else {
            panic!("expected a single operation");
        };
        assert_eq!(op.operation_name.as_deref(), Some("Q"));
        assert_eq!(op.variables, Some(json!({ "id": "1" })));
        assert!(op.extensions.is_none());
    }

    #[test]
    fn test_string_parameters_are_decoded() {
        let body = json!({
            "query": "{ examples { id } }",
            "variables": "{\"id\": 1}",
            "extensions": "{\"persistedQuery\": {\"version\": 1}}"
        });
        let op = OperationRequest::from_json(&body, "variables");
        assert_eq!(op.variables, Some(json!({ "id": 1 })));
        assert_eq!(op.extensions, Some(json!({ "persistedQuery": { "version": 1 } })));
    }

    #[test]
    fn test_custom_params_key() {
        let body = json!({ "query": "{ examples }", "params": { "id": 1 }, "variables": { "id": 2 } });
        let op = OperationRequest::from_json(&body, "params");
        assert_eq!(op.variables, Some(json!({ "id": 1 })));
    }

    #[test]
    fn test_invalid_string_variables_are_dropped() {
        let body = json!({
            "query": "{ examples }",
            "variables": "not valid json",
            "extensions": "{broken"
        });
        let op = OperationRequest::from_json(&body, "variables");
        assert_eq!(op.query.as_deref(), Some("{ examples }"));
        assert!(op.variables.is_none());
        assert!(op.extensions.is_none());
    }

    #[test]
    fn test_batch() {
        let body = json!([{ "query": "{ a }" }, 42, { "query": "{ b }" }]);
        let payload = Payload::from_json(&body, "variables").unwrap();
        assert!(payload.is_batch());
        let Payload::Batch(ops) = payload else {
            unreachable!();
        };
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[0].query.as_deref(), Some("{ a }"));
        assert_eq!(ops[1], OperationRequest::default());
    }

    #[test]
    fn test_scalar_body_is_rejected() {
        let err = Payload::from_json(&json!("{ a }"), "variables").unwrap_err();
        assert!(matches!(err, GraphQLError::InvalidRequest(_)));
    }
}
