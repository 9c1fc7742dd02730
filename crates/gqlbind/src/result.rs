//! Execution results.

use std::fmt;
use std::sync::Arc;

use async_graphql::{Response, ServerError};
use serde_json::json;

use crate::decorator::{ErrorFormatter, ErrorsHandler, base_format};

/// Outcome of executing one operation.
///
/// Errors stay engine errors until [`to_json`](Self::to_json), where the
/// configured handler and formatter turn them into response objects.
#[derive(Clone, Default)]
pub struct ExecutionResult {
    pub data: Option<serde_json::Value>,
    pub errors: Vec<ServerError>,
    pub extensions: Option<serde_json::Value>,
    formatter: Option<ErrorFormatter>,
    handler: Option<ErrorsHandler>,
}

impl fmt::Debug for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionResult")
            .field("data", &self.data)
            .field("errors", &self.errors)
            .field("extensions", &self.extensions)
            .field("has_formatter", &self.formatter.is_some())
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

impl From<Response> for ExecutionResult {
    fn from(resp: Response) -> Self {
        let data = resp
            .data
            .into_json()
            .ok()
            .filter(|data| !data.is_null());
        let extensions = if resp.extensions.is_empty() {
            None
        } else {
            serde_json::to_value(&resp.extensions).ok()
        };

        Self {
            data,
            errors: resp.errors,
            extensions,
            formatter: None,
            handler: None,
        }
    }
}

impl ExecutionResult {
    /// A result with data only.
    #[must_use]
    pub fn from_data(data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            ..Self::default()
        }
    }

    /// A result with errors only.
    #[must_use]
    pub fn from_errors(errors: Vec<ServerError>) -> Self {
        Self {
            errors,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_error_formatter(mut self, formatter: ErrorFormatter) -> Self {
        self.formatter = Some(formatter);
        self
    }

    #[must_use]
    pub fn with_errors_handler(mut self, handler: ErrorsHandler) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn set_error_formatter(&mut self, formatter: ErrorFormatter) {
        self.formatter = Some(formatter);
    }

    pub fn set_errors_handler(&mut self, handler: ErrorsHandler) {
        self.handler = Some(handler);
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Renders `{data?, errors?, extensions?}`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let mut out = json!({});
        if let Some(data) = &self.data {
            out["data"] = data.clone();
        }
        if !self.errors.is_empty() {
            let formatter = self
                .formatter
                .clone()
                .unwrap_or_else(|| Arc::new(base_format) as ErrorFormatter);
            let errors = match &self.handler {
                Some(handler) => handler(&self.errors, &formatter),
                None => self.errors.iter().map(|err| formatter(err)).collect(),
            };
            out["errors"] = serde_json::Value::Array(errors);
        }
        if let Some(extensions) = &self.extensions {
            out["extensions"] = extensions.clone();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result() {
        assert_eq!(ExecutionResult::default().to_json(), json!({}));
    }

    #[test]
    fn test_data_only() {
        let result = ExecutionResult::from_data(json!({ "examples": [] }));
        assert!(result.is_ok());
        assert_eq!(result.to_json(), json!({ "data": { "examples": [] } }));
    }

    #[test]
    fn test_errors_use_base_format_by_default() {
        let result = ExecutionResult::from_errors(vec![ServerError::new("boom", None)]);
        assert_eq!(result.to_json(), json!({ "errors": [{ "message": "boom" }] }));
    }

    #[test]
    fn test_custom_formatter_and_handler() {
        let formatter: ErrorFormatter = Arc::new(|err: &ServerError| json!({ "msg": err.message }));
        let handler: ErrorsHandler = Arc::new(|errors: &[ServerError], formatter: &ErrorFormatter| {
            errors.iter().rev().map(|e| formatter(e)).collect()
        });

        let result = ExecutionResult::from_errors(vec![
            ServerError::new("first", None),
            ServerError::new("second", None),
        ])
        .with_error_formatter(formatter)
        .with_errors_handler(handler);

        assert_eq!(
            result.to_json()["errors"],
            json!([{ "msg": "second" }, { "msg": "first" }])
        );
    }
}
