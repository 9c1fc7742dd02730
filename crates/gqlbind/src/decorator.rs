//! Error formatting and reporting for execution results.
//!
//! Every engine error is classified by the value it carries as its source:
//!
//! | source                          | reported | formatted as                                  |
//! |---------------------------------|----------|-----------------------------------------------|
//! | none, outside any field         | no       | message, category `graphql`                   |
//! | none, raised while resolving    | yes      | message, category `graphql`                   |
//! | [`ValidationError`]             | no       | message, category `validation` + field bag    |
//! | [`AuthorizationError`]          | no       | message, category `authorization`             |
//! | `validator::ValidationErrors`   | no       | `"validation"`, category `validation` + bag   |
//! | anything else                   | yes      | `"Internal server error"`, category `internal`|
//!
//! In debug mode masked errors keep their original message under
//! `extensions.debugMessage`.

use std::sync::Arc;

use async_graphql::{ServerError, Value};
use serde_json::json;
use tracing::error;

use crate::error::{AuthorizationError, ReportableError, ValidationError, validator_messages};

/// Formats one error for the response.
pub type ErrorFormatter = Arc<dyn Fn(&ServerError) -> serde_json::Value + Send + Sync>;

/// Reports and formats all errors of a result.
pub type ErrorsHandler =
    Arc<dyn Fn(&[ServerError], &ErrorFormatter) -> Vec<serde_json::Value> + Send + Sync>;

/// Message of masked errors.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Receives unexpected resolver failures.
pub trait ExceptionReporter: Send + Sync {
    fn report(&self, error: &ReportableError);
}

/// Logs reported errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ExceptionReporter for TracingReporter {
    fn report(&self, err: &ReportableError) {
        error!(
            message = %err.message,
            code = err.code.as_deref().unwrap_or("none"),
            "Unhandled error during GraphQL execution"
        );
    }
}

/// What an error carries as its source.
#[derive(Debug, Clone, Copy)]
pub enum ErrorClass<'a> {
    /// No source and no path: request-level engine errors.
    Engine,
    /// No source but a path: plain-message errors from field resolution.
    Resolver,
    Validation(&'a ValidationError),
    Authorization(&'a AuthorizationError),
    FrameworkValidation(&'a validator::ValidationErrors),
    /// Already wrapped for reporting.
    Reportable(&'a ReportableError),
    /// Any other source.
    Unexpected,
}

impl ErrorClass<'_> {
    #[must_use]
    pub fn of(err: &ServerError) -> ErrorClass<'_> {
        if err.source.is_none() {
            return if err.path.is_empty() {
                ErrorClass::Engine
            } else {
                ErrorClass::Resolver
            };
        }
        if let Some(v) = err.source::<ValidationError>() {
            ErrorClass::Validation(v)
        } else if let Some(a) = err.source::<AuthorizationError>() {
            ErrorClass::Authorization(a)
        } else if let Some(v) = err.source::<validator::ValidationErrors>() {
            ErrorClass::FrameworkValidation(v)
        } else if let Some(r) = err.source::<ReportableError>() {
            ErrorClass::Reportable(r)
        } else {
            ErrorClass::Unexpected
        }
    }

    /// Whether the error is forwarded to the exception reporter.
    #[must_use]
    pub fn is_reported(&self) -> bool {
        matches!(self, Self::Resolver | Self::Reportable(_) | Self::Unexpected)
    }

    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Engine | Self::Resolver => "graphql",
            Self::Validation(_) | Self::FrameworkValidation(_) => "validation",
            Self::Authorization(_) => "authorization",
            Self::Reportable(_) | Self::Unexpected => "internal",
        }
    }
}

/// Renders message, locations, path and extensions without classification.
#[must_use]
pub fn base_format(err: &ServerError) -> serde_json::Value {
    let mut out = json!({ "message": err.message });
    if !err.locations.is_empty() {
        out["locations"] = serde_json::to_value(&err.locations).unwrap_or_default();
    }
    if !err.path.is_empty() {
        out["path"] = serde_json::to_value(&err.path).unwrap_or_default();
    }
    if let Some(extensions) = &err.extensions {
        out["extensions"] = serde_json::to_value(extensions).unwrap_or_default();
    }
    out
}

/// Formats an error for the response.
#[must_use]
pub fn format_error(err: &ServerError, debug: bool) -> serde_json::Value {
    let class = ErrorClass::of(err);
    let mut out = base_format(err);

    match class {
        ErrorClass::FrameworkValidation(errors) => {
            out["message"] = json!("validation");
            out["extensions"] = json!({
                "category": "validation",
                "validation": validator_messages(errors),
            });
            return out;
        }
        ErrorClass::Reportable(_) | ErrorClass::Unexpected => {
            out["message"] = json!(INTERNAL_ERROR_MESSAGE);
        }
        _ => {}
    }

    if !out["extensions"].is_object() {
        out["extensions"] = json!({});
    }
    if let Some(extensions) = out["extensions"].as_object_mut() {
        extensions.insert("category".into(), json!(class.category()));
        match class {
            ErrorClass::Validation(v) => {
                extensions.insert("validation".into(), json!(v.messages()));
            }
            ErrorClass::Reportable(_) | ErrorClass::Unexpected if debug => {
                extensions.insert("debugMessage".into(), json!(err.message));
            }
            _ => {}
        }
    }
    out
}

/// Wraps an unexpected error for the reporter.
#[must_use]
pub fn reportable(err: &ServerError) -> Option<ReportableError> {
    match ErrorClass::of(err) {
        ErrorClass::Reportable(r) => Some(r.clone()),
        ErrorClass::Resolver | ErrorClass::Unexpected => Some(ReportableError {
            message: err.message.clone(),
            code: err
                .extensions
                .as_ref()
                .and_then(|ext| ext.get("code"))
                .and_then(|code| match code {
                    Value::String(s) => Some(s.clone()),
                    Value::Enum(e) => Some(e.to_string()),
                    _ => None,
                }),
            cause: err.source.clone(),
        }),
        _ => None,
    }
}

/// Reports unexpected and resolver errors, then formats every error.
pub fn handle_errors(
    errors: &[ServerError],
    formatter: &ErrorFormatter,
    reporter: &dyn ExceptionReporter,
) -> Vec<serde_json::Value> {
    for err in errors {
        if let Some(report) = reportable(err) {
            reporter.report(&report);
        }
    }
    errors.iter().map(|err| formatter(err)).collect()
}

#[must_use]
pub fn default_error_formatter(debug: bool) -> ErrorFormatter {
    Arc::new(move |err: &ServerError| format_error(err, debug))
}

#[must_use]
pub fn default_errors_handler(reporter: Arc<dyn ExceptionReporter>) -> ErrorsHandler {
    Arc::new(move |errors: &[ServerError], formatter: &ErrorFormatter| {
        handle_errors(errors, formatter, reporter.as_ref())
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_graphql::{ErrorExtensionValues, PathSegment, Pos};

    use super::*;

    #[derive(Default)]
    struct Collecting(Mutex<Vec<String>>);

    impl ExceptionReporter for Collecting {
        fn report(&self, err: &ReportableError) {
            self.0.lock().unwrap().push(err.message.clone());
        }
    }

    fn with_source<T: std::fmt::Display + Send + Sync + 'static>(source: T) -> ServerError {
        async_graphql::Error::from(source).into_server_error(Pos { line: 1, column: 3 })
    }

    #[test]
    fn test_engine_error_format() {
        let err = ServerError::new("Unknown field \"nope\"", Some(Pos { line: 1, column: 3 }));
        let out = format_error(&err, false);
        assert_eq!(out["message"], "Unknown field \"nope\"");
        assert_eq!(out["locations"][0]["line"], 1);
        assert_eq!(out["extensions"]["category"], "graphql");
    }

    #[test]
    fn test_framework_validation_format() {
        let mut errors = validator::ValidationErrors::new();
        errors.add("test", validator::ValidationError::new("required"));

        let out = format_error(&with_source(errors), false);
        assert_eq!(out["message"], "validation");
        assert_eq!(
            out["extensions"],
            json!({ "category": "validation", "validation": { "test": ["required"] } })
        );
    }

    #[test]
    fn test_validation_error_keeps_extensions() {
        let mut err = with_source(ValidationError::new("Invalid input").with_message("email", "is invalid"));
        let mut ext = ErrorExtensionValues::default();
        ext.set("code", "BAD_INPUT");
        err.extensions = Some(ext);

        let out = format_error(&err, false);
        assert_eq!(out["message"], "Invalid input");
        assert_eq!(out["extensions"]["code"], "BAD_INPUT");
        assert_eq!(out["extensions"]["category"], "validation");
        assert_eq!(out["extensions"]["validation"]["email"][0], "is invalid");
    }

    #[test]
    fn test_unexpected_error_is_masked() {
        let err = with_source(std::io::Error::other("disk on fire"));
        let out = format_error(&err, false);
        assert_eq!(out["message"], INTERNAL_ERROR_MESSAGE);
        assert_eq!(out["extensions"]["category"], "internal");
        assert!(out["extensions"].get("debugMessage").is_none());

        let out = format_error(&err, true);
        assert_eq!(out["extensions"]["debugMessage"], "disk on fire");
    }

    #[test]
    fn test_handle_errors_reports_only_unexpected() {
        let reporter = Collecting::default();
        let errors = vec![
            ServerError::new("Syntax Error", None),
            with_source(ValidationError::new("validation")),
            with_source(AuthorizationError::default()),
            with_source(validator::ValidationErrors::new()),
            with_source(std::io::Error::other("boom")),
        ];

        let formatted = handle_errors(&errors, &default_error_formatter(false), &reporter);
        assert_eq!(formatted.len(), 5);
        assert_eq!(formatted[2]["extensions"]["category"], "authorization");
        assert_eq!(*reporter.0.lock().unwrap(), vec!["boom".to_string()]);
    }

    #[test]
    fn test_handle_errors_reports_plain_resolver_errors() {
        let reporter = Collecting::default();
        let mut resolver_err = ServerError::new("db connection lost", Some(Pos { line: 1, column: 3 }));
        resolver_err.path = vec![PathSegment::Field("posts".into())];
        let errors = vec![ServerError::new("Unknown field \"nope\"", None), resolver_err];

        let formatted = handle_errors(&errors, &default_error_formatter(false), &reporter);
        assert_eq!(formatted[1]["message"], "db connection lost");
        assert_eq!(formatted[1]["path"], json!(["posts"]));
        assert_eq!(formatted[1]["extensions"]["category"], "graphql");
        assert_eq!(*reporter.0.lock().unwrap(), vec!["db connection lost".to_string()]);
    }

    #[test]
    fn test_reportable_carries_code() {
        let mut err = with_source(std::io::Error::other("boom"));
        let mut ext = ErrorExtensionValues::default();
        ext.set("code", "E_BOOM");
        err.extensions = Some(ext);

        let report = reportable(&err).unwrap();
        assert_eq!(report.code.as_deref(), Some("E_BOOM"));
        assert!(report.cause.is_some());
        assert!(reportable(&ServerError::new("plain", None)).is_none());
    }
}
