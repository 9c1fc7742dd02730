//! Default field resolution and JSON value conversion.

use async_graphql::dynamic::{FieldFuture, FieldValue, ResolverContext};
use async_graphql::{Name, Value};

/// Root value of a request, consulted by the default field resolver when a
/// field has no parent object.
#[derive(Debug, Clone, Default)]
pub struct RootValue(pub serde_json::Value);

/// Resolver used for fields declared without one.
///
/// Reads the field's key from the parent object. Parents are either engine
/// values or `serde_json::Value`s passed with `FieldValue::owned_any`. Root
/// fields fall back to the request's [`RootValue`]. Missing keys resolve to
/// null.
pub fn default_field_resolver(ctx: ResolverContext<'_>) -> FieldFuture<'_> {
    FieldFuture::new(async move {
        let name = ctx.field().name();

        if let Some(Value::Object(parent)) = ctx.parent_value.as_value() {
            return Ok(parent.get(name).cloned().map(into_field_value));
        }

        if let Some(parent) = ctx.parent_value.downcast_ref::<serde_json::Value>() {
            return Ok(parent
                .get(name)
                .map(|v| into_field_value(json_to_graphql_value(v.clone()))));
        }

        let root = ctx
            .data_opt::<RootValue>()
            .and_then(|root| root.0.get(name))
            .map(|v| into_field_value(json_to_graphql_value(v.clone())));
        Ok(root)
    })
}

/// Wraps a value for the engine. Lists become list field values so that
/// list-of-object fields keep resolving against each element.
pub fn into_field_value(value: Value) -> FieldValue<'static> {
    match value {
        Value::Null => FieldValue::NULL,
        Value::List(items) => FieldValue::list(items.into_iter().map(into_field_value)),
        other => FieldValue::value(other),
    }
}

/// Converts a JSON value to an engine value.
pub fn json_to_graphql_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else if let Some(f) = n.as_f64() {
                async_graphql::Number::from_f64(f).map_or(Value::Null, Value::Number)
            } else {
                Value::Null
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => {
            Value::List(arr.into_iter().map(json_to_graphql_value).collect())
        }
        serde_json::Value::Object(obj) => Value::Object(
            obj.into_iter()
                .map(|(k, v)| (Name::new(k), json_to_graphql_value(v)))
                .collect(),
        ),
    }
}
