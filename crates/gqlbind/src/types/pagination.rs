//! Pagination wrapper types.
//!
//! `paginate("Post")` produces a `PostPagination` object whose fields are
//! read from the object value returned by the query resolver:
//!
//! ```json
//! { "data": [...], "total": 42, "per_page": 10, "current_page": 1,
//!   "from": 1, "to": 10, "last_page": 5, "has_more_pages": true }
//! ```
//!
//! The wrappers are resolved through the container under the identifiers
//! configured as `pagination_type` and `simple_pagination_type`, so a host
//! can substitute its own shapes.

use std::sync::Arc;

use super::definition::{FieldDefinition, ToType, TypeDefinition};

/// Builds a wrapper type around an existing type.
pub trait WrapType: Send + Sync {
    fn wrap(&self, type_name: &str, custom_name: &str) -> Arc<dyn ToType>;
}

/// Length-aware pagination.
#[derive(Debug, Clone, Copy, Default)]
pub struct LengthAwarePagination;

/// Pagination without a total count.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimplePagination;

impl WrapType for LengthAwarePagination {
    fn wrap(&self, type_name: &str, custom_name: &str) -> Arc<dyn ToType> {
        Arc::new(PaginationType {
            type_name: type_name.to_string(),
            name: custom_name.to_string(),
            with_totals: true,
        })
    }
}

impl WrapType for SimplePagination {
    fn wrap(&self, type_name: &str, custom_name: &str) -> Arc<dyn ToType> {
        Arc::new(PaginationType {
            type_name: type_name.to_string(),
            name: custom_name.to_string(),
            with_totals: false,
        })
    }
}

/// The object type produced by the built-in wrappers.
#[derive(Debug, Clone)]
pub struct PaginationType {
    type_name: String,
    name: String,
    with_totals: bool,
}

impl ToType for PaginationType {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn to_type(&self) -> TypeDefinition {
        let mut def = TypeDefinition::object(&self.name)
            .description(format!("Paginated list of {}", self.type_name))
            .field(
                FieldDefinition::new("data", format!("[{}!]!", self.type_name))
                    .description("List of items on the current page"),
            );

        if self.with_totals {
            def = def
                .field(
                    FieldDefinition::new("total", "Int!")
                        .description("Number of total items selected by the query"),
                );
        }

        def = def
            .field(
                FieldDefinition::new("per_page", "Int!")
                    .description("Number of items returned per page"),
            )
            .field(FieldDefinition::new("current_page", "Int!").description("Current page of the cursor"))
            .field(
                FieldDefinition::new("from", "Int")
                    .description("Number of the first item returned"),
            )
            .field(FieldDefinition::new("to", "Int").description("Number of the last item returned"));

        if self.with_totals {
            def = def.field(
                FieldDefinition::new("last_page", "Int!")
                    .description("The last page (number of pages)"),
            );
        }

        def.field(
            FieldDefinition::new("has_more_pages", "Boolean!")
                .description("Determines if cursor has more pages after the current page"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_names(def: &TypeDefinition) -> Vec<&str> {
        def.fields().iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_length_aware_pagination_fields() {
        let def = LengthAwarePagination.wrap("Post", "PostPagination").to_type();
        assert_eq!(def.name, "PostPagination");
        assert_eq!(
            field_names(&def),
            vec![
                "data",
                "total",
                "per_page",
                "current_page",
                "from",
                "to",
                "last_page",
                "has_more_pages"
            ]
        );
        assert_eq!(def.fields()[0].ty, "[Post!]!");
    }

    #[test]
    fn test_simple_pagination_fields() {
        let def = SimplePagination.wrap("Post", "PostSimplePagination").to_type();
        assert_eq!(
            field_names(&def),
            vec!["data", "per_page", "current_page", "from", "to", "has_more_pages"]
        );
    }
}
