//! Ad hoc object type construction.

use std::sync::Arc;

use super::builder::resolve_fields;
use super::config::FieldMap;
use crate::container::Container;
use crate::error::GraphQLError;
use crate::types::{ToType, TypeDefinition};

/// Input accepted by `GraphQL::object_type`.
pub enum ObjectSource {
    /// A realized definition.
    Definition(TypeDefinition),
    /// Field map of a new object type; needs a name override.
    Fields(FieldMap),
    /// Container identifier of a type component.
    Class(String),
    /// Live type provider.
    Instance(Arc<dyn ToType>),
}

impl From<TypeDefinition> for ObjectSource {
    fn from(def: TypeDefinition) -> Self {
        Self::Definition(def)
    }
}

impl From<FieldMap> for ObjectSource {
    fn from(fields: FieldMap) -> Self {
        Self::Fields(fields)
    }
}

/// Properties applied on top of the converted type.
#[derive(Debug, Clone, Default)]
pub struct TypeOverrides {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl TypeOverrides {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            description: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn apply(self, mut def: TypeDefinition) -> TypeDefinition {
        if let Some(name) = self.name {
            def.name = name;
        }
        if let Some(description) = self.description {
            def.description = Some(description);
        }
        def
    }
}

/// Builds an object type from any supported source.
///
/// # Errors
///
/// Returns `GraphQLError::TypeNotFound` if a `Class` source is not a type
/// component, and `GraphQLError::InvalidRequest` for a field map without a
/// name.
pub fn object_type(
    container: &Container,
    source: ObjectSource,
    overrides: TypeOverrides,
) -> Result<TypeDefinition, GraphQLError> {
    let def = match source {
        ObjectSource::Definition(def) => def,
        ObjectSource::Fields(fields) => {
            let Some(name) = overrides.name.as_deref() else {
                return Err(GraphQLError::InvalidRequest(
                    "An object type built from fields needs a name".to_string(),
                ));
            };
            resolve_fields(container, &fields)?
                .into_iter()
                .fold(TypeDefinition::object(name), TypeDefinition::field)
        }
        ObjectSource::Class(id) => container.make_type(&id)?.to_type(),
        ObjectSource::Instance(provider) => provider.to_type(),
    };
    Ok(overrides.apply(def))
}
