//! Structured schema configuration.

use std::fmt;
use std::sync::Arc;

use async_graphql::dynamic::Schema;
use indexmap::IndexMap;

use crate::registry::TypeDescriptor;
use crate::types::{FieldDefinition, ToField};

/// Where a root field comes from.
#[derive(Clone)]
pub enum FieldDescriptor {
    /// Container identifier of a [`ToField`] component.
    Class(String),
    /// Live field provider.
    Provider(Arc<dyn ToField>),
    /// Ready definition. The map key overrides its name.
    Definition(FieldDefinition),
}

impl FieldDescriptor {
    pub fn class(id: impl Into<String>) -> Self {
        Self::Class(id.into())
    }

    pub fn provider<T: ToField + 'static>(provider: T) -> Self {
        Self::Provider(Arc::new(provider))
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(id) => f.debug_tuple("Class").field(id).finish(),
            Self::Provider(_) => f.write_str("Provider"),
            Self::Definition(def) => f.debug_tuple("Definition").field(&def.name).finish(),
        }
    }
}

impl From<FieldDefinition> for FieldDescriptor {
    fn from(def: FieldDefinition) -> Self {
        Self::Definition(def)
    }
}

impl From<&str> for FieldDescriptor {
    fn from(id: &str) -> Self {
        Self::class(id)
    }
}

/// Field name -> descriptor, in declaration order.
pub type FieldMap = IndexMap<String, FieldDescriptor>;

/// Root field maps plus the member types a schema registers.
#[derive(Clone, Debug, Default)]
pub struct SchemaConfig {
    pub query: FieldMap,
    pub mutation: FieldMap,
    pub subscription: FieldMap,
    /// Optional registration name with its descriptor.
    pub types: Vec<(Option<String>, TypeDescriptor)>,
}

impl SchemaConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn query(mut self, name: impl Into<String>, field: impl Into<FieldDescriptor>) -> Self {
        self.query.insert(name.into(), field.into());
        self
    }

    #[must_use]
    pub fn mutation(mut self, name: impl Into<String>, field: impl Into<FieldDescriptor>) -> Self {
        self.mutation.insert(name.into(), field.into());
        self
    }

    #[must_use]
    pub fn subscription(
        mut self,
        name: impl Into<String>,
        field: impl Into<FieldDescriptor>,
    ) -> Self {
        self.subscription.insert(name.into(), field.into());
        self
    }

    /// Adds a member type registered under its declared name.
    #[must_use]
    pub fn with_type(mut self, descriptor: impl Into<TypeDescriptor>) -> Self {
        self.types.push((None, descriptor.into()));
        self
    }

    /// Adds a member type registered under `name`.
    #[must_use]
    pub fn with_named_type(
        mut self,
        name: impl Into<String>,
        descriptor: impl Into<TypeDescriptor>,
    ) -> Self {
        self.types.push((Some(name.into()), descriptor.into()));
        self
    }

    /// Deep-merges `other` into `self`.
    ///
    /// Field maps merge key-wise and `other` wins a conflicting key; type
    /// lists are appended.
    pub fn merge(&mut self, other: SchemaConfig) {
        self.query.extend(other.query);
        self.mutation.extend(other.mutation);
        self.subscription.extend(other.subscription);
        self.types.extend(other.types);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
            && self.mutation.is_empty()
            && self.subscription.is_empty()
            && self.types.is_empty()
    }
}

/// Capability of producing a schema configuration.
pub trait ToConfig: Send + Sync {
    fn to_config(&self) -> SchemaConfig;
}

impl ToConfig for SchemaConfig {
    fn to_config(&self) -> SchemaConfig {
        self.clone()
    }
}

/// What to build a schema from.
#[derive(Clone)]
pub enum SchemaSource {
    /// A registered schema; `None` selects the configured default.
    Name(Option<String>),
    /// An inline configuration that is not registered.
    Config(SchemaConfig),
    /// A finished schema, returned unchanged.
    Prebuilt(Schema),
}

impl SchemaSource {
    #[must_use]
    pub fn default_schema() -> Self {
        Self::Name(None)
    }
}

impl fmt::Debug for SchemaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.debug_tuple("Name").field(name).finish(),
            Self::Config(config) => f.debug_tuple("Config").field(config).finish(),
            Self::Prebuilt(_) => f.write_str("Prebuilt"),
        }
    }
}

impl From<&str> for SchemaSource {
    fn from(name: &str) -> Self {
        Self::Name(Some(name.to_string()))
    }
}

impl From<String> for SchemaSource {
    fn from(name: String) -> Self {
        Self::Name(Some(name))
    }
}

impl From<Option<String>> for SchemaSource {
    fn from(name: Option<String>) -> Self {
        Self::Name(name)
    }
}

impl From<SchemaConfig> for SchemaSource {
    fn from(config: SchemaConfig) -> Self {
        Self::Config(config)
    }
}

impl From<Schema> for SchemaSource {
    fn from(schema: Schema) -> Self {
        Self::Prebuilt(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeDefinition;

    #[test]
    fn test_merge_newer_field_wins() {
        let mut base = SchemaConfig::new()
            .query("examples", "ExamplesQuery")
            .query("posts", "PostsQuery")
            .with_type(TypeDescriptor::factory("ExampleType"));
        let update = SchemaConfig::new()
            .query("posts", "OtherPostsQuery")
            .mutation("createPost", "CreatePost")
            .with_named_type("Post", TypeDescriptor::factory("PostType"));

        base.merge(update);

        assert_eq!(
            base.query.keys().collect::<Vec<_>>(),
            vec!["examples", "posts"]
        );
        assert!(matches!(&base.query["posts"], FieldDescriptor::Class(id) if id == "OtherPostsQuery"));
        assert_eq!(base.mutation.len(), 1);
        assert_eq!(base.types.len(), 2);
        assert_eq!(base.types[1].0.as_deref(), Some("Post"));
    }

    #[test]
    fn test_is_empty() {
        assert!(SchemaConfig::new().is_empty());
        assert!(!SchemaConfig::new().with_type(TypeDefinition::scalar("Date")).is_empty());
    }

    #[test]
    fn test_schema_source_conversions() {
        assert!(matches!(SchemaSource::from("admin"), SchemaSource::Name(Some(n)) if n == "admin"));
        assert!(matches!(SchemaSource::default_schema(), SchemaSource::Name(None)));
        assert!(matches!(
            SchemaSource::from(SchemaConfig::new()),
            SchemaSource::Config(_)
        ));
    }
}
