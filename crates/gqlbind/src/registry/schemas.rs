//! Named schema registry.

use std::fmt;

use async_graphql::dynamic::Schema;
use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::schema::SchemaConfig;

/// A registered schema.
#[derive(Clone)]
pub enum SchemaEntry {
    /// Structured configuration, deep-merged on re-registration.
    Config(SchemaConfig),
    /// Container identifier of a `ToConfig` provider.
    Provider(String),
    /// Finished engine schema.
    Prebuilt(Schema),
}

impl SchemaEntry {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Provider(_) => "provider",
            Self::Prebuilt(_) => "prebuilt",
        }
    }
}

impl fmt::Debug for SchemaEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(config) => f.debug_tuple("Config").field(config).finish(),
            Self::Provider(id) => f.debug_tuple("Provider").field(id).finish(),
            Self::Prebuilt(_) => f.write_str("Prebuilt"),
        }
    }
}

impl From<SchemaConfig> for SchemaEntry {
    fn from(config: SchemaConfig) -> Self {
        Self::Config(config)
    }
}

impl From<Schema> for SchemaEntry {
    fn from(schema: Schema) -> Self {
        Self::Prebuilt(schema)
    }
}

/// Schema name -> entry, in registration order.
#[derive(Default)]
pub struct SchemaRegistry {
    entries: RwLock<IndexMap<String, SchemaEntry>>,
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("schemas", &self.names())
            .finish()
    }
}

impl SchemaRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema.
    ///
    /// Two structured configs under the same name are deep-merged. Any
    /// other combination replaces the existing entry.
    pub fn register(&self, name: &str, entry: impl Into<SchemaEntry>) {
        let entry = entry.into();
        let mut entries = self.entries.write();
        match (entries.get_mut(name), entry) {
            (Some(SchemaEntry::Config(existing)), SchemaEntry::Config(update)) => {
                debug!(schema = %name, "Merging schema config");
                existing.merge(update);
            }
            (_, entry) => {
                debug!(schema = %name, kind = entry.kind(), "Registering schema");
                entries.insert(name.to_string(), entry);
            }
        }
    }

    /// Registers several schemas in order.
    pub fn merge<I, E>(&self, schemas: I)
    where
        I: IntoIterator<Item = (String, E)>,
        E: Into<SchemaEntry>,
    {
        for (name, entry) in schemas {
            self.register(&name, entry);
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<SchemaEntry> {
        self.entries.read().get(name).cloned()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    pub fn unregister(&self, name: &str) {
        self.entries.write().shift_remove(name);
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Registered names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }
}
