//! Type registry with lazily realized, memoized instances.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::container::Container;
use crate::error::GraphQLError;
use crate::types::{GraphQLType, NamedType, ToType, TypeDefinition, TypeReference, builtin_scalar};

/// How a registered type is produced.
#[derive(Clone)]
pub enum TypeDescriptor {
    /// Container identifier, made on first use.
    Factory(String),
    /// Live type provider.
    Instance(Arc<dyn ToType>),
}

impl TypeDescriptor {
    pub fn factory(id: impl Into<String>) -> Self {
        Self::Factory(id.into())
    }

    pub fn instance<T: ToType + 'static>(provider: T) -> Self {
        Self::Instance(Arc::new(provider))
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Factory(id) => f.debug_tuple("Factory").field(id).finish(),
            Self::Instance(provider) => f.debug_tuple("Instance").field(&provider.name()).finish(),
        }
    }
}

impl From<TypeDefinition> for TypeDescriptor {
    fn from(def: TypeDefinition) -> Self {
        Self::instance(def)
    }
}

/// Maps type names to descriptors and caches realized instances.
///
/// At most one instance per name is cached. The cache is dropped wholesale
/// by [`invalidate_instances`](Self::invalidate_instances) at the start of
/// every schema build so that no instance crosses from one schema to the
/// next.
pub struct TypeRegistry {
    container: Arc<Container>,
    descriptors: DashMap<String, TypeDescriptor>,
    instances: DashMap<String, Arc<TypeDefinition>>,
    lazyload: bool,
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.descriptors.len())
            .field("instances", &self.instances.len())
            .field("lazyload", &self.lazyload)
            .finish()
    }
}

impl TypeRegistry {
    /// With `lazyload` on, schemas realize the types reachable from their
    /// roots before the rest and not-found errors carry a naming hint.
    #[must_use]
    pub fn new(container: Arc<Container>, lazyload: bool) -> Self {
        Self {
            container,
            descriptors: DashMap::new(),
            instances: DashMap::new(),
            lazyload,
        }
    }

    /// Registers a descriptor, replacing any previous one under the name.
    ///
    /// Without an explicit name the descriptor is made and its declared
    /// name is used. Returns the name the descriptor was registered under.
    ///
    /// # Errors
    ///
    /// Fails if the descriptor has to be made and the container cannot
    /// produce a type from it.
    pub fn register(
        &self,
        name: Option<&str>,
        descriptor: TypeDescriptor,
    ) -> Result<String, GraphQLError> {
        let name = match name {
            Some(name) => name.to_string(),
            None => match &descriptor {
                TypeDescriptor::Instance(provider) => provider.name(),
                TypeDescriptor::Factory(id) => self.container.make_type(id)?.name(),
            },
        };
        self.insert(&name, descriptor);
        Ok(name)
    }

    /// Registers a descriptor under an explicit name, replacing any previous
    /// one.
    pub fn insert(&self, name: &str, descriptor: TypeDescriptor) {
        trace!(name = %name, descriptor = ?descriptor, "Registering type");
        self.descriptors.insert(name.to_string(), descriptor);
    }

    /// Resolves a type reference such as `"[Post!]!"`.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::TypeNotFound` if the base type is neither a
    /// built-in scalar nor registered.
    pub fn resolve(&self, reference: &str, fresh: bool) -> Result<GraphQLType, GraphQLError> {
        let parsed = TypeReference::parse(reference);
        let base = self.resolve_named(&parsed.base, fresh)?;
        Ok(parsed.apply(GraphQLType::Named(base)))
    }

    /// Resolves a bare type name.
    pub fn resolve_named(&self, name: &str, fresh: bool) -> Result<NamedType, GraphQLError> {
        if let Some(builtin) = builtin_scalar(name) {
            return Ok(NamedType::Builtin(builtin));
        }
        self.definition(name, fresh).map(NamedType::Defined)
    }

    /// Returns the realized instance for a registered name.
    ///
    /// A cached instance is returned unless `fresh` is set. Otherwise the
    /// descriptor is made and converted, and the result replaces the cached
    /// instance.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::TypeNotFound` for unregistered names.
    pub fn definition(&self, name: &str, fresh: bool) -> Result<Arc<TypeDefinition>, GraphQLError> {
        let descriptor = self
            .descriptors
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| self.not_found(name))?;

        if !fresh {
            if let Some(cached) = self.instances.get(name) {
                return Ok(Arc::clone(cached.value()));
            }
        }

        let provider = match descriptor {
            TypeDescriptor::Instance(provider) => provider,
            TypeDescriptor::Factory(id) => self.container.make_type(&id)?,
        };
        let instance = Arc::new(provider.to_type());
        debug!(name = %name, kind = instance.kind.label(), fresh, "Realized type instance");
        self.instances.insert(name.to_string(), Arc::clone(&instance));
        Ok(instance)
    }

    /// Caches an instance directly, bypassing the descriptor.
    pub fn cache_instance(&self, name: &str, instance: Arc<TypeDefinition>) {
        self.instances.insert(name.to_string(), instance);
    }

    /// Returns the cached instance without realizing anything.
    #[must_use]
    pub fn cached(&self, name: &str) -> Option<Arc<TypeDefinition>> {
        self.instances.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Drops every cached instance. Descriptors are kept.
    pub fn invalidate_instances(&self) {
        trace!(count = self.instances.len(), "Invalidating type instances");
        self.instances.clear();
    }

    pub fn unregister(&self, name: &str) {
        self.descriptors.remove(name);
    }

    pub fn clear(&self) {
        self.descriptors.clear();
    }

    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.descriptors.contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.descriptors.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn descriptor(&self, name: &str) -> Option<TypeDescriptor> {
        self.descriptors.get(name).map(|e| e.value().clone())
    }

    #[must_use]
    pub fn lazyload(&self) -> bool {
        self.lazyload
    }

    fn not_found(&self, name: &str) -> GraphQLError {
        let mut message = format!("Type {name} not found.");
        if self.lazyload {
            message.push_str(
                "\nCheck that the registration key for the type matches the name declared by \
                 the type itself.\nIt is required when 'lazyload_types' is enabled",
            );
        }
        GraphQLError::TypeNotFound(message)
    }
}
