//! Component container.
//!
//! Types, fields, schema providers, middleware and error hooks are referred
//! to by string identifiers in configuration. The container maps each
//! identifier to a factory; every [`Container::make`] call runs the factory,
//! so factories produce fresh instances and may resolve their own
//! dependencies from the container they receive.
//!
//! # Example
//!
//! ```ignore
//! let container = Container::new();
//! container.bind_type("ExampleType", |_| ExampleType::default());
//! container.bind_config("DefaultSchema", |c| DefaultSchema::new(c));
//!
//! let ty = container.make_type("ExampleType")?;
//! ```

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::trace;

use crate::decorator::{ErrorFormatter, ErrorsHandler};
use crate::error::GraphQLError;
use crate::pipeline::ExecutionMiddleware;
use crate::schema::ToConfig;
use crate::types::{LengthAwarePagination, SimplePagination, ToField, ToType, WrapType};

/// Identifier of the built-in length-aware pagination wrapper.
pub const PAGINATION_WRAPPER: &str = "pagination";

/// Identifier of the built-in simple pagination wrapper.
pub const SIMPLE_PAGINATION_WRAPPER: &str = "simple_pagination";

/// A component produced by the container, tagged by capability.
#[derive(Clone)]
pub enum Component {
    Type(Arc<dyn ToType>),
    Field(Arc<dyn ToField>),
    Config(Arc<dyn ToConfig>),
    Middleware(Arc<dyn ExecutionMiddleware>),
    Wrapper(Arc<dyn WrapType>),
    ErrorFormatter(ErrorFormatter),
    ErrorsHandler(ErrorsHandler),
}

impl Component {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Type(_) => "type",
            Self::Field(_) => "field",
            Self::Config(_) => "schema config",
            Self::Middleware(_) => "execution middleware",
            Self::Wrapper(_) => "type wrapper",
            Self::ErrorFormatter(_) => "error formatter",
            Self::ErrorsHandler(_) => "errors handler",
        }
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.kind())
    }
}

type Factory = Arc<dyn Fn(&Container) -> Component + Send + Sync>;

/// Identifier -> factory bindings.
pub struct Container {
    bindings: DashMap<String, Factory>,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("bindings", &self.bindings.len())
            .finish()
    }
}

impl Container {
    /// Creates a container with the built-in pagination wrappers bound.
    #[must_use]
    pub fn new() -> Self {
        let container = Self {
            bindings: DashMap::new(),
        };
        container.bind_wrapper(PAGINATION_WRAPPER, |_| LengthAwarePagination);
        container.bind_wrapper(SIMPLE_PAGINATION_WRAPPER, |_| SimplePagination);
        container
    }

    /// Binds a raw factory, replacing any previous binding.
    pub fn bind<F>(&self, id: impl Into<String>, factory: F)
    where
        F: Fn(&Container) -> Component + Send + Sync + 'static,
    {
        let id = id.into();
        trace!(id = %id, "Binding container component");
        self.bindings.insert(id, Arc::new(factory));
    }

    pub fn bind_type<T, F>(&self, id: impl Into<String>, factory: F)
    where
        T: ToType + 'static,
        F: Fn(&Container) -> T + Send + Sync + 'static,
    {
        self.bind(id, move |c| Component::Type(Arc::new(factory(c))));
    }

    pub fn bind_field<T, F>(&self, id: impl Into<String>, factory: F)
    where
        T: ToField + 'static,
        F: Fn(&Container) -> T + Send + Sync + 'static,
    {
        self.bind(id, move |c| Component::Field(Arc::new(factory(c))));
    }

    pub fn bind_config<T, F>(&self, id: impl Into<String>, factory: F)
    where
        T: ToConfig + 'static,
        F: Fn(&Container) -> T + Send + Sync + 'static,
    {
        self.bind(id, move |c| Component::Config(Arc::new(factory(c))));
    }

    pub fn bind_middleware<T, F>(&self, id: impl Into<String>, factory: F)
    where
        T: ExecutionMiddleware + 'static,
        F: Fn(&Container) -> T + Send + Sync + 'static,
    {
        self.bind(id, move |c| Component::Middleware(Arc::new(factory(c))));
    }

    pub fn bind_wrapper<T, F>(&self, id: impl Into<String>, factory: F)
    where
        T: WrapType + 'static,
        F: Fn(&Container) -> T + Send + Sync + 'static,
    {
        self.bind(id, move |c| Component::Wrapper(Arc::new(factory(c))));
    }

    pub fn bind_error_formatter(&self, id: impl Into<String>, formatter: ErrorFormatter) {
        self.bind(id, move |_| Component::ErrorFormatter(Arc::clone(&formatter)));
    }

    pub fn bind_errors_handler(&self, id: impl Into<String>, handler: ErrorsHandler) {
        self.bind(id, move |_| Component::ErrorsHandler(Arc::clone(&handler)));
    }

    #[must_use]
    pub fn has(&self, id: &str) -> bool {
        self.bindings.contains_key(id)
    }

    pub fn unbind(&self, id: &str) {
        self.bindings.remove(id);
    }

    /// Runs the factory bound to `id`.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::ComponentNotFound` if nothing is bound.
    pub fn make(&self, id: &str) -> Result<Component, GraphQLError> {
        // Release the shard guard before running the factory; factories may
        // call back into the container.
        let factory = self
            .bindings
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| GraphQLError::ComponentNotFound(id.to_string()))?;
        Ok(factory(self))
    }

    /// Makes a type provider.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::TypeNotFound` if the component cannot be
    /// converted to a type.
    pub fn make_type(&self, id: &str) -> Result<Arc<dyn ToType>, GraphQLError> {
        match self.make(id)? {
            Component::Type(ty) => Ok(ty),
            other => Err(GraphQLError::TypeNotFound(format!(
                "Unable to convert {id} to a GraphQL type, please implement ToType (found {})",
                other.kind()
            ))),
        }
    }

    pub fn make_field(&self, id: &str) -> Result<Arc<dyn ToField>, GraphQLError> {
        match self.make(id)? {
            Component::Field(field) => Ok(field),
            other => Err(mismatch(id, "field", &other)),
        }
    }

    /// Makes a schema config provider.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::SchemaNotFound` if nothing is bound to `id`.
    pub fn make_config(&self, id: &str) -> Result<Arc<dyn ToConfig>, GraphQLError> {
        if !self.has(id) {
            return Err(GraphQLError::SchemaNotFound(format!(
                "Schema class {id} not found."
            )));
        }
        match self.make(id)? {
            Component::Config(config) => Ok(config),
            other => Err(mismatch(id, "schema config", &other)),
        }
    }

    pub fn make_middleware(&self, id: &str) -> Result<Arc<dyn ExecutionMiddleware>, GraphQLError> {
        match self.make(id)? {
            Component::Middleware(middleware) => Ok(middleware),
            other => Err(mismatch(id, "execution middleware", &other)),
        }
    }

    pub fn make_wrapper(&self, id: &str) -> Result<Arc<dyn WrapType>, GraphQLError> {
        match self.make(id)? {
            Component::Wrapper(wrapper) => Ok(wrapper),
            other => Err(mismatch(id, "type wrapper", &other)),
        }
    }

    pub fn make_error_formatter(&self, id: &str) -> Result<ErrorFormatter, GraphQLError> {
        match self.make(id)? {
            Component::ErrorFormatter(formatter) => Ok(formatter),
            other => Err(mismatch(id, "error formatter", &other)),
        }
    }

    pub fn make_errors_handler(&self, id: &str) -> Result<ErrorsHandler, GraphQLError> {
        match self.make(id)? {
            Component::ErrorsHandler(handler) => Ok(handler),
            other => Err(mismatch(id, "errors handler", &other)),
        }
    }
}

fn mismatch(id: &str, expected: &'static str, found: &Component) -> GraphQLError {
    GraphQLError::ComponentMismatch {
        id: id.to_string(),
        expected,
        found: found.kind(),
    }
}
