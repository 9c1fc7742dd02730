//! Type and field definitions.
//!
//! A [`TypeDefinition`] is the realized form of a named GraphQL type held by
//! the type registry. Field and argument types are kept as type reference
//! strings (`"[Post!]!"`) and are only resolved against the registry when a
//! schema is assembled, so definitions can refer to each other in any order.

use std::fmt;
use std::sync::Arc;

use async_graphql::Value;
use async_graphql::dynamic::{FieldFuture, ResolverContext, SubscriptionFieldFuture};

/// Resolver for an object or interface field.
pub type ResolverFn = Arc<dyn for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync>;

/// Stream resolver for a subscription root field.
pub type SubscriptionFn =
    Arc<dyn for<'a> Fn(ResolverContext<'a>) -> SubscriptionFieldFuture<'a> + Send + Sync>;

/// Capability of producing a named GraphQL type.
pub trait ToType: Send + Sync {
    /// Declared type name, used when the type is registered without one.
    fn name(&self) -> String;

    /// Produces a new realized type.
    fn to_type(&self) -> TypeDefinition;
}

/// Capability of producing a field definition.
pub trait ToField: Send + Sync {
    /// Produces the field under the name it is registered with.
    fn to_field(&self, name: &str) -> FieldDefinition;
}

/// A realized named type.
#[derive(Clone, Debug)]
pub struct TypeDefinition {
    pub name: String,
    pub description: Option<String>,
    pub kind: TypeKind,
}

#[derive(Clone, Debug)]
pub enum TypeKind {
    Object {
        fields: Vec<FieldDefinition>,
        implements: Vec<String>,
    },
    Interface {
        fields: Vec<FieldDefinition>,
    },
    InputObject {
        fields: Vec<InputValueDefinition>,
    },
    Enum {
        values: Vec<EnumValueDefinition>,
    },
    Scalar,
    Union {
        members: Vec<String>,
    },
}

impl TypeKind {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Object { .. } => "object",
            Self::Interface { .. } => "interface",
            Self::InputObject { .. } => "input object",
            Self::Enum { .. } => "enum",
            Self::Scalar => "scalar",
            Self::Union { .. } => "union",
        }
    }
}

impl TypeDefinition {
    pub fn object(name: impl Into<String>) -> Self {
        Self::with_kind(
            name,
            TypeKind::Object {
                fields: Vec::new(),
                implements: Vec::new(),
            },
        )
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Interface { fields: Vec::new() })
    }

    pub fn input_object(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::InputObject { fields: Vec::new() })
    }

    pub fn enumeration(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Enum { values: Vec::new() })
    }

    pub fn scalar(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Scalar)
    }

    pub fn union(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Union { members: Vec::new() })
    }

    fn with_kind(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a field to an object or interface type. Ignored for other kinds.
    #[must_use]
    pub fn field(mut self, field: FieldDefinition) -> Self {
        match &mut self.kind {
            TypeKind::Object { fields, .. } | TypeKind::Interface { fields } => fields.push(field),
            _ => {}
        }
        self
    }

    /// Declares an implemented interface on an object type.
    #[must_use]
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        if let TypeKind::Object { implements, .. } = &mut self.kind {
            implements.push(interface.into());
        }
        self
    }

    /// Adds a field to an input object type.
    #[must_use]
    pub fn input_field(mut self, field: InputValueDefinition) -> Self {
        if let TypeKind::InputObject { fields } = &mut self.kind {
            fields.push(field);
        }
        self
    }

    /// Adds a value to an enum type.
    #[must_use]
    pub fn value(mut self, value: EnumValueDefinition) -> Self {
        if let TypeKind::Enum { values } = &mut self.kind {
            values.push(value);
        }
        self
    }

    /// Adds a member to a union type.
    #[must_use]
    pub fn member(mut self, member: impl Into<String>) -> Self {
        if let TypeKind::Union { members } = &mut self.kind {
            members.push(member.into());
        }
        self
    }

    /// Fields of an object or interface type.
    #[must_use]
    pub fn fields(&self) -> &[FieldDefinition] {
        match &self.kind {
            TypeKind::Object { fields, .. } | TypeKind::Interface { fields } => fields,
            _ => &[],
        }
    }

    /// Every type reference this definition mentions, in declaration order.
    #[must_use]
    pub fn referenced_types(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        match &self.kind {
            TypeKind::Object { fields, implements } => {
                refs.extend(implements.iter().map(String::as_str));
                for field in fields {
                    refs.extend(field.referenced_types());
                }
            }
            TypeKind::Interface { fields } => {
                for field in fields {
                    refs.extend(field.referenced_types());
                }
            }
            TypeKind::InputObject { fields } => {
                refs.extend(fields.iter().map(|f| f.ty.as_str()));
            }
            TypeKind::Union { members } => refs.extend(members.iter().map(String::as_str)),
            TypeKind::Enum { .. } | TypeKind::Scalar => {}
        }
        refs
    }
}

/// A realized definition is its own type provider.
impl ToType for TypeDefinition {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn to_type(&self) -> TypeDefinition {
        self.clone()
    }
}

/// Field resolver.
#[derive(Clone)]
pub enum Resolver {
    Field(ResolverFn),
    Subscription(SubscriptionFn),
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(_) => f.write_str("Resolver::Field"),
            Self::Subscription(_) => f.write_str("Resolver::Subscription"),
        }
    }
}

/// An output field.
#[derive(Clone, Debug)]
pub struct FieldDefinition {
    pub name: String,
    /// Type reference, e.g. `"[Example!]!"`.
    pub ty: String,
    pub description: Option<String>,
    pub deprecation: Option<String>,
    pub args: Vec<InputValueDefinition>,
    /// `None` falls back to the default field resolver.
    pub resolver: Option<Resolver>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            description: None,
            deprecation: None,
            args: Vec::new(),
            resolver: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.deprecation = Some(reason.into());
        self
    }

    #[must_use]
    pub fn argument(mut self, arg: InputValueDefinition) -> Self {
        self.args.push(arg);
        self
    }

    #[must_use]
    pub fn resolve<F>(mut self, resolver: F) -> Self
    where
        F: for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync + 'static,
    {
        self.resolver = Some(Resolver::Field(Arc::new(resolver)));
        self
    }

    #[must_use]
    pub fn subscribe<F>(mut self, resolver: F) -> Self
    where
        F: for<'a> Fn(ResolverContext<'a>) -> SubscriptionFieldFuture<'a> + Send + Sync + 'static,
    {
        self.resolver = Some(Resolver::Subscription(Arc::new(resolver)));
        self
    }

    fn referenced_types(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.ty.as_str()).chain(self.args.iter().map(|a| a.ty.as_str()))
    }
}

/// An argument or input object field.
#[derive(Clone, Debug)]
pub struct InputValueDefinition {
    pub name: String,
    /// Type reference, e.g. `"Int!"`.
    pub ty: String,
    pub description: Option<String>,
    pub default_value: Option<Value>,
}

impl InputValueDefinition {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            description: None,
            default_value: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

#[derive(Clone, Debug)]
pub struct EnumValueDefinition {
    pub name: String,
    pub description: Option<String>,
    pub deprecation: Option<String>,
}

impl EnumValueDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            deprecation: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.deprecation = Some(reason.into());
        self
    }
}
