//! String type references.
//!
//! A reference such as `"[Post!]!"` is split into a base type name and an
//! ordered modifier stack. Parsing repeatedly strips a trailing `!` or an
//! enclosing `[...]`, prepending the matching modifier each time, so the
//! modifier found on the outside of the string ends up last and is applied
//! last:
//!
//! ```text
//! "[Example!]!"  ->  base "Example", [NonNull, ListOf, NonNull]
//!                ->  NonNull(ListOf(NonNull(Example)))
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use async_graphql::dynamic::TypeRef;

use super::definition::TypeDefinition;

/// Scalars provided by the engine itself.
pub const BUILTIN_SCALARS: [&str; 5] = [
    TypeRef::INT,
    TypeRef::FLOAT,
    TypeRef::STRING,
    TypeRef::BOOLEAN,
    TypeRef::ID,
];

/// Returns the built-in scalar with the given name.
#[must_use]
pub fn builtin_scalar(name: &str) -> Option<&'static str> {
    BUILTIN_SCALARS.iter().copied().find(|s| *s == name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    NonNull,
    ListOf,
}

/// A parsed type reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeReference {
    pub base: String,
    pub modifiers: Vec<Modifier>,
}

impl TypeReference {
    #[must_use]
    pub fn parse(reference: &str) -> Self {
        let mut name = reference;
        let mut modifiers = VecDeque::new();

        loop {
            if let Some(inner) = name.strip_suffix('!').filter(|s| !s.is_empty()) {
                name = inner;
                modifiers.push_front(Modifier::NonNull);
            } else if let Some(inner) = name
                .strip_prefix('[')
                .and_then(|s| s.strip_suffix(']'))
                .filter(|s| !s.is_empty())
            {
                name = inner;
                modifiers.push_front(Modifier::ListOf);
            } else {
                break;
            }
        }

        Self {
            base: name.to_string(),
            modifiers: modifiers.into(),
        }
    }

    /// Wraps a resolved base type with the modifiers, in order.
    #[must_use]
    pub fn apply(&self, base: GraphQLType) -> GraphQLType {
        self.modifiers
            .iter()
            .fold(base, |ty, modifier| match modifier {
                Modifier::NonNull => GraphQLType::non_null(ty),
                Modifier::ListOf => GraphQLType::list(ty),
            })
    }
}

/// A resolved named type.
#[derive(Clone, Debug)]
pub enum NamedType {
    Builtin(&'static str),
    Defined(Arc<TypeDefinition>),
}

impl NamedType {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Builtin(name) => name,
            Self::Defined(def) => &def.name,
        }
    }
}

/// Instances compare by identity, built-ins by name.
impl PartialEq for NamedType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Builtin(a), Self::Builtin(b)) => a == b,
            (Self::Defined(a), Self::Defined(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Handle to a resolved type, possibly wrapped.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphQLType {
    Named(NamedType),
    List(Box<GraphQLType>),
    NonNull(Box<GraphQLType>),
}

impl GraphQLType {
    #[must_use]
    pub fn list(inner: GraphQLType) -> Self {
        Self::List(Box::new(inner))
    }

    #[must_use]
    pub fn non_null(inner: GraphQLType) -> Self {
        Self::NonNull(Box::new(inner))
    }

    /// The innermost named type.
    #[must_use]
    pub fn named(&self) -> &NamedType {
        match self {
            Self::Named(named) => named,
            Self::List(inner) | Self::NonNull(inner) => inner.named(),
        }
    }

    /// The realized definition behind this handle, if it is not a built-in.
    #[must_use]
    pub fn definition(&self) -> Option<&Arc<TypeDefinition>> {
        match self.named() {
            NamedType::Defined(def) => Some(def),
            NamedType::Builtin(_) => None,
        }
    }

    #[must_use]
    pub fn to_type_ref(&self) -> TypeRef {
        match self {
            Self::Named(named) => TypeRef::named(named.name().to_string()),
            Self::List(inner) => TypeRef::List(Box::new(inner.to_type_ref())),
            Self::NonNull(inner) => TypeRef::NonNull(Box::new(inner.to_type_ref())),
        }
    }
}

impl fmt::Display for GraphQLType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(named) => f.write_str(named.name()),
            Self::List(inner) => write!(f, "[{inner}]"),
            Self::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}
