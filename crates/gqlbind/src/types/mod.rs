//! Type definitions, string type references and pagination wrappers.
//!
//! - [`TypeDefinition`] / [`FieldDefinition`] - realized types held by the registry
//! - [`ToType`] / [`ToField`] - capabilities of container components
//! - [`TypeReference`] - parser for `"[Post!]!"` style references
//! - [`GraphQLType`] - resolved, possibly wrapped type handle
//! - [`WrapType`] - pagination wrappers

mod definition;
mod pagination;
mod reference;

pub use definition::{
    EnumValueDefinition, FieldDefinition, InputValueDefinition, Resolver, ResolverFn,
    SubscriptionFn, ToField, ToType, TypeDefinition, TypeKind,
};
pub use pagination::{LengthAwarePagination, PaginationType, SimplePagination, WrapType};
pub use reference::{
    BUILTIN_SCALARS, GraphQLType, Modifier, NamedType, TypeReference, builtin_scalar,
};
