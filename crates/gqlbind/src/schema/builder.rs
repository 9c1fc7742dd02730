//! Schema assembly.
//!
//! Turns a [`SchemaConfig`] into an `async_graphql::dynamic::Schema`:
//!
//! 1. member types listed in the config are registered with the type registry
//! 2. root field maps are resolved to field definitions, and `Mutation` /
//!    `Subscription` are left out when their maps are empty
//! 3. every registered type is collected, along with whatever the roots and
//!    collected types reference; lazy loading only orders the reachable
//!    types first
//! 4. each definition is converted to its dynamic counterpart and the engine
//!    finishes the schema
//!
//! Type instances are taken from the registry cache, so a type referenced
//! from several fields is realized once per build.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use async_graphql::dynamic::{
    Enum, EnumItem, Field, InputObject, InputValue, Interface, InterfaceField, Object, Scalar,
    Schema, SchemaBuilder, Subscription, SubscriptionField, TypeRef, Union,
};
use indexmap::IndexMap;
use tracing::{debug, trace};

use super::config::{FieldDescriptor, FieldMap, SchemaConfig};
use crate::container::Container;
use crate::error::GraphQLError;
use crate::registry::TypeRegistry;
use crate::resolvers::default_field_resolver;
use crate::types::{
    FieldDefinition, InputValueDefinition, Resolver, TypeDefinition, TypeKind, TypeReference,
    builtin_scalar,
};

pub const QUERY_ROOT: &str = "Query";
pub const MUTATION_ROOT: &str = "Mutation";
pub const SUBSCRIPTION_ROOT: &str = "Subscription";

/// Resolves a field map to definitions named after their keys.
///
/// # Errors
///
/// Fails if a `Class` descriptor is not bound to a field component.
pub fn resolve_fields(
    container: &Container,
    fields: &FieldMap,
) -> Result<Vec<FieldDefinition>, GraphQLError> {
    fields
        .iter()
        .map(|(name, descriptor)| {
            let mut field = match descriptor {
                FieldDescriptor::Class(id) => container.make_field(id)?.to_field(name),
                FieldDescriptor::Provider(provider) => provider.to_field(name),
                FieldDescriptor::Definition(def) => def.clone(),
            };
            field.name.clone_from(name);
            Ok(field)
        })
        .collect()
}

/// Assembles engine schemas from structured configs.
pub struct SchemaAssembler<'a> {
    registry: &'a TypeRegistry,
    container: &'a Container,
}

impl<'a> SchemaAssembler<'a> {
    #[must_use]
    pub fn new(registry: &'a TypeRegistry, container: &'a Container) -> Self {
        Self {
            registry,
            container,
        }
    }

    /// Builds a schema.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::TypeNotFound` for unresolvable type references
    /// and `GraphQLError::SchemaBuildFailed` if the engine rejects the result.
    pub fn build(&self, config: &SchemaConfig) -> Result<Schema, GraphQLError> {
        debug!(
            query = config.query.len(),
            mutation = config.mutation.len(),
            subscription = config.subscription.len(),
            types = config.types.len(),
            "Assembling GraphQL schema"
        );

        for (name, descriptor) in &config.types {
            self.registry.register(name.as_deref(), descriptor.clone())?;
        }

        let query = self.root(QUERY_ROOT, &config.query)?;
        let mutation = if config.mutation.is_empty() {
            None
        } else {
            Some(self.root(MUTATION_ROOT, &config.mutation)?)
        };
        let subscription = if config.subscription.is_empty() {
            None
        } else {
            Some(self.root(SUBSCRIPTION_ROOT, &config.subscription)?)
        };

        let mut roots = vec![&query];
        roots.extend(mutation.as_ref());
        roots.extend(subscription.as_ref());
        let members = self.collect_types(&roots)?;

        let mut builder = Schema::build(
            QUERY_ROOT,
            mutation.as_ref().map(|_| MUTATION_ROOT),
            subscription.as_ref().map(|_| SUBSCRIPTION_ROOT),
        );
        builder = self.register(builder, &query)?;
        if let Some(mutation) = &mutation {
            builder = self.register(builder, mutation)?;
        }
        if let Some(subscription) = &subscription {
            builder = builder.register(self.subscription(subscription)?);
        }
        for def in members.values() {
            builder = self.register(builder, def)?;
        }

        let schema = builder
            .finish()
            .map_err(|e| GraphQLError::SchemaBuildFailed(e.to_string()))?;
        debug!(types = members.len(), "GraphQL schema assembled");
        Ok(schema)
    }

    fn root(&self, name: &str, fields: &FieldMap) -> Result<TypeDefinition, GraphQLError> {
        let fields = resolve_fields(self.container, fields)?;
        Ok(fields
            .into_iter()
            .fold(TypeDefinition::object(name), TypeDefinition::field))
    }

    /// Collects every registered type plus everything referenced from the
    /// roots and from collected types.
    ///
    /// With lazy loading on, the types reachable from the roots are realized
    /// first and the remaining registered types after them; otherwise every
    /// registered type is realized up front.
    fn collect_types(
        &self,
        roots: &[&TypeDefinition],
    ) -> Result<IndexMap<String, Arc<TypeDefinition>>, GraphQLError> {
        let reachable = roots
            .iter()
            .flat_map(|root| root.referenced_types())
            .map(|reference| TypeReference::parse(reference).base);
        let registered = self.registry.names();

        let mut pending: VecDeque<String> = if self.registry.lazyload() {
            reachable.chain(registered).collect()
        } else {
            registered.into_iter().chain(reachable).collect()
        };

        let root_names: HashSet<&str> = roots.iter().map(|root| root.name.as_str()).collect();
        let mut seen = HashSet::new();
        let mut collected = IndexMap::new();

        while let Some(name) = pending.pop_front() {
            if builtin_scalar(&name).is_some()
                || root_names.contains(name.as_str())
                || !seen.insert(name.clone())
            {
                continue;
            }
            let def = self.registry.definition(&name, false)?;
            trace!(name = %name, kind = def.kind.label(), "Collected schema type");
            pending.extend(
                def.referenced_types()
                    .into_iter()
                    .map(|reference| TypeReference::parse(reference).base),
            );
            collected.entry(def.name.clone()).or_insert(def);
        }

        Ok(collected)
    }

    fn register(
        &self,
        builder: SchemaBuilder,
        def: &TypeDefinition,
    ) -> Result<SchemaBuilder, GraphQLError> {
        let builder = match &def.kind {
            TypeKind::Object { fields, implements } => {
                let mut object = Object::new(&def.name);
                if let Some(description) = &def.description {
                    object = object.description(description);
                }
                for interface in implements {
                    object = object.implement(interface);
                }
                for field in fields {
                    object = object.field(self.field(field)?);
                }
                builder.register(object)
            }
            TypeKind::Interface { fields } => {
                let mut interface = Interface::new(&def.name);
                if let Some(description) = &def.description {
                    interface = interface.description(description);
                }
                for field in fields {
                    let mut iface_field = InterfaceField::new(&field.name, self.type_ref(&field.ty)?);
                    if let Some(description) = &field.description {
                        iface_field = iface_field.description(description);
                    }
                    for arg in &field.args {
                        iface_field = iface_field.argument(self.input_value(arg)?);
                    }
                    interface = interface.field(iface_field);
                }
                builder.register(interface)
            }
            TypeKind::InputObject { fields } => {
                let mut input = InputObject::new(&def.name);
                if let Some(description) = &def.description {
                    input = input.description(description);
                }
                for field in fields {
                    input = input.field(self.input_value(field)?);
                }
                builder.register(input)
            }
            TypeKind::Enum { values } => {
                let mut enumeration = Enum::new(&def.name);
                if let Some(description) = &def.description {
                    enumeration = enumeration.description(description);
                }
                for value in values {
                    let mut item = EnumItem::new(&value.name);
                    if let Some(description) = &value.description {
                        item = item.description(description);
                    }
                    if let Some(reason) = &value.deprecation {
                        item = item.deprecation(Some(reason.as_str()));
                    }
                    enumeration = enumeration.item(item);
                }
                builder.register(enumeration)
            }
            TypeKind::Scalar => {
                let mut scalar = Scalar::new(&def.name);
                if let Some(description) = &def.description {
                    scalar = scalar.description(description);
                }
                builder.register(scalar)
            }
            TypeKind::Union { members } => {
                let mut union = Union::new(&def.name);
                if let Some(description) = &def.description {
                    union = union.description(description);
                }
                for member in members {
                    union = union.possible_type(member);
                }
                builder.register(union)
            }
        };
        Ok(builder)
    }

    fn subscription(&self, def: &TypeDefinition) -> Result<Subscription, GraphQLError> {
        let mut subscription = Subscription::new(&def.name);
        for field in def.fields() {
            let ty = self.type_ref(&field.ty)?;
            let Some(Resolver::Subscription(resolver)) = &field.resolver else {
                return Err(GraphQLError::SchemaBuildFailed(format!(
                    "Subscription field {} has no stream resolver",
                    field.name
                )));
            };
            let resolver = Arc::clone(resolver);
            let mut sub_field = SubscriptionField::new(&field.name, ty, move |ctx| resolver(ctx));
            if let Some(description) = &field.description {
                sub_field = sub_field.description(description);
            }
            for arg in &field.args {
                sub_field = sub_field.argument(self.input_value(arg)?);
            }
            subscription = subscription.field(sub_field);
        }
        Ok(subscription)
    }

    fn field(&self, field: &FieldDefinition) -> Result<Field, GraphQLError> {
        let ty = self.type_ref(&field.ty)?;
        let mut out = match &field.resolver {
            Some(Resolver::Field(resolver)) => {
                let resolver = Arc::clone(resolver);
                Field::new(&field.name, ty, move |ctx| resolver(ctx))
            }
            Some(Resolver::Subscription(_)) => {
                return Err(GraphQLError::SchemaBuildFailed(format!(
                    "Field {} declares a stream resolver outside the subscription root",
                    field.name
                )));
            }
            None => Field::new(&field.name, ty, default_field_resolver),
        };
        if let Some(description) = &field.description {
            out = out.description(description);
        }
        if let Some(reason) = &field.deprecation {
            out = out.deprecation(Some(reason.as_str()));
        }
        for arg in &field.args {
            out = out.argument(self.input_value(arg)?);
        }
        Ok(out)
    }

    fn input_value(&self, value: &InputValueDefinition) -> Result<InputValue, GraphQLError> {
        let mut input = InputValue::new(&value.name, self.type_ref(&value.ty)?);
        if let Some(description) = &value.description {
            input = input.description(description);
        }
        if let Some(default) = &value.default_value {
            input = input.default_value(default.clone());
        }
        Ok(input)
    }

    fn type_ref(&self, reference: &str) -> Result<TypeRef, GraphQLError> {
        Ok(self.registry.resolve(reference, false)?.to_type_ref())
    }
}
