//! Schema configuration and assembly.

mod builder;
mod config;
mod object;

pub use builder::{MUTATION_ROOT, QUERY_ROOT, SUBSCRIPTION_ROOT, SchemaAssembler, resolve_fields};
pub use config::{FieldDescriptor, FieldMap, SchemaConfig, SchemaSource, ToConfig};
pub use object::{ObjectSource, TypeOverrides, object_type};
