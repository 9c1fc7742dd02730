//! Type and schema registries.

mod schemas;
mod types;

pub use schemas::{SchemaEntry, SchemaRegistry};
pub use types::{TypeDescriptor, TypeRegistry};
