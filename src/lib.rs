//! Load-time type selection for configuration documents.
//!
//! A field declared as [`Dynamic<B>`] names its concrete type in the document
//! (`class_path = "namespace.Type"`). Loading captures the raw fields, resolves
//! the name through a [`TypeRegistry`], checks it against the base `B` and
//! rebuilds the node as the resolved type, recursively through fields,
//! sequences and maps.

pub mod config;
pub mod dynamic;
mod error;
pub mod registry;

#[cfg(test)]
mod testing;

pub use config::{Config, ConfigError};
pub use dynamic::{
    from_value, Base, Dynamic, Element, Instance, RawElement, Specialize, Specialized, Specializer,
    TYPE_KEY,
};
pub use error::Error;
pub use registry::{RegistryError, TypeEntry, TypeRegistry};
