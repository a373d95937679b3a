//! Type registry and resolver.
//!
//! Maps qualified type identifiers (`"namespace.Name"`) to the constructors
//! of concrete configuration types. The registry is filled by explicit
//! registration before any document is loaded and is read-only afterwards.

mod error;
pub mod ident;

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use toml::{Table, Value};

pub use error::RegistryError;

use crate::config::{ConfigError, UnresolvedReason};
use crate::dynamic::{Element, Specializer};

/// Type-erased constructor output: a `Box<O>` for the entry's family `O`.
pub(crate) type Constructed = Box<dyn Any + Send + Sync>;

type Constructor =
    Box<dyn Fn(Table, &mut Specializer<'_>) -> Result<Constructed, ConfigError> + Send + Sync>;

/// A registered concrete type.
pub struct TypeEntry {
    name: &'static str,
    parent: Option<&'static str>,
    object: TypeId,
    object_name: &'static str,
    construct: Constructor,
}

impl TypeEntry {
    /// Qualified identifier this type was registered under.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared base type, if any.
    pub fn parent(&self) -> Option<&'static str> {
        self.parent
    }

    /// Name of the trait object type instances are handed out as.
    pub fn object_name(&self) -> &'static str {
        self.object_name
    }

    pub(crate) fn produces<O: ?Sized + 'static>(&self) -> bool {
        self.object == TypeId::of::<O>()
    }

    pub(crate) fn construct(
        &self,
        payload: Table,
        cx: &mut Specializer<'_>,
    ) -> Result<Constructed, ConfigError> {
        (self.construct)(payload, cx)
    }
}

impl fmt::Debug for TypeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeEntry")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("object", &self.object_name)
            .finish_non_exhaustive()
    }
}

/// Registry of constructible configuration types, keyed by namespace.
///
/// ## Example
///
/// ```
/// use dragon_dyncfg::{Base, Element, Instance, TypeRegistry};
/// use serde::{Deserialize, Serialize};
///
/// trait Item: Instance {}
///
/// struct BaseItem;
///
/// impl Base for BaseItem {
///     type Object = dyn Item;
///     const TYPE_NAME: &'static str = "items.BaseItem";
/// }
///
/// #[derive(Debug, Serialize, Deserialize)]
/// struct Item1 {
///     arg1: String,
/// }
///
/// impl Item for Item1 {}
///
/// impl Element for Item1 {
///     const TYPE_NAME: &'static str = "items.Item1";
///     const PARENT: Option<&'static str> = Some("items.BaseItem");
/// }
///
/// dragon_dyncfg::specialize_fields!(Item1 { arg1 });
///
/// let mut registry = TypeRegistry::new();
/// registry.register::<Item1, dyn Item>(|item| item)?;
///
/// assert_eq!(registry.resolve("items.Item1")?.name(), "items.Item1");
/// # Ok::<(), dragon_dyncfg::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct TypeRegistry {
    namespaces: HashMap<&'static str, HashMap<&'static str, TypeEntry>>,
    len: usize,
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` as a member of the family whose instances are `Box<O>`.
    ///
    /// `upcast` converts the concrete value into the family's trait object;
    /// for `O = dyn Trait` the identity closure `|t| t` is enough.
    pub fn register<T, O>(
        &mut self,
        upcast: fn(Box<T>) -> Box<O>,
    ) -> Result<&mut Self, RegistryError>
    where
        T: Element,
        O: ?Sized + Send + Sync + 'static,
    {
        let name = T::TYPE_NAME;
        if !ident::is_valid(name) {
            return Err(RegistryError::InvalidTypeName(name));
        }
        let (namespace, bare) = ident::split(name);
        let types = self.namespaces.entry(namespace).or_default();
        if types.contains_key(bare) {
            return Err(RegistryError::DuplicateType(name));
        }

        types.insert(
            bare,
            TypeEntry {
                name,
                parent: T::PARENT,
                object: TypeId::of::<O>(),
                object_name: std::any::type_name::<O>(),
                construct: Box::new(move |payload: Table, cx: &mut Specializer<'_>| {
                    construct::<T, O>(payload, cx, upcast)
                }),
            },
        );
        self.len += 1;
        tracing::trace!(type_name = name, parent = ?T::PARENT, "registered type");
        Ok(self)
    }

    /// Resolves a qualified identifier to its registered entry.
    ///
    /// A bare name without a `.` is looked up in the top-level namespace.
    pub fn resolve(&self, identifier: &str) -> Result<&TypeEntry, ConfigError> {
        let (namespace, name) = ident::split(identifier);
        let unresolved = |reason| ConfigError::UnresolvedType {
            identifier: identifier.to_string(),
            reason,
        };

        let types = self
            .namespaces
            .get(namespace)
            .ok_or_else(|| unresolved(UnresolvedReason::UnknownNamespace(namespace.to_string())))?;
        let entry = types.get(name).ok_or_else(|| {
            unresolved(UnresolvedReason::UnknownName {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
        })?;

        tracing::trace!(identifier, resolved = entry.name, "resolved type");
        Ok(entry)
    }

    /// Returns true if `entry` is `base` or declares it as an ancestor.
    ///
    /// Ancestors are followed through the declared parents of registered
    /// types; an unregistered ancestor ends the chain after being compared.
    pub fn is_descendant(&self, entry: &TypeEntry, base: &str) -> bool {
        let mut next = Some(entry.name);
        // a parent cycle can visit at most every entry once
        for _ in 0..=self.len {
            let Some(name) = next else {
                return false;
            };
            if name == base {
                return true;
            }
            next = self.lookup(name).and_then(TypeEntry::parent);
        }
        false
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.lookup(identifier).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// All registered identifiers, sorted.
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self
            .namespaces
            .values()
            .flat_map(|types| types.values().map(TypeEntry::name))
            .collect();
        names.sort_unstable();
        names
    }

    fn lookup(&self, identifier: &str) -> Option<&TypeEntry> {
        let (namespace, name) = ident::split(identifier);
        self.namespaces.get(namespace)?.get(name)
    }
}

fn construct<T, O>(
    payload: Table,
    cx: &mut Specializer<'_>,
    upcast: fn(Box<T>) -> Box<O>,
) -> Result<Constructed, ConfigError>
where
    T: Element,
    O: ?Sized + Send + Sync + 'static,
{
    let mut element: T = Value::Table(payload)
        .try_into()
        .map_err(|source| ConfigError::InvalidElement {
            path: cx.path(),
            type_name: T::TYPE_NAME,
            source,
        })?;
    // nested dynamic fields resolve before this one is handed back
    element.specialize(cx)?;
    Ok(Box::new(upcast(Box::new(element))))
}
