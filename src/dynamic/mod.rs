//! Self-specializing configuration nodes.
//!
//! A [`Dynamic<B>`] field is declared against a base `B`, but the document
//! chooses the concrete type through its `class_path` key:
//!
//! ```toml
//! [item]
//! class_path = "items.Item1"
//! arg1 = "x"
//! ```
//!
//! Loading happens in two passes. Deserialization captures the identifier and
//! the remaining keys verbatim ([`Dynamic::Raw`]). Specialization then resolves
//! the identifier, checks it against `B`, and builds the resolved type from
//! the captured keys ([`Dynamic::Specialized`]).

mod specialize;

use std::any::Any;
use std::fmt;

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::ser::{self, Serializer};
use serde::{Deserialize, Serialize};
use toml::{Table, Value};

pub use specialize::{from_value, Specialize, Specializer};

use crate::config::ConfigError;

/// Document key holding the type identifier of a dynamic element.
pub const TYPE_KEY: &str = "class_path";

/// Object-safe view of a constructed configuration instance.
///
/// Family traits extend this so their trait objects can be inspected and
/// re-serialized. Implemented for every serializable type.
pub trait Instance: Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;

    /// Serializes the instance's own fields.
    fn to_value(&self) -> Result<Value, toml::ser::Error>;
}

impl<T> Instance for T
where
    T: Serialize + Any + Send + Sync + fmt::Debug,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn to_value(&self) -> Result<Value, toml::ser::Error> {
        Value::try_from(self)
    }
}

/// Static base type of a dynamic position.
///
/// Elements resolved at a `Dynamic<B>` position must be registered as
/// producing `B::Object` and must be `B::TYPE_NAME` or declare it as an
/// ancestor.
pub trait Base: 'static {
    /// Trait object instances are handed out as.
    type Object: ?Sized + Instance;

    /// Qualified identifier of the base.
    const TYPE_NAME: &'static str;
}

/// A concrete type that can be named by a `class_path`.
pub trait Element:
    Serialize + DeserializeOwned + Specialize + fmt::Debug + Send + Sync + 'static
{
    /// Qualified identifier, `"namespace.Name"` or a bare `"Name"`.
    const TYPE_NAME: &'static str;

    /// Identifier of the type this one specializes.
    const PARENT: Option<&'static str> = None;
}

/// Captured fields of a dynamic element that has not been resolved yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawElement {
    type_path: Option<String>,
    payload: Table,
}

impl RawElement {
    pub fn new(type_path: Option<String>, payload: Table) -> Self {
        Self { type_path, payload }
    }

    /// The `class_path` from the document, if one was given.
    pub fn type_path(&self) -> Option<&str> {
        self.type_path.as_deref()
    }

    /// Every captured key except `class_path`.
    pub fn payload(&self) -> &Table {
        &self.payload
    }

    fn specialize<B: Base>(&self, cx: &mut Specializer<'_>) -> Result<Specialized<B>, ConfigError> {
        let identifier = self
            .type_path()
            .ok_or_else(|| ConfigError::MissingTypeIdentifier { path: cx.path() })?;

        let registry = cx.registry();
        let entry = registry.resolve(identifier)?;
        let not_a_subclass = |cx: &Specializer<'_>| ConfigError::NotASubclass {
            path: cx.path(),
            resolved: entry.name().to_string(),
            expected: B::TYPE_NAME,
        };
        if !entry.produces::<B::Object>() || !registry.is_descendant(entry, B::TYPE_NAME) {
            return Err(not_a_subclass(&*cx));
        }

        let object = entry
            .construct(self.payload.clone(), cx)?
            .downcast::<Box<B::Object>>()
            .map_err(|_| not_a_subclass(&*cx))?;

        tracing::debug!(path = %cx.path(), type_name = entry.name(), "specialized element");
        Ok(Specialized {
            type_name: entry.name(),
            object: *object,
        })
    }
}

impl<'de> Deserialize<'de> for RawElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut payload = Table::deserialize(deserializer)?;
        let type_path = match payload.remove(TYPE_KEY) {
            None => None,
            Some(Value::String(path)) => Some(path),
            Some(other) => {
                return Err(de::Error::custom(format!(
                    "'{TYPE_KEY}' must be a string, found {}",
                    other.type_str()
                )))
            }
        };
        Ok(Self { type_path, payload })
    }
}

/// A resolved dynamic element.
pub struct Specialized<B: Base> {
    type_name: &'static str,
    object: Box<B::Object>,
}

impl<B: Base> fmt::Debug for Specialized<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Specialized")
            .field("type_name", &self.type_name)
            .field("object", &&*self.object)
            .finish()
    }
}

/// A configuration node whose concrete type is chosen by the document.
pub enum Dynamic<B: Base> {
    Raw(RawElement),
    Specialized(Specialized<B>),
}

impl<B: Base> Dynamic<B> {
    pub fn is_specialized(&self) -> bool {
        matches!(self, Self::Specialized(_))
    }

    /// Qualified identifier of the resolved type.
    pub fn type_name(&self) -> Option<&'static str> {
        match self {
            Self::Specialized(s) => Some(s.type_name),
            Self::Raw(_) => None,
        }
    }

    /// The resolved instance.
    pub fn get(&self) -> Option<&B::Object> {
        match self {
            Self::Specialized(s) => Some(&*s.object),
            Self::Raw(_) => None,
        }
    }

    pub fn into_inner(self) -> Option<Box<B::Object>> {
        match self {
            Self::Specialized(s) => Some(s.object),
            Self::Raw(_) => None,
        }
    }

    pub fn raw(&self) -> Option<&RawElement> {
        match self {
            Self::Raw(raw) => Some(raw),
            Self::Specialized(_) => None,
        }
    }

    /// Returns true if the resolved instance is exactly a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.get()?.as_any().downcast_ref()
    }
}

impl<B: Base> From<RawElement> for Dynamic<B> {
    fn from(raw: RawElement) -> Self {
        Self::Raw(raw)
    }
}

impl<B: Base> fmt::Debug for Dynamic<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw(raw) => f.debug_tuple("Raw").field(raw).finish(),
            Self::Specialized(s) => f.debug_tuple("Specialized").field(s).finish(),
        }
    }
}

impl<B: Base> Specialize for Dynamic<B> {
    fn specialize(&mut self, cx: &mut Specializer<'_>) -> Result<(), ConfigError> {
        let Self::Raw(raw) = self else {
            return Ok(());
        };
        *self = Self::Specialized(raw.specialize::<B>(cx)?);
        Ok(())
    }
}

impl<'de, B: Base> Deserialize<'de> for Dynamic<B> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawElement::deserialize(deserializer).map(Self::Raw)
    }
}

/// Writes only the resolved type's own fields. Unresolved elements refuse to
/// serialize.
impl<B: Base> Serialize for Dynamic<B> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Specialized(s) => {
                let object: &B::Object = &s.object;
                object
                    .to_value()
                    .map_err(ser::Error::custom)?
                    .serialize(serializer)
            }
            Self::Raw(raw) => Err(ser::Error::custom(format!(
                "element '{}' has not been specialized",
                raw.type_path().unwrap_or("<missing class_path>")
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{registry, BaseItem, Item1, Item2, Wrapper};
    use crate::TypeRegistry;

    fn raw(doc: &str) -> Dynamic<BaseItem> {
        toml::from_str(doc).unwrap()
    }

    fn specialize<B: Base>(element: &mut Dynamic<B>, registry: &TypeRegistry) -> Result<(), ConfigError> {
        element.specialize(&mut Specializer::new(registry))
    }

    #[test]
    fn test_capture_moves_fields_into_payload() {
        let element = raw(
            r#"
            class_path = "items.Item2"
            arg1 = "a"
            arg2 = "b"
            "#,
        );
        let raw = element.raw().unwrap();
        assert_eq!(raw.type_path(), Some("items.Item2"));
        assert_eq!(raw.payload().len(), 2);
        assert!(!raw.payload().contains_key(TYPE_KEY));
        assert!(!element.is_specialized());
    }

    #[test]
    fn test_capture_does_not_validate_payload() {
        let element = raw(
            r#"
            class_path = "items.Item1"
            unknown = [1, 2, 3]
            "#,
        );
        assert_eq!(element.raw().unwrap().payload()["unknown"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_capture_rejects_non_string_type_path() {
        let result: Result<Dynamic<BaseItem>, _> = toml::from_str("class_path = 42");
        assert!(result.is_err());
    }

    #[test]
    fn test_specialize_to_exact_type() {
        let registry = registry();
        let mut element = raw(
            r#"
            class_path = "items.Item2"
            arg1 = "a"
            arg2 = "b"
            "#,
        );
        specialize(&mut element, &registry).unwrap();

        assert_eq!(element.type_name(), Some("items.Item2"));
        assert!(element.is::<Item2>());
        assert!(!element.is::<Item1>());
        assert_eq!(element.get().unwrap().run(), vec!["a", "b"]);
        assert!(element.raw().is_none());
    }

    #[test]
    fn test_specialize_missing_type_path() {
        let registry = registry();
        let mut element = raw(r#"arg1 = "a""#);
        let err = specialize(&mut element, &registry).unwrap_err();
        assert!(matches!(err, ConfigError::MissingTypeIdentifier { .. }));
    }

    #[test]
    fn test_specialize_unresolved() {
        let registry = registry();
        let mut element = raw(r#"class_path = "items.Missing""#);
        let err = specialize(&mut element, &registry).unwrap_err();
        assert!(matches!(err, ConfigError::UnresolvedType { .. }));
    }

    #[test]
    fn test_failed_specialize_keeps_raw_element() {
        let mut element = raw(
            r#"
            class_path = "items.Item1"
            arg1 = "a"
            "#,
        );
        let before = element.raw().unwrap().clone();

        let err = specialize(&mut element, &TypeRegistry::new()).unwrap_err();
        assert!(matches!(err, ConfigError::UnresolvedType { .. }));
        assert_eq!(element.raw(), Some(&before));

        specialize(&mut element, &registry()).unwrap();
        assert_eq!(element.downcast_ref::<Item1>().unwrap().arg1, "a");
    }

    #[test]
    fn test_sibling_type_is_not_a_subclass() {
        let registry = registry();
        // same fields as Item1 but not derived from the base
        let mut element = raw(
            r#"
            class_path = "items.ItemX"
            arg1 = "a"
            "#,
        );
        let err = specialize(&mut element, &registry).unwrap_err();
        match err {
            ConfigError::NotASubclass {
                resolved, expected, ..
            } => {
                assert_eq!(resolved, "items.ItemX");
                assert_eq!(expected, "items.BaseItem");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_other_family_is_not_a_subclass() {
        let registry = registry();
        let mut element = raw(r#"class_path = "sinks.Console""#);
        let err = specialize(&mut element, &registry).unwrap_err();
        assert!(matches!(err, ConfigError::NotASubclass { .. }));
    }

    #[test]
    fn test_base_type_narrower_than_resolved() {
        let registry = registry();
        let mut element: Dynamic<Item1> = toml::from_str(
            r#"
            class_path = "items.Item2"
            arg1 = "a"
            arg2 = "b"
            "#,
        )
        .unwrap();
        specialize(&mut element, &registry).unwrap();
        assert!(element.is::<Item2>());

        let mut element: Dynamic<Item1> = toml::from_str(
            r#"
            class_path = "items.Wrapper"
            name = "w"
            [inner]
            class_path = "items.Item1"
            arg1 = "a"
            "#,
        )
        .unwrap();
        let err = specialize(&mut element, &registry).unwrap_err();
        assert!(matches!(err, ConfigError::NotASubclass { expected: "items.Item1", .. }));
    }

    #[test]
    fn test_invalid_payload_for_resolved_type() {
        let registry = registry();
        let mut element = raw(
            r#"
            class_path = "items.Item2"
            arg1 = "a"
            "#,
        );
        let err = specialize(&mut element, &registry).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidElement {
                type_name: "items.Item2",
                ..
            }
        ));
    }

    #[test]
    fn test_nested_element_specializes_first() {
        let registry = registry();
        let mut element = raw(
            r#"
            class_path = "items.Wrapper"
            name = "outer"
            [inner]
            class_path = "items.Item1"
            arg1 = "a"
            "#,
        );
        specialize(&mut element, &registry).unwrap();

        let wrapper = element.downcast_ref::<Wrapper>().unwrap();
        assert!(wrapper.inner.is::<Item1>());
        assert_eq!(element.get().unwrap().run(), vec!["outer", "a"]);
    }

    #[test]
    fn test_nested_missing_type_path_reports_path() {
        let registry = registry();
        let mut element = raw(
            r#"
            class_path = "items.Wrapper"
            name = "outer"
            [inner]
            arg1 = "a"
            "#,
        );
        let err = specialize(&mut element, &registry).unwrap_err();
        match err {
            ConfigError::MissingTypeIdentifier { path } => assert_eq!(path, "inner"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_specialize_twice_is_noop() {
        let registry = registry();
        let mut element = raw(
            r#"
            class_path = "items.Item1"
            arg1 = "a"
            "#,
        );
        specialize(&mut element, &registry).unwrap();
        specialize(&mut element, &TypeRegistry::new()).unwrap();
        assert!(element.is::<Item1>());
    }

    #[test]
    fn test_serialize_omits_bookkeeping() {
        let registry = registry();
        let mut element = raw(
            r#"
            class_path = "items.Item2"
            arg1 = "a"
            arg2 = "b"
            "#,
        );
        specialize(&mut element, &registry).unwrap();

        let value = Value::try_from(&element).unwrap();
        let table = value.as_table().unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table["arg1"].as_str(), Some("a"));
        assert_eq!(table["arg2"].as_str(), Some("b"));
        assert!(!table.contains_key(TYPE_KEY));
    }

    #[test]
    fn test_serialize_raw_fails() {
        let element = raw(r#"class_path = "items.Item1""#);
        assert!(Value::try_from(&element).is_err());
    }
}
