//! Specialization pass over loaded configuration trees.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use toml::{Table, Value};

use crate::config::ConfigError;
use crate::registry::TypeRegistry;

/// Resolves every dynamic element reachable from a value.
///
/// Aggregates walk their fields and hand each one the same [`Specializer`];
/// a field's subtree is fully specialized before the next field is visited.
/// Plain values implement this as a no-op. Use [`specialize_fields!`] for
/// structs.
///
/// [`specialize_fields!`]: crate::specialize_fields
pub trait Specialize {
    fn specialize(&mut self, cx: &mut Specializer<'_>) -> Result<(), ConfigError>;
}

enum Segment {
    Field(&'static str),
    Index(usize),
    Key(String),
}

/// Traversal state: the registry to resolve against and the current field
/// path, used in error messages.
pub struct Specializer<'r> {
    registry: &'r TypeRegistry,
    path: Vec<Segment>,
}

impl<'r> Specializer<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            registry,
            path: Vec::new(),
        }
    }

    pub fn registry(&self) -> &'r TypeRegistry {
        self.registry
    }

    /// Dotted path of the value being specialized, `<root>` at the top.
    pub fn path(&self) -> String {
        if self.path.is_empty() {
            return "<root>".to_string();
        }
        let mut out = String::new();
        for segment in &self.path {
            match segment {
                Segment::Index(index) => out.push_str(&format!("[{index}]")),
                Segment::Field(name) => push_dotted(&mut out, name),
                Segment::Key(key) => push_dotted(&mut out, key),
            }
        }
        out
    }

    /// Runs `f` with `name` appended to the path.
    pub fn field<R>(
        &mut self,
        name: &'static str,
        f: impl FnOnce(&mut Self) -> Result<R, ConfigError>,
    ) -> Result<R, ConfigError> {
        self.scoped(Segment::Field(name), f)
    }

    pub fn index<R>(
        &mut self,
        index: usize,
        f: impl FnOnce(&mut Self) -> Result<R, ConfigError>,
    ) -> Result<R, ConfigError> {
        self.scoped(Segment::Index(index), f)
    }

    pub fn key<R>(
        &mut self,
        key: &dyn fmt::Display,
        f: impl FnOnce(&mut Self) -> Result<R, ConfigError>,
    ) -> Result<R, ConfigError> {
        self.scoped(Segment::Key(key.to_string()), f)
    }

    fn scoped<R>(
        &mut self,
        segment: Segment,
        f: impl FnOnce(&mut Self) -> Result<R, ConfigError>,
    ) -> Result<R, ConfigError> {
        self.path.push(segment);
        let result = f(self);
        self.path.pop();
        result
    }
}

fn push_dotted(out: &mut String, segment: &str) {
    if !out.is_empty() {
        out.push('.');
    }
    out.push_str(segment);
}

/// Deserializes `value` into `T` and specializes every dynamic element in it.
///
/// Either the whole tree is built or an error is returned; no partially
/// specialized document escapes.
pub fn from_value<T>(value: Value, registry: &TypeRegistry) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Specialize,
{
    let mut document: T = value.try_into()?;
    document.specialize(&mut Specializer::new(registry))?;
    Ok(document)
}

/// Implements [`Specialize`] for a struct by walking the listed fields in
/// order.
///
/// ```
/// use dragon_dyncfg::specialize_fields;
///
/// struct Limits {
///     max: u32,
///     labels: Vec<String>,
/// }
///
/// specialize_fields!(Limits { max, labels });
/// ```
///
/// Every field must be listed:
///
/// ```compile_fail
/// use dragon_dyncfg::specialize_fields;
///
/// struct Limits {
///     max: u32,
///     labels: Vec<String>,
/// }
///
/// specialize_fields!(Limits { max });
/// ```
#[macro_export]
macro_rules! specialize_fields {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl $crate::Specialize for $ty {
            #[allow(unused_variables)]
            fn specialize(
                &mut self,
                cx: &mut $crate::Specializer<'_>,
            ) -> ::std::result::Result<(), $crate::ConfigError> {
                let Self { $($field),* } = self;
                $(
                    cx.field(stringify!($field), |cx| {
                        $crate::Specialize::specialize($field, cx)
                    })?;
                )*
                Ok(())
            }
        }
    };
}

macro_rules! plain_values {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Specialize for $ty {
                fn specialize(&mut self, _cx: &mut Specializer<'_>) -> Result<(), ConfigError> {
                    Ok(())
                }
            }
        )*
    };
}

plain_values!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    String, PathBuf, Value, Table, toml::value::Datetime,
);

impl<T: Specialize> Specialize for Option<T> {
    fn specialize(&mut self, cx: &mut Specializer<'_>) -> Result<(), ConfigError> {
        match self {
            Some(inner) => inner.specialize(cx),
            None => Ok(()),
        }
    }
}

impl<T: Specialize> Specialize for Box<T> {
    fn specialize(&mut self, cx: &mut Specializer<'_>) -> Result<(), ConfigError> {
        (**self).specialize(cx)
    }
}

impl<T: Specialize> Specialize for Vec<T> {
    fn specialize(&mut self, cx: &mut Specializer<'_>) -> Result<(), ConfigError> {
        for (index, item) in self.iter_mut().enumerate() {
            cx.index(index, |cx| item.specialize(cx))?;
        }
        Ok(())
    }
}

impl<K: fmt::Display, V: Specialize> Specialize for BTreeMap<K, V> {
    fn specialize(&mut self, cx: &mut Specializer<'_>) -> Result<(), ConfigError> {
        for (key, value) in self.iter_mut() {
            cx.key(key, |cx| value.specialize(cx))?;
        }
        Ok(())
    }
}

/// Entries are visited in key order, so the first failing key is reported.
impl<K: fmt::Display, V: Specialize, S> Specialize for HashMap<K, V, S> {
    fn specialize(&mut self, cx: &mut Specializer<'_>) -> Result<(), ConfigError> {
        let mut entries: Vec<_> = self
            .iter_mut()
            .map(|(key, value)| (key.to_string(), value))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        for (key, value) in entries {
            cx.key(&key, |cx| value.specialize(cx))?;
        }
        Ok(())
    }
}
