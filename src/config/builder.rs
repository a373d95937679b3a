use std::path::Path;

use serde::de::DeserializeOwned;
use toml::{Table, Value};

use super::env::EnvSource;
use super::file::FileSource;
use super::source::{merge_entry, ConfigSource, StrSource};
use super::ConfigError;
use crate::dynamic::{from_value, Specialize};
use crate::registry::TypeRegistry;

/// Builder for loading a configuration document with dynamic elements.
///
/// Sources are merged in registration order, with later sources overriding
/// earlier ones. Nested tables are merged recursively; other values
/// (including arrays) are replaced entirely. The merged tree is then
/// deserialized and every [`Dynamic`](crate::Dynamic) element in it is
/// specialized against the given registry.
///
/// ## Example
///
/// ```no_run
/// use dragon_dyncfg::{specialize_fields, Base, Config, Dynamic, Instance, TypeRegistry};
/// use serde::Deserialize;
///
/// trait Stage: Instance {}
///
/// struct AnyStage;
///
/// impl Base for AnyStage {
///     type Object = dyn Stage;
///     const TYPE_NAME: &'static str = "stages.Stage";
/// }
///
/// #[derive(Deserialize)]
/// struct Pipeline {
///     name: String,
///     stages: Vec<Dynamic<AnyStage>>,
/// }
///
/// specialize_fields!(Pipeline { name, stages });
///
/// let registry = TypeRegistry::new();
/// let pipeline: Pipeline = Config::builder()
///     .with_file("config/default.toml", true)
///     .with_env("MYAPP", "__")
///     .with_file("config/local.toml", false)
///     .build(&registry)?;
/// # Ok::<(), dragon_dyncfg::ConfigError>(())
/// ```
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct Config {
    sources: Vec<Box<dyn ConfigSource>>,
}

impl Config {
    /// Creates a new configuration builder.
    pub fn builder() -> Self {
        Self::default()
    }

    /// Adds a TOML file to be loaded.
    ///
    /// If `required` is `true`, the build will fail if the file doesn't exist.
    /// Optional files that are missing are silently skipped.
    pub fn with_file(self, path: impl AsRef<Path>, required: bool) -> Self {
        self.with_source(FileSource::new(path, required))
    }

    /// Adds an inline TOML document.
    pub fn with_str(self, contents: impl Into<String>) -> Self {
        let origin = format!("<inline #{}>", self.sources.len());
        self.with_source(StrSource::new(origin, contents))
    }

    /// Loads overrides from environment variables with the given prefix.
    ///
    /// Variables address tables by key, so they can also retarget a dynamic
    /// element before it is resolved: `MYAPP__SINK__CLASS_PATH=sinks.File`.
    /// Array elements cannot be addressed.
    pub fn with_env(self, prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        self.with_source(EnvSource::new(prefix, separator))
    }

    pub fn with_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Loads and merges every source without deserializing.
    pub fn merged(self) -> Result<Table, ConfigError> {
        let mut merged = Table::new();
        for source in &self.sources {
            for entry in source.entries()? {
                merge_entry(&mut merged, entry);
            }
        }
        Ok(merged)
    }

    /// Builds the configuration: load, merge, deserialize, specialize.
    pub fn build<T>(self, registry: &TypeRegistry) -> Result<T, ConfigError>
    where
        T: DeserializeOwned + Specialize,
    {
        let merged = self.merged()?;
        from_value(Value::Table(merged), registry)
    }
}
