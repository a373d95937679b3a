use toml::{Table, Value};

use super::ConfigError;

/// A value to merge into the configuration tree at `path`.
///
/// An empty path means `value` is a table merged at the root.
#[derive(Debug, Clone)]
pub struct ConfigEntry {
    pub path: Vec<String>,
    pub value: Value,
}

impl ConfigEntry {
    pub fn root(table: Table) -> Self {
        Self {
            path: Vec::new(),
            value: Value::Table(table),
        }
    }

    pub fn at_path(path: Vec<String>, value: Value) -> Self {
        Self { path, value }
    }
}

/// One layer of the loading pipeline.
pub trait ConfigSource: Send + Sync + std::fmt::Debug {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError>;
}

/// An inline TOML document.
#[derive(Debug, Clone)]
pub struct StrSource {
    origin: String,
    contents: String,
}

impl StrSource {
    /// `origin` names the document in parse errors.
    pub fn new(origin: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            contents: contents.into(),
        }
    }
}

impl ConfigSource for StrSource {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError> {
        parse_document(&self.origin, &self.contents).map(|table| vec![ConfigEntry::root(table)])
    }
}

/// Parses a whole TOML document, naming `origin` on failure.
pub(crate) fn parse_document(origin: &str, contents: &str) -> Result<Table, ConfigError> {
    toml::from_str(contents).map_err(|source| ConfigError::ParseError {
        origin: origin.to_string(),
        source,
    })
}

/// Merges `entry` into `table`.
///
/// Tables merge recursively; any other value replaces what was there.
/// Intermediate path segments that are missing or not tables become tables.
pub fn merge_entry(table: &mut Table, entry: ConfigEntry) {
    let ConfigEntry { path, value } = entry;
    let Some((last, parents)) = path.split_last() else {
        if let Value::Table(overlay) = value {
            deep_merge(table, overlay);
        }
        return;
    };

    let mut current = table;
    for segment in parents {
        if !matches!(current.get(segment), Some(Value::Table(_))) {
            current.insert(segment.clone(), Value::Table(Table::new()));
        }
        current = match current.get_mut(segment) {
            Some(Value::Table(nested)) => nested,
            _ => return,
        };
    }
    merge_value(current, last.clone(), value);
}

fn deep_merge(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        merge_value(base, key, value);
    }
}

fn merge_value(table: &mut Table, key: String, value: Value) {
    match (table.get_mut(&key), value) {
        (Some(Value::Table(base)), Value::Table(overlay)) => deep_merge(base, overlay),
        (_, value) => {
            table.insert(key, value);
        }
    }
}
