use toml::{Table, Value};

use super::source::{ConfigEntry, ConfigSource};
use super::ConfigError;

/// Environment variable overrides.
///
/// `PREFIX<sep>ITEM<sep>ARG1=x` sets `item.arg1 = "x"`. Path segments are
/// lowercased. Values are read as TOML literals (`8080`, `true`, `1.5`,
/// `[1, 2]`, `{ a = 1 }`) and fall back to a plain string.
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
    separator: String,
}

impl EnvSource {
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        let separator = separator.into();
        assert!(!separator.is_empty(), "separator must not be empty");
        Self {
            prefix: prefix.into(),
            separator,
        }
    }

    fn entries_from(&self, vars: impl IntoIterator<Item = (String, String)>) -> Vec<ConfigEntry> {
        let prefix = format!("{}{}", self.prefix, self.separator);
        vars.into_iter()
            .filter_map(|(key, raw)| {
                let rest = key.strip_prefix(&prefix)?;
                let path: Vec<String> = rest
                    .split(self.separator.as_str())
                    .map(str::to_lowercase)
                    .collect();
                if path.iter().any(String::is_empty) {
                    return None;
                }
                Some(ConfigEntry::at_path(path, parse_value(&raw)))
            })
            .collect()
    }
}

impl ConfigSource for EnvSource {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError> {
        let entries = self.entries_from(std::env::vars());
        tracing::debug!(prefix = %self.prefix, count = entries.len(), "loaded env overrides");
        Ok(entries)
    }
}

fn parse_value(raw: &str) -> Value {
    toml::from_str::<Table>(&format!("v = {raw}"))
        .ok()
        .filter(|table| table.len() == 1)
        .and_then(|mut table| table.remove("v"))
        .unwrap_or_else(|| Value::String(raw.to_string()))
}
