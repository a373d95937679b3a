//! Re-serialization of loaded configurations.
//!
//! A specialized tree writes only the fields each resolved type declares;
//! `class_path` and captured payloads are gone after specialization.

use serde::Serialize;
use toml::Value;

use super::ConfigError;

pub fn to_value<T: Serialize + ?Sized>(config: &T) -> Result<Value, ConfigError> {
    Ok(Value::try_from(config)?)
}

/// Renders the configuration as a TOML document.
pub fn to_string<T: Serialize + ?Sized>(config: &T) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(config)?)
}
