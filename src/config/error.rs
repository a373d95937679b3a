use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("required config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config source '{origin}': {source}")]
    ParseError {
        origin: String,
        source: toml::de::Error,
    },

    #[error("failed to deserialize config: {0}")]
    DeserializeError(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("'class_path' is required for configurable object at {path}")]
    MissingTypeIdentifier { path: String },

    #[error("cannot resolve type '{identifier}': {reason}")]
    UnresolvedType {
        identifier: String,
        reason: UnresolvedReason,
    },

    #[error("specialization '{resolved}' at {path} must be a subtype of '{expected}'")]
    NotASubclass {
        path: String,
        resolved: String,
        expected: &'static str,
    },

    #[error("invalid fields for '{type_name}' at {path}: {source}")]
    InvalidElement {
        path: String,
        type_name: &'static str,
        source: toml::de::Error,
    },
}

/// Why a type identifier did not resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReason {
    UnknownNamespace(String),
    UnknownName { namespace: String, name: String },
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNamespace(ns) if ns.is_empty() => {
                f.write_str("no types registered in the top-level namespace")
            }
            Self::UnknownNamespace(ns) => write!(f, "namespace '{ns}' not found"),
            Self::UnknownName { namespace, name } if namespace.is_empty() => {
                write!(f, "'{name}' not found in the top-level namespace")
            }
            Self::UnknownName { namespace, name } => {
                write!(f, "'{name}' not found in namespace '{namespace}'")
            }
        }
    }
}
