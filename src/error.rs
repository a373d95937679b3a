use crate::config::ConfigError;
use crate::registry::RegistryError;
use thiserror::Error;

/// Top-level error type for the dragon-dyncfg library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("type registry error: {0}")]
    Registry(#[from] RegistryError),
}
