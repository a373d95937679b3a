//! Configuration loading and management.

mod builder;
mod dump;
mod env;
mod error;
mod file;
mod source;

pub use builder::Config;
pub use dump::{to_string, to_value};
pub use env::EnvSource;
pub use error::{ConfigError, UnresolvedReason};
pub use file::FileSource;
pub use source::{ConfigEntry, ConfigSource, StrSource};
