//! TOML file layers.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::source::{parse_document, ConfigEntry, ConfigSource};
use super::ConfigError;

/// One TOML file, merged at the root of the document.
///
/// A missing optional file contributes nothing. A missing required file is
/// [`ConfigError::FileNotFound`]; parse errors name the file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    required: bool,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>, required: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            required,
        }
    }

    fn read(&self) -> Result<Option<String>, ConfigError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound && !self.required => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(ConfigError::FileNotFound(self.path.clone()))
            }
            Err(source) => Err(ConfigError::ReadError {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

impl ConfigSource for FileSource {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError> {
        let path = self.path.display();
        let Some(contents) = self.read()? else {
            tracing::debug!(%path, "optional config file missing");
            return Ok(vec![]);
        };
        let table = parse_document(&path.to_string(), &contents)?;
        tracing::debug!(%path, keys = table.len(), "loaded config file");
        Ok(vec![ConfigEntry::root(table)])
    }
}
