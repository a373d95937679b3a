use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RegistryError {
    #[error("type '{0}' is already registered")]
    DuplicateType(&'static str),

    #[error("invalid type name '{0}' (expected 'namespace.Name' or 'Name')")]
    InvalidTypeName(&'static str),
}
