//! Qualified type identifiers.

/// Namespace that bare identifiers (no `.`) belong to.
pub const TOP_LEVEL: &str = "";

/// Splits `"pkg.module.Name"` into `("pkg.module", "Name")`.
///
/// The split happens at the last `.`; a bare `"Name"` lands in [`TOP_LEVEL`].
pub fn split(identifier: &str) -> (&str, &str) {
    identifier
        .rsplit_once('.')
        .unwrap_or((TOP_LEVEL, identifier))
}

/// Returns true if the identifier has a non-empty name and no empty
/// namespace segments.
pub fn is_valid(identifier: &str) -> bool {
    let (namespace, name) = split(identifier);
    if name.is_empty() {
        return false;
    }
    if namespace == TOP_LEVEL {
        // ".Name" splits into an empty namespace too
        return !identifier.starts_with('.');
    }
    namespace.split('.').all(|s| !s.is_empty())
}
