//! Channel name grammar and resolution.
//!
//! ```text
//! ABSOLUTE := segment (':' segment)*
//! RELATIVE := ':' ABSOLUTE?
//! ```
//!
//! A relative name is resolved against the path of the node that uses it.
//! Resolution only depends on that path and the raw name.

use nshub_error::NamespaceError;

/// Path separator and relative-name marker.
pub const SEPARATOR: char = ':';

/// Returns `true` if `name` starts with the relative marker.
#[inline]
pub fn is_relative(name: &str) -> bool {
    name.starts_with(SEPARATOR)
}

/// Resolves `name` against the namespace `path`.
///
/// - `":rest"` at an empty path → `"rest"`
/// - `":rest"` at `"a:b"` → `"a:b:rest"`
/// - anything else is returned unchanged
pub fn resolve(path: &str, name: &str) -> String {
    match name.strip_prefix(SEPARATOR) {
        Some(rest) if path.is_empty() => rest.to_string(),
        Some(_) => format!("{path}{name}"),
        None => name.to_string(),
    }
}

/// Splits a canonical name into `(target, short_name)`.
///
/// The short name is the last segment; the target is everything before the
/// last separator, or `""` when there is none.
pub fn decompose(canonical: &str) -> (&str, &str) {
    canonical.rsplit_once(SEPARATOR).unwrap_or(("", canonical))
}

/// Path of a child named `local` under `parent`.
pub fn join(parent: &str, local: &str) -> String {
    if parent.is_empty() {
        local.to_string()
    } else {
        format!("{parent}{SEPARATOR}{local}")
    }
}

/// Checks that `local` is usable as a single path segment.
///
/// The separator is refused so that a path always has one segment per tree
/// level.
pub fn validate_segment(local: &str) -> Result<(), NamespaceError> {
    if local.is_empty() {
        return Err(NamespaceError::invalid("namespace must be a non-empty string"));
    }
    if local.contains(SEPARATOR) {
        return Err(NamespaceError::invalid(format!(
            "namespace '{local}' must not contain '{SEPARATOR}'"
        )));
    }
    Ok(())
}
