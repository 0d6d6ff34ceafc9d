//! Materialized path helpers
//!
//! A category's path is the `/`-joined chain of its ancestors' names, ending
//! with its own name (`Despesas/Lazer/Cinema`). All prefix matching goes
//! through this module so every caller respects the separator boundary:
//! `Car` is an ancestor of `Car/Oil` but not of `Cartao`.

use crate::error::{Error, Result};

/// Separator between path segments
pub const SEPARATOR: char = '/';

/// Code point immediately after [`SEPARATOR`], used as an exclusive upper
/// bound for range scans
const SEPARATOR_SUCCESSOR: char = '0';

/// Normalize a name for sibling-uniqueness comparison
///
/// Trims surrounding whitespace and lower-cases. The display name keeps its
/// original form.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Check that a name can be used as a path segment
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidName("name must not be blank".to_string()));
    }
    if name.contains(SEPARATOR) {
        return Err(Error::InvalidName(format!(
            "'{}' must not contain '{}'",
            name, SEPARATOR
        )));
    }
    Ok(())
}

/// Build a path from an optional parent path and a name
pub fn compose(parent_path: Option<&str>, name: &str) -> String {
    match parent_path {
        Some(parent) => format!("{}{}{}", parent, SEPARATOR, name),
        None => name.to_string(),
    }
}

/// The prefix every strict descendant of `path` starts with
pub fn subtree_prefix(path: &str) -> String {
    format!("{}{}", path, SEPARATOR)
}

/// Half-open `[start, end)` range covering exactly the strict descendants
/// of `path` under byte-wise string ordering
pub fn descendant_range(path: &str) -> (String, String) {
    (
        subtree_prefix(path),
        format!("{}{}", path, SEPARATOR_SUCCESSOR),
    )
}

/// True if `path` lies strictly below `ancestor`
pub fn is_strict_descendant(path: &str, ancestor: &str) -> bool {
    path.len() > ancestor.len() + 1
        && path.starts_with(ancestor)
        && path[ancestor.len()..].starts_with(SEPARATOR)
}

/// True if `path` is `root` itself or lies below it
pub fn is_within(path: &str, root: &str) -> bool {
    path == root || is_strict_descendant(path, root)
}

/// Replace the `old_prefix` ancestor of `path` with `new_prefix`
///
/// Returns `None` when `path` is not a strict descendant of `old_prefix`.
pub fn rebase(path: &str, old_prefix: &str, new_prefix: &str) -> Option<String> {
    if !is_strict_descendant(path, old_prefix) {
        return None;
    }
    Some(format!("{}{}", new_prefix, &path[old_prefix.len()..]))
}

/// Path of the parent, `None` for a root path
pub fn parent_path(path: &str) -> Option<&str> {
    path.rfind(SEPARATOR).map(|pos| &path[..pos])
}

/// Last segment of a path
pub fn leaf_name(path: &str) -> &str {
    match path.rfind(SEPARATOR) {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}

/// Number of ancestors above the node (0 for a root)
pub fn depth(path: &str) -> usize {
    path.matches(SEPARATOR).count()
}
