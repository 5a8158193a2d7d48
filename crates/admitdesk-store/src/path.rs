//! Store path helpers.
//!
//! Paths are slash-separated segments with no leading or trailing slash.
//! Segments may not be empty and may not contain `.`, `#`, `$`, `[` or `]`.

use crate::error::StoreError;

const FORBIDDEN: [char; 5] = ['.', '#', '$', '[', ']'];

pub fn validate(path: &str) -> Result<(), StoreError> {
    if path.is_empty() {
        return Err(StoreError::invalid_path(path, "path is empty"));
    }
    if path.split('/').any(str::is_empty) {
        return Err(StoreError::invalid_path(path, "empty path segment"));
    }
    if path.chars().any(|c| FORBIDDEN.contains(&c) || c.is_control()) {
        return Err(StoreError::invalid_path(path, "forbidden character"));
    }
    Ok(())
}

/// Validates a single segment (a key to be appended to a path).
pub fn validate_segment(segment: &str) -> Result<(), StoreError> {
    if segment.contains('/') {
        return Err(StoreError::invalid_path(segment, "segment contains '/'"));
    }
    validate(segment)
}

pub fn join(parent: &str, key: &str) -> String {
    format!("{parent}/{key}")
}

/// Splits `a/b/c` into (`a/b`, `c`). Top-level paths have an empty parent.
pub fn split(path: &str) -> (&str, &str) {
    path.rsplit_once('/').unwrap_or(("", path))
}

/// Whether a write at `changed` can alter what a watcher of `watched` sees.
pub fn affects(changed: &str, watched: &str) -> bool {
    is_same_or_descendant(changed, watched) || is_same_or_descendant(watched, changed)
}

/// `path == ancestor` or `path` lies beneath `ancestor`.
pub fn is_same_or_descendant(path: &str, ancestor: &str) -> bool {
    path == ancestor
        || (path.len() > ancestor.len()
            && path.starts_with(ancestor)
            && path.as_bytes()[ancestor.len()] == b'/')
}
