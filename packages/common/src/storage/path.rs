use super::error::StorageError;

/// Validate a relative object path and return it without surrounding
/// whitespace or redundant slashes.
///
/// Rejects empty paths, absolute paths, backslashes, NUL bytes and any
/// `.`/`..` segment, so a path can never leave the backend's root.
pub fn normalize_path(path: &str) -> Result<String, StorageError> {
    let trimmed = path.trim();

    if trimmed.is_empty() {
        return Err(StorageError::InvalidPath("path cannot be empty".into()));
    }
    if trimmed.contains('\0') {
        return Err(StorageError::InvalidPath(
            "path must not contain null bytes".into(),
        ));
    }
    if trimmed.contains('\\') {
        return Err(StorageError::InvalidPath(
            "path must not contain backslashes".into(),
        ));
    }
    if trimmed.starts_with('/') {
        return Err(StorageError::InvalidPath(format!(
            "path must be relative: {trimmed}"
        )));
    }

    let mut segments = Vec::new();
    for segment in trimmed.split('/') {
        match segment {
            "" => continue,
            "." | ".." => {
                return Err(StorageError::InvalidPath(format!(
                    "path traversal is not allowed: {trimmed}"
                )));
            }
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        return Err(StorageError::InvalidPath("path cannot be empty".into()));
    }

    Ok(segments.join("/"))
}

/// Normalize a listing prefix. An empty prefix is allowed and means "everything".
pub fn normalize_prefix(prefix: &str) -> Result<String, StorageError> {
    if prefix.trim().trim_matches('/').is_empty() {
        return Ok(String::new());
    }
    normalize_path(prefix)
}
