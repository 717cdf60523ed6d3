//! URL helpers.

use crate::error::LlmError;

/// Join a base URL and a path without doubling or dropping the slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Last path segment of a URL, ignoring query and fragment.
///
/// The segment is returned as it appears in the URL, without percent
/// decoding, so it can be used as a single file name. Segments that could
/// still name another directory are rejected.
pub fn file_name_from_url(raw: &str) -> Result<String, LlmError> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| LlmError::InvalidInput(format!("invalid URL `{raw}`: {e}")))?;
    let name = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| LlmError::InvalidInput(format!("URL `{raw}` has no file name")))?;
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(LlmError::InvalidInput(format!(
            "URL `{raw}` does not end in a plain file name"
        )));
    }
    Ok(name.to_string())
}
