use thiserror::Error;

/// Longest stored filename, in bytes.
pub const MAX_FILENAME_LEN: usize = 255;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

/// Characters replaced by `_` in stored filenames
fn is_reserved(c: char) -> bool {
    c.is_control() || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | ';')
}

/// Turns a client-supplied filename into a name that is safe to join onto
/// the upload directory.
///
/// Directory components are dropped (both `/` and `\` count as separators),
/// reserved characters become `_`, and the result is capped at
/// [`MAX_FILENAME_LEN`] bytes. Names that end up empty, `.` or `..` are
/// rejected.
pub fn sanitize_filename(filename: &str) -> Result<String, ValidationError> {
    let name = filename
        .rsplit(['/', '\\'])
        .find(|segment| !segment.is_empty())
        .unwrap_or("");

    if name != filename {
        tracing::warn!("Stripped directory components from filename: {:?}", filename);
    }

    let sanitized: String = name
        .chars()
        .map(|c| if is_reserved(c) { '_' } else { c })
        .collect();

    // Limit length safely for UTF-8
    let sanitized = if sanitized.len() > MAX_FILENAME_LEN {
        let mut end = MAX_FILENAME_LEN;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized[..end].to_string()
    } else {
        sanitized
    };

    if sanitized.trim().is_empty() || sanitized == "." || sanitized == ".." {
        return Err(ValidationError {
            code: "INVALID_FILENAME",
            message: format!("Filename {:?} does not name a file", filename),
        });
    }

    Ok(sanitized)
}
