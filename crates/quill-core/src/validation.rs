//! Payload validation shared by every mutating operation.

use crate::crypto::normalize_name;
use crate::error::ValidationError;

/// Maximum content size in bytes.
pub const MAX_SIZE: usize = 65535;

/// Validate content length: must be in `(0, max]` bytes.
pub fn validate_content(content: &str, max: usize) -> Result<(), ValidationError> {
    if content.is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    if content.len() > max {
        return Err(ValidationError::ContentTooLarge {
            len: content.len(),
            max,
        });
    }
    Ok(())
}

/// Validate an attachment reference.
pub fn validate_reference(reference: &str) -> Result<(), ValidationError> {
    if reference.is_empty() {
        return Err(ValidationError::EmptyReference);
    }
    Ok(())
}

/// Validate a vanity name. It must survive normalization non-empty.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if normalize_name(name).is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(())
}

/// Validate a whole batch before any item is created.
///
/// Checks, in order:
/// - Equal lengths
/// - Non-empty
/// - Every content, reporting the first failing index
///
/// Titles are carried through unchecked; they may be empty or of any length.
pub fn validate_batch<T, C>(titles: &[T], contents: &[C], max: usize) -> Result<(), ValidationError>
where
    T: AsRef<str>,
    C: AsRef<str>,
{
    if titles.len() != contents.len() {
        return Err(ValidationError::BatchLengthMismatch {
            titles: titles.len(),
            contents: contents.len(),
        });
    }
    if contents.is_empty() {
        return Err(ValidationError::EmptyBatch);
    }

    for (index, content) in contents.iter().enumerate() {
        validate_content(content.as_ref(), max).map_err(|e| ValidationError::BatchItem {
            index,
            source: Box::new(e),
        })?;
    }

    Ok(())
}
