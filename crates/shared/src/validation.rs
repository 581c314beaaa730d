//! Common validation utilities.

use validator::ValidationError;

/// Anonymous marker stored when a viewer has no public handle.
pub const ANONYMOUS_HANDLE: &str = "anonymous";

/// Maximum accepted length for a chat handle (without the leading `@`).
const MAX_HANDLE_LENGTH: usize = 64;

/// Validates that a string contains at least one non-whitespace character.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Field must not be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Validates a chat handle such as `@alice` or `alice`.
///
/// Handles consist of ASCII letters, digits and underscores.
pub fn validate_handle(value: &str) -> Result<(), ValidationError> {
    let handle = normalize_handle(value);
    if handle.is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Field must not be blank".into());
        return Err(err);
    }
    if handle.len() > MAX_HANDLE_LENGTH
        || !handle
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        let mut err = ValidationError::new("handle_format");
        err.message =
            Some("Handle may only contain letters, digits and underscores".into());
        return Err(err);
    }
    Ok(())
}

/// Strips whitespace and a leading `@` from a handle.
pub fn normalize_handle(value: &str) -> String {
    value.trim().trim_start_matches('@').to_string()
}

/// Default contact link for a handle, `https://t.me/<handle>`.
pub fn contact_link_for_handle(handle: &str) -> String {
    format!("https://t.me/{}", normalize_handle(handle))
}

/// Display form of a handle for chat messages (`@alice`).
pub fn display_handle(handle: &str) -> String {
    format!("@{}", normalize_handle(handle))
}
