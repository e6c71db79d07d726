//! Validation helpers for request parameters.

use validator::ValidationError;

/// Longest accepted animation name.
const MAX_ANIMATION_NAME_LEN: usize = 64;

/// Validates that an animation name is a non-empty path segment made of
/// ASCII letters, digits, `_` and `-`.
///
/// # Examples
///
/// ```ignore
/// validate_animation_name("heartbeat")   // Ok
/// validate_animation_name("rain-bow_2")  // Ok
/// validate_animation_name("../finish")   // Err - illegal characters
/// ```
pub fn validate_animation_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() || name.len() > MAX_ANIMATION_NAME_LEN {
        let mut err = ValidationError::new("animation_name_length");
        err.message = Some(
            format!(
                "Animation name must be 1-{MAX_ANIMATION_NAME_LEN} characters (got {})",
                name.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        let mut err = ValidationError::new("animation_name_format");
        err.message =
            Some("Animation name may only contain letters, digits, '_' and '-'".into());
        return Err(err);
    }

    Ok(())
}
