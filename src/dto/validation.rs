//! Validation helpers for DTOs.

use validator::ValidationError;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 32;

/// Validates that a color is a `#rrggbb` hexadecimal string.
///
/// # Examples
///
/// ```ignore
/// validate_hex_color("#8b5cf6") // Ok
/// validate_hex_color("8b5cf6")  // Err - missing '#'
/// validate_hex_color("#8b5cf")  // Err - too short
/// ```
pub fn validate_hex_color(color: &str) -> Result<(), ValidationError> {
    let Some(digits) = color.strip_prefix('#') else {
        let mut err = ValidationError::new("accent_color_prefix");
        err.message = Some("Accent color must start with '#'".into());
        return Err(err);
    };

    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        let mut err = ValidationError::new("accent_color_format");
        err.message = Some(
            format!("Accent color must be 6 hexadecimal digits (got `{digits}`)").into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Validates a public username: 3 to 32 ASCII letters, digits, `_`, `-` or `.`.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&username.len()) {
        let mut err = ValidationError::new("username_length");
        err.message = Some(
            format!(
                "Username must be between {USERNAME_MIN} and {USERNAME_MAX} characters (got {})",
                username.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        let mut err = ValidationError::new("username_format");
        err.message = Some("Username contains unsupported characters".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_hex_color_valid() {
        assert!(validate_hex_color("#8b5cf6").is_ok());
        assert!(validate_hex_color("#FFFFFF").is_ok());
        assert!(validate_hex_color("#000000").is_ok());
    }

    #[test]
    fn test_validate_hex_color_invalid() {
        assert!(validate_hex_color("8b5cf6").is_err()); // no prefix
        assert!(validate_hex_color("#8b5cf").is_err()); // too short
        assert!(validate_hex_color("#8b5cf6a").is_err()); // too long
        assert!(validate_hex_color("#8b5cfg").is_err()); // invalid hex
        assert!(validate_hex_color("").is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("gamer254").is_ok());
        assert!(validate_username("night_owl.gg").is_ok());
        assert!(validate_username("ab").is_err()); // too short
        assert!(validate_username(&"x".repeat(33)).is_err()); // too long
        assert!(validate_username("bad name").is_err()); // space
        assert!(validate_username("émile").is_err()); // non-ascii
    }
}
