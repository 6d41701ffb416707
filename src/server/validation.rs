//! Request validation utilities.
//!
//! License keys and hardware identifiers are opaque strings, so validation is
//! limited to presence, a sanity bound on length and readable timestamps.

use crate::errors::{LicenseError, LicenseResult};
use crate::timestamp::parse_timestamp;

/// Upper bound on license key length.
pub const MAX_LICENSE_KEY_LEN: usize = 1024;

/// Validate that a string is not empty.
///
/// # Example
/// ```
/// use hwbind::server::validation::validate_not_empty;
///
/// assert!(validate_not_empty("hello", "licenseKey").is_ok());
/// assert!(validate_not_empty("", "licenseKey").is_err());
/// ```
pub fn validate_not_empty(value: &str, field_name: &str) -> LicenseResult<()> {
    if value.is_empty() {
        Err(LicenseError::Validation(format!("{field_name} cannot be empty")))
    } else {
        Ok(())
    }
}

/// Validate string length is within bounds.
pub fn validate_length(value: &str, min: usize, max: usize, field_name: &str) -> LicenseResult<()> {
    let len = value.chars().count();
    if len < min {
        Err(LicenseError::Validation(format!(
            "{field_name} must be at least {min} characters"
        )))
    } else if len > max {
        Err(LicenseError::Validation(format!(
            "{field_name} must be at most {max} characters"
        )))
    } else {
        Ok(())
    }
}

/// Validate a license key submitted for creation.
pub fn validate_license_key(value: &str) -> LicenseResult<()> {
    validate_not_empty(value, "licenseKey")?;
    validate_length(value, 1, MAX_LICENSE_KEY_LEN, "licenseKey")
}

/// Validate an expiration timestamp submitted for creation.
///
/// # Example
/// ```
/// use hwbind::server::validation::validate_expiration;
///
/// assert!(validate_expiration("2099-01-01T00:00:00Z").is_ok());
/// assert!(validate_expiration("someday").is_err());
/// ```
pub fn validate_expiration(value: &str) -> LicenseResult<()> {
    parse_timestamp(value)
        .map(|_| ())
        .ok_or_else(|| LicenseError::Validation("Invalid expiration date".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_bounds() {
        assert!(validate_length("abc", 1, 3, "f").is_ok());
        assert!(validate_length("", 1, 3, "f").is_err());
        assert!(validate_length("abcd", 1, 3, "f").is_err());
    }

    #[test]
    fn oversized_key_is_rejected() {
        let key = "K".repeat(MAX_LICENSE_KEY_LEN + 1);
        assert!(matches!(
            validate_license_key(&key),
            Err(LicenseError::Validation(_))
        ));
        assert!(validate_license_key("KEY1").is_ok());
    }

    #[test]
    fn expiration_message() {
        let err = validate_expiration("tomorrow-ish").unwrap_err();
        assert_eq!(err.to_string(), "Invalid expiration date");
    }
}
