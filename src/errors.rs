//! Error taxonomy shared by the store, the licensing operations and the HTTP layer.
//!
//! The `Display` output of the business-rule variants is the exact reason string
//! returned to callers, so licensed applications can branch on it.

use thiserror::Error;

/// Everything that can go wrong while creating or verifying a license.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Missing or malformed input. Carries the caller-visible message.
    #[error("{0}")]
    Validation(String),

    /// No license exists with the presented key.
    #[error("Invalid license key")]
    NotFound,

    /// The operator switched the license off.
    #[error("License is deactivated")]
    Deactivated,

    /// Current time is past `expires_at`.
    #[error("License has expired")]
    Expired,

    /// The license is bound to a different hardware identifier.
    #[error("License is bound to another machine")]
    HwidMismatch,

    /// A license with the same key already exists.
    #[error("License key already exists")]
    DuplicateKey,

    /// Unexpected storage failure. The detail is for logs only.
    #[error("database error: {0}")]
    Persistence(String),

    /// The HTTP listener could not start or stopped with an error.
    #[error("server error: {0}")]
    Server(String),

    /// Invalid or unloadable configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl LicenseError {
    /// Whether the failure is the caller's fault (4xx) rather than the server's.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            LicenseError::Persistence(_) | LicenseError::Server(_) | LicenseError::Config(_)
        )
    }
}

impl From<sqlx::Error> for LicenseError {
    fn from(e: sqlx::Error) -> Self {
        LicenseError::Persistence(e.to_string())
    }
}

impl From<config::ConfigError> for LicenseError {
    fn from(e: config::ConfigError) -> Self {
        LicenseError::Config(e.to_string())
    }
}

pub type LicenseResult<T> = Result<T, LicenseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_strings_are_distinct() {
        let reasons = [
            LicenseError::NotFound.to_string(),
            LicenseError::Deactivated.to_string(),
            LicenseError::Expired.to_string(),
            LicenseError::HwidMismatch.to_string(),
        ];
        for (i, a) in reasons.iter().enumerate() {
            for b in reasons.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn storage_failures_are_server_faults() {
        assert!(!LicenseError::Persistence("disk full".into()).is_client_error());
        assert!(!LicenseError::Config("bad".into()).is_client_error());
        assert!(LicenseError::DuplicateKey.is_client_error());
        assert!(LicenseError::Validation("x".into()).is_client_error());
        assert!(LicenseError::HwidMismatch.is_client_error());
    }
}
