//! Input validation for registration and credential updates

use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;
use crate::config::PasswordConfig;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Upper bound on password length, in bytes
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Upper bound on email length, in bytes
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Validate email format
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::new("email_too_long"));
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::new("invalid_email_format"));
    }

    // Additional check for dangerous characters
    if email.contains('<') || email.contains('>') || email.contains('"') || email.contains('\'') {
        return Err(ValidationError::new("email_contains_dangerous_chars"));
    }

    Ok(())
}

/// Validate a new password against the configured length policy
pub fn validate_password(password: &str, policy: &PasswordConfig) -> Result<(), ValidationError> {
    if password.len() < policy.min_length {
        return Err(ValidationError::new("password_too_short"));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::new("password_too_long"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(validate_email("saul@bettercall.com").is_ok());
        assert!(validate_email("walt+chem@breakingbad.co.uk").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign.com").is_err());
        assert!(validate_email("two words@example.com").is_err());
        assert!(validate_email("x@localhost").is_err());
        assert!(validate_email("a'b@example.com").is_err());

        let long = format!("{}@example.com", "a".repeat(250));
        assert_eq!(validate_email(&long).unwrap_err().code, "email_too_long");
    }

    #[test]
    fn test_password_validation() {
        let policy = PasswordConfig::default();

        assert!(validate_password("12345678", &policy).is_ok());
        assert_eq!(validate_password("1234567", &policy).unwrap_err().code, "password_too_short");
        assert_eq!(
            validate_password(&"x".repeat(MAX_PASSWORD_LENGTH + 1), &policy).unwrap_err().code,
            "password_too_long"
        );
    }
}
