//! Input validation helpers
//!
//! Each check names the offending field in the returned error.

use crate::error::{BusinessError, BusinessResult};
use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;

/// Minimum password length
pub const MIN_PASSWORD_LEN: usize = 6;

/// Validate email format (đơn giản)
pub fn validate_email(email: &str) -> bool {
    let email = email.trim();

    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return false;
    }

    // Có @ và ít nhất một ký tự trước và sau @
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

/// Field must be present and not blank
pub fn require(field: &str, value: &str) -> BusinessResult<()> {
    if value.trim().is_empty() {
        return Err(BusinessError::validation(field, format!("{field} is required")));
    }
    Ok(())
}

/// Email must be well-formed
pub fn require_email(email: &str) -> BusinessResult<()> {
    if !validate_email(email) {
        return Err(BusinessError::validation("email", "Please provide a valid email"));
    }
    Ok(())
}

/// Password length and confirmation
pub fn require_password(password: &str, confirmation: &str) -> BusinessResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(BusinessError::validation(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters long"),
        ));
    }
    if password != confirmation {
        return Err(BusinessError::validation(
            "confirmPassword",
            "Passwords do not match",
        ));
    }
    Ok(())
}

/// Parse a date of birth given as `YYYY-MM-DD` or a full RFC 3339 timestamp
pub fn parse_date_of_birth(raw: &str) -> BusinessResult<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .ok_or_else(|| {
            BusinessError::validation("dateOfBirth", "Please provide a valid date of birth")
        })
}

/// Amount must be strictly positive
pub fn require_positive(field: &str, amount: Decimal) -> BusinessResult<()> {
    if amount <= Decimal::ZERO {
        return Err(BusinessError::InvalidAmount(format!(
            "{field} must be positive, got {amount}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com"));
        assert!(validate_email("  first.last@bank.co.uk "));
        assert!(!validate_email("userexample.com"));
        assert!(!validate_email("@example.com"));
        assert!(!validate_email("user@example"));
        assert!(!validate_email("user@.com"));
        assert!(!validate_email("us er@example.com"));
        assert!(!validate_email("a@b@example.com"));
        assert!(!validate_email(""));
    }

    #[test]
    fn test_require_password() {
        assert!(require_password("secret", "secret").is_ok());

        let err = require_password("short", "short").unwrap_err();
        assert!(matches!(err, BusinessError::Validation { ref field, .. } if field == "password"));

        let err = require_password("secret1", "secret2").unwrap_err();
        assert!(
            matches!(err, BusinessError::Validation { ref field, .. } if field == "confirmPassword")
        );
    }

    #[test]
    fn test_parse_date_of_birth() {
        assert_eq!(
            parse_date_of_birth("1990-02-28").unwrap(),
            NaiveDate::from_ymd_opt(1990, 2, 28).unwrap()
        );
        assert_eq!(
            parse_date_of_birth("1990-02-28T00:00:00Z").unwrap(),
            NaiveDate::from_ymd_opt(1990, 2, 28).unwrap()
        );
        assert!(parse_date_of_birth("1990-02-30").is_err());
        assert!(parse_date_of_birth("yesterday").is_err());
    }

    #[test]
    fn test_require_helpers() {
        assert!(require("firstName", "Ada").is_ok());
        assert!(require("firstName", "   ").is_err());
        assert!(require_positive("amount", dec!(0.01)).is_ok());
        assert!(require_positive("amount", dec!(0)).is_err());
    }
}
