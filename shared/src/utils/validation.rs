//! Common validation utilities

use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,63}$").unwrap());

/// Check that a string is a plain SQL identifier (letters, digits, underscore; max 64 chars)
pub fn is_valid_identifier(value: &str) -> bool {
    IDENTIFIER_REGEX.is_match(value)
}

/// Check that a string is not blank
pub fn not_empty(value: &str) -> bool {
    !value.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        assert!(is_valid_identifier("sessions"));
        assert!(is_valid_identifier("_app_sessions_v2"));
        assert!(is_valid_identifier(&"a".repeat(64)));
    }

    #[test]
    fn test_invalid_identifiers() {
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("2sessions"));
        assert!(!is_valid_identifier("sessions`; --"));
        assert!(!is_valid_identifier("app.sessions"));
        assert!(!is_valid_identifier(&"a".repeat(65)));
    }

    #[test]
    fn test_not_empty() {
        assert!(not_empty("user-1"));
        assert!(!not_empty("   "));
    }
}
