//! Field validators for form input.
//!
//! Every validator returns `Option<String>`: `None` means the value is
//! acceptable, `Some(message)` carries a human-readable reason. Validators
//! other than [`required`] accept the empty string, so optional fields
//! compose as `required(..).or_else(|| phone(..))` only where the field is
//! mandatory.

use std::sync::OnceLock;

use regex::Regex;

/// Digits only, between 9 and 14 of them. Covers local formats with and
/// without an area code; no separators allowed.
fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{9,14}$").unwrap())
}

/// Reject empty or whitespace-only input.
pub fn required(label: &str, value: &str) -> Option<String> {
    if value.trim().is_empty() {
        Some(format!("{label} is required"))
    } else {
        None
    }
}

/// Phone numbers must be 9 to 14 digits with no separators.
pub fn phone(value: &str) -> Option<String> {
    if value.is_empty() || phone_pattern().is_match(value) {
        None
    } else {
        Some("phone number must be 9 to 14 digits".to_string())
    }
}

/// Both password fields must agree.
pub fn password_match(password: &str, confirm: &str) -> Option<String> {
    if password == confirm {
        None
    } else {
        Some("passwords do not match".to_string())
    }
}

/// Numeric and strictly greater than zero. Empty input is acceptable; pair
/// with [`required`] where the field is mandatory.
pub fn positive_number(label: &str, value: &str) -> Option<String> {
    if value.is_empty() {
        return None;
    }
    match value.parse::<f64>() {
        Ok(n) if n > 0.0 => None,
        _ => Some(format!("{label} must be a positive number")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_blank_input() {
        assert_eq!(required("email", ""), Some("email is required".into()));
        assert_eq!(required("email", "   "), Some("email is required".into()));
        assert_eq!(required("email", "a@b.io"), None);
    }

    #[test]
    fn phone_accepts_nine_to_fourteen_digits() {
        assert_eq!(phone("123456789"), None);
        assert_eq!(phone("12345678901234"), None);
        assert_eq!(phone(""), None);

        assert!(phone("12345678").is_some());
        assert!(phone("123456789012345").is_some());
        assert!(phone("010-1234-5678").is_some());
        assert!(phone("phone").is_some());
    }

    #[test]
    fn password_match_compares_exactly() {
        assert_eq!(password_match("pw", "pw"), None);
        assert!(password_match("pw", "PW").is_some());
        assert!(password_match("pw", "").is_some());
    }

    #[test]
    fn positive_number_requires_strictly_positive() {
        assert_eq!(positive_number("size", ""), None);
        assert_eq!(positive_number("size", "12"), None);
        assert_eq!(positive_number("size", "12.5"), None);

        assert!(positive_number("size", "0").is_some());
        assert!(positive_number("size", "-3").is_some());
        assert!(positive_number("size", "abc").is_some());
        assert!(positive_number("size", "NaN").is_some());
    }
}
