//! Client-side pre-submit validation: email shape and password strength.
//!
//! These checks gate form submission only; the backend remains
//! authoritative and its validation messages are surfaced verbatim.

use std::sync::OnceLock;

use regex::Regex;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap_or_else(|e| {
            // The pattern is a literal; failure here is a programming error.
            panic!("email regex failed to compile: {e}")
        })
    })
}

#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// Password strength checks for user creation and password reset.
///
/// A password is acceptable with length, upper, lower, and digit; the
/// special-character check is reported for display but not required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordStrength {
    pub min_length: bool,
    pub has_uppercase: bool,
    pub has_lowercase: bool,
    pub has_digit: bool,
    pub has_special: bool,
}

pub const MIN_PASSWORD_LEN: usize = 8;

impl PasswordStrength {
    #[must_use]
    pub fn check(password: &str) -> Self {
        Self {
            min_length: password.chars().count() >= MIN_PASSWORD_LEN,
            has_uppercase: password.chars().any(|c| c.is_ascii_uppercase()),
            has_lowercase: password.chars().any(|c| c.is_ascii_lowercase()),
            has_digit: password.chars().any(|c| c.is_ascii_digit()),
            has_special: password.chars().any(|c| "!@#$%^&*(),.?\":{}|<>".contains(c)),
        }
    }

    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.min_length && self.has_uppercase && self.has_lowercase && self.has_digit
    }
}
