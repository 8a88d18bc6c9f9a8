//! Login credentials, two-factor challenge data, and contact masking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::ChallengeId;

/// Email + password pair submitted at login.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// How the one-time code was delivered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryChannel {
    #[default]
    Email,
    Sms,
}

/// A server-issued two-factor challenge.
///
/// Persisted to the transient storage area while verification is in
/// progress so a restart mid-verification can resume, and cleared once
/// verified. The server-issued `expires_at` is the source of truth for
/// expiry; client countdowns are presentation only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpChallenge {
    pub challenge_id: ChallengeId,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub delivery_channel: DeliveryChannel,
    pub expires_at: DateTime<Utc>,
}

impl OtpChallenge {
    /// Expiry decision derived from the server timestamp at the moment of
    /// the action, never from a displayed countdown.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whole seconds until the challenge expires, clamped at zero.
    #[must_use]
    pub fn seconds_remaining(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }

    /// Masked contact for display, chosen by the delivery channel.
    #[must_use]
    pub fn masked_contact(&self) -> String {
        match self.delivery_channel {
            DeliveryChannel::Email => mask_email(&self.email),
            DeliveryChannel::Sms => mask_phone(self.phone.as_deref().unwrap_or("")),
        }
    }
}

/// A six-digit one-time code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OtpCode(String);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("verification code must be 6 digits")]
pub struct OtpCodeError;

impl OtpCode {
    /// Accepts exactly six digits, ignoring any separators the user typed.
    pub fn new(input: &str) -> Result<Self, OtpCodeError> {
        let digits: String = input.chars().filter(char::is_ascii_digit).collect();
        if digits.len() == 6 {
            Ok(Self(digits))
        } else {
            Err(OtpCodeError)
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Token material returned by login / OTP verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Mask an email for display: `joe.bloggs@example.com` -> `joe***@example.com`.
#[must_use]
pub fn mask_email(email: &str) -> String {
    let Some((local, domain)) = email.split_once('@') else {
        return "***@***".to_owned();
    };
    if local.is_empty() || domain.is_empty() {
        return "***@***".to_owned();
    }
    let visible = if local.chars().count() > 3 { 3 } else { 1 };
    let shown: String = local.chars().take(visible).collect();
    format!("{shown}***@{domain}")
}

/// Mask a phone number, keeping the leading three and trailing four digits.
#[must_use]
pub fn mask_phone(phone: &str) -> String {
    let digits: Vec<char> = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < 10 {
        return "***-***-****".to_owned();
    }
    let head: String = digits[..3].iter().collect();
    let tail: String = digits[digits.len() - 4..].iter().collect();
    format!("{head}-***-{tail}")
}
